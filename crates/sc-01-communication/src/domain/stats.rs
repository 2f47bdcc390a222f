//! Request and notification counters.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RequestStats {
    /// Requests written to the socket (resends not counted).
    pub total_sent: AtomicU64,
    /// Replies handed back to a waiting caller.
    pub total_completed: AtomicU64,
    pub total_timeouts: AtomicU64,
    /// Send failures followed by a reconnect.
    pub total_reconnects: AtomicU64,
    /// Response frames that arrived with nothing pending.
    pub total_unsolicited: AtomicU64,
    pub notifications_dispatched: AtomicU64,
    /// Notifications for unknown subscriptions or with undecodable payloads.
    pub notifications_dropped: AtomicU64,
}

/// Plain copy of [`RequestStats`] at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub total_sent: u64,
    pub total_completed: u64,
    pub total_timeouts: u64,
    pub total_reconnects: u64,
    pub total_unsolicited: u64,
    pub notifications_dispatched: u64,
    pub notifications_dropped: u64,
}

impl RequestStats {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_sent: self.total_sent.load(Ordering::Relaxed),
            total_completed: self.total_completed.load(Ordering::Relaxed),
            total_timeouts: self.total_timeouts.load(Ordering::Relaxed),
            total_reconnects: self.total_reconnects.load(Ordering::Relaxed),
            total_unsolicited: self.total_unsolicited.load(Ordering::Relaxed),
            notifications_dispatched: self.notifications_dispatched.load(Ordering::Relaxed),
            notifications_dropped: self.notifications_dropped.load(Ordering::Relaxed),
        }
    }
}
