//! # Wait Slot
//!
//! The single outstanding request of a connection. Arming the slot
//! replaces whatever was there; releasing it hands the raw frame to the
//! waiting caller. A slot is released at most once: the first frame that
//! takes it wins and later frames find it empty.

use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::debug;

struct PendingSlot {
    request_id: u64,
    sender: oneshot::Sender<String>,
    armed_at: Instant,
}

#[derive(Default)]
pub struct WaitSlot {
    inner: Mutex<Option<PendingSlot>>,
}

/// Who a released frame was delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Released {
    pub request_id: u64,
    pub waited: Duration,
}

impl WaitSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the slot for `request_id`, dropping any previous waiter.
    pub fn arm(&self, request_id: u64) -> oneshot::Receiver<String> {
        let (sender, receiver) = oneshot::channel();
        let previous = self.inner.lock().replace(PendingSlot {
            request_id,
            sender,
            armed_at: Instant::now(),
        });
        if let Some(previous) = previous {
            debug!(
                previous_id = previous.request_id,
                request_id, "Replaced an outstanding wait slot"
            );
        }
        receiver
    }

    /// Deliver a frame to the armed waiter. `None` when nothing is armed.
    pub fn release(&self, payload: String) -> Option<Released> {
        let pending = self.inner.lock().take()?;
        let released = Released {
            request_id: pending.request_id,
            waited: pending.armed_at.elapsed(),
        };
        // The waiter may have timed out between take() and send().
        let _ = pending.sender.send(payload);
        Some(released)
    }

    /// Disarm the slot if it still belongs to `request_id`.
    pub fn discard(&self, request_id: u64) -> bool {
        let mut inner = self.inner.lock();
        if inner.as_ref().map(|p| p.request_id) == Some(request_id) {
            *inner = None;
            true
        } else {
            false
        }
    }

    pub fn pending_id(&self) -> Option<u64> {
        self.inner.lock().as_ref().map(|p| p.request_id)
    }

    pub fn is_armed(&self) -> bool {
        self.inner.lock().is_some()
    }
}
