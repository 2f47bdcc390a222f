//! Communication settings, derived from the client configuration.

use crate::domain::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunicationConfig {
    /// How long a call waits for its reply. 0 waits forever.
    pub response_timeout_ms: u64,
    /// Close a session that delivered nothing for this long. 0 disables.
    pub socket_timeout_ms: u64,
    /// Consecutive connect or send failures tolerated. `None` retries forever.
    pub max_reconnect_attempts: Option<u32>,
    pub reconnect_backoff_ms: u64,
    /// Fail calls whose reply carries a different id instead of warning.
    pub strict_response_ids: bool,
}

impl Default for CommunicationConfig {
    fn default() -> Self {
        Self {
            response_timeout_ms: 1_000,
            socket_timeout_ms: 0,
            max_reconnect_attempts: None,
            reconnect_backoff_ms: 0,
            strict_response_ids: false,
        }
    }
}

impl CommunicationConfig {
    pub fn response_timeout(&self) -> Option<Duration> {
        non_zero(self.response_timeout_ms)
    }

    pub fn socket_timeout(&self) -> Option<Duration> {
        non_zero(self.socket_timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_reconnect_attempts,
            backoff: Duration::from_millis(self.reconnect_backoff_ms),
        }
    }
}

fn non_zero(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}
