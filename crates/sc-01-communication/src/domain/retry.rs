//! # Retry Policy
//!
//! Governs both connect failures and send failures. The default retries
//! forever with no delay, walking the endpoint list.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive failures tolerated before giving up. `None` = unbounded.
    pub max_attempts: Option<u32>,
    /// Pause between attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const fn forever() -> Self {
        Self {
            max_attempts: None,
            backoff: Duration::ZERO,
        }
    }

    pub const fn bounded(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            backoff,
        }
    }

    /// Whether another attempt is allowed after `failures` consecutive
    /// failures.
    pub fn should_retry(&self, failures: u32) -> bool {
        match self.max_attempts {
            Some(max) => failures < max,
            None => true,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::forever()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forever_never_stops() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(u32::MAX));
        assert_eq!(policy.backoff, Duration::ZERO);
    }

    #[test]
    fn test_bounded_caps_failures() {
        let policy = RetryPolicy::bounded(3, Duration::from_millis(10));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }
}
