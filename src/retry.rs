//! Bounded retry with exponential backoff
//!
//! - Attempt 1 fails: wait `base`
//! - Attempt 2 fails: wait `base * 2`
//! - Attempt 3 fails: wait `base * 4`
//!
//! No wait after the final attempt. Blocking; callers are single-threaded.

use std::time::Duration;

/// Retry configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one (min 1)
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// A single attempt, no backoff
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Backoff after the given zero-based attempt index
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt_index.min(16));
        self.base_delay.saturating_mul(factor)
    }

    /// Whether another attempt follows the given zero-based attempt index
    pub fn has_next(&self, attempt_index: u32) -> bool {
        attempt_index + 1 < self.max_attempts
    }

    /// Sleep for the backoff following `attempt_index`, if there is a next attempt
    pub fn backoff(&self, attempt_index: u32) {
        if !self.has_next(attempt_index) {
            return;
        }
        let delay = self.delay_for(attempt_index);
        if !delay.is_zero() {
            tracing::debug!("Backing off {:?} before attempt {}", delay, attempt_index + 2);
            std::thread::sleep(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_double() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn test_has_next() {
        let policy = RetryPolicy::new(2, Duration::ZERO);
        assert!(policy.has_next(0));
        assert!(!policy.has_next(1));
        assert!(!RetryPolicy::once().has_next(0));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }
}
