//! Reconnect timing

use std::time::Duration;

/// Longest single wait between attempts
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60 * 60);

/// Exponential backoff with a hard ceiling on consecutive attempts
///
/// The delay for attempt `n` (1-based) is `base_delay * 2^(n-1)`, clamped to
/// [`MAX_RETRY_DELAY`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    attempt: u32,
    max_attempts: u32,
    base_delay: Duration,
}

impl ReconnectPolicy {
    pub fn new(base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            max_attempts,
            base_delay,
        }
    }

    /// Retries scheduled since the last successful open
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    /// Delay for a given 1-based attempt number
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(MAX_RETRY_DELAY)
    }

    /// Consume one attempt and return its delay, or `None` once exhausted
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }
        self.attempt += 1;
        Some(self.delay_for(self.attempt))
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let mut policy = ReconnectPolicy::new(Duration::from_millis(1000), 5);
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(1000)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(2000)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(4000)));
        assert_eq!(policy.attempt(), 3);
    }

    #[test]
    fn test_exhaustion_and_reset() {
        let mut policy = ReconnectPolicy::new(Duration::from_millis(500), 2);
        assert!(policy.next_delay().is_some());
        assert!(policy.next_delay().is_some());
        assert!(policy.is_exhausted());
        assert_eq!(policy.next_delay(), None);
        assert_eq!(policy.attempt(), 2);

        policy.reset();
        assert!(!policy.is_exhausted());
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_zero_max_attempts_never_retries() {
        let mut policy = ReconnectPolicy::new(Duration::from_millis(500), 0);
        assert!(policy.is_exhausted());
        assert_eq!(policy.next_delay(), None);
    }

    #[test]
    fn test_delay_is_clamped() {
        let policy = ReconnectPolicy::new(Duration::from_secs(1), u32::MAX);
        assert_eq!(policy.delay_for(12), Duration::from_secs(2048));
        assert_eq!(policy.delay_for(13), MAX_RETRY_DELAY);
        assert_eq!(policy.delay_for(40), MAX_RETRY_DELAY);
        assert_eq!(policy.delay_for(u32::MAX), MAX_RETRY_DELAY);

        let policy = ReconnectPolicy::new(Duration::MAX, 5);
        assert_eq!(policy.delay_for(1), MAX_RETRY_DELAY);
    }
}
