use chrono::{DateTime, TimeDelta, Utc};

/// Backoff policy for the degraded retry path.
///
/// Delay doubles per attempt starting from `base_delay`, capped at `max_delay`:
/// with the defaults that is 1min, 2min, 4min, 8min, 16min.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub base_delay: TimeDelta,
    pub max_delay: TimeDelta,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: TimeDelta::minutes(1),
            max_delay: TimeDelta::minutes(60),
        }
    }
}

impl BackoffPolicy {
    pub fn new(max_attempts: u32, base_delay: TimeDelta) -> Self {
        Self {
            max_attempts,
            base_delay,
            ..Self::default()
        }
    }

    pub fn with_max_delay(mut self, max_delay: TimeDelta) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Delay before retry `attempt` (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> TimeDelta {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self
            .base_delay
            .checked_mul(1_i32 << exponent)
            .unwrap_or(self.max_delay);
        std::cmp::min(delay, self.max_delay)
    }

    /// Whether another attempt is allowed after `attempts_made` retries.
    pub fn allows(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }

    /// Whether enough time has passed since `last_attempt` for retry `attempt`.
    pub fn is_ready(
        &self,
        attempt: u32,
        last_attempt: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        match last_attempt {
            None => true,
            Some(at) => now - at >= self.delay_for_attempt(attempt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_then_caps() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_for_attempt(0), TimeDelta::minutes(1));
        assert_eq!(policy.delay_for_attempt(1), TimeDelta::minutes(1));
        assert_eq!(policy.delay_for_attempt(2), TimeDelta::minutes(2));
        assert_eq!(policy.delay_for_attempt(3), TimeDelta::minutes(4));
        assert_eq!(policy.delay_for_attempt(7), TimeDelta::minutes(60));
        assert_eq!(policy.delay_for_attempt(500), TimeDelta::minutes(60));
    }

    #[test]
    fn test_allows_up_to_max_attempts() {
        let policy = BackoffPolicy::new(3, TimeDelta::seconds(10));
        assert!(policy.allows(0));
        assert!(policy.allows(2));
        assert!(!policy.allows(3));
    }

    #[test]
    fn test_is_ready() {
        let now = Utc::now();
        let policy = BackoffPolicy::new(5, TimeDelta::minutes(10));
        assert!(policy.is_ready(1, None, now));
        assert!(!policy.is_ready(1, Some(now - TimeDelta::minutes(5)), now));
        assert!(policy.is_ready(1, Some(now - TimeDelta::minutes(10)), now));
        assert!(!policy.is_ready(2, Some(now - TimeDelta::minutes(15)), now));
    }
}
