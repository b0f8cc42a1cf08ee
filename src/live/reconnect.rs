//! Reconnect policy for live connections.
//!
//! Unexpected closures are retried with capped exponential backoff. The
//! retry state is an explicit attempt counter driven by the session task,
//! so it stays inspectable and testable.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for automatic reconnection behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectPolicy {
    /// Enable automatic reconnection on unexpected closure.
    /// Default: true
    pub enabled: bool,

    /// Maximum number of reopen attempts before giving up.
    /// Set to 0 for unlimited attempts.
    /// Default: 5
    pub max_attempts: u32,

    /// Initial delay before the first reopen attempt.
    /// Default: 1s
    pub base_delay: Duration,

    /// Cap on the delay between reopen attempts.
    /// Default: 30s
    pub max_delay: Duration,

    /// Multiplier for exponential backoff.
    /// Default: 2.0
    pub multiplier: f64,

    /// Whether to add jitter to the delay to prevent thundering herd.
    /// Default: true
    pub jitter: bool,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl ReconnectPolicy {
    /// A policy with reconnection disabled.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Override the attempt cap.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Override the initial delay.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Override the delay cap.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Disable jitter for deterministic delays.
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Check if another reopen is allowed after `attempts` attempts so far.
    pub fn should_retry(&self, attempts: u32) -> bool {
        self.enabled && (self.max_attempts == 0 || attempts < self.max_attempts)
    }

    /// Calculate the delay before reopen attempt `attempt` (1-based) using
    /// exponential backoff.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_millis() as f64;

        // Exponential backoff: base * multiplier^(attempt-1), capped.
        let delay = base * self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let delay = delay.min(self.max_delay.as_millis() as f64);

        let millis = if self.jitter {
            // Up to 25% jitter in either direction.
            let jitter_range = delay * 0.25;
            (delay + rand_jitter(jitter_range)).max(0.0) as u64
        } else {
            delay as u64
        };
        Duration::from_millis(millis)
    }
}

/// Generate a pseudo-random jitter value using a simple LCG.
/// This avoids pulling in the rand crate for a single use case.
fn rand_jitter(range: f64) -> f64 {
    use std::time::SystemTime;
    let seed = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    let random = ((seed.wrapping_mul(1103515245).wrapping_add(12345)) % (1 << 31)) as f64;
    let normalized = random / (1u64 << 31) as f64; // 0.0 to 1.0
    (normalized - 0.5) * 2.0 * range // -range to +range
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = ReconnectPolicy::default();
        assert!(policy.enabled);
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
        assert_eq!(policy.max_delay, Duration::from_secs(30));
        assert_eq!(policy.multiplier, 2.0);
        assert!(policy.jitter);
    }

    #[test]
    fn test_disabled_never_retries() {
        let policy = ReconnectPolicy::disabled();
        assert!(!policy.should_retry(0));
    }

    #[test]
    fn test_should_retry_bounds() {
        let policy = ReconnectPolicy::default().with_max_attempts(3);
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
        assert!(!policy.should_retry(10));
    }

    #[test]
    fn test_unlimited_attempts() {
        let policy = ReconnectPolicy::default().with_max_attempts(0);
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(u32::MAX));
    }

    #[test]
    fn test_delay_progression_no_jitter() {
        let policy = ReconnectPolicy::default()
            .with_base_delay(Duration::from_millis(1000))
            .without_jitter();

        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(4000));
        assert_eq!(policy.delay_for(4), Duration::from_millis(8000));
        assert_eq!(policy.delay_for(5), Duration::from_millis(16000));
        // Capped by max_delay.
        assert_eq!(policy.delay_for(6), Duration::from_millis(30000));
    }

    #[test]
    fn test_delays_non_decreasing() {
        let policy = ReconnectPolicy::default()
            .with_base_delay(Duration::from_millis(100))
            .without_jitter();

        let mut previous = Duration::ZERO;
        for attempt in 1..=8 {
            let delay = policy.delay_for(attempt);
            assert!(delay >= previous, "attempt {attempt}");
            previous = delay;
        }
    }

    #[test]
    fn test_jitter_stays_within_band() {
        let policy = ReconnectPolicy::default().with_base_delay(Duration::from_millis(1000));
        let delay = policy.delay_for(1);
        assert!(
            delay >= Duration::from_millis(750) && delay <= Duration::from_millis(1250),
            "delay {delay:?} should be within 750-1250ms"
        );
    }
}
