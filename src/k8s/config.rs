/**
 * Configuration constants for the readiness poller and event tailer
 */
use std::time::Duration;

/// API group of the resource watched when none is given
pub const DEFAULT_GROUP: &str = "external-secrets.io";

/// API version of the resource watched when none is given
pub const DEFAULT_VERSION: &str = "v1beta1";

/// Kind of the resource watched when none is given
pub const DEFAULT_KIND: &str = "ExternalSecret";

/// How long the bounded poller waits for `Ready=True` (10 minutes)
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 600;

/// Poll interval when a deadline is configured
pub const BOUNDED_POLL_INTERVAL_SECONDS: u64 = 1;

/// Poll interval when waiting forever
pub const UNBOUNDED_POLL_INTERVAL_SECONDS: u64 = 5;

/// Fixed delay before re-opening a failed event subscription
pub const SUBSCRIBE_RETRY_DELAY_SECONDS: u64 = 5;

/// Watch stream timeout in seconds (294 vs 300 to allow 6 seconds for graceful shutdown)
pub const WATCH_TIMEOUT_SECONDS: u32 = 294;

/// Mounted service-account token checked before falling back to `Config::infer`
pub const SERVICE_ACCOUNT_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Timing for a single readiness wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Time between two fetches
    pub interval: Duration,
    /// `None` polls until ready
    pub timeout: Option<Duration>,
}

impl PollConfig {
    /// Bounded wait with the 1s tick
    #[must_use]
    pub const fn bounded(timeout: Duration) -> Self {
        Self {
            interval: Duration::from_secs(BOUNDED_POLL_INTERVAL_SECONDS),
            timeout: Some(timeout),
        }
    }

    /// Wait forever with the 5s tick
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            interval: Duration::from_secs(UNBOUNDED_POLL_INTERVAL_SECONDS),
            timeout: None,
        }
    }

    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::bounded(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
    }
}

/// Validate configuration constants at compile time
const _: () = {
    assert!(DEFAULT_TIMEOUT_SECONDS > 0, "DEFAULT_TIMEOUT_SECONDS must be greater than 0");
    assert!(BOUNDED_POLL_INTERVAL_SECONDS > 0, "BOUNDED_POLL_INTERVAL_SECONDS must be greater than 0");
    assert!(UNBOUNDED_POLL_INTERVAL_SECONDS > 0, "UNBOUNDED_POLL_INTERVAL_SECONDS must be greater than 0");
    assert!(SUBSCRIBE_RETRY_DELAY_SECONDS > 0, "SUBSCRIBE_RETRY_DELAY_SECONDS must be greater than 0");
    assert!(WATCH_TIMEOUT_SECONDS > 0, "WATCH_TIMEOUT_SECONDS must be greater than 0");
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modes_use_their_own_tick() {
        let bounded = PollConfig::bounded(Duration::from_secs(10));
        assert_eq!(bounded.interval, Duration::from_secs(1));
        assert_eq!(bounded.timeout, Some(Duration::from_secs(10)));

        let unbounded = PollConfig::unbounded();
        assert_eq!(unbounded.interval, Duration::from_secs(5));
        assert!(unbounded.timeout.is_none());
    }

    #[test]
    fn test_default_is_ten_minute_bounded_wait() {
        assert_eq!(PollConfig::default().timeout, Some(Duration::from_secs(600)));
    }
}
