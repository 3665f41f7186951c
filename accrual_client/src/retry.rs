use std::time::Duration;

use reqwest::StatusCode;

/// Governs how a single logical accrual query reacts to rate limiting.
///
/// The policy is a pure value: given the last response's status and its `Retry-After` header, it answers "how long
/// to wait before the next attempt". Keeping it out of the request loop makes it testable without a live server
/// and lets callers tune it (or neuter it in tests) without touching the client.
///
/// Only `429 Too Many Requests` ever triggers another attempt, and the attempt budget is bounded, so a logical
/// query never turns into an unbounded retry storm. Anything else either succeeds or fails once.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    fallback: Duration,
    max_attempts: u32,
}

/// Applied when the `Retry-After` header is missing or unparsable.
pub const DEFAULT_RATE_LIMIT_FALLBACK: Duration = Duration::from_secs(120);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { fallback: DEFAULT_RATE_LIMIT_FALLBACK, max_attempts: DEFAULT_MAX_ATTEMPTS }
    }
}

impl RetryPolicy {
    pub fn new(fallback: Duration, max_attempts: u32) -> Self {
        Self { fallback, max_attempts: max_attempts.max(1) }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The delay to apply before retrying the given response.
    pub fn delay_for(&self, status: StatusCode, retry_after: Option<&str>) -> Duration {
        if status != StatusCode::TOO_MANY_REQUESTS {
            return self.fallback;
        }
        retry_after
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(self.fallback)
    }

    /// Whether `status` warrants another attempt at all.
    pub fn should_retry(&self, status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn honors_retry_after_on_429() {
        let policy = RetryPolicy::default();
        let delay = policy.delay_for(StatusCode::TOO_MANY_REQUESTS, Some("30"));
        assert_eq!(delay, Duration::from_secs(30));
    }

    #[test]
    fn missing_header_falls_back() {
        let policy = RetryPolicy::default();
        let delay = policy.delay_for(StatusCode::TOO_MANY_REQUESTS, None);
        assert_eq!(delay, DEFAULT_RATE_LIMIT_FALLBACK);
    }

    #[test]
    fn unparsable_header_falls_back() {
        let policy = RetryPolicy::default();
        for garbage in ["", "soon", "-5", "1.5"] {
            let delay = policy.delay_for(StatusCode::TOO_MANY_REQUESTS, Some(garbage));
            assert_eq!(delay, DEFAULT_RATE_LIMIT_FALLBACK, "Retry-After: {garbage:?} should fall back");
        }
    }

    #[test]
    fn non_429_uses_fallback_regardless_of_header() {
        let policy = RetryPolicy::new(Duration::from_secs(7), 5);
        for status in [StatusCode::OK, StatusCode::INTERNAL_SERVER_ERROR, StatusCode::BAD_GATEWAY] {
            assert_eq!(policy.delay_for(status, Some("30")), Duration::from_secs(7));
            assert!(!policy.should_retry(status));
        }
        assert!(policy.should_retry(StatusCode::TOO_MANY_REQUESTS));
    }

    #[test]
    fn at_least_one_attempt() {
        assert_eq!(RetryPolicy::new(Duration::from_secs(1), 0).max_attempts(), 1);
    }
}
