use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::ForgeError;

/// How many times a forge request is attempted and how long to wait between
/// attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt. Doubles on each further attempt.
    pub base_delay: Duration,
    /// Upper bound for any single delay, rate-limit waits included.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Backoff before attempt `attempt + 1`, without jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    fn delay_for(&self, attempt: u32, err: &ForgeError) -> Duration {
        let delay = err
            .retry_after()
            .unwrap_or_else(|| self.backoff(attempt))
            .min(self.max_delay);
        let spread = u64::try_from(delay.as_millis() / 4).unwrap_or(u64::MAX);
        let jitter = Duration::from_millis(rand::rng().random_range(0..=spread));
        (delay + jitter).min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails permanently or attempts run out.
    ///
    /// Only errors where [`ForgeError::is_transient`] holds are retried.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, ForgeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ForgeError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.delay_for(attempt, &e);
                    tracing::warn!(
                        "{label}: {e}, retrying ({attempt}/{max_attempts}) in {}ms",
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn immediate(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    fn status(code: u16) -> ForgeError {
        ForgeError::Status {
            url: "https://api.github.com/repos/o/r/releases".to_string(),
            status: StatusCode::from_u16(code).unwrap(),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
        assert_eq!(policy.backoff(10), Duration::from_secs(30));
    }

    #[test]
    fn test_rate_limit_delay_is_capped() {
        let policy = RetryPolicy {
            max_delay: Duration::from_secs(5),
            ..RetryPolicy::default()
        };
        let err = ForgeError::RateLimited {
            url: "u".to_string(),
            retry_after: Some(Duration::from_secs(3600)),
        };
        assert_eq!(policy.delay_for(1, &err), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_retries_transient_until_exhausted() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = immediate(3)
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(status(502)) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = immediate(4)
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(status(404)) }
            })
            .await;
        assert!(matches!(result, Err(ForgeError::Status { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = immediate(4)
            .run("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { if n < 2 { Err(status(503)) } else { Ok(n) } }
            })
            .await;
        assert_eq!(result.unwrap(), 2);
    }
}
