//! Shared HTTP plumbing for the external API clients
//!
//! - reqwest client with User-Agent, gzip and a per-request timeout
//! - exponential backoff with ±20% jitter
//! - `StatusError` so callers can tell "retry later" from "wrong key"

use eyre::{eyre, Result};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::utils::constants::USER_AGENT as USER_AGENT_CONST;

/// Upper bound for a single backoff sleep
pub const MAX_RETRY_DELAY_MS: u64 = 64_000;

/// Jitter percentage applied to every backoff sleep
pub const RETRY_JITTER_PERCENT: u64 = 20;

/// Non-2xx HTTP response
#[derive(Debug, Clone)]
pub struct StatusError {
    pub status: u16,
    pub body: String,
}

impl StatusError {
    /// 408, 429 and 5xx are worth another attempt
    pub fn is_retryable(&self) -> bool {
        self.status == 408 || self.status == 429 || self.status >= 500
    }

    pub fn is_auth_failure(&self) -> bool {
        self.status == 401 || self.status == 403
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body: String = self.body.chars().take(200).collect();
        write!(f, "HTTP {}: {}", self.status, body)
    }
}

impl std::error::Error for StatusError {}

/// Turn a non-success response into a `StatusError` report
pub async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(eyre::Report::new(StatusError {
        status: status.as_u16(),
        body,
    }))
}

/// Build HTTP client with custom headers (gzip enabled)
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .gzip(true)
        .build()
        .map_err(|e| eyre!("Failed to build HTTP client: {}", e))
}

/// How often and how patiently to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles each time
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// No retries, no sleeping
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Backoff before retry number `retry` (1-based), without jitter
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let base_ms = self.base_delay.as_millis() as u64;
        let factor = 2_u64.saturating_pow(retry - 1);
        Duration::from_millis(base_ms.saturating_mul(factor).min(MAX_RETRY_DELAY_MS))
    }

    /// Backoff with random ±20% jitter
    pub fn jittered_backoff(&self, retry: u32) -> Duration {
        let capped = self.backoff(retry).as_millis() as u64;
        if capped == 0 {
            return Duration::ZERO;
        }
        let jitter_range = (capped * RETRY_JITTER_PERCENT) / 100;
        let jitter: i64 =
            rand::thread_rng().gen_range(-(jitter_range as i64)..=(jitter_range as i64));
        Duration::from_millis((capped as i64 + jitter).max(0) as u64)
    }
}

/// Run `op` until it succeeds, the error is not retryable, or retries run out
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_retries + 1;
    let mut last_error = None;

    for attempt in 0..attempts {
        if attempt > 0 {
            let delay = policy.jittered_backoff(attempt);
            debug!(
                "⏳ {} retry {}/{} after {}ms",
                label,
                attempt,
                policy.max_retries,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if let Some(status) = e.downcast_ref::<StatusError>() {
                    if status.status == 429 {
                        warn!(
                            "⏳ {} rate limited (HTTP 429), backing off (attempt {}/{})",
                            label,
                            attempt + 1,
                            attempts
                        );
                    }
                    if !status.is_retryable() {
                        return Err(e);
                    }
                }
                warn!("⚠️ {} attempt {}/{} failed: {}", label, attempt + 1, attempts, e);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| eyre!("{} failed after {} attempts", label, attempts)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(10, Duration::from_secs(2));
        assert_eq!(policy.backoff(0), Duration::ZERO);
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
        assert_eq!(policy.backoff(10), Duration::from_millis(MAX_RETRY_DELAY_MS));
    }

    #[test]
    fn test_jitter_within_bounds() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1000));
        for _ in 0..50 {
            let d = policy.jittered_backoff(1).as_millis();
            assert!((800..=1200).contains(&d), "jittered delay {} out of range", d);
        }
    }

    #[test]
    fn test_status_classification() {
        let rate = StatusError { status: 429, body: String::new() };
        let auth = StatusError { status: 401, body: String::new() };
        let server = StatusError { status: 503, body: String::new() };
        assert!(rate.is_retryable());
        assert!(server.is_retryable());
        assert!(!auth.is_retryable());
        assert!(auth.is_auth_failure());
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let result = with_retry(&policy, "test", || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(eyre!("transient"))
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let result: Result<()> = with_retry(&policy, "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(eyre!("always"))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_auth_failure_not_retried() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(5, Duration::ZERO);
        let result: Result<()> = with_retry(&policy, "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(eyre::Report::new(StatusError {
                status: 401,
                body: "bad token".to_string(),
            }))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
