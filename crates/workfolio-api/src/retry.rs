// Retry logic with exponential backoff
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 500,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// No retries at all, the first outcome is final
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Pause before retry number `retry` (1-based), capped at `max_delay_ms`
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(retry.saturating_sub(1) as i32);
        let delay_ms = (self.initial_delay_ms as f64 * factor).min(self.max_delay_ms as f64);
        Duration::from_millis(delay_ms as u64)
    }
}

/// Run `operation`, retrying the failures `is_retryable` accepts.
///
/// A 404 or a parse failure is returned on the spot. Everything else gets
/// `max_retries` more attempts with exponential backoff in between.
pub async fn with_retry<F, Fut, T, E, P>(
    config: &RetryConfig,
    is_retryable: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut retry = 0;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if retry > 0 {
                    debug!(retries = retry, "GitHub request recovered");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !is_retryable(&err) {
            return Err(err);
        }
        if retry >= config.max_retries {
            warn!(attempts = retry + 1, "Giving up on GitHub request: {}", err);
            return Err(err);
        }

        retry += 1;
        let delay = config.delay_for(retry);
        warn!(
            retry,
            delay_ms = delay.as_millis() as u64,
            "Retrying GitHub request: {}",
            err
        );
        sleep(delay).await;
    }
}

/// Check if an HTTP status code is worth retrying
pub fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status.is_server_error()
        || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
}
