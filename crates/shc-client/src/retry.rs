//! Retry with exponential backoff for key-set requests.
//!
//! Retries only on transport errors (connection failures, timeouts). A
//! response with any status is returned to the caller, which decides what the
//! status means; status errors are never retried.

use std::future::Future;
use std::time::Duration;

/// Send a request, retrying transport failures up to `max_retries` times.
///
/// Delays double from `base_delay`: with the defaults, 200ms then 400ms.
pub(crate) async fn retry_send<F, Fut>(
    max_retries: u32,
    base_delay: Duration,
    f: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    for attempt in 0..max_retries {
        match f().await {
            Ok(resp) => return Ok(resp),
            Err(e) => {
                let delay = base_delay.saturating_mul(2u32.saturating_pow(attempt));
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries,
                    "key set request failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
    f().await
}
