//! HTTP retry helpers for transient errors.
//!
//! ```ignore
//! let body = retry::send_json(|| client.get(&url), &policy).await?;
//! let response = retry::send(|| client.post(&url).json(&payload), &policy).await?;
//! ```
//!
//! Connection errors, timeouts, HTTP 429 and HTTP 5xx are retried with
//! exponential backoff. Other 4xx responses are permanent and returned
//! immediately.

use crate::{HttpError, HttpPolicy};

/// Sends the request built by `build_request`, retrying transient
/// failures, and returns the successful response.
///
/// The closure is called once per attempt because a
/// [`reqwest::RequestBuilder`] is consumed by `send()`.
///
/// # Errors
///
/// Returns [`HttpError`] once retries are exhausted or a permanent error
/// occurs.
#[allow(clippy::future_not_send)]
pub async fn send<F>(build_request: F, policy: &HttpPolicy) -> Result<reqwest::Response, HttpError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = policy.backoff(attempt);
            log::warn!("  retry {attempt}/{} in {delay:?}...", policy.max_retries);
            tokio::time::sleep(delay).await;
        }
        let can_retry = attempt < policy.max_retries;
        attempt += 1;

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && can_retry {
                    log::warn!("  transient error: {e}");
                    continue;
                }
                return Err(HttpError::Http(e));
            }
            Ok(response) => {
                let status = response.status();

                if is_retryable_status(status) {
                    if can_retry {
                        log::warn!("  HTTP {status} from {}", response.url());
                        continue;
                    }
                    return Err(HttpError::Status {
                        status: status.as_u16(),
                    });
                }

                if status.is_client_error() || status.is_server_error() {
                    return Err(HttpError::Status {
                        status: status.as_u16(),
                    });
                }

                return Ok(response);
            }
        }
    }
}

/// Like [`send`], then parses the body as JSON.
///
/// # Errors
///
/// Returns [`HttpError`] if the request fails or the body is not JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(build_request: F, policy: &HttpPolicy) -> Result<serde_json::Value, HttpError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send(build_request, policy).await?;
    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}

/// HTTP 429 and 5xx are worth another attempt.
#[must_use]
pub fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}
