#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared HTTP plumbing for the weather and prediction clients.
//!
//! Every outgoing request goes through [`retry::send`] (or
//! [`retry::send_json`]) so transient failures are retried the same way
//! everywhere.

pub mod retry;

use std::time::Duration;

use serde::Deserialize;

/// Errors from outgoing HTTP requests.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP status {status}")]
    Status {
        /// The status code returned.
        status: u16,
    },

    /// The body was not valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Timeout and retry settings for outgoing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpPolicy {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds; doubles each retry.
    pub backoff_ms: u64,
}

impl Default for HttpPolicy {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 2,
            backoff_ms: 500,
        }
    }
}

impl HttpPolicy {
    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_ms.saturating_mul(factor))
    }

    /// Builds a client with this policy's timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Http`] if the TLS backend fails to initialize.
    pub fn client(&self) -> Result<reqwest::Client, HttpError> {
        Ok(reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles() {
        let policy = HttpPolicy {
            backoff_ms: 100,
            ..HttpPolicy::default()
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(4), Duration::from_millis(800));
    }

    #[test]
    fn policy_deserializes_with_defaults() {
        let policy: HttpPolicy = serde_json::from_str(r#"{"max_retries": 0}"#).unwrap();
        assert_eq!(policy.max_retries, 0);
        assert_eq!(policy.timeout_secs, 10);
    }
}
