//! Delivery of prediction records to the ingestion service.

use async_trait::async_trait;
use firespread_http::{HttpError, HttpPolicy, retry};
use serde_json::Value;

/// Destination for a batch of prediction records.
#[async_trait]
pub trait PredictionSink: Send + Sync {
    /// Sends `records` (a JSON array). Returns the response status on
    /// success, or `None` if delivery failed. Never errors.
    async fn transmit(&self, records: &Value) -> Option<u16>;
}

/// Posts records as JSON to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpPredictionSink {
    client: reqwest::Client,
    endpoint: String,
    policy: HttpPolicy,
}

impl HttpPredictionSink {
    /// Builds a sink that posts to `endpoint` using `policy` for timeouts
    /// and retries.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, policy: HttpPolicy) -> Result<Self, HttpError> {
        Ok(Self {
            client: policy.client()?,
            endpoint: endpoint.into(),
            policy,
        })
    }

    /// URL the records are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PredictionSink for HttpPredictionSink {
    async fn transmit(&self, records: &Value) -> Option<u16> {
        let count = records.as_array().map_or(0, Vec::len);
        log::info!("Sending {count} records to {}", self.endpoint);

        match retry::send(|| self.client.post(&self.endpoint).json(records), &self.policy).await {
            Ok(response) => {
                let status = response.status().as_u16();
                log::info!("Prediction service responded {status}");
                Some(status)
            }
            Err(e) => {
                log::error!("Failed to send predictions to {}: {e}", self.endpoint);
                None
            }
        }
    }
}
