//! Remote image classification client
//!
//! Posts the opaque image payload to a hosted inference endpoint and
//! returns the ordered prediction list. Failure handling distinguishes a
//! "model loading" response (HTTP 503, retried with a growing delay)
//! from transport errors (retried after a flat delay) and all other
//! non-success responses (surfaced immediately). At most three attempts
//! are made in total; the last error propagates to the caller with no
//! fallback.

use crate::types::Prediction;
use soilscan_common::config::ServiceConfig;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = "SoilScan/0.1.0 (https://github.com/soilscan/soilscan)";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Total attempt budget (first try included)
const RETRY_ATTEMPTS: u32 = 3;

/// Inference client errors
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Non-success response from the service; status text attached
    #[error("Inference service unavailable ({status}): {message}")]
    ServiceUnavailable { status: u16, message: String },

    /// Transport-level failure (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// Response body did not decode to a usable prediction list
    #[error("Parse error: {0}")]
    Parse(String),

    /// No credential configured; the client performs no I/O
    #[error("Inference credential not configured")]
    NotConfigured,
}

impl InferenceError {
    /// Whether the error is the transient "model loading" signal
    fn is_model_loading(&self) -> bool {
        matches!(self, InferenceError::ServiceUnavailable { status: 503, .. })
    }
}

/// Client for the remote label-classification service
pub struct InferenceClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_token: String,
    retry_delay: Duration,
}

impl InferenceClient {
    /// Build a client from resolved configuration
    ///
    /// Returns `NotConfigured` when no credential is present; mode policy
    /// (demo substitution) belongs to the caller, not this client.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, InferenceError> {
        let api_token = config
            .api_token
            .clone()
            .ok_or(InferenceError::NotConfigured)?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| InferenceError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}{}", config.inference_url, config.model_id),
            api_token,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// Classify an image, returning predictions ordered by descending score
    ///
    /// Retries per the attempt budget; retries are strictly sequential and
    /// block only this call.
    pub async fn classify(&self, image_bytes: &[u8]) -> Result<Vec<Prediction>, InferenceError> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.query(image_bytes).await {
                Ok(predictions) => {
                    tracing::info!(
                        attempt,
                        prediction_count = predictions.len(),
                        top_label = %predictions[0].label,
                        top_score = predictions[0].score,
                        "Inference succeeded"
                    );
                    return Ok(predictions);
                }
                Err(err) if err.is_model_loading() && attempt < RETRY_ATTEMPTS => {
                    // Model still loading: back off harder on each attempt
                    let delay = self.retry_delay * attempt;
                    tracing::warn!(
                        attempt,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "Inference model loading, will retry"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(InferenceError::Network(message)) if attempt < RETRY_ATTEMPTS => {
                    tracing::warn!(
                        attempt,
                        error = %message,
                        delay_ms = self.retry_delay.as_millis() as u64,
                        "Inference transport error, will retry"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(err) => {
                    tracing::error!(attempt, error = %err, "Inference failed");
                    return Err(err);
                }
            }
        }
    }

    /// One request/response cycle
    async fn query(&self, image_bytes: &[u8]) -> Result<Vec<Prediction>, InferenceError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image_bytes.to_vec())
            .send()
            .await
            .map_err(|e| InferenceError::Network(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(InferenceError::ServiceUnavailable {
                status: status.as_u16(),
                message: if message.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown status")
                        .to_string()
                } else {
                    message
                },
            });
        }

        let predictions: Vec<Prediction> = response
            .json()
            .await
            .map_err(|e| InferenceError::Parse(e.to_string()))?;

        if predictions.is_empty() {
            // The success contract guarantees a non-empty ordered list
            return Err(InferenceError::Parse(
                "service returned an empty prediction list".to_string(),
            ));
        }

        Ok(predictions)
    }
}
