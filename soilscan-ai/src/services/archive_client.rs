//! Optional remote archive client
//!
//! Mirrors analyses to a remote store when one is configured: the source
//! image goes to object storage (returning its URL) and the verdict is
//! recorded against that URL. The pipeline is fully functional without
//! an archive, and archive failures never fail an analysis — callers log
//! and continue.

use crate::types::AnalysisResult;
use serde::{Deserialize, Serialize};
use soilscan_common::config::ServiceConfig;
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Archive client errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Archive error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Response of an image upload
#[derive(Debug, Clone, Deserialize)]
struct UploadResponse {
    url: String,
}

/// One archived analysis entry, as returned by the archive history API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedAnalysis {
    pub id: String,
    pub image_url: String,
    pub created_at: String,
    pub result: AnalysisResult,
}

/// Payload recorded against an uploaded image
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordPayload<'a> {
    image_url: &'a str,
    result: &'a AnalysisResult,
}

/// Client for the optional remote persistence collaborator
pub struct ArchiveClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ArchiveClient {
    /// Build a client when both archive URL and key are configured
    ///
    /// Returns `None` when the archive is not configured (local-only
    /// mode); `Some(Err)` only for client construction failures.
    pub fn from_config(config: &ServiceConfig) -> Option<Result<Self, ArchiveError>> {
        let base_url = config.archive_url.clone()?;
        let api_key = config.archive_key.clone()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ArchiveError::Network(e.to_string()))
            .map(|http_client| Self {
                http_client,
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key,
            });

        Some(client)
    }

    /// Upload the source image; returns its public URL
    pub async fn upload_image(&self, image_bytes: &[u8]) -> Result<String, ArchiveError> {
        let response = self
            .http_client
            .post(format!("{}/images", self.base_url))
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image_bytes.to_vec())
            .send()
            .await
            .map_err(|e| ArchiveError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ArchiveError::Api(status.as_u16(), message));
        }

        let upload: UploadResponse = response
            .json()
            .await
            .map_err(|e| ArchiveError::Parse(e.to_string()))?;

        tracing::info!(image_url = %upload.url, "Image archived");
        Ok(upload.url)
    }

    /// Record an analysis verdict against an uploaded image URL
    pub async fn record_analysis(
        &self,
        image_url: &str,
        result: &AnalysisResult,
    ) -> Result<(), ArchiveError> {
        let response = self
            .http_client
            .post(format!("{}/analyses", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&RecordPayload { image_url, result })
            .send()
            .await
            .map_err(|e| ArchiveError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ArchiveError::Api(status.as_u16(), message));
        }

        Ok(())
    }

    /// Fetch previously archived analyses, newest first
    pub async fn fetch_history(&self, limit: usize) -> Result<Vec<ArchivedAnalysis>, ArchiveError> {
        let response = self
            .http_client
            .get(format!("{}/analyses", self.base_url))
            .bearer_auth(&self.api_key)
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(|e| ArchiveError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ArchiveError::Api(status.as_u16(), message));
        }

        response
            .json()
            .await
            .map_err(|e| ArchiveError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soilscan_common::config::{
        ServiceConfig, DEFAULT_INFERENCE_URL, DEFAULT_MAX_IMAGE_BYTES, DEFAULT_MODEL_ID,
        DEFAULT_PORT, DEFAULT_RETRY_DELAY_MS,
    };
    use std::path::PathBuf;

    fn config_with_archive(url: Option<&str>, key: Option<&str>) -> ServiceConfig {
        ServiceConfig {
            api_token: None,
            model_id: DEFAULT_MODEL_ID.to_string(),
            inference_url: DEFAULT_INFERENCE_URL.to_string(),
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            archive_url: url.map(str::to_string),
            archive_key: key.map(str::to_string),
            data_folder: PathBuf::from("/tmp/soilscan-test"),
            port: DEFAULT_PORT,
        }
    }

    #[test]
    fn absent_configuration_means_local_only() {
        assert!(ArchiveClient::from_config(&config_with_archive(None, None)).is_none());
        assert!(
            ArchiveClient::from_config(&config_with_archive(Some("https://a.example"), None))
                .is_none()
        );
        assert!(ArchiveClient::from_config(&config_with_archive(None, Some("key"))).is_none());
    }

    #[test]
    fn configured_archive_builds_and_trims_base_url() {
        let client = ArchiveClient::from_config(&config_with_archive(
            Some("https://archive.example/api/"),
            Some("key"),
        ))
        .unwrap()
        .unwrap();

        assert_eq!(client.base_url, "https://archive.example/api");
    }
}
