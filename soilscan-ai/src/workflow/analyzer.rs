//! Soil analysis workflow
//!
//! One coordinating async flow per analysis request: run remote inference
//! and color extraction concurrently, gate on plausibility, fuse signals
//! into a verdict, then persist. The mode (real service vs demo) is
//! resolved once at construction from the credential flag and passed
//! down; nothing re-checks configuration mid-flow.
//!
//! Failure policy:
//! - inference failure aborts (no fallback to demo data in real mode)
//! - color decode failure degrades to label-only fusion
//! - archive and history-save failures are logged, never fatal
//! - a non-soil verdict is terminal: no result, nothing persisted

use crate::extractors::extract_color;
use crate::fusion;
use crate::knowledge;
use crate::services::{ArchiveClient, InferenceClient, InferenceError};
use crate::store::HistoryStore;
use crate::types::{
    round_to_tenth, AnalysisMode, AnalysisResult, ColorSample, Prediction, SoilType,
};
use crate::validators::is_soil_image;
use chrono::Utc;
use soilscan_common::events::{AnalysisEvent, EventBus};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Demo-mode fixed confidence
const DEMO_CONFIDENCE: f64 = 87.5;

/// Terminal analysis errors surfaced to the caller
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The predictions do not plausibly describe soil
    #[error("The image does not appear to contain soil")]
    NonSoilImage,

    /// Remote inference failed after the retry budget
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Coordinates one analysis flow over explicitly constructed components
pub struct SoilAnalyzer {
    mode: AnalysisMode,
    inference: Option<InferenceClient>,
    archive: Option<Arc<ArchiveClient>>,
    store: Arc<HistoryStore>,
    event_bus: EventBus,
}

impl SoilAnalyzer {
    pub fn new(
        mode: AnalysisMode,
        inference: Option<InferenceClient>,
        archive: Option<Arc<ArchiveClient>>,
        store: Arc<HistoryStore>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            mode,
            inference,
            archive,
            store,
            event_bus,
        }
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    /// Analyze one image and return the verdict
    ///
    /// The result is produced exactly once and owned by the caller; the
    /// history save is best-effort and cannot fail the analysis.
    pub async fn analyze(&self, image_bytes: &[u8]) -> Result<AnalysisResult, AnalysisError> {
        let analysis_id = Uuid::new_v4();

        self.emit(AnalysisEvent::AnalysisStarted {
            analysis_id,
            mode: self.mode.as_str().to_string(),
            timestamp: Utc::now(),
        });

        let result = match self.mode {
            AnalysisMode::DemoMode => demo_analysis(),
            AnalysisMode::RealService => match self.run_real_analysis(analysis_id, image_bytes).await {
                Ok(result) => result,
                Err(err) => {
                    self.emit(AnalysisEvent::AnalysisFailed {
                        analysis_id,
                        reason: err.to_string(),
                        timestamp: Utc::now(),
                    });
                    return Err(err);
                }
            },
        };

        self.archive_analysis(analysis_id, image_bytes, &result).await;

        let record_id = match self.store.save(image_bytes, &result).await {
            Ok(record) => Some(record.id),
            Err(err) => {
                // Local persistence is best-effort; the verdict still stands
                tracing::warn!(error = %err, "Failed to save analysis to history");
                None
            }
        };

        self.emit(AnalysisEvent::AnalysisCompleted {
            analysis_id,
            soil_type: result.soil_type.to_string(),
            confidence: result.confidence,
            record_id,
            timestamp: Utc::now(),
        });

        Ok(result)
    }

    /// Real-service path: inference + color extraction, gate, fusion
    async fn run_real_analysis(
        &self,
        analysis_id: Uuid,
        image_bytes: &[u8],
    ) -> Result<AnalysisResult, AnalysisError> {
        let inference = self
            .inference
            .as_ref()
            .ok_or(InferenceError::NotConfigured)?;

        // Network I/O and image decode are independent; run them
        // concurrently. Fusion waits for both.
        let decode_input = image_bytes.to_vec();
        let decode_task = tokio::task::spawn_blocking(move || extract_color(&decode_input));
        let (predictions, color) = tokio::join!(inference.classify(image_bytes), decode_task);

        let predictions = predictions?;

        self.emit(AnalysisEvent::PredictionsReceived {
            analysis_id,
            prediction_count: predictions.len(),
            timestamp: Utc::now(),
        });

        if !is_soil_image(&predictions) {
            return Err(AnalysisError::NonSoilImage);
        }

        let color_sample = match color {
            Ok(Ok(sample)) => Some(sample),
            Ok(Err(err)) => {
                // Degrade to label-only fusion rather than aborting
                tracing::warn!(error = %err, "Color extraction failed; using label-only fusion");
                None
            }
            Err(join_err) => {
                tracing::warn!(error = %join_err, "Color extraction task failed; using label-only fusion");
                None
            }
        };

        Ok(compose_result(&predictions, color_sample))
    }

    /// Mirror the analysis to the remote archive when one is configured
    async fn archive_analysis(
        &self,
        analysis_id: Uuid,
        image_bytes: &[u8],
        result: &AnalysisResult,
    ) {
        let Some(archive) = &self.archive else {
            return;
        };

        match archive.upload_image(image_bytes).await {
            Ok(image_url) => {
                self.emit(AnalysisEvent::ImageArchived {
                    analysis_id,
                    image_url: image_url.clone(),
                    timestamp: Utc::now(),
                });
                if let Err(err) = archive.record_analysis(&image_url, result).await {
                    tracing::warn!(error = %err, "Failed to record analysis in archive");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to archive image");
            }
        }
    }

    fn emit(&self, event: AnalysisEvent) {
        // Progress events are advisory; nobody listening is fine
        let _ = self.event_bus.emit(event);
    }
}

/// Build the final result from predictions and optional color statistics
pub fn compose_result(
    predictions: &[Prediction],
    color_sample: Option<ColorSample>,
) -> AnalysisResult {
    let (soil_type, confidence) = match &color_sample {
        Some(sample) => {
            let soil_type = fusion::determine_soil_type(predictions, sample);
            let confidence = fusion::calculate_confidence(predictions, sample, soil_type);
            (soil_type, confidence)
        }
        None => fusion::classify_label_only(predictions),
    };

    let profile = knowledge::lookup(soil_type);

    AnalysisResult {
        soil_type,
        confidence: round_to_tenth(confidence),
        characteristics: profile.characteristics.clone(),
        recommendations: profile.recommendations.clone(),
        nutrients: profile.nutrients,
        ph: profile.ph.clone(),
        color_sample,
        top_predictions: predictions.iter().take(3).cloned().collect(),
    }
}

/// Fixed demo verdict used when no inference credential is configured
pub fn demo_analysis() -> AnalysisResult {
    let profile = knowledge::lookup(SoilType::Loamy);

    AnalysisResult {
        soil_type: SoilType::Loamy,
        confidence: DEMO_CONFIDENCE,
        characteristics: profile.characteristics.clone(),
        recommendations: profile.recommendations.clone(),
        nutrients: profile.nutrients,
        ph: profile.ph.clone(),
        color_sample: None,
        top_predictions: vec![
            Prediction {
                label: "loamy soil".to_string(),
                score: 0.875,
            },
            Prediction {
                label: "clay soil".to_string(),
                score: 0.089,
            },
            Prediction {
                label: "sandy soil".to_string(),
                score: 0.036,
            },
        ],
    }
}
