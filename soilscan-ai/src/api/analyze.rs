//! Analysis API handler
//!
//! POST /analyze accepts the raw image bytes and returns the
//! [`AnalysisResult`]. Image constraints (size cap, accepted formats)
//! are enforced here, before the pipeline is invoked; the single-flight
//! guard rejects a second concurrent analysis with 409.

use axum::{
    body::Bytes,
    extract::State,
    routing::post,
    Json, Router,
};

use crate::error::{ApiError, ApiResult};
use crate::types::AnalysisResult;
use crate::AppState;

/// Accepted upload formats
const ALLOWED_MIME_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// POST /analyze
///
/// Body: raw image bytes (JPEG or PNG). Responses:
/// - 200 with the analysis result
/// - 400 on an empty, oversized, or non-image payload
/// - 409 while another analysis is in flight
/// - 422 when the image is not recognizable as soil
/// - 502 when the inference service fails after retries
pub async fn analyze_image(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<AnalysisResult>> {
    validate_upload(&state, &body)?;

    let _permit = state
        .single_flight
        .try_acquire()
        .ok_or_else(|| ApiError::Conflict("Analysis already in progress".to_string()))?;

    tracing::info!(image_bytes = body.len(), "Analysis requested");

    match state.analyzer.analyze(&body).await {
        Ok(result) => Ok(Json(result)),
        Err(err) => {
            *state.last_error.write().await = Some(err.to_string());
            Err(err.into())
        }
    }
}

/// Enforce caller-side image constraints before the core runs
fn validate_upload(state: &AppState, body: &[u8]) -> Result<(), ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("Empty image payload".to_string()));
    }

    if body.len() as u64 > state.config.max_image_bytes {
        return Err(ApiError::BadRequest(format!(
            "Image size must be less than {} bytes",
            state.config.max_image_bytes
        )));
    }

    let mime = infer::get(body).map(|kind| kind.mime_type());
    if !mime.is_some_and(|m| ALLOWED_MIME_TYPES.contains(&m)) {
        return Err(ApiError::BadRequest(
            "Please upload a valid image file (JPEG or PNG)".to_string(),
        ));
    }

    Ok(())
}

/// Build analysis routes
pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/analyze", post(analyze_image))
}
