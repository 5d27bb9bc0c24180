//! History API handlers
//!
//! CRUD, statistics, and export/import over the bounded local history
//! store, plus the optional remote archive listing.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::store::HistoryStatistics;
use crate::types::HistoryRecord;
use crate::AppState;

/// GET /history/recent query parameters
#[derive(Debug, Deserialize)]
pub struct RecentParams {
    #[serde(default = "default_recent_count")]
    pub count: usize,
}

fn default_recent_count() -> usize {
    10
}

/// POST /history/import response
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub imported: usize,
}

/// DELETE /history/:id response
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// DELETE /history response
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub removed: usize,
}

/// GET /history - full history, most recent first
pub async fn get_history(State(state): State<AppState>) -> Json<Vec<HistoryRecord>> {
    Json(state.store.get_all().await)
}

/// GET /history/recent?count=N - first N records
pub async fn get_recent(
    State(state): State<AppState>,
    Query(params): Query<RecentParams>,
) -> Json<Vec<HistoryRecord>> {
    Json(state.store.get_recent(params.count).await)
}

/// GET /history/statistics - fresh aggregate over the stored set
pub async fn get_statistics(State(state): State<AppState>) -> Json<HistoryStatistics> {
    Json(state.store.statistics().await)
}

/// GET /history/export - downloadable JSON document of the full history
pub async fn export_history(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let payload = state.store.export_all().await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"soilscan-history.json\"".to_string(),
            ),
        ],
        payload,
    ))
}

/// POST /history/import - replace the history from an exported document
///
/// Rejects the entire payload (400) when it is not a record array; no
/// partial merge occurs.
pub async fn import_history(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<Json<ImportResponse>> {
    let imported = state.store.import_all(&body).await?;
    Ok(Json(ImportResponse { imported }))
}

/// GET /history/archive?limit=N - previously archived analyses (remote)
pub async fn get_archived(
    State(state): State<AppState>,
    Query(params): Query<RecentParams>,
) -> ApiResult<impl IntoResponse> {
    let archive = state
        .archive
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest("Remote archive not configured".to_string()))?;

    let entries = archive
        .fetch_history(params.count)
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    Ok(Json(entries))
}

/// GET /history/:id - single record lookup
pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<HistoryRecord>> {
    state
        .store
        .get_by_id(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("History record {id}")))
}

/// DELETE /history/:id - remove one record
pub async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let deleted = state.store.delete(&id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("History record {id}")));
    }
    Ok(Json(DeleteResponse { deleted }))
}

/// DELETE /history - clear all records
pub async fn clear_history(State(state): State<AppState>) -> ApiResult<Json<ClearResponse>> {
    let removed = state.store.clear_all().await?;
    Ok(Json(ClearResponse { removed }))
}

/// Build history routes
pub fn history_routes() -> Router<AppState> {
    Router::new()
        .route("/history", get(get_history).delete(clear_history))
        .route("/history/recent", get(get_recent))
        .route("/history/statistics", get(get_statistics))
        .route("/history/export", get(export_history))
        .route("/history/import", post(import_history))
        .route("/history/archive", get(get_archived))
        .route("/history/:id", get(get_record).delete(delete_record))
}
