//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status (e.g., "ok")
    pub status: String,
    /// Module name ("soilscan-ai")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// "realService" or "demoMode"
    pub mode: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Whether an analysis is currently in flight
    pub analysis_in_flight: bool,
    /// Last analysis error message if any (for diagnostics)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health
///
/// Health check endpoint for monitoring.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let last_error = state.last_error.read().await.clone();

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "soilscan-ai".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        mode: state.analyzer.mode().as_str().to_string(),
        uptime_seconds,
        analysis_in_flight: state.single_flight.is_active(),
        last_error,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
