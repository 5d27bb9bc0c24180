//! soilscan-ai library interface
//!
//! Exposes the classification pipeline and HTTP surface for integration
//! testing.

pub mod api;
pub mod error;
pub mod extractors;
pub mod fusion;
pub mod knowledge;
pub mod services;
pub mod store;
pub mod types;
pub mod validators;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use axum::{routing::get, Router};
use chrono::{DateTime, Utc};
use soilscan_common::config::ServiceConfig;
use soilscan_common::events::EventBus;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::services::ArchiveClient;
use crate::store::HistoryStore;
use crate::workflow::{SingleFlight, SoilAnalyzer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Resolved configuration (image constraints, credentials)
    pub config: Arc<ServiceConfig>,
    /// The analysis pipeline coordinator
    pub analyzer: Arc<SoilAnalyzer>,
    /// Bounded local history store
    pub store: Arc<HistoryStore>,
    /// Optional remote archive (local-only mode when absent)
    pub archive: Option<Arc<ArchiveClient>>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Guard enforcing at most one in-flight analysis
    pub single_flight: Arc<SingleFlight>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last analysis error, for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::analyze_routes())
        .merge(api::history_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .with_state(state)
}
