//! soilscan-ai - Soil Image Analysis Service
//!
//! Classifies soil photographs into six soil categories by fusing remote
//! model predictions with sampled color statistics, attaches agronomic
//! profile data, and keeps a bounded local history of past verdicts.

use anyhow::Result;
use clap::Parser;
use soilscan_common::config::{CliOverrides, ServiceConfig};
use soilscan_common::events::EventBus;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use soilscan_ai::services::{ArchiveClient, InferenceClient, InferenceError};
use soilscan_ai::store::HistoryStore;
use soilscan_ai::types::AnalysisMode;
use soilscan_ai::workflow::{SingleFlight, SoilAnalyzer};
use soilscan_ai::AppState;

#[derive(Debug, Parser)]
#[command(name = "soilscan-ai", about = "Soil image analysis service")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Folder holding local persisted state
    #[arg(long)]
    data_folder: Option<PathBuf>,

    /// HTTP listen port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting soilscan-ai (Soil Image Analysis)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();

    // Resolve configuration: CLI → env → TOML → defaults
    let config = ServiceConfig::resolve(&CliOverrides {
        config_path: cli.config,
        data_folder: cli.data_folder,
        port: cli.port,
    })?;
    config.ensure_data_folder()?;
    info!("Data folder: {}", config.data_folder.display());

    // Open the local history store
    let store = Arc::new(HistoryStore::open(config.history_path())?);

    // Event bus for SSE broadcasting
    let event_bus = EventBus::new(100);

    // Mode is resolved once from the credential flag and passed down
    let (mode, inference) = match InferenceClient::from_config(&config) {
        Ok(client) => (AnalysisMode::RealService, Some(client)),
        Err(InferenceError::NotConfigured) => {
            warn!("Running in demo mode; analyses return the fixed demo verdict");
            (AnalysisMode::DemoMode, None)
        }
        Err(err) => return Err(err.into()),
    };

    // Optional remote archive (local-only mode when absent)
    let archive = match ArchiveClient::from_config(&config) {
        Some(Ok(client)) => {
            info!("Remote archive configured");
            Some(Arc::new(client))
        }
        Some(Err(err)) => {
            warn!(error = %err, "Remote archive configuration failed; continuing local-only");
            None
        }
        None => None,
    };

    let analyzer = Arc::new(SoilAnalyzer::new(
        mode,
        inference,
        archive.clone(),
        store.clone(),
        event_bus.clone(),
    ));

    let port = config.port;
    let state = AppState {
        config: Arc::new(config),
        analyzer,
        store,
        archive,
        event_bus,
        single_flight: Arc::new(SingleFlight::new()),
        startup_time: chrono::Utc::now(),
        last_error: Arc::new(tokio::sync::RwLock::new(None)),
    };

    let app = soilscan_ai::build_router(state)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
