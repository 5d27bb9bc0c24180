//! HTTP API integration tests (demo mode)
//!
//! Drives the router in-process with tower's `oneshot`: upload
//! validation, the demo analysis flow end to end, history endpoints,
//! the single-flight 409, and the health shape.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use image::{ImageBuffer, Rgb};
use soilscan_ai::store::HistoryStore;
use soilscan_ai::types::AnalysisMode;
use soilscan_ai::workflow::{SingleFlight, SoilAnalyzer};
use soilscan_ai::AppState;
use soilscan_common::config::ServiceConfig;
use soilscan_common::events::EventBus;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

fn png_bytes(color: [u8; 3]) -> Vec<u8> {
    let buffer = ImageBuffer::from_pixel(64, 64, Rgb(color));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(buffer)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn demo_state(data_folder: PathBuf, max_image_bytes: u64) -> AppState {
    let config = ServiceConfig {
        api_token: None,
        model_id: "mock-model".to_string(),
        inference_url: "http://127.0.0.1:1/".to_string(),
        retry_delay_ms: 10,
        max_image_bytes,
        archive_url: None,
        archive_key: None,
        data_folder: data_folder.clone(),
        port: 0,
    };

    let store = Arc::new(HistoryStore::open(data_folder.join("history.json")).unwrap());
    let event_bus = EventBus::new(16);
    let analyzer = Arc::new(SoilAnalyzer::new(
        AnalysisMode::DemoMode,
        None,
        None,
        store.clone(),
        event_bus.clone(),
    ));

    AppState {
        config: Arc::new(config),
        analyzer,
        store,
        archive: None,
        event_bus,
        single_flight: Arc::new(SingleFlight::new()),
        startup_time: chrono::Utc::now(),
        last_error: Arc::new(tokio::sync::RwLock::new(None)),
    }
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn analyze_request(bytes: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .body(Body::from(bytes))
        .unwrap()
}

#[tokio::test]
async fn demo_analysis_flows_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let state = demo_state(dir.path().to_path_buf(), 5 * 1024 * 1024);
    let app = soilscan_ai::build_router(state);

    let response = app
        .clone()
        .oneshot(analyze_request(png_bytes([120, 85, 60])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["soilType"], "loamy");
    assert_eq!(body["confidence"], 87.5);
    assert_eq!(body["topPredictions"].as_array().unwrap().len(), 3);
    assert_eq!(body["characteristics"]["drainage"], "Good");
    assert_eq!(body["pH"]["status"], "Neutral");

    // The verdict landed in history
    let response = app
        .clone()
        .oneshot(Request::get("/history").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let history = json_body(response).await;
    let records = history.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["result"]["soilType"], "loamy");

    // Statistics see the same set
    let response = app
        .clone()
        .oneshot(
            Request::get("/history/statistics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let stats = json_body(response).await;
    assert_eq!(stats["totalCount"], 1);
    assert_eq!(stats["countsBySoilType"]["loamy"], 1);
    assert_eq!(stats["averageConfidence"], 87.5);
}

#[tokio::test]
async fn upload_validation_rejects_bad_payloads() {
    let dir = tempfile::tempdir().unwrap();
    // Cap of 50 bytes: below any real PNG, above the garbage payload
    let state = demo_state(dir.path().to_path_buf(), 50);
    let app = soilscan_ai::build_router(state);

    // Not an image
    let response = app
        .clone()
        .oneshot(analyze_request(b"not an image at all".to_vec()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    // Empty payload
    let response = app
        .clone()
        .oneshot(analyze_request(Vec::new()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Over the configured size cap
    let response = app
        .clone()
        .oneshot(analyze_request(png_bytes([200, 180, 140])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn concurrent_analysis_is_rejected_not_queued() {
    let dir = tempfile::tempdir().unwrap();
    let state = demo_state(dir.path().to_path_buf(), 5 * 1024 * 1024);

    // Hold the single-flight permit as if an analysis were running
    let _permit = state.single_flight.try_acquire().unwrap();

    let app = soilscan_ai::build_router(state.clone());
    let response = app
        .oneshot(analyze_request(png_bytes([120, 85, 60])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn history_lookup_and_delete_by_id() {
    let dir = tempfile::tempdir().unwrap();
    let state = demo_state(dir.path().to_path_buf(), 5 * 1024 * 1024);
    let app = soilscan_ai::build_router(state.clone());

    app.clone()
        .oneshot(analyze_request(png_bytes([120, 85, 60])))
        .await
        .unwrap();

    let record_id = state.store.get_all().await[0].id.clone();

    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/history/{record_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::delete(format!("/history/{record_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Second delete and lookup both 404
    let response = app
        .clone()
        .oneshot(
            Request::delete(format!("/history/{record_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/history/{record_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn export_and_import_round_trip_through_the_api() {
    let dir = tempfile::tempdir().unwrap();
    let state = demo_state(dir.path().to_path_buf(), 5 * 1024 * 1024);
    let app = soilscan_ai::build_router(state.clone());

    for _ in 0..3 {
        app.clone()
            .oneshot(analyze_request(png_bytes([120, 85, 60])))
            .await
            .unwrap();
    }

    let response = app
        .clone()
        .oneshot(
            Request::get("/history/export")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .contains("attachment"));
    let exported = response.into_body().collect().await.unwrap().to_bytes();

    // Wipe, then import the exported document back
    let response = app
        .clone()
        .oneshot(Request::delete("/history").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::post("/history/import")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(exported))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["imported"], 3);

    // A non-array payload is rejected outright
    let response = app
        .clone()
        .oneshot(
            Request::post("/history/import")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"bogus\": true}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "INVALID_FORMAT");

    assert_eq!(state.store.get_all().await.len(), 3);
}

#[tokio::test]
async fn archive_listing_requires_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let state = demo_state(dir.path().to_path_buf(), 5 * 1024 * 1024);
    let app = soilscan_ai::build_router(state);

    let response = app
        .oneshot(
            Request::get("/history/archive")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_module_and_mode() {
    let dir = tempfile::tempdir().unwrap();
    let state = demo_state(dir.path().to_path_buf(), 5 * 1024 * 1024);
    let app = soilscan_ai::build_router(state);

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "soilscan-ai");
    assert_eq!(body["mode"], "demoMode");
    assert_eq!(body["analysis_in_flight"], false);
}
