//! Integration tests for health check and metrics endpoints

mod common;

use axum::http::StatusCode;
use common::{local, TestApp};

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::at(local(2024, 7, 1, 9, 0));

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("healthy"));
}

#[tokio::test]
async fn test_liveness_endpoint() {
    let app = TestApp::at(local(2024, 7, 1, 9, 0));

    let (status, body) = app.get("/health/live").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("alive"));
}

#[tokio::test]
async fn test_readiness_pings_store() {
    let app = TestApp::at(local(2024, 7, 1, 9, 0));

    let (status, body) = app.get("/health/ready").await;

    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["store"]["status"], "healthy");
}

#[tokio::test]
async fn test_metrics_without_recorder_is_not_found() {
    let app = TestApp::at(local(2024, 7, 1, 9, 0));

    let (status, _) = app.get("/metrics").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_v1_root() {
    let app = TestApp::at(local(2024, 7, 1, 9, 0));

    let (status, body) = app.get("/api/v1/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Wellness Tracker API v1"));
}
