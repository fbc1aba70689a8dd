//! HTTP API tests that run the router in-process with axum-test

use axum_test::TestServer;
use model_cache_manager::{
    CacheStore, DiskSpaceReporter,
    api::routes::{AppState, create_router},
    metrics,
};
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tempfile::TempDir;

// Global metrics handle - only initialize once per test process
static METRICS_HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> metrics_exporter_prometheus::PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| metrics::setup_metrics().expect("Failed to setup metrics"))
        .clone()
}

fn write_artifact(root: &Path, name: &str, size: usize) {
    let dir = root.join(name).join("blobs");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("weights"), vec![0u8; size]).unwrap();
}

/// Test server over a cache seeded with three models
fn create_test_server() -> (TestServer, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path().join("hub");
    write_artifact(&root, "models--BAAI--bge-small-en-v1.5", 300);
    write_artifact(&root, "models--BAAI--bge-base-en-v1.5", 500);
    write_artifact(&root, "models--openai--gpt2", 100);

    let state = AppState {
        store: Arc::new(CacheStore::new(&root)),
        reporter: Arc::new(DiskSpaceReporter::new()),
        low_space_threshold_bytes: 1,
        prometheus_handle: get_metrics_handle(),
    };

    let server = TestServer::try_new(create_router(state)).expect("Failed to create test server");
    (server, temp_dir)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _temp_dir) = create_test_server();

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_get_cache_sorted_by_size() {
    let (server, _temp_dir) = create_test_server();

    let response = server.get("/cache").await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["exists"], true);
    assert_eq!(body["total_bytes"], 900);
    assert_eq!(body["artifacts"][0]["name"], "models--BAAI--bge-base-en-v1.5");
    assert_eq!(body["artifacts"][0]["size_bytes"], 500);
    assert_eq!(body["artifacts"][2]["name"], "models--openai--gpt2");
}

#[tokio::test]
async fn test_delete_artifact_by_exact_name() {
    let (server, temp_dir) = create_test_server();

    let response = server.delete("/cache/models--openai--gpt2").await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["size_bytes"], 100);
    assert!(!temp_dir.path().join("hub/models--openai--gpt2").exists());
}

#[tokio::test]
async fn test_delete_unknown_artifact_returns_404() {
    let (server, _temp_dir) = create_test_server();

    let response = server.delete("/cache/models--nobody--nothing").await;

    assert_eq!(response.status_code(), 404);
    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("models--nobody--nothing"));

    let cache: serde_json::Value = server.get("/cache").await.json();
    assert_eq!(cache["artifacts"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_delete_matching_reports_each_artifact() {
    let (server, _temp_dir) = create_test_server();

    let response = server
        .delete("/cache")
        .add_query_param("match", "baai")
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["removed_count"], 2);
    assert_eq!(body["freed_bytes"], 800);
    assert_eq!(body["failed"].as_array().unwrap().len(), 0);

    let cache: serde_json::Value = server.get("/cache").await.json();
    assert_eq!(cache["total_bytes"], 100);
}

#[tokio::test]
async fn test_delete_matching_nothing_returns_404() {
    let (server, _temp_dir) = create_test_server();

    let response = server
        .delete("/cache")
        .add_query_param("match", "llama")
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_clear_entire_cache() {
    let (server, temp_dir) = create_test_server();

    let response = server.delete("/cache").await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["freed_bytes"], 900);
    assert!(!temp_dir.path().join("hub").exists());

    let cache: serde_json::Value = server.get("/cache").await.json();
    assert_eq!(cache["exists"], false);
    assert_eq!(cache["total_bytes"], 0);
}

#[tokio::test]
async fn test_disk_endpoint() {
    let (server, _temp_dir) = create_test_server();

    let response = server.get("/disk").await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert!(body["total_bytes"].as_u64().unwrap() > 0);
    assert_eq!(body["threshold_bytes"], 1);
    assert!(body["low"].is_boolean());
}

#[tokio::test]
async fn test_metrics_endpoint_after_deletion() {
    let (server, _temp_dir) = create_test_server();

    server.delete("/cache/models--openai--gpt2").await;
    let response = server.get("/metrics").await;

    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("model_cache_artifacts_deleted_total"));
}
