//! API route definitions

use crate::cache::CacheStore;
use crate::disk::DiskSpaceReporter;
use axum::{
    Router,
    routing::{delete, get},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CacheStore>,
    pub reporter: Arc<DiskSpaceReporter>,
    pub low_space_threshold_bytes: u64,
    pub prometheus_handle: metrics_exporter_prometheus::PrometheusHandle,
}

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health and status
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        // Cache inspection and eviction
        .route("/cache", get(handlers::get_cache).delete(handlers::clear_cache))
        .route("/cache/{name}", delete(handlers::delete_artifact))
        // Capacity
        .route("/disk", get(handlers::get_disk))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
