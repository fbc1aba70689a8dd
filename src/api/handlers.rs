//! API request handlers
//!
//! Cache operations block on disk I/O, so they run on the blocking pool.

use super::models::{
    BatchDeletionResponse, ClearAllResponse, ClearQuery, DiskResponse, HealthResponse,
};
use super::routes::AppState;
use crate::cache::{ArtifactEntry, CacheReport};
use crate::error::{CacheError, CacheResult};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Run a blocking cache operation off the async runtime
async fn blocking<T, F>(f: F) -> CacheResult<T>
where
    F: FnOnce() -> CacheResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CacheError::io("cache task failed", std::io::Error::other(e)))?
}

/// GET /health - Manager health check
pub async fn health() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now(),
        }),
    )
}

/// GET /metrics - Prometheus metrics
pub async fn metrics(State(state): State<AppState>) -> String {
    state.prometheus_handle.render()
}

/// GET /cache - Cache location, total size and artifacts, largest first
pub async fn get_cache(State(state): State<AppState>) -> Result<Json<CacheReport>, CacheError> {
    let store = state.store.clone();
    let report = blocking(move || store.report()).await?;
    Ok(Json(report))
}

/// DELETE /cache - Clear everything, or every artifact matching `?match=`
pub async fn clear_cache(
    State(state): State<AppState>,
    Query(params): Query<ClearQuery>,
) -> Result<Response, CacheError> {
    let store = state.store.clone();

    match params.pattern {
        Some(pattern) => {
            let batch = blocking(move || store.delete_by_substring(&pattern)).await?;
            let status = if batch.is_total_failure() {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::OK
            };
            Ok((status, Json(BatchDeletionResponse::from(batch))).into_response())
        }
        None => {
            let freed_bytes = blocking(move || store.delete_all()).await?;
            Ok(Json(ClearAllResponse { freed_bytes }).into_response())
        }
    }
}

/// DELETE /cache/{name} - Remove one artifact by exact name
pub async fn delete_artifact(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ArtifactEntry>, CacheError> {
    let store = state.store.clone();
    let removed = blocking(move || store.delete_by_exact_name(&name)).await?;
    Ok(Json(removed))
}

/// GET /disk - Capacity of the filesystem holding the cache
pub async fn get_disk(State(state): State<AppState>) -> Result<Json<DiskResponse>, CacheError> {
    let store = state.store.clone();
    let reporter = state.reporter.clone();
    let threshold_bytes = state.low_space_threshold_bytes;

    let usage = blocking(move || reporter.report(store.root())).await?;

    Ok(Json(DiskResponse {
        usage,
        threshold_bytes,
        low: usage.is_below(threshold_bytes),
    }))
}
