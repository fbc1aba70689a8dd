//! Error types for cache operations and API responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::path::PathBuf;

/// Errors raised by cache and disk operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("artifact '{name}' not found in cache")]
    NotFound { name: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cache root {path:?} exists but is not a directory")]
    InvalidRoot { path: PathBuf },

    #[error("failed to query filesystem capacity at {path:?}: {source}")]
    Capacity {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type CacheResult<T> = Result<T, CacheError>;

impl CacheError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// True for the "nothing matched" case, as opposed to an I/O failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound { .. } => StatusCode::NOT_FOUND,
            CacheError::InvalidRoot { .. } => StatusCode::BAD_REQUEST,
            CacheError::Io { .. } | CacheError::Capacity { .. } => {
                tracing::error!(error = %self, "Cache operation failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            timestamp: chrono::Utc::now(),
        });

        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    timestamp: chrono::DateTime<chrono::Utc>,
}
