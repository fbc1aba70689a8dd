//! API request and response models

use crate::cache::{ArtifactEntry, BatchDeletion};
use crate::disk::DiskUsage;
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Query parameters for `DELETE /cache`
#[derive(Debug, Default, Deserialize)]
pub struct ClearQuery {
    /// Case-insensitive substring; absent means clear everything
    #[serde(rename = "match")]
    pub pattern: Option<String>,
}

/// Response for clearing the whole cache
#[derive(Debug, Serialize, Deserialize)]
pub struct ClearAllResponse {
    pub freed_bytes: u64,
}

/// Artifact that could not be removed
#[derive(Debug, Serialize, Deserialize)]
pub struct FailedArtifact {
    pub name: String,
    pub error: String,
}

/// Per-artifact result of a substring deletion
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchDeletionResponse {
    pub removed_count: usize,
    pub freed_bytes: u64,
    pub removed: Vec<ArtifactEntry>,
    pub failed: Vec<FailedArtifact>,
}

impl From<BatchDeletion> for BatchDeletionResponse {
    fn from(batch: BatchDeletion) -> Self {
        Self {
            removed_count: batch.removed_count(),
            freed_bytes: batch.freed_bytes(),
            failed: batch
                .failed
                .into_iter()
                .map(|f| FailedArtifact {
                    name: f.artifact.name,
                    error: f.error.to_string(),
                })
                .collect(),
            removed: batch.removed,
        }
    }
}

/// Disk capacity of the cache's filesystem
#[derive(Debug, Serialize, Deserialize)]
pub struct DiskResponse {
    #[serde(flatten)]
    pub usage: DiskUsage,
    pub threshold_bytes: u64,
    pub low: bool,
}
