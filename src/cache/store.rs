//! Query and deletion operations over a cache root

use super::index::{ArtifactEntry, scan};
use crate::error::{CacheError, CacheResult};
use crate::metrics;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// Cache operations bound to a single root directory
///
/// Holds no state beyond the root path; every call re-scans the filesystem.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

/// An artifact whose removal failed during a batch deletion
#[derive(Debug)]
pub struct FailedDeletion {
    pub artifact: ArtifactEntry,
    pub error: CacheError,
}

/// Per-artifact outcome of a substring deletion
#[derive(Debug, Default)]
pub struct BatchDeletion {
    pub removed: Vec<ArtifactEntry>,
    pub failed: Vec<FailedDeletion>,
}

impl BatchDeletion {
    /// Number of artifacts actually removed
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    /// Bytes reclaimed by the removed artifacts
    pub fn freed_bytes(&self) -> u64 {
        self.removed.iter().map(|a| a.size_bytes).sum()
    }

    /// True when there were matches but none of them could be removed
    pub fn is_total_failure(&self) -> bool {
        self.removed.is_empty() && !self.failed.is_empty()
    }
}

/// Snapshot of the whole cache for display or export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheReport {
    pub cache_root: PathBuf,
    pub exists: bool,
    pub total_bytes: u64,
    /// Largest first
    pub artifacts: Vec<ArtifactEntry>,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the root currently exists on disk
    pub fn exists(&self) -> bool {
        self.root.exists()
    }

    /// Location, existence, total and sorted artifacts from a single scan
    pub fn report(&self) -> CacheResult<CacheReport> {
        let artifacts = self.list_artifacts()?;
        Ok(CacheReport {
            cache_root: self.root.clone(),
            exists: self.exists(),
            total_bytes: artifacts.iter().map(|a| a.size_bytes).sum(),
            artifacts,
        })
    }

    /// Sum of all artifact sizes; 0 for a missing root
    pub fn total_size(&self) -> CacheResult<u64> {
        let total = scan(&self.root)?.iter().map(|a| a.size_bytes).sum();
        metrics::update_cache_size(total);
        Ok(total)
    }

    /// All artifacts, largest first (ties by name)
    pub fn list_artifacts(&self) -> CacheResult<Vec<ArtifactEntry>> {
        let mut artifacts = scan(&self.root)?;
        artifacts.sort_by(|a, b| {
            b.size_bytes
                .cmp(&a.size_bytes)
                .then_with(|| a.name.cmp(&b.name))
        });
        metrics::update_cache_size(artifacts.iter().map(|a| a.size_bytes).sum());
        Ok(artifacts)
    }

    /// Remove the entire cache root
    ///
    /// Returns the bytes freed as measured just before removal. Not
    /// transactional: a failure partway leaves whatever could not be removed.
    /// A symlinked root keeps its link and has the target's contents removed.
    pub fn delete_all(&self) -> CacheResult<u64> {
        // Validates the root and measures it before it disappears
        let artifacts = scan(&self.root)?;
        let link = match std::fs::symlink_metadata(&self.root) {
            Ok(metadata) => metadata.file_type().is_symlink(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(root = ?self.root, "No cache to clear");
                return Ok(0);
            }
            Err(e) => {
                return Err(CacheError::io(
                    format!("failed to stat cache root {:?}", self.root),
                    e,
                ));
            }
        };

        let freed: u64 = artifacts.iter().map(|a| a.size_bytes).sum();

        let result = if link {
            clear_link_target(&self.root)
        } else {
            match std::fs::remove_dir_all(&self.root) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                other => other.map_err(|e| {
                    CacheError::io(format!("failed to clear cache root {:?}", self.root), e)
                }),
            }
        };

        if let Err(e) = result {
            metrics::record_delete_failure();
            return Err(e);
        }

        for artifact in &artifacts {
            metrics::record_artifact_deleted(artifact.size_bytes);
        }
        metrics::update_cache_size(0);

        tracing::info!(
            root = ?self.root,
            symlinked = link,
            artifacts = artifacts.len(),
            freed_bytes = freed,
            "Cleared entire cache"
        );

        Ok(freed)
    }

    /// Remove the artifact whose name equals `name` exactly
    pub fn delete_by_exact_name(&self, name: &str) -> CacheResult<ArtifactEntry> {
        let artifact = scan(&self.root)?
            .into_iter()
            .find(|a| !name.is_empty() && a.name == name)
            .ok_or_else(|| CacheError::NotFound {
                name: name.to_string(),
            })?;

        remove_artifact(&artifact)?;
        Ok(artifact)
    }

    /// Remove every artifact whose name contains `needle`, ignoring case
    ///
    /// Attempts every match even when some fail. Fails with `NotFound` only
    /// when nothing matched.
    pub fn delete_by_substring(&self, needle: &str) -> CacheResult<BatchDeletion> {
        self.delete_by_substring_with(needle, remove_artifact)
    }

    fn delete_by_substring_with<F>(&self, needle: &str, mut remove: F) -> CacheResult<BatchDeletion>
    where
        F: FnMut(&ArtifactEntry) -> CacheResult<()>,
    {
        let needle_lower = needle.to_lowercase();
        let mut matches: Vec<ArtifactEntry> = scan(&self.root)?
            .into_iter()
            .filter(|a| !needle_lower.is_empty() && a.name.to_lowercase().contains(&needle_lower))
            .collect();

        if matches.is_empty() {
            return Err(CacheError::NotFound {
                name: needle.to_string(),
            });
        }

        matches.sort_by(|a, b| a.name.cmp(&b.name));

        let mut batch = BatchDeletion::default();
        for artifact in matches {
            match remove(&artifact) {
                Ok(()) => batch.removed.push(artifact),
                Err(error) => {
                    tracing::warn!(
                        artifact = %artifact.name,
                        error = %error,
                        "Failed to remove matching artifact, continuing"
                    );
                    batch.failed.push(FailedDeletion { artifact, error });
                }
            }
        }

        tracing::info!(
            needle = %needle,
            removed = batch.removed_count(),
            failed = batch.failed.len(),
            freed_bytes = batch.freed_bytes(),
            "Substring deletion finished"
        );

        Ok(batch)
    }
}

/// Empty the directory a symlinked root points at, leaving the link in place
fn clear_link_target(root: &Path) -> CacheResult<()> {
    let target = std::fs::canonicalize(root)
        .map_err(|e| CacheError::io(format!("failed to resolve cache root {:?}", root), e))?;
    let entries = std::fs::read_dir(&target)
        .map_err(|e| CacheError::io(format!("failed to list cache root {:?}", target), e))?;

    for entry in entries {
        let entry =
            entry.map_err(|e| CacheError::io(format!("failed to list cache root {:?}", target), e))?;
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        let removed = if is_dir {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        match removed {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                return Err(CacheError::io(format!("failed to remove {:?}", path), e));
            }
            _ => {}
        }
    }

    Ok(())
}

fn remove_artifact(artifact: &ArtifactEntry) -> CacheResult<()> {
    match std::fs::remove_dir_all(&artifact.path) {
        Ok(()) => {}
        // Removed by someone else between scan and delete
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(artifact = %artifact.name, "Artifact already gone");
        }
        Err(e) => {
            metrics::record_delete_failure();
            return Err(CacheError::io(
                format!("failed to remove {}", artifact.name),
                e,
            ));
        }
    }

    metrics::record_artifact_deleted(artifact.size_bytes);
    tracing::info!(
        artifact = %artifact.name,
        size_bytes = artifact.size_bytes,
        "Removed artifact"
    );

    Ok(())
}
