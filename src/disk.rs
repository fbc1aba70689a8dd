//! Filesystem capacity reporting for the cache location
//!
//! Measurement only: the low-space threshold always comes from the caller.

use crate::error::{CacheError, CacheResult};
use crate::fallback::select_first;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// Default low-space threshold suggested to callers (5 GiB)
pub const DEFAULT_LOW_SPACE_THRESHOLD: u64 = 5 * 1024 * 1024 * 1024;

/// Capacity of one filesystem, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskUsage {
    pub total_bytes: u64,
    pub used_bytes: u64,
    /// Space available to unprivileged users
    pub free_bytes: u64,
}

impl DiskUsage {
    pub fn is_below(&self, threshold_bytes: u64) -> bool {
        self.free_bytes < threshold_bytes
    }
}

/// Source of filesystem capacity figures
pub trait CapacitySource {
    fn capacity(&self, path: &Path) -> CacheResult<DiskUsage>;
}

/// Reads capacity with `statvfs(2)`
#[derive(Debug, Clone, Copy, Default)]
pub struct StatvfsSource;

impl CapacitySource for StatvfsSource {
    fn capacity(&self, path: &Path) -> CacheResult<DiskUsage> {
        let stat = nix::sys::statvfs::statvfs(path).map_err(|errno| CacheError::Capacity {
            path: path.to_path_buf(),
            source: io::Error::from(errno),
        })?;

        let fragment_size = match u64::from(stat.fragment_size()) {
            0 => u64::from(stat.block_size()),
            size => size,
        };
        let blocks = u64::from(stat.blocks());
        let blocks_free = u64::from(stat.blocks_free());
        let blocks_available = u64::from(stat.blocks_available());

        Ok(DiskUsage {
            total_bytes: blocks.saturating_mul(fragment_size),
            used_bytes: blocks.saturating_sub(blocks_free).saturating_mul(fragment_size),
            free_bytes: blocks_available.saturating_mul(fragment_size),
        })
    }
}

/// Reports capacity of the filesystem holding a path
#[derive(Debug, Clone, Default)]
pub struct DiskSpaceReporter<S = StatvfsSource> {
    source: S,
}

impl DiskSpaceReporter<StatvfsSource> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: CapacitySource> DiskSpaceReporter<S> {
    pub fn with_source(source: S) -> Self {
        Self { source }
    }

    /// Capacity of the filesystem holding `path`
    ///
    /// The cache root may not exist yet, so the nearest measurable ancestor
    /// is used instead. Relative paths are resolved against the working
    /// directory first so the walk can reach it. The error for `path` itself
    /// is returned if nothing along the chain can be measured.
    pub fn report(&self, path: &Path) -> CacheResult<DiskUsage> {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let candidates: Vec<PathBuf> = absolute.ancestors().map(Path::to_path_buf).collect();

        match select_first(candidates, |candidate| self.source.capacity(candidate)) {
            Ok((measured, usage)) => {
                if measured != absolute {
                    tracing::debug!(
                        path = ?path,
                        measured = ?measured,
                        "Measured nearest existing ancestor"
                    );
                }
                Ok(usage)
            }
            Err(all_failed) => Err(all_failed
                .failures
                .into_iter()
                .next()
                .map(|(_, error)| error)
                .unwrap_or_else(|| CacheError::Capacity {
                    path: path.to_path_buf(),
                    source: io::Error::from(io::ErrorKind::NotFound),
                })),
        }
    }

    /// True iff free space on `path`'s filesystem is strictly below `threshold_bytes`
    pub fn is_low(&self, path: &Path, threshold_bytes: u64) -> CacheResult<bool> {
        let usage = self.report(path)?;
        let low = usage.is_below(threshold_bytes);
        if low {
            tracing::warn!(
                path = ?path,
                free_bytes = usage.free_bytes,
                threshold_bytes,
                "Disk space is low"
            );
        }
        Ok(low)
    }
}
