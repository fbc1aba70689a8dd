//! Model Cache Manager - local model cache accounting
//!
//! Inspects the on-disk cache of pretrained model weights, reports per-model
//! sizes and disk capacity, and evicts cached models.

pub mod api;
pub mod cache;
pub mod commands;
pub mod config;
pub mod disk;
pub mod error;
pub mod fallback;
pub mod format;
pub mod metrics;

pub use cache::{ArtifactEntry, BatchDeletion, CacheReport, CacheStore, scan};
pub use config::ManagerConfig;
pub use disk::{CapacitySource, DiskSpaceReporter, DiskUsage, StatvfsSource};
pub use error::{CacheError, CacheResult};
