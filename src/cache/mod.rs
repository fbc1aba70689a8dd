//! Local model cache management
//!
//! Provides functionality for:
//! - Locating the HuggingFace cache directory
//! - Enumerating cached artifacts and their sizes
//! - Deleting artifacts (all, by exact name, by substring)

pub mod index;
pub mod store;

pub use index::{ArtifactEntry, scan};
pub use store::{BatchDeletion, CacheReport, CacheStore, FailedDeletion};

use std::path::PathBuf;

/// Resolve where HuggingFace runtimes put downloaded weights
///
/// Precedence:
/// 1. `$HF_HUB_CACHE`
/// 2. `$HF_HOME/hub`
/// 3. `$XDG_CACHE_HOME/huggingface/hub`
/// 4. `~/.cache/huggingface/hub`
///
/// The pre-hub `huggingface/transformers` layout is not checked; current
/// runtimes no longer write there. Point `--cache-root` at it to manage it.
pub fn default_cache_root() -> PathBuf {
    let env_dir = |key: &str| {
        std::env::var_os(key)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    };

    if let Some(hub) = env_dir("HF_HUB_CACHE") {
        return hub;
    }
    if let Some(home) = env_dir("HF_HOME") {
        return home.join("hub");
    }

    env_dir("XDG_CACHE_HOME")
        .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join("huggingface/hub")
}
