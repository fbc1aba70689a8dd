//! Cache enumeration and size accounting
//!
//! Every immediate subdirectory of the cache root is one artifact. For the
//! HuggingFace hub layout that looks like:
//! ```text
//! ~/.cache/huggingface/hub/
//! ├── models--BAAI--bge-small-en-v1.5/
//! │   ├── blobs/
//! │   ├── refs/main
//! │   └── snapshots/{revision}/config.json -> ../../blobs/...
//! └── models--sentence-transformers--all-MiniLM-L6-v2/
//! ```
//! Snapshot entries are symlinks into `blobs/`, so only regular files are
//! counted and symlinks are never followed.

use crate::error::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

/// A single cached artifact (one directory under the cache root)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    /// Directory name under the cache root
    pub name: String,
    /// Sum of all regular file sizes under the directory, at scan time
    pub size_bytes: u64,
    /// Absolute path of the artifact directory
    pub path: PathBuf,
}

impl ArtifactEntry {
    /// Repository identifier for hub-style directory names
    ///
    /// e.g., "models--BAAI--bge-small-en-v1.5" -> "BAAI/bge-small-en-v1.5"
    pub fn model_id(&self) -> Option<String> {
        cache_name_to_model_id(&self.name)
    }

    /// Model ID when the name follows the hub convention, otherwise the raw name
    pub fn display_name(&self) -> String {
        self.model_id().unwrap_or_else(|| self.name.clone())
    }
}

/// Convert a hub cache directory name back to a model ID
fn cache_name_to_model_id(cache_name: &str) -> Option<String> {
    ["models--", "datasets--", "spaces--"]
        .iter()
        .find_map(|prefix| cache_name.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty())
        .map(|rest| rest.replacen("--", "/", 1))
}

/// Snapshot every artifact currently present under `root`
///
/// A missing root is an empty cache. Files that cannot be stat'ed (permission
/// errors, concurrent deletion) count as zero bytes instead of failing the scan.
/// The result is unordered.
pub fn scan(root: &Path) -> CacheResult<Vec<ArtifactEntry>> {
    let metadata = match std::fs::metadata(root) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(root = ?root, "Cache root does not exist, treating as empty");
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(CacheError::io(
                format!("failed to stat cache root {:?}", root),
                e,
            ));
        }
    };

    if !metadata.is_dir() {
        return Err(CacheError::InvalidRoot {
            path: root.to_path_buf(),
        });
    }

    let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
    let entries = std::fs::read_dir(&root)
        .map_err(|e| CacheError::io(format!("failed to list cache root {:?}", root), e))?;

    let mut artifacts = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(root = ?root, error = %e, "Skipping unreadable cache entry");
                continue;
            }
        };

        // Loose files (lock files, version markers) are not artifacts
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }

        let path = entry.path();
        let size_bytes = dir_size(&path);
        artifacts.push(ArtifactEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            size_bytes,
            path,
        });
    }

    tracing::debug!(root = ?root, count = artifacts.len(), "Scanned cache");

    Ok(artifacts)
}

/// Recursively sum regular file sizes under `path`
pub(crate) fn dir_size(path: &Path) -> u64 {
    dir_size_with(path, &mut |p: &Path| std::fs::symlink_metadata(p))
}

fn dir_size_with<F>(path: &Path, stat: &mut F) -> u64
where
    F: FnMut(&Path) -> io::Result<Metadata>,
{
    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(path = ?path, error = %e, "Skipping unreadable directory");
            return 0;
        }
    };

    let mut size = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        match stat(&path) {
            Ok(metadata) if metadata.is_dir() => size += dir_size_with(&path, stat),
            Ok(metadata) if metadata.is_file() => size += metadata.len(),
            // symlinks, sockets, fifos
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(path = ?path, error = %e, "Skipping unreadable file");
            }
        }
    }

    size
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::fs;

    fn entry(name: &str) -> ArtifactEntry {
        ArtifactEntry {
            name: name.to_string(),
            size_bytes: 0,
            path: PathBuf::from("/tmp").join(name),
        }
    }

    #[test]
    fn test_model_id_from_hub_name() {
        assert_eq!(
            entry("models--BAAI--bge-small-en-v1.5").model_id(),
            Some("BAAI/bge-small-en-v1.5".to_string())
        );
        assert_eq!(
            entry("models--sentence-transformers--all-MiniLM-L6-v2").model_id(),
            Some("sentence-transformers/all-MiniLM-L6-v2".to_string())
        );
        assert_eq!(
            entry("datasets--squad").model_id(),
            Some("squad".to_string())
        );
        assert_eq!(entry("not-a-model").model_id(), None);
        assert_eq!(entry("models--").model_id(), None);
    }

    #[test]
    fn test_display_name_falls_back_to_raw_name() {
        assert_eq!(entry("gpt2").display_name(), "gpt2");
        assert_eq!(entry("models--openai--gpt2").display_name(), "openai/gpt2");
    }

    #[test]
    fn test_scan_missing_root_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let artifacts = scan(&temp_dir.path().join("does-not-exist")).unwrap();
        assert!(artifacts.is_empty());
    }

    #[test]
    fn test_scan_file_root_is_invalid() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("hub");
        fs::write(&file, "not a directory").unwrap();

        let err = scan(&file).unwrap_err();
        assert!(matches!(err, CacheError::InvalidRoot { .. }));
    }

    #[test]
    fn test_scan_ignores_loose_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir(temp_dir.path().join("models--a--b")).unwrap();
        fs::write(temp_dir.path().join("version.txt"), "1").unwrap();

        let artifacts = scan(temp_dir.path()).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].name, "models--a--b");
        assert!(artifacts[0].path.is_absolute());
    }

    #[test]
    fn test_dir_size_empty_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert_eq!(dir_size(temp_dir.path()), 0);
    }

    #[test]
    fn test_dir_size_nested_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();

        let subdir = temp_dir.path().join("snapshots/abc123");
        fs::create_dir_all(&subdir).unwrap();
        fs::write(subdir.join("config.json"), "abc").unwrap();
        fs::write(temp_dir.path().join("model.safetensors"), "defgh").unwrap();

        assert_eq!(dir_size(temp_dir.path()), 8);
    }

    #[cfg(unix)]
    #[test]
    fn test_dir_size_does_not_follow_symlinks() {
        let temp_dir = tempfile::tempdir().unwrap();
        let blobs = temp_dir.path().join("blobs");
        let snapshot = temp_dir.path().join("snapshots/main");
        fs::create_dir_all(&blobs).unwrap();
        fs::create_dir_all(&snapshot).unwrap();
        fs::write(blobs.join("deadbeef"), "0123456789").unwrap();
        std::os::unix::fs::symlink(blobs.join("deadbeef"), snapshot.join("model.bin")).unwrap();

        assert_eq!(dir_size(temp_dir.path()), 10);
    }

    #[test]
    fn test_file_vanishing_mid_scan_is_omitted() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("kept.bin"), "12345").unwrap();
        fs::write(temp_dir.path().join("vanishing.bin"), "1234567890").unwrap();

        // Delete the file after it was listed but before it is stat'ed
        let mut stat = |p: &Path| {
            if p.file_name() == Some(OsStr::new("vanishing.bin")) {
                let _ = fs::remove_file(p);
            }
            fs::symlink_metadata(p)
        };

        assert_eq!(dir_size_with(temp_dir.path(), &mut stat), 5);
        assert!(!temp_dir.path().join("vanishing.bin").exists());
    }
}
