//! Terminal commands: `info`, `clear`, `diskspace`
//!
//! Each command writes human or JSON output to the given writer and returns
//! an error only for failures that should end the process non-zero.

use crate::cache::{BatchDeletion, CacheStore};
use crate::disk::{CapacitySource, DiskSpaceReporter, DiskUsage};
use crate::format::format_bytes;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// What `clear` removes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearTarget {
    All,
    Exact(String),
    Matching(String),
}

/// Asks the operator before a destructive action
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool>;
}

/// Skips confirmation (`--yes`)
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _prompt: &str) -> io::Result<bool> {
        Ok(true)
    }
}

/// Line-based y/n prompt
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl Prompt<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stderr, answer on stdin
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for Prompt<R, W> {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        write!(self.output, "{} (y/n): ", prompt)?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}

/// Show cache location, total size and artifacts, largest first
pub fn info(store: &CacheStore, json: bool, out: &mut impl Write) -> Result<()> {
    let report = store.report().context("Failed to read cache")?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
        return Ok(());
    }

    if !report.exists {
        writeln!(out, "No model cache found at {}", report.cache_root.display())?;
        writeln!(out, "Models will be cached there on first download")?;
        return Ok(());
    }

    writeln!(out, "Cache location: {}", report.cache_root.display())?;
    writeln!(out, "Total cache size: {}", format_bytes(report.total_bytes))?;

    if report.artifacts.is_empty() {
        writeln!(out, "\nNo models cached yet")?;
        return Ok(());
    }

    writeln!(out, "\nCached models ({}):", report.artifacts.len())?;
    for artifact in &report.artifacts {
        writeln!(
            out,
            "  {:>10}  {}",
            format_bytes(artifact.size_bytes),
            artifact.display_name()
        )?;
    }

    Ok(())
}

/// Delete cache contents after confirmation
///
/// A batch where at least one artifact was removed succeeds even if others
/// failed; the failures are printed.
pub fn clear<S: CapacitySource>(
    store: &CacheStore,
    reporter: &DiskSpaceReporter<S>,
    target: &ClearTarget,
    confirm: &mut impl Confirm,
    out: &mut impl Write,
) -> Result<()> {
    let prompt = match target {
        ClearTarget::All => {
            if !store.exists() {
                writeln!(out, "No cache to clear")?;
                return Ok(());
            }
            "Clear entire cache? This deletes all downloaded models".to_string()
        }
        ClearTarget::Exact(name) => format!("Delete cached model '{}'?", name),
        ClearTarget::Matching(needle) => {
            format!("Delete every cached model matching '{}'?", needle)
        }
    };

    if !confirm.confirm(&prompt)? {
        writeln!(out, "Cancelled")?;
        return Ok(());
    }

    let free_before = free_space(reporter, store.root());

    match target {
        ClearTarget::All => {
            let freed = store.delete_all().context("Failed to clear cache")?;
            writeln!(out, "Cache cleared ({} freed)", format_bytes(freed))?;
        }
        ClearTarget::Exact(name) => {
            let removed = store
                .delete_by_exact_name(name)
                .with_context(|| format!("Failed to delete '{}'", name))?;
            writeln!(
                out,
                "Cleared {} ({})",
                removed.name,
                format_bytes(removed.size_bytes)
            )?;
        }
        ClearTarget::Matching(needle) => {
            let batch = store
                .delete_by_substring(needle)
                .with_context(|| format!("Failed to delete models matching '{}'", needle))?;
            write_batch(&batch, out)?;
            if batch.is_total_failure() {
                anyhow::bail!(
                    "None of the {} matching models could be deleted",
                    batch.failed.len()
                );
            }
        }
    }

    if let (Some(before), Some(after)) = (free_before, free_space(reporter, store.root())) {
        writeln!(
            out,
            "Free space: {} -> {}",
            format_bytes(before),
            format_bytes(after)
        )?;
    }

    Ok(())
}

fn write_batch(batch: &BatchDeletion, out: &mut impl Write) -> io::Result<()> {
    for artifact in &batch.removed {
        writeln!(
            out,
            "Cleared {} ({})",
            artifact.name,
            format_bytes(artifact.size_bytes)
        )?;
    }
    for failure in &batch.failed {
        writeln!(out, "Error clearing {}: {}", failure.artifact.name, failure.error)?;
    }
    writeln!(
        out,
        "Removed {} of {} matching models ({} freed)",
        batch.removed_count(),
        batch.removed_count() + batch.failed.len(),
        format_bytes(batch.freed_bytes())
    )
}

fn free_space<S: CapacitySource>(reporter: &DiskSpaceReporter<S>, path: &Path) -> Option<u64> {
    match reporter.report(path) {
        Ok(usage) => Some(usage.free_bytes),
        Err(e) => {
            tracing::warn!(error = %e, "Could not measure free space");
            None
        }
    }
}

#[derive(Serialize)]
struct DiskSpaceOutput {
    path: String,
    #[serde(flatten)]
    usage: DiskUsage,
    threshold_bytes: u64,
    low: bool,
}

/// Show total/used/free space of the filesystem holding `path`
pub fn diskspace<S: CapacitySource>(
    reporter: &DiskSpaceReporter<S>,
    path: &Path,
    threshold_bytes: u64,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let usage = reporter
        .report(path)
        .context("Failed to read disk space")?;
    let low = usage.is_below(threshold_bytes);

    if json {
        let output = DiskSpaceOutput {
            path: path.display().to_string(),
            usage,
            threshold_bytes,
            low,
        };
        serde_json::to_writer_pretty(&mut *out, &output)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "Disk space for {}:", path.display())?;
    writeln!(out, "  Total: {}", format_bytes(usage.total_bytes))?;
    writeln!(out, "  Used:  {}", format_bytes(usage.used_bytes))?;
    writeln!(out, "  Free:  {}", format_bytes(usage.free_bytes))?;
    if low {
        writeln!(
            out,
            "Warning: less than {} free",
            format_bytes(threshold_bytes)
        )?;
    }

    Ok(())
}
