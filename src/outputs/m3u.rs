//! Writing the rendered playlist to disk.
//!
//! The rendered document is compared byte-for-byte with the file on disk
//! (a missing file counts as empty) and only written when they differ. In
//! dry-run mode nothing is written; the change list is logged instead.

use crate::models::Change;
use itertools::Itertools;
use std::error::Error;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// What [`write_playlist`] decided to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Rendered content matches the file on disk.
    Unchanged,
    /// The file was rewritten.
    Written,
    /// Content differs but the write was suppressed; carries the change
    /// list that was reported instead.
    DryRun(String),
}

/// Change list as logged, one change per line; `—` when empty.
pub fn changes_summary(changes: &[Change]) -> String {
    if changes.is_empty() {
        "—".to_string()
    } else {
        changes.iter().join("\n")
    }
}

/// Write `content` to `path` if it differs from what is already there.
///
/// # Arguments
///
/// * `path` - Playlist file
/// * `content` - Rendered playlist document
/// * `entries` - Number of entries in `content`, for logging
/// * `changes` - Change list of this run
/// * `dry_run` - Suppress the write
///
/// # Errors
///
/// Reading the existing file (other than it not existing) or writing the
/// new one failed.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display(), dry_run = dry_run))]
pub async fn write_playlist(
    path: impl AsRef<Path>,
    content: &str,
    entries: usize,
    changes: &[Change],
    dry_run: bool,
) -> Result<WriteOutcome, Box<dyn Error>> {
    let path = path.as_ref();
    let existing = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    if existing == content.as_bytes() {
        info!("No changes in the playlist");
        return Ok(WriteOutcome::Unchanged);
    }

    if dry_run {
        let summary = changes_summary(changes);
        info!("Changes detected (dry-run):\n{summary}");
        return Ok(WriteOutcome::DryRun(summary));
    }

    fs::write(path, content).await?;
    info!(entries, "Playlist updated");
    if !changes.is_empty() {
        info!("Summary of changes:\n{}", changes_summary(changes));
    }
    Ok(WriteOutcome::Written)
}
