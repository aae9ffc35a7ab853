//! # Ace Playlist Updater
//!
//! Keeps an M3U playlist of AceStream (and plain HTTP) links up to date by
//! re-scraping the pages that publish them. Links that cannot be refreshed
//! this run are carried over from the previous playlist.
//!
//! ## Usage
//!
//! ```sh
//! ace_playlist_updater -c channels.yaml -p lista.m3u8 [--dry-run]
//! ```
//!
//! ## Architecture
//!
//! One sequential pass per run:
//! 1. **Load**: read `channels.yaml` and the previous playlist
//! 2. **Resolve**: per channel, fetch the source page and extract a link,
//!    falling back to the previous one
//! 3. **Render**: build the new playlist document
//! 4. **Write**: replace the file only if its bytes changed
//!
//! Per-channel failures are logged and never fail the run.

use clap::Parser;
use std::error::Error;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod fetch;
mod models;
mod outputs;
mod playlist;
mod reconcile;
mod scrapers;
mod utils;

use cli::Cli;
use fetch::{HttpFetcher, RetryFetch};
use outputs::m3u::{WriteOutcome, write_playlist};
use playlist::{load_playlist, render_playlist};
use reconcile::reconcile;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args.config, ?args.playlist, dry_run = args.dry_run, "Parsed CLI arguments");

    let outcome = run(&args).await?;

    let elapsed = start_time.elapsed();
    info!(?outcome, millis = elapsed.as_millis(), "Execution complete");
    Ok(())
}

/// One full update pass: load, resolve every channel, render and write.
///
/// # Errors
///
/// Only startup problems (unreadable or malformed configuration, unreadable
/// playlist, HTTP client setup) and the final write. Per-channel failures
/// are logged and absorbed.
#[instrument(level = "info", skip_all)]
async fn run(args: &Cli) -> Result<WriteOutcome, Box<dyn Error>> {
    let config = config::load_config(&args.config).await?;
    let previous = load_playlist(&args.playlist).await?;

    let fetcher = RetryFetch::new(HttpFetcher::new(&config.fetch)?, &config.fetch);
    let result = reconcile(&config.channels, &previous, &fetcher).await;

    let content = render_playlist(&result.entries);
    let outcome = write_playlist(
        &args.playlist,
        &content,
        result.entries.len(),
        &result.changes,
        args.dry_run,
    )
    .await?;
    info!(
        entries = result.entries.len(),
        changes = result.changes.len(),
        "Update pass finished"
    );
    Ok(outcome)
}
