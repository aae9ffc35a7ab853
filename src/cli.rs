//! Command-line interface definitions.
//!
//! Paths can also be provided via environment variables, which is how the
//! scheduled CI job configures them.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Update the playlist in place
/// ace_playlist_updater -c channels.yaml -p lista.m3u8
///
/// # Only report what would change
/// ace_playlist_updater --dry-run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Channel configuration (YAML)
    #[arg(short, long, env = "CHANNELS_CONFIG", default_value = "channels.yaml")]
    pub config: PathBuf,

    /// Playlist file to update
    #[arg(short, long, env = "PLAYLIST_PATH", default_value = "playlist.m3u8")]
    pub playlist: PathBuf,

    /// Report changes without writing the playlist
    #[arg(long)]
    pub dry_run: bool,
}
