//! Output of the reconciled playlist.
//!
//! # Submodules
//!
//! - [`m3u`]: compares the rendered playlist with the file on disk and
//!   rewrites it only when they differ (or reports the changes in dry-run mode)

pub mod m3u;
