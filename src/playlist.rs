//! Reading and rendering the M3U playlist.
//!
//! # Format
//!
//! ```text
//! #EXTM3U
//! #EXTINF:-1 group-title="Sports" tvg-logo="https://...", Sports 1
//! acestream://0123456789abcdef0123456789abcdef01234567
//! ```
//!
//! Attributes are rendered in alphabetical key order so the file only
//! changes when a link or a configured attribute does.

use crate::models::PlaylistEntry;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::error::Error;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument};

pub const HEADER: &str = "#EXTM3U";
const EXTINF: &str = "#EXTINF:";

static ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([\w-]+)\s*=\s*"([^"]*)""#).unwrap());

/// Parse playlist text into entries, in file order.
///
/// An `#EXTINF` line whose next line is blank or another `#` line is dropped.
pub fn parse_m3u(text: &str) -> Vec<PlaylistEntry> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut entries = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with(EXTINF) {
            let (attr_part, name_part) = lines[i].split_once(',').unwrap_or((lines[i], ""));
            let attrs = ATTRIBUTE
                .captures_iter(attr_part)
                .map(|caps| (caps[1].to_string(), caps[2].to_string()))
                .collect::<BTreeMap<_, _>>();

            match lines.get(i + 1) {
                Some(link) if !link.is_empty() && !link.starts_with('#') => {
                    entries.push(PlaylistEntry {
                        name: name_part.trim().to_string(),
                        link: link.to_string(),
                        attrs,
                    });
                    i += 1;
                }
                _ => debug!(line = lines[i], "EXTINF without link; dropped"),
            }
        }
        i += 1;
    }
    entries
}

/// Load the playlist at `path`; a missing file is an empty playlist.
///
/// # Errors
///
/// Any I/O error other than the file not existing.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub async fn load_playlist(path: impl AsRef<Path>) -> Result<Vec<PlaylistEntry>, Box<dyn Error>> {
    let bytes = match fs::read(path.as_ref()).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("No previous playlist; starting empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };
    let entries = parse_m3u(&String::from_utf8_lossy(&bytes));
    info!(entries = entries.len(), "Loaded previous playlist");
    Ok(entries)
}

/// Build the `#EXTINF` metadata line for one entry.
///
/// `BTreeMap` iteration gives the alphabetical key order.
pub fn build_extinf_line(name: &str, attrs: &BTreeMap<String, String>) -> String {
    if attrs.is_empty() {
        return format!("{EXTINF}-1, {name}");
    }
    let attrs = attrs
        .iter()
        .map(|(key, value)| format!(r#"{key}="{value}""#))
        .join(" ");
    format!("{EXTINF}-1 {attrs}, {name}")
}

/// Render the whole playlist document, newline-terminated.
pub fn render_playlist(entries: &[PlaylistEntry]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for entry in entries {
        out.push_str(&build_extinf_line(&entry.name, &entry.attrs));
        out.push('\n');
        out.push_str(&entry.link);
        out.push('\n');
    }
    out
}
