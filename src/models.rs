//! Data models shared by the configuration loader, the reconciler and the
//! playlist reader/writer.
//!
//! - [`ChannelConfig`]: one channel record as written in `channels.yaml`
//! - [`ChannelsFile`]: the whole configuration document
//! - [`PlaylistEntry`]: one `#EXTINF` entry of the playlist
//! - [`Change`]: a channel whose link differs from the previous run
//!
//! Attribute maps are `BTreeMap`s so that iteration (and therefore
//! rendering) is always in alphabetical key order.

use crate::fetch::FetchSettings;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// Sentinel rendered for the previous side of a change when the channel
/// had no entry in the previous playlist.
pub const NO_PREVIOUS_LINK: &str = "∅";

/// A channel record as it appears in the configuration document.
///
/// Only `name` is required. Lookup strategy fields are compiled into a
/// [`crate::scrapers::extract::ExtractRules`] when the configuration is loaded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelConfig {
    /// Display name, also the reconciliation key across runs.
    pub name: String,
    /// Page to scrape for the link.
    pub source_url: Option<String>,
    /// Link used as-is; bypasses fetching entirely.
    pub fixed_url: Option<String>,
    /// Pattern searched over the whole page (case-insensitive).
    pub regex: Option<String>,
    /// CSS selector for candidate elements.
    pub selector: Option<String>,
    /// Attribute read from selected elements instead of their text.
    pub attr: Option<String>,
    /// Pattern a selected element's value must match; the match is the candidate.
    pub inner_regex: Option<String>,
    /// `#EXTINF` attributes such as `tvg-logo` or `group-title`.
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
}

/// The configuration document.
#[derive(Debug, Default, Deserialize)]
pub struct ChannelsFile {
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

/// One entry of the playlist: the metadata line plus its link line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub name: String,
    pub link: String,
    pub attrs: BTreeMap<String, String>,
}

/// A channel whose resolved link is new or different this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub name: String,
    /// `None` when the channel was absent from the previous playlist.
    pub previous: Option<String>,
    pub current: String,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}  ->  {}",
            self.name,
            self.previous.as_deref().unwrap_or(NO_PREVIOUS_LINK),
            self.current
        )
    }
}
