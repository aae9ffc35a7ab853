//! Merging freshly extracted links with the previous playlist.
//!
//! Channels are processed one at a time, in configured order. For each:
//!
//! 1. a `fixed_url` is used as-is, without fetching
//! 2. without a `source_url` the channel is skipped
//! 3. otherwise the page is fetched and a link extracted
//! 4. on failure the previous playlist's link for the same name is kept
//! 5. with no link at all the channel is left out of the new playlist
//!
//! A [`Change`] is recorded whenever the resolved link differs from the
//! previous one, including channels that are new this run.

use crate::config::Channel;
use crate::fetch::{PageFetch, RetryFetch};
use crate::models::{Change, PlaylistEntry};
use crate::scrapers::extract::extract_link;
use std::collections::HashMap;
use tracing::{error, info, instrument, warn};

/// Result of one reconciliation pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Resolved entries, in channel order.
    pub entries: Vec<PlaylistEntry>,
    /// Channels whose link is new or changed.
    pub changes: Vec<Change>,
}

/// Resolve every channel against `previous`, fetching pages through `fetcher`.
#[instrument(level = "info", skip_all, fields(channels = channels.len(), previous = previous.len()))]
pub async fn reconcile<T: PageFetch>(
    channels: &[Channel],
    previous: &[PlaylistEntry],
    fetcher: &RetryFetch<T>,
) -> Reconciliation {
    // Later duplicates overwrite earlier ones.
    let previous_links: HashMap<&str, &str> = previous
        .iter()
        .map(|entry| (entry.name.as_str(), entry.link.as_str()))
        .collect();

    let mut result = Reconciliation::default();

    for channel in channels {
        info!(channel = %channel.name, "Processing channel");
        let previous_link = previous_links.get(channel.name.as_str()).copied();

        let Some(link) = resolve_link(channel, previous_link, fetcher).await else {
            error!(channel = %channel.name, "No link available; channel left out of the playlist");
            continue;
        };

        if previous_link != Some(link.as_str()) {
            result.changes.push(Change {
                name: channel.name.clone(),
                previous: previous_link.map(str::to_string),
                current: link.clone(),
            });
        }
        result.entries.push(PlaylistEntry {
            name: channel.name.clone(),
            link,
            attrs: channel.attrs.clone(),
        });
    }

    info!(
        resolved = result.entries.len(),
        changed = result.changes.len(),
        "Reconciliation complete"
    );
    result
}

async fn resolve_link<T: PageFetch>(
    channel: &Channel,
    previous_link: Option<&str>,
    fetcher: &RetryFetch<T>,
) -> Option<String> {
    if let Some(fixed) = &channel.fixed_url {
        info!(channel = %channel.name, "Using fixed_url");
        return Some(fixed.clone());
    }

    let Some(source_url) = &channel.source_url else {
        warn!(channel = %channel.name, "Neither source_url nor fixed_url; skipping");
        return None;
    };

    let found = match fetcher.fetch_text(source_url).await {
        Some(html) => extract_link(&html, &channel.rules),
        None => None,
    };
    if let Some(link) = found {
        info!(channel = %channel.name, %link, "Link found");
        return Some(link);
    }

    warn!(channel = %channel.name, url = %source_url, "Extraction failed; trying to keep the previous link");
    let kept = previous_link.map(str::to_string);
    if let Some(link) = &kept {
        info!(channel = %channel.name, %link, "Keeping previous link");
    }
    kept
}
