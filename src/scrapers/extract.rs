//! Link extraction from fetched page content.
//!
//! Strategies are tried in a fixed order and the first one that yields a
//! candidate accepted by [`normalize_link`] wins:
//!
//! 1. **Direct pattern**: `regex`, searched case-insensitively over the whole page
//! 2. **CSS selector**: `selector`, reading `attr` or the element text,
//!    optionally narrowed by `inner_regex`
//! 3. **Fallback scan**: the first `acestream://<40 hex>` anywhere in the page

use super::normalize::{ACESTREAM_LINK, normalize_link};
use crate::models::ChannelConfig;
use crate::utils::truncate_for_log;
use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use tracing::debug;

/// Compiled lookup strategy of one channel.
#[derive(Debug, Clone, Default)]
pub struct ExtractRules {
    pub pattern: Option<Regex>,
    pub selector: Option<Selector>,
    pub attr: Option<String>,
    pub inner_pattern: Option<Regex>,
}

impl ExtractRules {
    /// Compile the strategy fields of a channel record.
    ///
    /// # Errors
    ///
    /// Returns an error naming the channel if a pattern or the selector does
    /// not compile.
    pub fn compile(channel: &ChannelConfig) -> Result<Self, Box<dyn Error>> {
        let pattern = channel
            .regex
            .as_deref()
            .map(case_insensitive)
            .transpose()
            .map_err(|e| format!("channel '{}': invalid regex: {e}", channel.name))?;
        let inner_pattern = channel
            .inner_regex
            .as_deref()
            .map(case_insensitive)
            .transpose()
            .map_err(|e| format!("channel '{}': invalid inner_regex: {e}", channel.name))?;
        let selector = channel
            .selector
            .as_deref()
            .map(Selector::parse)
            .transpose()
            .map_err(|e| format!("channel '{}': invalid selector: {e}", channel.name))?;

        Ok(Self {
            pattern,
            selector,
            attr: channel.attr.clone(),
            inner_pattern,
        })
    }
}

fn case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Extract a canonical link from `html` using `rules`.
pub fn extract_link(html: &str, rules: &ExtractRules) -> Option<String> {
    if let Some(pattern) = &rules.pattern {
        if let Some(m) = pattern.find(html) {
            if let Some(link) = normalize_link(m.as_str()) {
                debug!(strategy = "regex", %link, "Candidate accepted");
                return Some(link);
            }
            debug!(
                candidate = %truncate_for_log(m.as_str(), 120),
                "Direct pattern match rejected"
            );
        }
    }

    if let Some(selector) = &rules.selector {
        let document = Html::parse_document(html);
        for element in document.select(selector) {
            let raw = element_value(&element, rules.attr.as_deref());
            let candidate = match &rules.inner_pattern {
                Some(inner) => match inner.find(raw.trim()) {
                    Some(m) => m.as_str().to_string(),
                    None => continue,
                },
                None => raw.trim().to_string(),
            };
            if let Some(link) = normalize_link(&candidate) {
                debug!(strategy = "selector", %link, "Candidate accepted");
                return Some(link);
            }
        }
    }

    let link = ACESTREAM_LINK
        .find(html)
        .and_then(|m| normalize_link(m.as_str()));
    if let Some(link) = &link {
        debug!(strategy = "fallback", %link, "Candidate accepted");
    }
    link
}

/// Attribute value (empty when missing) or the element's visible text with
/// each text node trimmed.
fn element_value(element: &ElementRef<'_>, attr: Option<&str>) -> String {
    match attr {
        Some(name) => element.value().attr(name).unwrap_or_default().to_string(),
        None => element.text().map(str::trim).collect(),
    }
}
