//! Loading of the channel configuration document.
//!
//! The document is YAML with a `channels:` list and an optional `fetch:`
//! block (see [`crate::fetch::FetchSettings`]). Every pattern and selector is
//! compiled here, so a malformed document aborts the run before any channel
//! is processed.

use crate::fetch::FetchSettings;
use crate::models::{ChannelConfig, ChannelsFile};
use crate::scrapers::extract::ExtractRules;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// A channel ready for reconciliation.
#[derive(Debug, Clone)]
pub struct Channel {
    pub name: String,
    pub source_url: Option<String>,
    pub fixed_url: Option<String>,
    pub rules: ExtractRules,
    pub attrs: BTreeMap<String, String>,
}

impl TryFrom<ChannelConfig> for Channel {
    type Error = Box<dyn Error>;

    fn try_from(config: ChannelConfig) -> Result<Self, Self::Error> {
        let rules = ExtractRules::compile(&config)?;
        Ok(Self {
            name: config.name,
            source_url: config.source_url.filter(|s| !s.trim().is_empty()),
            fixed_url: config.fixed_url.filter(|s| !s.trim().is_empty()),
            rules,
            attrs: config.attrs,
        })
    }
}

/// Parsed configuration.
#[derive(Debug)]
pub struct Config {
    pub fetch: FetchSettings,
    pub channels: Vec<Channel>,
}

/// Parse a configuration document from YAML text.
///
/// # Errors
///
/// Returns an error on invalid YAML, unusable `fetch:` settings, a channel
/// without `name`, or a pattern or selector that does not compile.
pub fn parse_config(yaml: &str) -> Result<Config, Box<dyn Error>> {
    let file: ChannelsFile = serde_yaml::from_str(yaml)?;
    file.fetch.validate()?;
    let channels = file
        .channels
        .into_iter()
        .map(Channel::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Config {
        fetch: file.fetch,
        channels,
    })
}

/// Read and parse the configuration document at `path`.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub async fn load_config(path: impl AsRef<Path>) -> Result<Config, Box<dyn Error>> {
    let yaml = fs::read_to_string(path.as_ref())
        .await
        .map_err(|e| format!("cannot read {}: {e}", path.as_ref().display()))?;
    let config = parse_config(&yaml)?;
    info!(channels = config.channels.len(), "Loaded channel configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_compiles_rules() {
        let yaml = r#"
fetch:
  timeout_secs: 5
channels:
  - name: "Sports"
    source_url: "https://example.com"
    regex: "acestream://[0-9a-f]{40}"
    selector: "a.stream"
    attr: "href"
  - name: "Fixed"
    fixed_url: "http://example.com/live.m3u8"
"#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.fetch.timeout_secs, 5);
        assert_eq!(config.fetch.retries, 2);
        assert_eq!(config.channels.len(), 2);
        assert!(config.channels[0].rules.pattern.is_some());
        assert!(config.channels[0].rules.selector.is_some());
        assert_eq!(config.channels[0].rules.attr.as_deref(), Some("href"));
        assert!(config.channels[1].rules.pattern.is_none());
    }

    #[test]
    fn test_blank_urls_count_as_missing() {
        let yaml = "channels:\n  - name: \"Blank\"\n    source_url: \"  \"\n    fixed_url: \"\"\n";
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.channels[0].source_url, None);
        assert_eq!(config.channels[0].fixed_url, None);
    }

    #[test]
    fn test_empty_document_has_no_channels() {
        let config = parse_config("{}").unwrap();
        assert!(config.channels.is_empty());
        assert_eq!(config.fetch, FetchSettings::default());
    }

    #[test]
    fn test_invalid_pattern_aborts_load() {
        let yaml = "channels:\n  - name: \"Bad\"\n    inner_regex: \"[a-\"\n";
        let err = parse_config(yaml).unwrap_err();
        assert!(err.to_string().contains("Bad"));
    }

    #[test]
    fn test_infinite_backoff_aborts_load() {
        let yaml = "fetch:\n  backoff_max_secs: .inf\nchannels:\n  - name: \"One\"\n    source_url: \"https://a\"\n";
        let err = parse_config(yaml).unwrap_err();
        assert!(err.to_string().contains("backoff_max_secs"));
    }

    #[test]
    fn test_nan_backoff_aborts_load() {
        let err = parse_config("fetch:\n  backoff_min_secs: .nan\n").unwrap_err();
        assert!(err.to_string().contains("backoff_min_secs"));
    }

    #[test]
    fn test_negative_backoff_aborts_load() {
        let err = parse_config("fetch:\n  backoff_min_secs: -1.0\n").unwrap_err();
        assert!(err.to_string().contains("backoff_min_secs"));
    }

    #[test]
    fn test_inverted_backoff_bounds_abort_load() {
        let yaml = "fetch:\n  backoff_min_secs: 3.0\n  backoff_max_secs: 1.0\n";
        assert!(parse_config(yaml).is_err());
    }

    #[test]
    fn test_overflowing_retries_abort_load() {
        let err = parse_config("fetch:\n  retries: 4294967295\n").unwrap_err();
        assert!(err.to_string().contains("retries"));
        assert!(parse_config("fetch:\n  retries: 4294967294\n").is_ok());
    }

    #[test]
    fn test_invalid_yaml_aborts_load() {
        assert!(parse_config("channels: [name: ").is_err());
    }

    #[tokio::test]
    async fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path().join("channels.yaml")).await.unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channels.yaml");
        std::fs::write(&path, "channels:\n  - name: \"One\"\n    source_url: \"https://a\"\n").unwrap();
        let config = load_config(&path).await.unwrap();
        assert_eq!(config.channels[0].name, "One");
    }
}
