//! Canonicalization of candidate links.
//!
//! Only two link shapes are written to the playlist: an `acestream://`
//! content id with a lowercase 40-hex payload, or an HTTP(S) URL. A
//! scheme-prefixed candidate whose payload is not 40 hex characters is
//! passed through untouched; some sources publish non-standard ids there.

use once_cell::sync::Lazy;
use regex::Regex;

/// Scheme of AceStream content ids.
pub const ACESTREAM_SCHEME: &str = "acestream://";

static HEX40: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{40}$").unwrap());

/// Any AceStream link embedded in page content, used by the fallback scan.
pub static ACESTREAM_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"acestream://[0-9a-fA-F]{40}").unwrap());

/// Classify and canonicalize a candidate.
///
/// Returns `None` for anything that is neither an AceStream id nor an
/// HTTP(S) URL.
///
/// # Examples
///
/// ```ignore
/// let id = "ABCDEF0123456789ABCDEF0123456789ABCDEF01";
/// assert_eq!(normalize_link(id).unwrap(), format!("acestream://{}", id.to_lowercase()));
/// assert_eq!(normalize_link("http://x").as_deref(), Some("http://x"));
/// assert_eq!(normalize_link("not-a-link"), None);
/// ```
pub fn normalize_link(candidate: &str) -> Option<String> {
    let c = candidate.trim();

    if let Some(payload) = c.strip_prefix(ACESTREAM_SCHEME) {
        if HEX40.is_match(payload) {
            return Some(format!("{ACESTREAM_SCHEME}{}", payload.to_ascii_lowercase()));
        }
        return Some(c.to_string());
    }
    if HEX40.is_match(c) {
        return Some(format!("{ACESTREAM_SCHEME}{}", c.to_ascii_lowercase()));
    }
    if c.starts_with("http://") || c.starts_with("https://") {
        return Some(c.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIXED: &str = "0123456789ABCDEFabcdef0123456789ABCDEF01";

    #[test]
    fn test_prefixed_id_is_lowercased() {
        assert_eq!(
            normalize_link(&format!("acestream://{MIXED}")).unwrap(),
            format!("acestream://{}", MIXED.to_lowercase())
        );
    }

    #[test]
    fn test_bare_id_gets_scheme() {
        assert_eq!(
            normalize_link(MIXED).unwrap(),
            format!("acestream://{}", MIXED.to_lowercase())
        );
    }

    #[test]
    fn test_every_hex_digit_round_trips() {
        for digit in "0123456789abcdefABCDEF".chars() {
            let id: String = std::iter::repeat_n(digit, 40).collect();
            let expected = format!("acestream://{}", id.to_lowercase());
            assert_eq!(normalize_link(&id).as_deref(), Some(expected.as_str()));
            assert_eq!(
                normalize_link(&format!("acestream://{id}")).as_deref(),
                Some(expected.as_str())
            );
        }
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        assert_eq!(
            normalize_link(&format!("  {MIXED}\n")).unwrap(),
            format!("acestream://{}", MIXED.to_lowercase())
        );
    }

    #[test]
    fn test_prefixed_non_hex_passes_through() {
        assert_eq!(
            normalize_link("acestream://SomeCustomId").as_deref(),
            Some("acestream://SomeCustomId")
        );
        assert_eq!(
            normalize_link("acestream://").as_deref(),
            Some("acestream://")
        );
    }

    #[test]
    fn test_http_urls_pass_through() {
        assert_eq!(normalize_link("http://x").as_deref(), Some("http://x"));
        assert_eq!(
            normalize_link("https://cdn.example.com/Live.m3u8?token=AB").as_deref(),
            Some("https://cdn.example.com/Live.m3u8?token=AB")
        );
    }

    #[test]
    fn test_rejections() {
        assert_eq!(normalize_link("not-a-link"), None);
        assert_eq!(normalize_link(""), None);
        assert_eq!(normalize_link(&MIXED[..39]), None);
        assert_eq!(normalize_link(&format!("{MIXED}0")), None);
        assert_eq!(normalize_link("ftp://example.com/file"), None);
    }

    #[test]
    fn test_acestream_link_pattern_finds_embedded_id() {
        let page = format!("<p>Watch: acestream://{MIXED}</p>");
        let found = ACESTREAM_LINK.find(&page).unwrap();
        assert_eq!(found.as_str(), format!("acestream://{MIXED}"));
    }
}
