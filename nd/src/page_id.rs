//! Page-id extraction from workspace URLs

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

static RE_PAGE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([a-f0-9]{32}|[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12})").expect("valid regex")
});

/// First 32-hex or dashed UUID in `url`, with dashes removed
pub fn extract_page_id(url: &str) -> Option<String> {
    debug!(%url, "extract_page_id: called");
    RE_PAGE_ID.find(url).map(|m| m.as_str().replace('-', ""))
}

/// Accept either a bare id or a URL containing one
///
/// Falls back to the input unchanged so ids in formats we don't recognize
/// still reach the API, which reports its own error.
pub fn resolve_page_ref(input: &str) -> String {
    extract_page_id(input).unwrap_or_else(|| input.trim().to_string())
}
