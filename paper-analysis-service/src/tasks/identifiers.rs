use once_cell::sync::Lazy;
use regex::Regex;

static ARXIV_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^arxiv:\s*").unwrap());

static ARXIV_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://(www\.)?arxiv\.org/(abs|pdf)/").unwrap());

/// New-style `YYMM.NNNNN` ids or legacy `category/NNNNNNN` ids, each with an
/// optional version suffix.
static ARXIV_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4}\.\d{4,5}(?:v\d+)?|[a-z-]+/\d{7}(?:v\d+)?)").unwrap());

/// Returns true for the placeholder values models emit instead of an id.
pub fn is_placeholder(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "null" | "none" | "n/a"
    )
}

/// Normalize a free-form arXiv reference (`arXiv:2301.07041v2`,
/// `https://arxiv.org/abs/2301.07041`, `abs/hep-th/9901001`) to the bare
/// identifier. Returns `None` when nothing identifier-shaped is present.
pub fn normalize_identifier(raw: &str) -> Option<String> {
    if is_placeholder(raw) {
        return None;
    }
    let trimmed = raw.trim();
    let without_prefix = ARXIV_PREFIX.replace(trimmed, "");
    let without_url = ARXIV_URL.replace(&without_prefix, "");
    let bare = without_url.strip_prefix("abs/").unwrap_or(&without_url);

    ARXIV_ID
        .captures(bare)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
