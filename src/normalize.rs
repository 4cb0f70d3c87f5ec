//! Comparison keys for URLs and titles.
//!
//! Two records whose [`NormalizedKey`]s are equal are treated as the same
//! story without further comparison. Everything here is pure and total: a
//! URL that cannot be parsed becomes the empty string ("no URL signal").

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use url::Url;

static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").unwrap());
static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").unwrap());
static NON_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w가-힣]+").unwrap());

/// Canonical `(url, title)` pair used for exact-match identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NormalizedKey {
    pub url: String,
    pub title: String,
}

impl NormalizedKey {
    /// Normalize both parts of a record's identity.
    pub fn from_parts(url: &str, title: &str) -> Self {
        Self {
            url: normalize_url(url),
            title: normalize_title(title),
        }
    }

    /// Neither part carries any signal.
    pub fn is_empty(&self) -> bool {
        self.url.is_empty() && self.title.is_empty()
    }
}

/// Canonicalize a URL for comparison.
///
/// Lowercases the host, drops query string and fragment, strips trailing
/// slashes from the path and assumes `https` when no scheme is given.
///
/// # Examples
///
/// ```
/// use story_digest::normalize::normalize_url;
/// assert_eq!(
///     normalize_url("HTTPS://News.Example.com/a/b/?utm=1#top"),
///     "https://news.example.com/a/b"
/// );
/// assert_eq!(normalize_url("example.com/story"), "https://example.com/story");
/// assert_eq!(normalize_url("not a url"), "");
/// ```
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    let parsed = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let with_scheme = match raw.strip_prefix("//") {
                Some(rest) => format!("https://{rest}"),
                None => format!("https://{raw}"),
            };
            match Url::parse(&with_scheme) {
                Ok(url) => url,
                Err(_) => return String::new(),
            }
        }
        Err(_) => return String::new(),
    };
    let Some(host) = parsed.host_str() else {
        return String::new();
    };

    let host = host.to_lowercase();
    let path = parsed.path().trim_end_matches('/');
    match parsed.port() {
        Some(port) => format!("{}://{}:{}{}", parsed.scheme(), host, port, path),
        None => format!("{}://{}{}", parsed.scheme(), host, path),
    }
}

/// Reduce a headline to its comparable tokens.
///
/// Lowercases, removes `[단독]`-style bracketed tags and `(종합)`-style
/// parenthetical asides, then keeps only runs of word characters and Hangul
/// joined by single spaces. Applying it twice yields the same string.
///
/// # Examples
///
/// ```
/// use story_digest::normalize::normalize_title;
/// assert_eq!(normalize_title("[단독] 렌즈 행사 개최 (종합)"), "렌즈 행사 개최");
/// assert_eq!(normalize_title("  Acuvue,  launches!  "), "acuvue launches");
/// ```
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let without_tags = BRACKETED.replace_all(&lowered, " ");
    let without_asides = PARENTHETICAL.replace_all(&without_tags, " ");
    NON_TOKEN
        .replace_all(&without_asides, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercase and collapse whitespace; used before similarity scoring.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercased host of a URL with any leading `www.` removed.
pub fn host_of(raw: &str) -> Option<String> {
    let normalized = normalize_url(raw);
    if normalized.is_empty() {
        return None;
    }
    let host = Url::parse(&normalized).ok()?.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}
