//! Structured metadata: meta tags, `<time datetime>` and JSON-LD.
//!
//! Publication timestamps are tried before modification timestamps. Each
//! value goes through [`parse_flexible`] and the year window; the first one
//! that survives wins.

use super::YearWindow;
use super::patterns::parse_flexible;
use crate::models::{DateCandidate, DateConfidence};
use chrono::FixedOffset;
use scraper::{Html, Selector};
use serde_json::Value;

const PUBLISHED_META: &[&str] = &[
    "meta[property='article:published_time']",
    "meta[name='article:published_time']",
    "meta[property='og:published_time']",
    "meta[itemprop='datePublished']",
    "meta[name='pubdate']",
    "meta[name='publishdate']",
    "meta[name='date']",
    "meta[name='dc.date.issued']",
];

const MODIFIED_META: &[&str] = &[
    "meta[property='article:modified_time']",
    "meta[name='article:modified_time']",
    "meta[property='og:updated_time']",
    "meta[itemprop='dateModified']",
];

const JSON_LD_PUBLISHED_KEYS: &[&str] = &["datePublished", "dateCreated", "uploadDate"];
const JSON_LD_MODIFIED_KEYS: &[&str] = &["dateModified"];

/// Whether a body looks like page markup worth handing to the HTML parser.
pub fn looks_like_markup(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    lower.contains("<meta") || lower.contains("<script") || lower.contains("<time") || lower.contains("<html")
}

/// Resolve a publish instant from page markup or a raw JSON-LD document.
pub fn scan_metadata(body: &str, tz: &FixedOffset, window: &YearWindow) -> Option<DateCandidate> {
    let trimmed = body.trim_start();
    let values = if trimmed.starts_with('{') || trimmed.starts_with('[') {
        json_document_values(trimmed)
    } else if looks_like_markup(body) {
        markup_values(&Html::parse_document(body))
    } else {
        Vec::new()
    };

    values
        .iter()
        .filter_map(|raw| parse_flexible(raw, tz))
        .find(|dt| window.contains(dt))
        .map(|value| DateCandidate::new(value, DateConfidence::StructuredMetadata))
}

/// Candidate strings in priority order.
fn markup_values(document: &Html) -> Vec<String> {
    let mut json_ld = Vec::new();
    if let Ok(selector) = Selector::parse("script[type='application/ld+json']") {
        for script in document.select(&selector) {
            let text = script.text().collect::<String>();
            if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
                json_ld.push(value);
            }
        }
    }

    let mut out = meta_contents(document, PUBLISHED_META);
    for value in &json_ld {
        collect_json_dates(value, JSON_LD_PUBLISHED_KEYS, &mut out);
    }
    if let Ok(selector) = Selector::parse("time[datetime]") {
        out.extend(
            document
                .select(&selector)
                .filter_map(|el| el.value().attr("datetime"))
                .map(str::to_string),
        );
    }
    out.extend(meta_contents(document, MODIFIED_META));
    for value in &json_ld {
        collect_json_dates(value, JSON_LD_MODIFIED_KEYS, &mut out);
    }
    out
}

fn json_document_values(text: &str) -> Vec<String> {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    collect_json_dates(&value, JSON_LD_PUBLISHED_KEYS, &mut out);
    collect_json_dates(&value, JSON_LD_MODIFIED_KEYS, &mut out);
    out
}

fn meta_contents(document: &Html, selectors: &[&str]) -> Vec<String> {
    selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .flat_map(|selector| {
            document
                .select(&selector)
                .filter_map(|el| el.value().attr("content"))
                .map(|c| c.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|c| !c.is_empty())
        .collect()
}

/// Depth-first walk collecting string values stored under any of `keys`.
///
/// Covers plain objects, top-level arrays and `@graph` containers.
fn collect_json_dates(value: &Value, keys: &[&str], out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for key in keys {
                if let Some(Value::String(s)) = map.get(*key) {
                    out.push(s.clone());
                }
            }
            for child in map.values() {
                if child.is_object() || child.is_array() {
                    collect_json_dates(child, keys, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_json_dates(item, keys, out);
            }
        }
        _ => {}
    }
}

/// Visible text of a markup body, for the text-based scans.
pub fn visible_text(body: &str) -> String {
    let document = Html::parse_document(body);
    let Ok(selector) = Selector::parse("body") else {
        return String::new();
    };
    let root = document
        .select(&selector)
        .next()
        .unwrap_or_else(|| document.root_element());

    root.descendants()
        .filter(|node| {
            node.parent()
                .and_then(|p| p.value().as_element().map(|el| el.name()))
                .is_none_or(|name| !matches!(name, "script" | "style" | "noscript"))
        })
        .filter_map(|node| node.value().as_text().map(|t| t.trim()))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
