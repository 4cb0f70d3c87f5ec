//! Explicit-label scan: dates printed right after "입력", "등록", "Published", ...
//!
//! Publication labels are preferred over modification labels ("수정",
//! "Updated"); within one class the earliest match in the text wins.

use super::YearWindow;
use super::patterns::{ABSOLUTE_DATE, datetime_from_captures};
use crate::models::{DateCandidate, DateConfidence};
use chrono::FixedOffset;
use once_cell::sync::Lazy;
use regex::Regex;

const PUBLISH_LABELS: &[&str] = &[
    "기사입력", "최초입력", "입력", "등록", "게재", "작성", "송고", "발행", "published", "posted",
];

const MODIFY_LABELS: &[&str] = &["최종수정", "수정", "업데이트", "updated", "modified"];

static LABELED_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    let labels = PUBLISH_LABELS
        .iter()
        .chain(MODIFY_LABELS)
        .copied()
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"(?i)(?P<label>{labels})\s*(?:일시|일자|시간|날짜|일|on|at)?\s*[:：]?\s*{ABSOLUTE_DATE}"
    ))
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelClass {
    Publish,
    Modify,
}

fn classify(label: &str) -> LabelClass {
    let label = label.to_lowercase();
    if MODIFY_LABELS.contains(&label.as_str()) {
        LabelClass::Modify
    } else {
        LabelClass::Publish
    }
}

/// Find the first labeled date in `text` that parses and falls inside `window`.
pub fn scan_labels(text: &str, tz: &FixedOffset, window: &YearWindow) -> Option<DateCandidate> {
    let mut modified = None;
    for caps in LABELED_DATE_RE.captures_iter(text) {
        let Some(value) = datetime_from_captures(&caps, tz) else {
            continue;
        };
        if !window.contains(&value) {
            continue;
        }
        match classify(&caps["label"]) {
            LabelClass::Publish => {
                return Some(DateCandidate::new(value, DateConfidence::ExplicitLabel));
            }
            LabelClass::Modify => {
                if modified.is_none() {
                    modified = Some(value);
                }
            }
        }
    }
    modified.map(|value| DateCandidate::new(value, DateConfidence::ExplicitLabel))
}
