//! Publish-date reconciliation.
//!
//! Collectors hand over date signals in many shapes: typed feed timestamps,
//! "입력 2026.01.11 14:32" bylines, meta tags, "3시간 전" portal labels, or
//! nothing but dates scattered through the body. [`DateReconciler`] tries the
//! strategies strongest-first and stops at the first that yields a valid
//! instant:
//!
//! | Step | Module | Confidence |
//! |------|--------|------------|
//! | 1 | record field, then [`labels`] | `ExplicitLabel` |
//! | 2 | [`metadata`] | `StructuredMetadata` |
//! | 3 | [`relative`] | `RelativePhrase` |
//! | 4 | [`fallback`] | `FallbackScan` |
//!
//! When every step fails the record is [`PublishDate::Unknown`]. Nothing here
//! ever substitutes the current time.

pub mod fallback;
pub mod labels;
pub mod metadata;
pub mod patterns;
pub mod relative;

pub use patterns::parse_flexible;
pub use relative::RelativeTimePolicy;

use crate::models::{DateCandidate, DateConfidence, PublishDate, PublishedRaw, RawRecord};
use crate::utils::truncate_for_log;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use tracing::debug;

/// Inclusive range of plausible publication years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearWindow {
    pub min_year: i32,
    pub max_year: i32,
}

impl YearWindow {
    pub const EARLIEST_YEAR: i32 = 2000;

    pub fn new(min_year: i32, max_year: i32) -> Self {
        Self { min_year, max_year }
    }

    /// Year 2000 through the year after `anchor`.
    pub fn around(anchor: &DateTime<FixedOffset>) -> Self {
        Self::new(Self::EARLIEST_YEAR, anchor.year() + 1)
    }

    pub fn contains(&self, value: &DateTime<FixedOffset>) -> bool {
        (self.min_year..=self.max_year).contains(&value.year())
    }
}

/// Resolves one publish instant per record against a fixed anchor.
#[derive(Debug, Clone)]
pub struct DateReconciler {
    anchor: DateTime<FixedOffset>,
    tz: FixedOffset,
    policy: RelativeTimePolicy,
    window: YearWindow,
}

impl DateReconciler {
    /// `anchor` also fixes the timezone naive dates are read in.
    pub fn new(anchor: DateTime<FixedOffset>, policy: RelativeTimePolicy) -> Self {
        Self {
            anchor,
            tz: *anchor.offset(),
            policy,
            window: YearWindow::around(&anchor),
        }
    }

    pub fn anchor(&self) -> DateTime<FixedOffset> {
        self.anchor
    }

    pub fn today(&self) -> NaiveDate {
        self.anchor.date_naive()
    }

    /// Run the strategies in priority order for one record.
    pub fn resolve(&self, record: &RawRecord) -> PublishDate {
        let texts = RecordTexts::from_record(record);

        let found = self
            .explicit_field(record)
            .or_else(|| labels::scan_labels(&texts.full, &self.tz, &self.window))
            .or_else(|| {
                texts
                    .markup
                    .and_then(|body| metadata::scan_metadata(body, &self.tz, &self.window))
            })
            .or_else(|| {
                texts
                    .short
                    .iter()
                    .find_map(|t| relative::resolve_relative(t, self.anchor, self.policy))
                    .filter(|c| self.window.contains(&c.value))
            })
            .or_else(|| fallback::scan_closest(&texts.full, self.today(), &self.tz, &self.window));

        match found {
            Some(candidate) => {
                debug!(
                    title = %truncate_for_log(&record.title, 80),
                    value = %candidate.value,
                    confidence = ?candidate.confidence,
                    "Resolved publish date"
                );
                PublishDate::Resolved(candidate)
            }
            None => {
                debug!(
                    title = %truncate_for_log(&record.title, 80),
                    "No publish date signal; marking unknown"
                );
                PublishDate::Unknown
            }
        }
    }

    fn explicit_field(&self, record: &RawRecord) -> Option<DateCandidate> {
        let value = match record.published_raw.as_ref()? {
            PublishedRaw::Instant(dt) => dt.with_timezone(&self.tz),
            PublishedRaw::Text(text) => parse_flexible(text, &self.tz)?,
        };
        self.window
            .contains(&value)
            .then(|| DateCandidate::new(value, DateConfidence::ExplicitLabel))
    }
}

/// The text views of a record each strategy reads.
struct RecordTexts<'a> {
    /// Date field text, snippet and the body's visible text.
    full: String,
    /// Body when it is page markup or a JSON document.
    markup: Option<&'a str>,
    /// Date field text and snippet, where portals print "3시간 전".
    short: Vec<&'a str>,
}

impl<'a> RecordTexts<'a> {
    fn from_record(record: &'a RawRecord) -> Self {
        let raw_text = record.published_raw.as_ref().and_then(PublishedRaw::as_text);
        let body = record.body_text.as_deref().filter(|b| !b.trim().is_empty());

        let markup = body.filter(|b| {
            let t = b.trim_start();
            t.starts_with('{') || t.starts_with('[') || metadata::looks_like_markup(b)
        });
        let body_plain = match (body, markup) {
            (Some(b), Some(_)) if metadata::looks_like_markup(b) => metadata::visible_text(b),
            (Some(_), Some(_)) => String::new(),
            (Some(b), None) => b.to_string(),
            (None, _) => String::new(),
        };

        let short: Vec<&str> = raw_text
            .into_iter()
            .chain(std::iter::once(record.snippet.as_str()))
            .filter(|t| !t.trim().is_empty())
            .collect();

        let full = short
            .iter()
            .copied()
            .chain(std::iter::once(body_plain.as_str()))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Self { full, markup, short }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn kst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, mi: u32) -> DateTime<FixedOffset> {
        kst().with_ymd_and_hms(y, m, d, h, mi, 0).unwrap()
    }

    fn reconciler(policy: RelativeTimePolicy) -> DateReconciler {
        DateReconciler::new(at(2026, 1, 12, 9, 0), policy)
    }

    fn record() -> RawRecord {
        RawRecord::new("렌즈 행사 개최", "https://example.com/a")
    }

    #[test]
    fn test_typed_field_wins() {
        let utc = chrono::Utc.with_ymd_and_hms(2026, 1, 11, 1, 0, 0).unwrap();
        let rec = record()
            .with_published(PublishedRaw::Instant(utc.fixed_offset()))
            .with_snippet("입력 2026.01.05");
        let resolved = reconciler(RelativeTimePolicy::AnyUnit).resolve(&rec);
        assert_eq!(resolved.instant(), Some(at(2026, 1, 11, 10, 0)));
        assert_eq!(resolved.confidence(), Some(DateConfidence::ExplicitLabel));
    }

    #[test]
    fn test_label_beats_metadata_and_fallback() {
        let body = r#"<html><head><meta property="article:published_time" content="2026-01-10T08:00:00+09:00"></head>
            <body><span>입력 2026.01.11 07:30</span><p>2026.01.12 행사</p></body></html>"#;
        let rec = record().with_body(body);
        let resolved = reconciler(RelativeTimePolicy::AnyUnit).resolve(&rec);
        assert_eq!(resolved.instant(), Some(at(2026, 1, 11, 7, 30)));
        assert_eq!(resolved.confidence(), Some(DateConfidence::ExplicitLabel));
    }

    #[test]
    fn test_metadata_used_without_label() {
        let body = r#"<html><head><meta property="article:published_time" content="2026-01-10T08:00:00+09:00"></head>
            <body><p>2026.01.12 행사</p></body></html>"#;
        let rec = record().with_body(body);
        let resolved = reconciler(RelativeTimePolicy::AnyUnit).resolve(&rec);
        assert_eq!(resolved.instant(), Some(at(2026, 1, 10, 8, 0)));
        assert_eq!(resolved.confidence(), Some(DateConfidence::StructuredMetadata));
    }

    #[test]
    fn test_relative_phrase_from_portal_label() {
        let rec = record()
            .with_published(PublishedRaw::Text("3시간 전".to_string()))
            .with_platform(crate::models::OriginPlatform::SearchPortal);
        let resolved = reconciler(RelativeTimePolicy::AnyUnit).resolve(&rec);
        assert_eq!(resolved.instant(), Some(at(2026, 1, 12, 6, 0)));
        assert_eq!(resolved.confidence(), Some(DateConfidence::RelativePhrase));
    }

    #[test]
    fn test_imprecise_relative_phrase_is_unknown_under_one_day_policy() {
        let rec = record().with_published(PublishedRaw::Text("8개월 전".to_string()));
        let resolved = reconciler(RelativeTimePolicy::OneDayOnly).resolve(&rec);
        assert_eq!(resolved, PublishDate::Unknown);
        assert!(resolved.is_unknown());
    }

    #[test]
    fn test_relative_phrase_outside_year_window_falls_through() {
        let rec = record().with_published(PublishedRaw::Text("30년 전".to_string()));
        assert_eq!(reconciler(RelativeTimePolicy::AnyUnit).resolve(&rec), PublishDate::Unknown);

        let rec = record()
            .with_published(PublishedRaw::Text("30년 전".to_string()))
            .with_body("2026.01.10 발표된 자료");
        let resolved = reconciler(RelativeTimePolicy::AnyUnit).resolve(&rec);
        assert_eq!(resolved.instant(), Some(at(2026, 1, 10, 0, 0)));
        assert_eq!(resolved.confidence(), Some(DateConfidence::FallbackScan));
    }

    #[test]
    fn test_fallback_scan_on_plain_body() {
        let rec = record().with_body("2020.05.01 설립된 회사가 2026.01.11 신제품을 공개했다.");
        let resolved = reconciler(RelativeTimePolicy::AnyUnit).resolve(&rec);
        assert_eq!(resolved.instant(), Some(at(2026, 1, 11, 0, 0)));
        assert_eq!(resolved.confidence(), Some(DateConfidence::FallbackScan));
    }

    #[test]
    fn test_no_signal_is_unknown_never_now() {
        let rec = record().with_snippet("날짜 정보가 없는 기사");
        assert_eq!(reconciler(RelativeTimePolicy::AnyUnit).resolve(&rec), PublishDate::Unknown);
        assert_eq!(reconciler(RelativeTimePolicy::AnyUnit).resolve(&record()), PublishDate::Unknown);
    }

    #[test]
    fn test_out_of_window_field_falls_through() {
        let rec = record()
            .with_published(PublishedRaw::Text("1970-01-01T00:00:00Z".to_string()))
            .with_snippet("등록 2026-01-11");
        let resolved = reconciler(RelativeTimePolicy::AnyUnit).resolve(&rec);
        assert_eq!(resolved.instant(), Some(at(2026, 1, 11, 0, 0)));
    }

    #[test]
    fn test_year_window() {
        let window = YearWindow::around(&at(2026, 1, 12, 9, 0));
        assert!(window.contains(&at(2000, 1, 1, 0, 0)));
        assert!(window.contains(&at(2027, 12, 31, 0, 0)));
        assert!(!window.contains(&at(2028, 1, 1, 0, 0)));
        assert!(!window.contains(&at(1999, 12, 31, 0, 0)));
    }
}
