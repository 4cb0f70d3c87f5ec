//! Record filters applied before deduplication.
//!
//! Keyword matching is a plain substring test on title and snippet, so a
//! table entry like `IR` does not fire on "their".

use crate::config::{DayWindowConfig, FilterConfig, KeywordTable};
use crate::models::DigestRecord;
use crate::normalize::host_of;
use crate::utils::truncate_for_log;
use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use std::fmt;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    BlockedDomain(String),
    Keyword { table: String, keyword: String },
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::BlockedDomain(domain) => write!(f, "blocked domain {domain}"),
            ExclusionReason::Keyword { table, keyword } => write!(f, "keyword {keyword:?} from table {table}"),
        }
    }
}

/// Drops records from blocked domains or mentioning excluded keywords.
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    blocked_domains: Vec<String>,
    tables: Vec<KeywordTable>,
}

impl ExclusionFilter {
    pub fn new(config: &FilterConfig) -> Self {
        let blocked_domains = config
            .blocked_domains
            .iter()
            .map(|d| d.trim().trim_start_matches("www.").to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        Self {
            blocked_domains,
            tables: config.exclude.clone(),
        }
    }

    /// Why `record` should be dropped, if it should.
    pub fn check(&self, record: &DigestRecord) -> Option<ExclusionReason> {
        if let Some(host) = host_of(&record.record.url) {
            let blocked = self
                .blocked_domains
                .iter()
                .find(|d| host == **d || host.ends_with(&format!(".{d}")));
            if let Some(domain) = blocked {
                return Some(ExclusionReason::BlockedDomain(domain.clone()));
            }
        }

        let text = record.match_text();
        self.tables.iter().find_map(|table| {
            table
                .keywords
                .iter()
                .find(|k| !k.is_empty() && text.contains(k.as_str()))
                .map(|k| ExclusionReason::Keyword {
                    table: table.name.clone(),
                    keyword: k.clone(),
                })
        })
    }

    /// Keep the records no rule excludes, preserving order.
    #[instrument(level = "info", skip_all, fields(records = records.len()))]
    pub fn apply(&self, records: Vec<DigestRecord>) -> Vec<DigestRecord> {
        let before = records.len();
        let kept: Vec<DigestRecord> = records
            .into_iter()
            .filter(|record| match self.check(record) {
                Some(reason) => {
                    debug!(title = %truncate_for_log(&record.record.title, 80), %reason, "Excluded record");
                    false
                }
                None => true,
            })
            .collect();
        info!(kept = kept.len(), excluded = before - kept.len(), "Exclusion filters applied");
        kept
    }
}

/// Calendar-day window, evaluated in the anchor's timezone.
///
/// Records whose date is unknown are always outside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    /// First day kept.
    pub start: NaiveDate,
    /// First day no longer kept.
    pub end: NaiveDate,
    tz: FixedOffset,
}

impl DayWindow {
    pub fn new(config: DayWindowConfig, anchor: DateTime<FixedOffset>) -> Self {
        let anchor_date = anchor.date_naive();
        let start = anchor_date
            .checked_sub_days(Days::new(u64::from(config.days_back)))
            .unwrap_or(NaiveDate::MIN);
        let end = start
            .checked_add_days(Days::new(u64::from(config.span_days)))
            .unwrap_or(NaiveDate::MAX);
        Self {
            start,
            end,
            tz: *anchor.offset(),
        }
    }

    pub fn contains(&self, record: &DigestRecord) -> bool {
        record
            .resolved_published()
            .map(|dt| dt.with_timezone(&self.tz).date_naive())
            .is_some_and(|day| self.start <= day && day < self.end)
    }

    #[instrument(level = "info", skip_all, fields(start = %self.start, end = %self.end))]
    pub fn apply(&self, records: Vec<DigestRecord>) -> Vec<DigestRecord> {
        let before = records.len();
        let unknown = records.iter().filter(|r| r.date_unknown()).count();
        let kept: Vec<DigestRecord> = records.into_iter().filter(|r| self.contains(r)).collect();
        info!(
            kept = kept.len(),
            dropped = before - kept.len(),
            date_unknown = unknown,
            "Day window applied"
        );
        kept
    }
}
