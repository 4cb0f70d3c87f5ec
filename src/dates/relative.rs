//! Relative phrases such as "3시간 전", "2 days ago" or "어제".
//!
//! Phrases are resolved against the run's anchor instant, never wall-clock
//! time, so a batch started after midnight still lands on the intended day.

use crate::models::{DateCandidate, DateConfidence};
use chrono::{DateTime, Duration, FixedOffset, Months};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Which relative phrases are trusted for day-level filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeTimePolicy {
    /// Every unit from seconds to years is resolved.
    #[default]
    AnyUnit,
    /// Only "1 day ago" (and "어제" / "yesterday") is trusted; everything
    /// else is treated as too imprecise and rejected.
    OneDayOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl RelativeUnit {
    fn parse(unit: &str) -> Option<Self> {
        let unit = unit.to_lowercase();
        let unit = unit.trim_end_matches('s');
        Some(match unit {
            "초" | "second" | "sec" => RelativeUnit::Second,
            "분" | "minute" | "min" => RelativeUnit::Minute,
            "시간" | "hour" | "hr" => RelativeUnit::Hour,
            "일" | "day" => RelativeUnit::Day,
            "주" | "week" | "wk" => RelativeUnit::Week,
            "개월" | "달" | "month" => RelativeUnit::Month,
            "년" | "year" | "yr" => RelativeUnit::Year,
            _ => return None,
        })
    }
}

/// A parsed `<N> <unit> ago` phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativePhrase {
    pub amount: u32,
    pub unit: RelativeUnit,
}

impl RelativePhrase {
    fn is_one_day(&self) -> bool {
        self.amount == 1 && self.unit == RelativeUnit::Day
    }

    /// Subtract the phrase from `anchor`; `None` on calendar overflow.
    pub fn resolve(&self, anchor: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let n = i64::from(self.amount);
        match self.unit {
            RelativeUnit::Second => anchor.checked_sub_signed(Duration::try_seconds(n)?),
            RelativeUnit::Minute => anchor.checked_sub_signed(Duration::try_minutes(n)?),
            RelativeUnit::Hour => anchor.checked_sub_signed(Duration::try_hours(n)?),
            RelativeUnit::Day => anchor.checked_sub_signed(Duration::try_days(n)?),
            RelativeUnit::Week => anchor.checked_sub_signed(Duration::try_weeks(n)?),
            RelativeUnit::Month => anchor.checked_sub_months(Months::new(self.amount)),
            RelativeUnit::Year => anchor.checked_sub_months(Months::new(self.amount.checked_mul(12)?)),
        }
    }
}

static KOREAN_AGO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<n>\d+)\s*(?P<unit>초|분|시간|일|주|개월|달|년)\s*전\b").unwrap());

static ENGLISH_AGO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?P<n>\d+|an?|one)\s*(?P<unit>seconds?|secs?|minutes?|mins?|hours?|hrs?|days?|weeks?|wks?|months?|years?|yrs?)\s+ago\b",
    )
    .unwrap()
});

static ONE_DAY_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*(?:어제|하루\s*전|yesterday)\s*$").unwrap());

/// Find the first relative phrase in `text`.
///
/// "어제" and "yesterday" only count when they are the whole text, since in
/// running prose they usually describe the event rather than the article.
pub fn find_phrase(text: &str) -> Option<RelativePhrase> {
    if ONE_DAY_WORD_RE.is_match(text) {
        return Some(RelativePhrase {
            amount: 1,
            unit: RelativeUnit::Day,
        });
    }

    let korean = KOREAN_AGO_RE.captures(text).map(|c| (c.get(0).map_or(0, |m| m.start()), c));
    let english = ENGLISH_AGO_RE.captures(text).map(|c| (c.get(0).map_or(0, |m| m.start()), c));
    let (_, caps) = match (korean, english) {
        (Some(k), Some(e)) => {
            if k.0 <= e.0 {
                k
            } else {
                e
            }
        }
        (Some(k), None) => k,
        (None, Some(e)) => e,
        (None, None) => return None,
    };

    let amount = match caps["n"].to_lowercase().as_str() {
        "a" | "an" | "one" => 1,
        n => n.parse::<u32>().ok()?,
    };
    let unit = RelativeUnit::parse(&caps["unit"])?;
    Some(RelativePhrase { amount, unit })
}

/// Resolve the first relative phrase in `text` under `policy`.
pub fn resolve_relative(
    text: &str,
    anchor: DateTime<FixedOffset>,
    policy: RelativeTimePolicy,
) -> Option<DateCandidate> {
    let phrase = find_phrase(text)?;
    if policy == RelativeTimePolicy::OneDayOnly && !phrase.is_one_day() {
        tracing::debug!(?phrase, "Relative phrase rejected by one-day policy");
        return None;
    }
    phrase
        .resolve(anchor)
        .map(|value| DateCandidate::new(value, DateConfidence::RelativePhrase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn anchor() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 1, 12, 9, 0, 0)
            .unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, mi: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, mi, 0)
            .unwrap()
    }

    #[test]
    fn test_hours_ago_resolves_against_anchor() {
        let found = resolve_relative("3시간 전", anchor(), RelativeTimePolicy::AnyUnit).unwrap();
        assert_eq!(found.value, at(2026, 1, 12, 6, 0));
        assert_eq!(found.confidence, DateConfidence::RelativePhrase);
    }

    #[test]
    fn test_english_phrases() {
        let found = resolve_relative("Posted 45 mins ago", anchor(), RelativeTimePolicy::AnyUnit).unwrap();
        assert_eq!(found.value, at(2026, 1, 12, 8, 15));
        let found = resolve_relative("an hour ago", anchor(), RelativeTimePolicy::AnyUnit).unwrap();
        assert_eq!(found.value, at(2026, 1, 12, 8, 0));
    }

    #[test]
    fn test_months_and_years() {
        let found = resolve_relative("8개월 전", anchor(), RelativeTimePolicy::AnyUnit).unwrap();
        assert_eq!(found.value, at(2025, 5, 12, 9, 0));
        let found = resolve_relative("2 years ago", anchor(), RelativeTimePolicy::AnyUnit).unwrap();
        assert_eq!(found.value, at(2024, 1, 12, 9, 0));
    }

    #[test]
    fn test_one_day_policy_rejects_other_units() {
        assert!(resolve_relative("8개월 전", anchor(), RelativeTimePolicy::OneDayOnly).is_none());
        assert!(resolve_relative("3시간 전", anchor(), RelativeTimePolicy::OneDayOnly).is_none());
        assert!(resolve_relative("2일 전", anchor(), RelativeTimePolicy::OneDayOnly).is_none());
        let found = resolve_relative("1일 전", anchor(), RelativeTimePolicy::OneDayOnly).unwrap();
        assert_eq!(found.value, at(2026, 1, 11, 9, 0));
        let found = resolve_relative("어제", anchor(), RelativeTimePolicy::OneDayOnly).unwrap();
        assert_eq!(found.value, at(2026, 1, 11, 9, 0));
    }

    #[test]
    fn test_yesterday_word_only_counts_alone() {
        assert!(find_phrase("어제 열린 행사에서").is_none());
        assert!(find_phrase(" yesterday ").is_some());
    }

    #[test]
    fn test_no_phrase() {
        assert!(find_phrase("").is_none());
        assert!(find_phrase("2026.01.12").is_none());
        assert!(find_phrase("전체 3개 매장").is_none());
        assert!(find_phrase("3일 전체 일정").is_none());
    }
}
