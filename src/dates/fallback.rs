//! Last-resort scan: every absolute date in the text, closest to "today" wins.

use super::YearWindow;
use super::patterns::{ABSOLUTE_DATE_RE, datetime_from_captures};
use crate::models::{DateCandidate, DateConfidence};
use chrono::{FixedOffset, NaiveDate};

/// Score every absolute-date substring by `1 / (1 + |days from today|)`
/// and keep the best one; ties go to the earliest occurrence.
pub fn scan_closest(
    text: &str,
    today: NaiveDate,
    tz: &FixedOffset,
    window: &YearWindow,
) -> Option<DateCandidate> {
    let mut best: Option<(f64, DateCandidate)> = None;
    for caps in ABSOLUTE_DATE_RE.captures_iter(text) {
        let Some(value) = datetime_from_captures(&caps, tz) else {
            continue;
        };
        if !window.contains(&value) {
            continue;
        }
        let distance = (value.date_naive() - today).num_days().unsigned_abs();
        let score = 1.0 / (1.0 + distance as f64);
        if best.as_ref().is_none_or(|(top, _)| score > *top) {
            best = Some((score, DateCandidate::new(value, DateConfidence::FallbackScan)));
        }
    }
    best.map(|(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn kst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 12).unwrap()
    }

    fn window() -> YearWindow {
        YearWindow::new(2000, 2027)
    }

    #[test]
    fn test_closest_date_wins() {
        let text = "2019.03.01 창립 이후 2026.01.11 신제품 발표, 2026.02.01 출시 예정";
        let found = scan_closest(text, today(), &kst(), &window()).unwrap();
        assert_eq!(found.value, kst().with_ymd_and_hms(2026, 1, 11, 0, 0, 0).unwrap());
        assert_eq!(found.confidence, DateConfidence::FallbackScan);
    }

    #[test]
    fn test_ties_keep_first_occurrence() {
        let text = "2026-01-13 그리고 2026-01-11";
        let found = scan_closest(text, today(), &kst(), &window()).unwrap();
        assert_eq!(found.value.date_naive(), NaiveDate::from_ymd_opt(2026, 1, 13).unwrap());
    }

    #[test]
    fn test_nothing_valid() {
        assert!(scan_closest("날짜 없음", today(), &kst(), &window()).is_none());
        assert!(scan_closest("1998.01.01 / 2026.13.40", today(), &kst(), &window()).is_none());
    }
}
