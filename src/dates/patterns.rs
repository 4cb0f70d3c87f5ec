//! Absolute-date text patterns shared by the label and fallback scans.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// `2026.01.12`, `2026-1-12`, `2026/01/12`, `2026. 1. 12.` or `2026년 1월 12일`,
/// optionally followed by a time of day such as `오후 3:05` or `15:05:30`.
pub(crate) const ABSOLUTE_DATE: &str = concat!(
    r"(?:(?P<y>\d{4})\s*[.\-/]\s*(?P<m>\d{1,2})\s*[.\-/]\s*(?P<d>\d{1,2})\.?",
    r"|(?P<ky>\d{4})\s*년\s*(?P<km>\d{1,2})\s*월\s*(?P<kd>\d{1,2})\s*일)",
    r"(?:\s*(?P<ampm>오전|오후|[AaPp][Mm])?\s*(?P<hh>\d{1,2}):(?P<mi>\d{2})(?::(?P<ss>\d{2}))?)?",
);

pub(crate) static ABSOLUTE_DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(ABSOLUTE_DATE).unwrap());

static WHOLE_ABSOLUTE_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^\s*{ABSOLUTE_DATE}\s*$")).unwrap());

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M%:z",
    "%a, %d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y%m%d%H%M%S",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d", "%Y%m%d"];

/// Parse a machine-readable or lightly formatted timestamp.
///
/// Values with an offset keep their instant and are moved into `tz`; values
/// without one are read as local time in `tz`; bare dates become local
/// midnight. Returns `None` rather than guessing.
pub fn parse_flexible(raw: &str, tz: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(tz));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(tz));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(tz));
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return tz.from_local_datetime(&ndt).single();
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return local_midnight(date, tz);
        }
    }

    WHOLE_ABSOLUTE_DATE_RE
        .captures(s)
        .and_then(|caps| datetime_from_captures(&caps, tz))
}

/// Build a local instant from an [`ABSOLUTE_DATE`] match.
///
/// An invalid calendar date (month 13, February 30) yields `None`; a missing
/// or invalid time of day yields midnight.
pub(crate) fn datetime_from_captures(caps: &Captures<'_>, tz: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    let num = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u32>().ok());

    let (year, month, day) = match (num("y"), num("m"), num("d")) {
        (Some(y), Some(m), Some(d)) => (y, m, d),
        _ => (num("ky")?, num("km")?, num("kd")?),
    };
    let date = NaiveDate::from_ymd_opt(year as i32, month, day)?;

    let time = match (num("hh"), num("mi")) {
        (Some(hour), Some(minute)) => {
            let meridiem = caps.name("ampm").map(|m| m.as_str().to_lowercase());
            let hour = match meridiem.as_deref() {
                Some("오후") | Some("pm") if hour < 12 => hour + 12,
                Some("오전") | Some("am") if hour == 12 => 0,
                _ => hour,
            };
            NaiveTime::from_hms_opt(hour, minute, num("ss").unwrap_or(0)).unwrap_or(NaiveTime::MIN)
        }
        _ => NaiveTime::MIN,
    };

    tz.from_local_datetime(&date.and_time(time)).single()
}

pub(crate) fn local_midnight(date: NaiveDate, tz: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    tz.from_local_datetime(&date.and_time(NaiveTime::MIN)).single()
}
