//! Date parsing with prioritized candidate formats
//!
//! Providers print dates in whatever shape their front-end prefers. Each
//! parser tries its candidates in order and gives up with `None`; callers
//! keep the raw string in that case.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};

/// Date-time shapes seen on social front-ends
const SOCIAL_DATETIME_FORMATS: &[&str] = &[
    "%b %d, %Y · %I:%M %p UTC",
    "%b %d, %Y · %I:%M %p",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Date-only shapes seen on social front-ends
const SOCIAL_DATE_FORMATS: &[&str] = &["%d %b %Y", "%b %d, %Y", "%d %B %Y", "%B %d, %Y", "%Y-%m-%d"];

/// Date shapes printed by WHOIS servers
const WHOIS_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%d-%m-%Y", "%Y.%m.%d", "%d.%m.%Y", "%Y/%m/%d", "%d/%m/%Y", "%d-%b-%Y",
];

/// A parsed point in time; the time of day is only known for some formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedWhen {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

impl ParsedWhen {
    /// Full English weekday name, e.g. "Monday"
    pub fn weekday_name(&self) -> String {
        let name = match self.date.weekday() {
            chrono::Weekday::Mon => "Monday",
            chrono::Weekday::Tue => "Tuesday",
            chrono::Weekday::Wed => "Wednesday",
            chrono::Weekday::Thu => "Thursday",
            chrono::Weekday::Fri => "Friday",
            chrono::Weekday::Sat => "Saturday",
            chrono::Weekday::Sun => "Sunday",
        };
        name.to_string()
    }

    /// Hour of day, when a time was parsed
    pub fn hour(&self) -> Option<u32> {
        self.time.map(|t| t.hour())
    }

    pub fn to_datetime(&self) -> NaiveDateTime {
        self.date.and_time(self.time.unwrap_or_default())
    }
}

/// Parses a date as shown on social front-ends
pub fn parse_social_date(raw: &str) -> Option<ParsedWhen> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in SOCIAL_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ParsedWhen {
                date: dt.date(),
                time: Some(dt.time()),
            });
        }
    }

    for format in SOCIAL_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(ParsedWhen { date, time: None });
        }
    }

    None
}

/// Normalizes a WHOIS date to `YYYY-MM-DD`
///
/// Accepts RFC 3339 timestamps and the date shapes registries commonly
/// print, with or without a trailing time component.
pub fn normalize_whois_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.format("%Y-%m-%d").to_string());
    }

    // Drop any time component ("2020-01-01T00:00:00Z", "2020-01-01 12:00:00")
    let first = raw.split_whitespace().next().unwrap_or(raw);
    let date_part = match first.char_indices().find(|(_, c)| *c == 'T') {
        Some((idx, _)) if first[..idx].ends_with(|c: char| c.is_ascii_digit()) => &first[..idx],
        _ => first,
    };

    WHOIS_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
}

/// Converts a Unix timestamp (seconds, possibly fractional) to UTC
pub fn from_unix(seconds: f64) -> Option<NaiveDateTime> {
    if !seconds.is_finite() {
        return None;
    }
    DateTime::<Utc>::from_timestamp(seconds.trunc() as i64, 0).map(|dt| dt.naive_utc())
}
