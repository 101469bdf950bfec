use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

pub const SHORT_DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub const SHORT_MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub const QUARTER_NAMES: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];

const SECONDS_PER_DAY: i64 = 86_400;

/// Formats tried, in order, for timestamps that are not RFC 3339.
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an order/student timestamp into UTC.
///
/// Accepts RFC 3339, Postgres-style `2024-03-01 10:15:00+00`, naive
/// date-times (assumed UTC) and bare `YYYY-MM-DD` dates (midnight UTC).
/// Returns `None` for anything else.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ndt.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

/// Serde adapter: unparseable or non-string timestamps become `None`
/// instead of failing the whole document.
pub fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => parse_timestamp(&s),
        _ => None,
    })
}

/// Weekday index with Sunday = 0.
pub fn weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_sunday() as usize
}

/// Zero-based month index (January = 0).
pub fn month_index(date: NaiveDate) -> usize {
    date.month0() as usize
}

/// Zero-based quarter index (Q1 = 0).
pub fn quarter_index(date: NaiveDate) -> usize {
    month_index(date) / 3
}

/// Month index immediately before `month` (0 wraps to 11).
pub fn previous_month(month: usize) -> usize {
    (month + 11) % 12
}

/// The instant `months` calendar months before `as_of`, clamped to the
/// earliest representable instant.
pub fn months_before(as_of: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    as_of
        .checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Elapsed days between two instants, fractional.
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> Decimal {
    Decimal::from((to - from).num_seconds()) / Decimal::from(SECONDS_PER_DAY)
}

/// ISO week label, e.g. `2024-W07`.
pub fn iso_week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// A calendar year-month bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Short label such as `Mar 2024`.
    pub fn short_label(&self) -> String {
        let idx = (self.month.clamp(1, 12) - 1) as usize;
        format!("{} {}", SHORT_MONTH_NAMES[idx], self.year)
    }

    /// The `n`th month before this one.
    pub fn minus(&self, n: u32) -> Self {
        let total = self.year * 12 + self.month as i32 - 1 - n as i32;
        YearMonth {
            year: total.div_euclid(12),
            month: (total.rem_euclid(12) + 1) as u32,
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_rfc3339_with_offset_converts_to_utc() {
        let ts = parse_timestamp("2024-03-01T23:30:00-02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 2, 1, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_postgres_style() {
        let ts = parse_timestamp("2024-03-01 10:15:00.123+00").unwrap();
        assert_eq!(ts.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_parse_bare_date_and_naive() {
        let d = parse_timestamp("2024-12-25").unwrap();
        assert_eq!(d, Utc.with_ymd_and_hms(2024, 12, 25, 0, 0, 0).unwrap());
        let n = parse_timestamp("2024-12-25T08:00:00").unwrap();
        assert_eq!(n, Utc.with_ymd_and_hms(2024, 12, 25, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2024-13-40").is_none());
    }

    #[test]
    fn test_weekday_sunday_is_zero() {
        // 2024-03-03 was a Sunday
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        assert_eq!(weekday_index(sunday), 0);
        assert_eq!(weekday_index(sunday.succ_opt().unwrap()), 1);
    }

    #[test]
    fn test_previous_month_wraps() {
        assert_eq!(previous_month(0), 11);
        assert_eq!(previous_month(5), 4);
    }

    #[test]
    fn test_months_before_clamps_day() {
        let as_of = Utc.with_ymd_and_hms(2024, 5, 31, 12, 0, 0).unwrap();
        let cutoff = months_before(as_of, 3);
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_year_month_minus_crosses_year() {
        let ym = YearMonth { year: 2024, month: 2 };
        assert_eq!(ym.minus(3), YearMonth { year: 2023, month: 11 });
        assert_eq!(ym.to_string(), "2024-02");
        assert_eq!(ym.short_label(), "Feb 2024");
    }

    #[test]
    fn test_days_between_fractional() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap();
        assert_eq!(days_between(a, b), Decimal::new(15, 1));
    }
}
