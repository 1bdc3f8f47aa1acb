//! Calendar-date normalization shared by every ingestion path.
//!
//! Provider timestamps, scraped table dates and hand-typed event dates all
//! end up as timezone-naive `NaiveDate`s in the exchange's local calendar
//! before any calculation sees them.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Formats accepted for calendar dates, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%b %d, %Y", "%B %d, %Y", "%m/%d/%Y", "%Y/%m/%d"];

#[derive(Debug, Error, PartialEq)]
#[error("could not parse date '{0}'")]
pub struct DateParseError(pub String);

/// Exchange-local trading date for a provider timestamp (epoch seconds).
pub fn trading_date(epoch_seconds: i64, exchange_tz: Tz) -> Option<NaiveDate> {
    let utc = DateTime::<Utc>::from_timestamp(epoch_seconds, 0)?;
    Some(utc.with_timezone(&exchange_tz).date_naive())
}

/// Today's date on the exchange calendar.
pub fn exchange_today(exchange_tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&exchange_tz).date_naive()
}

/// Parse a calendar date in any supported spelling.
///
/// RFC 3339 timestamps keep their own date part; no timezone shift is
/// applied, matching how providers stamp announcement dates.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = raw.trim().trim_matches('"');

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(date);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.date_naive());
    }

    // "2024-07-18 00:00:00-04:00" style index dumps
    if let Some(prefix) = trimmed.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Ok(date);
        }
    }

    Err(DateParseError(raw.to_string()))
}

/// Parse a price cell such as `1,234.56` or `$643.04`. Dashes and blanks
/// mean "no value".
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a volume cell; accepts thousands separators and a trailing `.0`.
pub fn parse_volume(raw: &str) -> Option<u64> {
    let value = parse_price(raw)?;
    (value >= 0.0).then(|| value.round() as u64)
}

/// Start and end of a trailing window of `months` approximate months
/// (31 days each) ending on `today`.
pub fn history_window(today: NaiveDate, months: u32) -> (NaiveDate, NaiveDate) {
    let start = today - Duration::days(i64::from(months) * 31);
    (start, today)
}

/// Epoch seconds for midnight UTC at the start of `date`.
pub fn start_of_day_epoch(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| Utc.from_utc_datetime(&dt).timestamp())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn market_open_timestamp_maps_to_new_york_date() {
        // 2024-07-19 13:30 UTC is 09:30 in New York
        let ts = 1_721_395_800;
        assert_eq!(trading_date(ts, chrono_tz::America::New_York), Some(d(2024, 7, 19)));
    }

    #[test]
    fn late_utc_timestamp_stays_on_previous_local_day() {
        // 2024-07-19 02:00 UTC is still July 18 in New York
        let ts = 1_721_354_400;
        assert_eq!(trading_date(ts, chrono_tz::America::New_York), Some(d(2024, 7, 18)));
    }

    #[test]
    fn start_of_day_is_midnight_utc() {
        assert_eq!(start_of_day_epoch(d(1970, 1, 2)), 86_400);
    }
}
