use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::EarningsApiConfig;
use crate::models::{EarningsEvent, EarningsTiming};
use crate::service::analytics::parse_calendar_date;
use crate::service::finance::FinanceServiceError;
use crate::service::tickers::normalize_ticker;

#[derive(Debug, Deserialize)]
struct ApiDateGroup {
    #[serde(default, alias = "stocks", alias = "earnings", alias = "items")]
    stocks: Vec<ApiEarning>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiEarningsPayload {
    ByDate(HashMap<String, ApiDateGroup>),
    Flat(Vec<ApiEarning>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiTopLevel {
    Response(ApiResponse),
    ByDate(HashMap<String, ApiDateGroup>),
    Flat(Vec<ApiEarning>),
}

// `earnings` is required so date-keyed maps never match this shape
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct ApiResponse {
    success: Option<bool>,
    date_from: Option<String>,
    date_to: Option<String>,
    total_dates: Option<usize>,
    total_earnings: Option<usize>,
    earnings: ApiEarningsPayload,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiEarning {
    symbol: String,
    #[serde(default)]
    date: Option<String>,
    time: Option<String>,
}

/// Fetch earnings for a date range from the configured calendar API.
pub async fn fetch_earnings_range(
    http: &reqwest::Client,
    api: &EarningsApiConfig,
    from: NaiveDate,
    to: NaiveDate,
    default_timing: EarningsTiming,
) -> Result<Vec<EarningsEvent>, FinanceServiceError> {
    info!("Fetching earnings from {} to {}", from, to);

    let from_str = from.format("%Y-%m-%d").to_string();
    let to_str = to.format("%Y-%m-%d").to_string();

    let mut request = http
        .get(&api.url)
        .query(&[("fromDate", from_str.as_str()), ("toDate", to_str.as_str())]);
    if let Some(token) = api.token.as_deref() {
        request = request.header("Authorization", format!("Bearer {token}"));
    }

    let resp = request.send().await.map_err(|e| {
        warn!("Earnings API request failed: {}", e);
        FinanceServiceError::Http(format!("earnings request failed: {e}"))
    })?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .unwrap_or_else(|_| "unable to read body".to_string());
        warn!("Earnings API returned error status {}: {}", status, body);
        return Err(FinanceServiceError::Http(format!(
            "earnings api status {}: {}",
            status, body
        )));
    }

    let raw_bytes = resp.bytes().await.map_err(|e| {
        warn!("Failed to read earnings API body: {}", e);
        FinanceServiceError::Http(format!("earnings body read failed: {e}"))
    })?;

    let events = parse_earnings_payload(&raw_bytes, default_timing)?;
    info!("Built {} earnings events from calendar API", events.len());
    Ok(events)
}

/// Decode any of the calendar API's payload shapes into events sorted by
/// date then symbol. Items with an unparseable date are skipped.
pub fn parse_earnings_payload(
    raw: &[u8],
    default_timing: EarningsTiming,
) -> Result<Vec<EarningsEvent>, FinanceServiceError> {
    let parsed: ApiTopLevel = serde_json::from_slice(raw).map_err(|e| {
        let preview = String::from_utf8_lossy(&raw[..raw.len().min(500)]);
        warn!(
            "Failed to parse earnings API response: {}; body preview: {}",
            e, preview
        );
        FinanceServiceError::Parse(format!("earnings parse failed: {e}"))
    })?;

    let payload = match parsed {
        ApiTopLevel::Response(body) => {
            if body.success == Some(false) {
                warn!("Earnings API returned success=false");
                return Err(FinanceServiceError::Http(
                    "earnings api returned success=false".into(),
                ));
            }
            if let Some(total) = body.total_earnings {
                info!("Earnings API reports {} events", total);
            }
            body.earnings
        }
        ApiTopLevel::ByDate(map) => ApiEarningsPayload::ByDate(map),
        ApiTopLevel::Flat(list) => ApiEarningsPayload::Flat(list),
    };

    let mut events = Vec::new();
    match payload {
        ApiEarningsPayload::ByDate(map) => {
            for (date_str, group) in map {
                for item in &group.stocks {
                    let date = item.date.as_deref().unwrap_or(&date_str);
                    push_event(&mut events, item, date, default_timing);
                }
            }
        }
        ApiEarningsPayload::Flat(list) => {
            for item in &list {
                push_event(&mut events, item, item.date.as_deref().unwrap_or(""), default_timing);
            }
        }
    }

    events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.symbol.cmp(&b.symbol)));
    Ok(events)
}

fn push_event(
    events: &mut Vec<EarningsEvent>,
    item: &ApiEarning,
    date_str: &str,
    default_timing: EarningsTiming,
) {
    let Some(symbol) = normalize_ticker(&item.symbol) else {
        return;
    };
    let date = match parse_calendar_date(date_str) {
        Ok(date) => date,
        Err(err) => {
            warn!("Skipping {} earnings item: {}", symbol, err);
            return;
        }
    };

    events.push(EarningsEvent {
        symbol,
        date,
        timing: classify_session(item.time.as_deref(), default_timing),
        time_of_day: item.time.clone(),
    });
}

/// Map a provider's free-form time-of-day to a session.
///
/// `None` (the provider said nothing) yields `default_timing`; text that is
/// present but unrecognized yields [`EarningsTiming::Unknown`].
pub fn classify_session(time: Option<&str>, default_timing: EarningsTiming) -> EarningsTiming {
    let Some(raw) = time else {
        return default_timing;
    };
    let t = raw.trim().to_ascii_lowercase().replace(['-', '_'], " ");
    if t.is_empty() {
        return default_timing;
    }

    if t.contains("bmo")
        || t.contains("before market")
        || t.contains("before open")
        || t.contains("pre")
    {
        return EarningsTiming::BeforeOpen;
    }
    if t.contains("amc")
        || t.contains("after close")
        || t.contains("after market")
        || t.contains("after hours")
        || t.contains("post")
    {
        return EarningsTiming::AfterClose;
    }

    if let Some(hour) = parse_hour_prefix(&t) {
        let pm = t.ends_with("pm") && hour < 12;
        let hour = if pm { hour + 12 } else { hour };
        if hour >= 15 {
            return EarningsTiming::AfterClose;
        }
        if hour <= 11 {
            return EarningsTiming::BeforeOpen;
        }
    }

    if t.ends_with("am") {
        return EarningsTiming::BeforeOpen;
    }
    if t.ends_with("pm") {
        return EarningsTiming::AfterClose;
    }

    EarningsTiming::Unknown
}

fn parse_hour_prefix(s: &str) -> Option<u32> {
    let mut digits = String::new();
    for ch in s.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            if digits.len() >= 2 {
                break;
            }
        } else if ch == ':' || !digits.is_empty() {
            break;
        }
    }

    if digits.is_empty() {
        return None;
    }
    digits.parse::<u32>().ok()
}

/// Load events from a `ticker,date[,timing]` CSV. A header row is optional;
/// malformed rows are skipped.
pub fn load_earnings_file(
    path: &Path,
    default_timing: EarningsTiming,
) -> Result<Vec<EarningsEvent>, FinanceServiceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut events = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                warn!("{}: row {} skipped: {err}", path.display(), line + 1);
                continue;
            }
        };
        let symbol = record.get(0).and_then(normalize_ticker);
        let date_raw = record.get(1).unwrap_or("");

        let Some(symbol) = symbol else {
            continue;
        };
        let date = match parse_calendar_date(date_raw) {
            Ok(date) => date,
            Err(err) => {
                // first row may be a header
                if line > 0 {
                    warn!("{}: row {} skipped: {err}", path.display(), line + 1);
                }
                continue;
            }
        };

        let timing = match record.get(2).filter(|t| !t.is_empty()) {
            Some(raw) => raw.parse::<EarningsTiming>().unwrap_or_else(|_| {
                classify_session(Some(raw), default_timing)
            }),
            None => default_timing,
        };

        events.push(EarningsEvent {
            symbol,
            date,
            timing,
            time_of_day: record.get(2).filter(|t| !t.is_empty()).map(str::to_string),
        });
    }

    info!("Loaded {} earnings events from {}", events.len(), path.display());
    Ok(events)
}

/// Load one symbol's announcement dates from a `date[,timing]` file, one per
/// line. Unparseable lines are skipped.
pub fn load_event_dates(
    path: &Path,
    symbol: &str,
    default_timing: EarningsTiming,
) -> Result<Vec<EarningsEvent>, FinanceServiceError> {
    // Dates like "April 17, 2025" contain a comma, so lines are split by hand.
    let content = std::fs::read(path)?;

    let mut events = Vec::new();
    for (line_no, raw) in content.split(|b| *b == b'\n').enumerate() {
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim(),
            Err(err) => {
                warn!("{}: line {} skipped: {err}", path.display(), line_no + 1);
                continue;
            }
        };
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (date_part, timing) = split_trailing_timing(line, default_timing);
        match parse_calendar_date(date_part) {
            Ok(date) => events.push(EarningsEvent::new(symbol, date, timing)),
            Err(err) => warn!("{}: line {} skipped: {err}", path.display(), line_no + 1),
        }
    }

    Ok(events)
}

/// Split `"April 17, 2025, bmo"` into the date text and its timing.
fn split_trailing_timing(line: &str, default_timing: EarningsTiming) -> (&str, EarningsTiming) {
    if let Some((head, tail)) = line.rsplit_once(',') {
        if let Ok(timing) = tail.trim().parse::<EarningsTiming>() {
            if !tail.trim().is_empty() {
                return (head.trim(), timing);
            }
        }
    }
    (line, default_timing)
}

/// Keep one symbol's events dated within `[since, until]`, newest first,
/// at most `limit` of them. Duplicate dates collapse to the first seen.
pub fn select_recent(
    events: &[EarningsEvent],
    symbol: &str,
    since: NaiveDate,
    until: NaiveDate,
    limit: usize,
) -> Vec<EarningsEvent> {
    let mut selected: Vec<EarningsEvent> = Vec::new();
    for event in events {
        if !event.symbol.eq_ignore_ascii_case(symbol) || event.date < since || event.date > until {
            continue;
        }
        if selected.iter().any(|e| e.date == event.date) {
            continue;
        }
        selected.push(event.clone());
    }

    selected.sort_by(|a, b| b.date.cmp(&a.date));
    selected.truncate(limit);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_prefix_reads_leading_digits() {
        assert_eq!(parse_hour_prefix("16:00"), Some(16));
        assert_eq!(parse_hour_prefix("7:30 am"), Some(7));
        assert_eq!(parse_hour_prefix("time not supplied"), None);
    }

    #[test]
    fn by_date_payload_uses_group_key_for_dates() {
        let raw = br#"{
            "success": true,
            "total_earnings": 2,
            "earnings": {
                "2024-07-18": {"stocks": [{"symbol": "nflx", "time": "amc"}]},
                "2024-07-23": {"stocks": [{"symbol": "KO", "time": "bmo"}]}
            }
        }"#;

        let events = parse_earnings_payload(raw, EarningsTiming::AfterClose).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].symbol, "NFLX");
        assert_eq!(events[0].timing, EarningsTiming::AfterClose);
        assert_eq!(events[1].symbol, "KO");
        assert_eq!(events[1].timing, EarningsTiming::BeforeOpen);
    }

    #[test]
    fn flat_payload_skips_bad_dates() {
        let raw = br#"[
            {"symbol": "AXP", "date": "2024-07-19", "time": null},
            {"symbol": "GE", "date": "soon", "time": "bmo"}
        ]"#;

        let events = parse_earnings_payload(raw, EarningsTiming::AfterClose).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].symbol, "AXP");
        assert_eq!(events[0].timing, EarningsTiming::AfterClose);
    }

    #[test]
    fn trailing_timing_is_split_from_long_dates() {
        let (date, timing) = split_trailing_timing("April 17, 2025, bmo", EarningsTiming::AfterClose);
        assert_eq!(date, "April 17, 2025");
        assert_eq!(timing, EarningsTiming::BeforeOpen);

        let (date, timing) = split_trailing_timing("April 17, 2025", EarningsTiming::AfterClose);
        assert_eq!(date, "April 17, 2025");
        assert_eq!(timing, EarningsTiming::AfterClose);
    }

    #[test]
    fn unsuccessful_response_is_an_error() {
        let raw = br#"{"success": false, "earnings": []}"#;
        assert!(matches!(
            parse_earnings_payload(raw, EarningsTiming::AfterClose),
            Err(FinanceServiceError::Http(_))
        ));

        let raw = br#"{"success": false}"#;
        assert!(parse_earnings_payload(raw, EarningsTiming::AfterClose).is_err());
    }

    #[test]
    fn response_envelope_tolerates_extra_keys() {
        let raw = br#"{
            "success": true,
            "message": "ok",
            "timestamp": 1721309400,
            "earnings": {
                "2024-07-18": {"stocks": [{"symbol": "NFLX", "time": "amc"}]}
            }
        }"#;

        let events = parse_earnings_payload(raw, EarningsTiming::Unknown).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].symbol, "NFLX");
        assert_eq!(events[0].date, NaiveDate::from_ymd_opt(2024, 7, 18).unwrap());
        assert_eq!(events[0].timing, EarningsTiming::AfterClose);
    }
}
