use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::models::{PriceBar, PriceSeries};
use crate::service::analytics::dates::{parse_volume, start_of_day_epoch};
use crate::service::analytics::{parse_calendar_date, parse_price, trading_date};
use crate::service::finance::FinanceServiceError;

const CHART_API_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Header written by [`save_history_csv`].
pub const HISTORY_HEADER: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    exchange_timezone_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Fetch daily bars, retrying failed or empty responses with a `2^attempt`
/// second backoff.
pub async fn fetch_price_history(
    http: &reqwest::Client,
    symbol: &str,
    from: NaiveDate,
    to: NaiveDate,
    exchange_tz: Tz,
    max_retries: u32,
) -> Result<PriceSeries, FinanceServiceError> {
    let attempts = max_retries.max(1);
    let mut last_err = FinanceServiceError::NotFound(symbol.to_string());

    for attempt in 0..attempts {
        if attempt > 0 {
            let wait = 2u64.pow(attempt);
            info!("{symbol}: waiting {wait}s before retry {}/{attempts}", attempt + 1);
            sleep(StdDuration::from_secs(wait)).await;
        }

        match fetch_chart_once(http, symbol, from, to, exchange_tz).await {
            Ok(series) if !series.is_empty() => {
                info!(
                    "{symbol}: fetched {} daily bars ({} to {})",
                    series.len(),
                    series.first().map(|b| b.date).unwrap_or(from),
                    series.last().map(|b| b.date).unwrap_or(to),
                );
                return Ok(series);
            }
            Ok(_) => {
                warn!("{symbol}: no historical data (attempt {}/{attempts})", attempt + 1);
                last_err = FinanceServiceError::NotFound(symbol.to_string());
            }
            Err(err) => {
                warn!("{symbol}: history fetch failed (attempt {}/{attempts}): {err}", attempt + 1);
                last_err = err;
            }
        }
    }

    Err(last_err)
}

async fn fetch_chart_once(
    http: &reqwest::Client,
    symbol: &str,
    from: NaiveDate,
    to: NaiveDate,
    exchange_tz: Tz,
) -> Result<PriceSeries, FinanceServiceError> {
    let url = format!("{CHART_API_URL}/{}", symbol.to_uppercase());
    let period1 = start_of_day_epoch(from).to_string();
    // period2 is exclusive
    let period2 = start_of_day_epoch(to + Duration::days(1)).to_string();

    debug!("Requesting chart {url} period1={period1} period2={period2}");

    let resp = http
        .get(&url)
        .query(&[
            ("period1", period1.as_str()),
            ("period2", period2.as_str()),
            ("interval", "1d"),
            ("includePrePost", "false"),
            ("events", "div,split"),
        ])
        .send()
        .await
        .map_err(|e| FinanceServiceError::Http(format!("chart request failed: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .unwrap_or_else(|_| "unable to read body".to_string());
        return Err(FinanceServiceError::Http(format!(
            "chart api status {}: {}",
            status,
            body.chars().take(300).collect::<String>()
        )));
    }

    let raw_bytes = resp
        .bytes()
        .await
        .map_err(|e| FinanceServiceError::Http(format!("chart body read failed: {e}")))?;

    parse_chart_payload(&raw_bytes, symbol, exchange_tz)
}

/// Turn a chart response into a series, dropping bars without a close.
///
/// The exchange timezone reported by the payload wins over `default_tz`.
pub fn parse_chart_payload(
    raw: &[u8],
    symbol: &str,
    default_tz: Tz,
) -> Result<PriceSeries, FinanceServiceError> {
    let envelope: ChartEnvelope = serde_json::from_slice(raw).map_err(|e| {
        let preview = String::from_utf8_lossy(&raw[..raw.len().min(300)]);
        warn!("Failed to parse chart response: {e}; body preview: {preview}");
        FinanceServiceError::Parse(format!("chart parse failed: {e}"))
    })?;

    if let Some(err) = envelope.chart.error {
        let code = err.code.unwrap_or_default();
        if code.eq_ignore_ascii_case("not found") {
            return Err(FinanceServiceError::NotFound(symbol.to_string()));
        }
        return Err(FinanceServiceError::Http(format!(
            "chart api error {}: {}",
            code,
            err.description.unwrap_or_default()
        )));
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(PriceSeries::default());
    };

    let tz = result
        .meta
        .as_ref()
        .and_then(|m| m.exchange_timezone_name.as_deref())
        .and_then(|name| name.parse::<Tz>().ok())
        .unwrap_or(default_tz);

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let value_at = |values: &[Option<f64>], idx: usize| values.get(idx).copied().flatten();

    // Keyed by date so a trailing live bar replaces the session it duplicates.
    let mut by_date: BTreeMap<NaiveDate, PriceBar> = BTreeMap::new();
    let mut skipped = 0usize;

    for (idx, ts) in result.timestamp.iter().enumerate() {
        let Some(date) = trading_date(*ts, tz) else {
            skipped += 1;
            continue;
        };
        let Some(close) = value_at(&quote.close, idx).filter(|c| c.is_finite() && *c > 0.0) else {
            skipped += 1;
            continue;
        };

        by_date.insert(
            date,
            PriceBar {
                date,
                open: value_at(&quote.open, idx),
                high: value_at(&quote.high, idx),
                low: value_at(&quote.low, idx),
                close,
                volume: value_at(&quote.volume, idx)
                    .filter(|v| *v >= 0.0)
                    .map(|v| v.round() as u64),
            },
        );
    }

    if skipped > 0 {
        warn!("{symbol}: skipped {skipped} chart rows without a usable close");
    }

    Ok(PriceSeries::from_bars(by_date.into_values().collect())?)
}

/// Load a history CSV written by this tool or scraped from the Yahoo
/// history table (`Jul 18, 2024`, `1,234.56`). Row order does not matter.
pub fn load_history_csv(path: &Path) -> Result<PriceSeries, FinanceServiceError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase().replace([' ', '*'], "_"))
        .collect();
    let col = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.trim_end_matches('_') == *n))
    };

    let date_col = col(&["date"])
        .ok_or_else(|| FinanceServiceError::Parse(format!("{}: no Date column", path.display())))?;
    let close_col = col(&["close"])
        .ok_or_else(|| FinanceServiceError::Parse(format!("{}: no Close column", path.display())))?;
    let open_col = col(&["open"]);
    let high_col = col(&["high"]);
    let low_col = col(&["low"]);
    let volume_col = col(&["volume"]);

    let mut bars = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                warn!("{}: row {} skipped: {err}", path.display(), line + 2);
                continue;
            }
        };
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");

        let date = match parse_calendar_date(cell(Some(date_col))) {
            Ok(date) => date,
            Err(err) => {
                warn!("{}: row {} skipped: {err}", path.display(), line + 2);
                continue;
            }
        };
        let Some(close) = parse_price(cell(Some(close_col))) else {
            // dividend and split rows carry no close
            debug!("{}: row {} has no close, skipped", path.display(), line + 2);
            continue;
        };

        bars.push(PriceBar {
            date,
            open: parse_price(cell(open_col)),
            high: parse_price(cell(high_col)),
            low: parse_price(cell(low_col)),
            close,
            volume: parse_volume(cell(volume_col)),
        });
    }

    Ok(PriceSeries::from_bars(bars)?)
}

/// Write a series as `Date,Open,High,Low,Close,Volume` with ISO dates.
pub fn save_history_csv(path: &Path, series: &PriceSeries) -> Result<(), FinanceServiceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HISTORY_HEADER)?;

    let opt = |v: Option<f64>| v.map(|v| format!("{v:.4}")).unwrap_or_default();
    for bar in series.bars() {
        writer.write_record([
            bar.date.format("%Y-%m-%d").to_string(),
            opt(bar.open),
            opt(bar.high),
            opt(bar.low),
            format!("{:.4}", bar.close),
            bar.volume.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
