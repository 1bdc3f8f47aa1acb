use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::warn;

use crate::models::EarningsTiming;
use crate::service::analytics::{parse_calendar_date, TRADING_DAYS_PER_YEAR};

/// Remote earnings calendar endpoint. Disabled unless a URL is configured.
#[derive(Debug, Clone)]
pub struct EarningsApiConfig {
    pub url: String,
    pub token: Option<String>,
}

/// Runtime settings, read from the environment (after `.env` is loaded) and
/// then overridden by command line flags.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub playbook_path: PathBuf,
    pub playbook_sheet: String,
    /// Fixed ticker list used when no playbook day or CLI tickers are given.
    pub tickers: Vec<String>,
    pub history_months: u32,
    pub output_dir: PathBuf,
    /// Timing assumed when the earnings source gives no signal.
    pub default_timing: EarningsTiming,
    pub earnings_since: Option<NaiveDate>,
    pub earnings_limit: usize,
    pub earnings_file: Option<PathBuf>,
    pub trailing_days: usize,
    pub concurrency: usize,
    pub max_retries: u32,
    pub proxy: Option<String>,
    pub earnings_api: Option<EarningsApiConfig>,
    pub exchange_tz: Tz,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            playbook_path: PathBuf::from("Playbook.xlsx"),
            playbook_sheet: "Playbook".to_string(),
            tickers: Vec::new(),
            history_months: 13,
            output_dir: PathBuf::from("."),
            default_timing: EarningsTiming::AfterClose,
            earnings_since: None,
            earnings_limit: 4,
            earnings_file: None,
            trailing_days: TRADING_DAYS_PER_YEAR,
            concurrency: 4,
            max_retries: 3,
            proxy: None,
            earnings_api: None,
            exchange_tz: chrono_tz::America::New_York,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let earnings_api = read_var("EARNINGS_API_URL").map(|url| EarningsApiConfig {
            url,
            token: read_var("EARNINGS_API_TOKEN"),
        });

        Self {
            playbook_path: read_var("PLAYBOOK_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.playbook_path),
            playbook_sheet: read_var("PLAYBOOK_SHEET").unwrap_or(defaults.playbook_sheet),
            tickers: read_var("TICKERS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            history_months: parse_var("HISTORY_MONTHS").unwrap_or(defaults.history_months),
            output_dir: read_var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            default_timing: parse_var("EARNINGS_DEFAULT_TIMING")
                .unwrap_or(defaults.default_timing),
            earnings_since: read_var("EARNINGS_SINCE").and_then(|v| match parse_calendar_date(&v) {
                Ok(date) => Some(date),
                Err(err) => {
                    warn!("EARNINGS_SINCE ignored: {err}");
                    None
                }
            }),
            earnings_limit: parse_var("EARNINGS_LIMIT").unwrap_or(defaults.earnings_limit),
            earnings_file: read_var("EARNINGS_FILE").map(PathBuf::from),
            trailing_days: parse_var("TRAILING_DAYS").unwrap_or(defaults.trailing_days),
            concurrency: parse_var::<usize>("FETCH_CONCURRENCY")
                .map(|n| n.max(1))
                .unwrap_or(defaults.concurrency),
            max_retries: parse_var::<u32>("FETCH_RETRIES")
                .map(|n| n.max(1))
                .unwrap_or(defaults.max_retries),
            proxy: read_var("YAHOO_PROXY"),
            earnings_api,
            exchange_tz: parse_var("EXCHANGE_TZ").unwrap_or(defaults.exchange_tz),
        }
    }
}

/// Split a comma or whitespace separated list, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn read_var(name: &str) -> Option<String> {
    let raw = env::var(name).ok()?;
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_var<T>(name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = read_var(name)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("{name} is set but invalid ({err}); using default");
            None
        }
    }
}
