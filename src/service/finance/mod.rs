use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::NaiveDate;
use chrono_tz::Tz;
use finance_query_core::{FetchClient, YahooAuthManager, YahooError, YahooFinanceClient};
use serde_json::Value;

use crate::config::{AppConfig, EarningsApiConfig};
use crate::models::{EarningsEvent, EarningsTiming, PriceSeries, SeriesError};
use crate::service::analytics::trading_date;

pub mod earnings;
pub mod history;

#[derive(Debug, thiserror::Error)]
pub enum FinanceServiceError {
    #[error(transparent)]
    Yahoo(#[from] YahooError),
    #[error("No price data for symbol {0}")]
    NotFound(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Earnings calendar API not configured (set EARNINGS_API_URL)")]
    CalendarDisabled,
    #[error(transparent)]
    Series(#[from] SeriesError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Provider settings carved out of [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub proxy: Option<String>,
    pub max_retries: u32,
    pub exchange_tz: Tz,
    pub default_timing: EarningsTiming,
    pub earnings_api: Option<EarningsApiConfig>,
}

impl From<&AppConfig> for ProviderSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            proxy: config.proxy.clone(),
            max_retries: config.max_retries,
            exchange_tz: config.exchange_tz,
            default_timing: config.default_timing,
            earnings_api: config.earnings_api.clone(),
        }
    }
}

pub struct FinanceService {
    client: Arc<YahooFinanceClient>,
    http: reqwest::Client,
    settings: ProviderSettings,
}

impl FinanceService {
    /// Build a finance service with optional proxy support.
    pub fn new(settings: ProviderSettings) -> Result<Self, FinanceServiceError> {
        let fetch = Arc::new(FetchClient::new(settings.proxy.clone())?);
        let auth = Arc::new(YahooAuthManager::new(
            settings.proxy.clone(),
            fetch.cookie_jar().clone(),
        ));
        let client = Arc::new(YahooFinanceClient::new(auth, fetch));

        let mut builder = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(15))
            .user_agent(history::USER_AGENT);
        if let Some(proxy) = settings.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| FinanceServiceError::Http(format!("invalid proxy {proxy}: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let http = builder
            .build()
            .map_err(|e| FinanceServiceError::Http(format!("failed to build client: {e}")))?;

        Ok(Self {
            client,
            http,
            settings,
        })
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    /// Daily closes for `symbol` between `from` and `to` inclusive, retried
    /// with exponential backoff.
    pub async fn get_price_history(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<PriceSeries, FinanceServiceError> {
        history::fetch_price_history(
            &self.http,
            symbol,
            from,
            to,
            self.settings.exchange_tz,
            self.settings.max_retries,
        )
        .await
    }

    /// Earnings events for every symbol in a date range (external API).
    pub async fn get_earnings_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<EarningsEvent>, FinanceServiceError> {
        let api = self
            .settings
            .earnings_api
            .as_ref()
            .ok_or(FinanceServiceError::CalendarDisabled)?;
        earnings::fetch_earnings_range(&self.http, api, from, to, self.settings.default_timing)
            .await
    }

    /// Next scheduled earnings date from the quote summary calendar.
    pub async fn get_next_earnings(
        &self,
        symbol: &str,
    ) -> Result<Option<NaiveDate>, FinanceServiceError> {
        let summary = self
            .client
            .get_quote_summary(symbol, &["calendarEvents"])
            .await?;

        Ok(extract_next_earnings(&summary, self.settings.exchange_tz))
    }
}

/// Earliest `calendarEvents.earnings.earningsDate` entry of a quote summary.
fn extract_next_earnings(summary: &Value, exchange_tz: Tz) -> Option<NaiveDate> {
    summary
        .get("quoteSummary")
        .and_then(|q| q.get("result"))
        .and_then(|r| r.as_array())
        .and_then(|arr| arr.first())
        .and_then(|r| r.get("calendarEvents"))
        .and_then(|c| c.get("earnings"))
        .and_then(|e| e.get("earningsDate"))
        .and_then(|d| d.as_array())?
        .iter()
        .filter_map(|item| {
            item.get("raw")
                .and_then(|r| r.as_i64())
                .or_else(|| item.as_i64())
        })
        .filter_map(|ts| trading_date(ts, exchange_tz))
        .min()
}

pub use FinanceServiceError as Error;
