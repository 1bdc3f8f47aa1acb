use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::models::{AnalysisRun, EarningsEvent, PriceSeries, TickerAnalysis, TickerFailure};
use crate::service::analytics::dates::history_window;
use crate::service::analytics::{compute_impacts, trailing_return, ytd_return};
use crate::service::finance::earnings::select_recent;
use crate::service::finance::FinanceService;
use crate::service::tickers::{PlaybookError, TickerSource};

/// Knobs for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub history_months: u32,
    pub trailing_days: usize,
    /// Oldest earnings date considered; defaults to the history window start.
    pub earnings_since: Option<NaiveDate>,
    pub earnings_limit: usize,
    pub concurrency: usize,
}

impl From<&AppConfig> for AnalysisSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            history_months: config.history_months,
            trailing_days: config.trailing_days,
            earnings_since: config.earnings_since,
            earnings_limit: config.earnings_limit,
            concurrency: config.concurrency.max(1),
        }
    }
}

/// Fetches each ticker's history and earnings and runs the calculations.
pub struct Analyzer {
    finance: Arc<FinanceService>,
    settings: AnalysisSettings,
}

impl Analyzer {
    pub fn new(finance: Arc<FinanceService>, settings: AnalysisSettings) -> Self {
        Self { finance, settings }
    }

    /// Analyze every ticker from `source` as of `today`.
    ///
    /// `local_events` (from an earnings file) are merged with the remote
    /// calendar when one is configured. A ticker whose history cannot be
    /// fetched is recorded as a failure; the rest of the run continues.
    pub async fn run(
        &self,
        source: &TickerSource,
        local_events: Vec<EarningsEvent>,
        today: NaiveDate,
    ) -> Result<AnalysisRun, PlaybookError> {
        let tickers = source.resolve()?;
        info!("Tickers to analyze: {} ({} total)", tickers.join(", "), tickers.len());

        let (from, to) = history_window(today, self.settings.history_months);
        let since = self.settings.earnings_since.unwrap_or(from);

        let mut events = local_events;
        if self.finance.settings().earnings_api.is_some() {
            match self.finance.get_earnings_range(since, today).await {
                Ok(mut remote) => events.append(&mut remote),
                Err(err) => warn!("Earnings calendar unavailable, continuing without it: {err}"),
            }
        } else if events.is_empty() {
            info!("No earnings source configured; post-earnings analysis will be empty");
        }

        let events: &[EarningsEvent] = &events;
        let results: Vec<Result<TickerAnalysis, TickerFailure>> = stream::iter(tickers.iter())
            .map(|symbol| self.analyze_ticker(symbol, events, from, to, since, today))
            .buffered(self.settings.concurrency)
            .collect()
            .await;

        let mut analyses = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(analysis) => analyses.push(analysis),
                Err(failure) => failures.push(failure),
            }
        }

        info!(
            "Analysis complete: {} succeeded, {} failed",
            analyses.len(),
            failures.len()
        );

        Ok(AnalysisRun {
            label: source.label(),
            generated_at: Utc::now(),
            as_of: today,
            analyses,
            failures,
        })
    }

    async fn analyze_ticker(
        &self,
        symbol: &str,
        events: &[EarningsEvent],
        from: NaiveDate,
        to: NaiveDate,
        since: NaiveDate,
        today: NaiveDate,
    ) -> Result<TickerAnalysis, TickerFailure> {
        info!("Analyzing {symbol}");

        let series = self
            .finance
            .get_price_history(symbol, from, to)
            .await
            .map_err(|err| TickerFailure {
                symbol: symbol.to_string(),
                reason: err.to_string(),
            })?;

        let mut analysis = analyze_series(symbol, &series, events, &self.settings, since, today)
            .ok_or_else(|| TickerFailure {
                symbol: symbol.to_string(),
                reason: "no historical data".to_string(),
            })?;

        match self.finance.get_next_earnings(symbol).await {
            Ok(next) => analysis.next_earnings = next.filter(|d| *d >= today),
            Err(err) => debug!("{symbol}: next earnings lookup failed: {err}"),
        }

        Ok(analysis)
    }
}

/// Run the pure calculations for one ticker's series.
///
/// Returns `None` for an empty series.
pub fn analyze_series(
    symbol: &str,
    series: &PriceSeries,
    events: &[EarningsEvent],
    settings: &AnalysisSettings,
    since: NaiveDate,
    today: NaiveDate,
) -> Option<TickerAnalysis> {
    let current_price = series.current_price()?;

    let selected = select_recent(events, symbol, since, today, settings.earnings_limit);
    let impacts = compute_impacts(series, &selected);
    if selected.len() > impacts.len() {
        warn!(
            "{symbol}: {} of {} earnings dates could not be bracketed by price data",
            selected.len() - impacts.len(),
            selected.len()
        );
    }

    let analysis = TickerAnalysis {
        symbol: symbol.to_string(),
        current_price,
        data_points: series.len(),
        ytd_return: ytd_return(series, today.year()),
        one_year_return: trailing_return(series, settings.trailing_days),
        next_earnings: None,
        impacts,
    };

    debug!(
        "{symbol}: {} bars, ytd={:?}, 1y={:?}, {} impacts",
        analysis.data_points,
        analysis.ytd_return,
        analysis.one_year_return,
        analysis.impacts.len()
    );

    Some(analysis)
}
