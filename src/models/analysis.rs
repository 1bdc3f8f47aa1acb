use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::EarningsImpact;

/// Aggregate view over a ticker's post-earnings moves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactStats {
    pub count: usize,
    pub positive: usize,
    pub negative: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst: Option<f64>,
}

/// Everything computed for one ticker in a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerAnalysis {
    pub symbol: String,
    pub current_price: f64,
    pub data_points: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ytd_return: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_year_return: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_earnings: Option<NaiveDate>,
    /// Newest first.
    pub impacts: Vec<EarningsImpact>,
}

/// A ticker that could not be analyzed, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerFailure {
    pub symbol: String,
    pub reason: String,
}

/// Result of one orchestrated run over a ticker list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRun {
    /// Playbook column or "tickers"; used in report titles and file names.
    pub label: String,
    pub generated_at: DateTime<Utc>,
    pub as_of: NaiveDate,
    pub analyses: Vec<TickerAnalysis>,
    pub failures: Vec<TickerFailure>,
}
