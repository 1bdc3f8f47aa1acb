use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{error, info};

use crate::models::TickerFailure;
use crate::service::finance::history::save_history_csv;
use crate::service::finance::FinanceService;

/// One history file written by [`scrape_tickers`].
#[derive(Debug, Clone)]
pub struct SavedHistory {
    pub symbol: String,
    pub path: PathBuf,
    pub rows: usize,
}

#[derive(Debug, Default)]
pub struct ScrapeSummary {
    pub saved: Vec<SavedHistory>,
    pub failed: Vec<TickerFailure>,
}

impl ScrapeSummary {
    pub fn total(&self) -> usize {
        self.saved.len() + self.failed.len()
    }
}

/// `{ticker}_{label}_{YYYYMMDD}.csv`
pub fn history_file_name(symbol: &str, label: &str, date: NaiveDate) -> String {
    format!(
        "{}_{}_{}.csv",
        symbol.to_ascii_lowercase(),
        label.to_ascii_lowercase(),
        date.format("%Y%m%d")
    )
}

/// Download and save daily history for each ticker, one at a time.
pub async fn scrape_tickers(
    finance: &FinanceService,
    tickers: &[String],
    from: NaiveDate,
    to: NaiveDate,
    output_dir: &Path,
    label: &str,
) -> ScrapeSummary {
    let mut summary = ScrapeSummary::default();

    for symbol in tickers {
        let series = match finance.get_price_history(symbol, from, to).await {
            Ok(series) => series,
            Err(err) => {
                error!("{symbol}: giving up on history: {err}");
                summary.failed.push(TickerFailure {
                    symbol: symbol.clone(),
                    reason: err.to_string(),
                });
                continue;
            }
        };

        if let Some(last) = series.last() {
            info!("{symbol}: latest close {:.2} on {}", last.close, last.date);
        }

        let path = output_dir.join(history_file_name(symbol, label, to));
        match save_history_csv(&path, &series) {
            Ok(()) => {
                info!("{symbol}: data saved to {}", path.display());
                summary.saved.push(SavedHistory {
                    symbol: symbol.clone(),
                    path,
                    rows: series.len(),
                });
            }
            Err(err) => {
                error!("{symbol}: error saving {}: {err}", path.display());
                summary.failed.push(TickerFailure {
                    symbol: symbol.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    summary
}
