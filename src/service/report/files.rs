use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::models::{AnalysisRun, EarningsImpact};

use super::{format_percent, format_price, format_price_change};

pub const SUMMARY_HEADER: [&str; 6] = [
    "Ticker",
    "Current Price",
    "YTD Return",
    "1-Year Return",
    "Next Earnings",
    "Earnings Analyzed",
];

pub const EARNINGS_HEADER: [&str; 7] = [
    "Ticker",
    "Date",
    "Timing",
    "Comparison",
    "Price Before",
    "Price After",
    "Return",
];

pub const IMPACT_HEADER: [&str; 7] = [
    "Event Date",
    "Anchor Date",
    "Comparison",
    "Price Before",
    "Price After",
    "Price Change",
    "Percentage Change",
];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Paths of the files a run produced; `None` when there was nothing to write.
#[derive(Debug, Default)]
pub struct WrittenReports {
    pub summary: Option<PathBuf>,
    pub earnings: Option<PathBuf>,
}

/// `daily_analysis_{label}_{YYYYMMDD}_{kind}.csv`
pub fn report_file_name(label: &str, date: NaiveDate, kind: &str) -> String {
    format!(
        "daily_analysis_{}_{}_{}.csv",
        label.to_ascii_lowercase(),
        date.format("%Y%m%d"),
        kind
    )
}

/// Write the summary and per-earnings CSVs for a run into `dir`.
pub fn write_run_csv(run: &AnalysisRun, dir: &Path) -> Result<WrittenReports, ReportError> {
    fs::create_dir_all(dir)?;
    let mut written = WrittenReports::default();

    if !run.analyses.is_empty() {
        let path = dir.join(report_file_name(&run.label, run.as_of, "summary"));
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(SUMMARY_HEADER)?;
        for analysis in &run.analyses {
            writer.write_record([
                analysis.symbol.clone(),
                format_price(analysis.current_price),
                format_percent(analysis.ytd_return),
                format_percent(analysis.one_year_return),
                analysis
                    .next_earnings
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "N/A".to_string()),
                analysis.impacts.len().to_string(),
            ])?;
        }
        writer.flush()?;
        info!("Summary saved to: {}", path.display());
        written.summary = Some(path);
    }

    if run.analyses.iter().any(|a| !a.impacts.is_empty()) {
        let path = dir.join(report_file_name(&run.label, run.as_of, "earnings"));
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(EARNINGS_HEADER)?;
        for analysis in &run.analyses {
            for impact in &analysis.impacts {
                writer.write_record([
                    analysis.symbol.clone(),
                    impact.event_date.format("%Y-%m-%d").to_string(),
                    impact.timing.label().to_string(),
                    impact.comparison_kind.label().to_string(),
                    format_price(impact.price_before),
                    format_price(impact.price_after),
                    format_percent(Some(impact.percent_change)),
                ])?;
            }
        }
        writer.flush()?;
        info!("Detailed earnings data saved to: {}", path.display());
        written.earnings = Some(path);
    }

    Ok(written)
}

/// Write a single-ticker impact table.
pub fn write_impacts_csv(path: &Path, impacts: &[EarningsImpact]) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(IMPACT_HEADER)?;
    for impact in impacts {
        writer.write_record([
            impact.event_date.format("%Y-%m-%d").to_string(),
            impact.anchor_date.format("%Y-%m-%d").to_string(),
            impact.comparison_kind.label().to_string(),
            format_price(impact.price_before),
            format_price(impact.price_after),
            format_price_change(impact.price_change()),
            format_percent(Some(impact.percent_change)),
        ])?;
    }
    writer.flush()?;

    info!("Results saved to {}", path.display());
    Ok(())
}
