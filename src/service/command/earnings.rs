use std::path::Path;

use anyhow::{bail, Context};
use tracing::{info, warn};

use crate::cli::EarningsArgs;
use crate::config::AppConfig;
use crate::models::EarningsEvent;
use crate::service::analytics::{compute_impacts, parse_calendar_date};
use crate::service::finance::earnings::load_event_dates;
use crate::service::finance::history::load_history_csv;
use crate::service::report::{render_impact_report, write_impacts_csv};
use crate::service::tickers::normalize_ticker;

/// Offline report: history comes from a CSV, dates from flags or a file.
pub fn handle(args: EarningsArgs, config: AppConfig) -> anyhow::Result<()> {
    let timing = args.timing.unwrap_or(config.default_timing);
    let symbol = args
        .symbol
        .as_deref()
        .and_then(normalize_ticker)
        .unwrap_or_else(|| symbol_from_path(&args.history));

    let series = load_history_csv(&args.history)
        .with_context(|| format!("failed to load {}", args.history.display()))?;
    if series.is_empty() {
        bail!("{} contains no usable price rows", args.history.display());
    }
    info!("Loaded {} trading days for {symbol}", series.len());

    let mut events: Vec<EarningsEvent> = Vec::new();
    for raw in &args.dates {
        match parse_calendar_date(raw) {
            Ok(date) => events.push(EarningsEvent::new(&symbol, date, timing)),
            Err(err) => warn!("Skipping earnings date: {err}"),
        }
    }
    if let Some(path) = &args.dates_file {
        let mut from_file = load_event_dates(path, &symbol, timing)
            .with_context(|| format!("failed to read {}", path.display()))?;
        events.append(&mut from_file);
    }
    if events.is_empty() {
        bail!("no valid earnings dates given (use --date or --dates-file)");
    }

    events.sort_by(|a, b| b.date.cmp(&a.date));
    events.dedup_by_key(|e| e.date);

    let impacts = compute_impacts(&series, &events);
    println!("{}", render_impact_report(&symbol, &impacts));

    if impacts.is_empty() {
        warn!("None of the {} earnings dates fell inside the price data", events.len());
        return Ok(());
    }
    write_impacts_csv(&args.output, &impacts)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    Ok(())
}

/// `nflx_data.csv` -> `NFLX`
fn symbol_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.split(['_', '-', '.']).next())
        .and_then(normalize_ticker)
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_comes_from_file_prefix() {
        assert_eq!(symbol_from_path(Path::new("data/nflx_data.csv")), "NFLX");
        assert_eq!(symbol_from_path(Path::new("ko_mon_20250414.csv")), "KO");
        assert_eq!(symbol_from_path(Path::new("")), "UNKNOWN");
    }
}
