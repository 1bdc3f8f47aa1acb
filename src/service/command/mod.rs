pub mod analyze;
pub mod earnings;
pub mod scrape;

use chrono::Datelike;
use tracing::info;

use crate::cli::SelectionArgs;
use crate::config::AppConfig;
use crate::service::analytics::dates::exchange_today;
use crate::service::tickers::TickerSource;

/// Fold command line overrides into the environment configuration.
pub fn apply_selection(config: &mut AppConfig, args: &SelectionArgs) {
    if let Some(path) = &args.playbook {
        config.playbook_path = path.clone();
    }
    if let Some(sheet) = &args.sheet {
        config.playbook_sheet = sheet.clone();
    }
    if let Some(months) = args.months {
        config.history_months = months.max(1);
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
}

/// Pick the ticker source for a run.
///
/// Explicit tickers win, then an explicit `--day`, then the `TICKERS` list,
/// then today's playbook column. Returns `None` when that lands on a weekend.
pub fn select_source(config: &AppConfig, args: &SelectionArgs) -> Option<TickerSource> {
    if !args.tickers.is_empty() {
        return Some(TickerSource::Args(args.tickers.clone()));
    }

    let weekday = match args.day {
        Some(day) => day,
        None if !config.tickers.is_empty() => {
            return Some(TickerSource::Fixed(config.tickers.clone()));
        }
        None => exchange_today(config.exchange_tz).weekday(),
    };

    let source = TickerSource::for_weekday(
        config.playbook_path.clone(),
        config.playbook_sheet.clone(),
        weekday,
    );
    if source.is_none() {
        info!("{weekday} is not a trading day; nothing to do");
    }
    source
}
