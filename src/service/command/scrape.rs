use std::fs;

use anyhow::{bail, Context};
use tracing::info;

use crate::cli::SelectionArgs;
use crate::config::AppConfig;
use crate::service::analytics::dates::{exchange_today, history_window};
use crate::service::automation::scrape_tickers;
use crate::service::finance::{FinanceService, ProviderSettings};

use super::{apply_selection, select_source};

pub async fn handle(args: SelectionArgs, mut config: AppConfig) -> anyhow::Result<()> {
    apply_selection(&mut config, &args);

    let Some(source) = select_source(&config, &args) else {
        return Ok(());
    };
    let tickers = source.resolve()?;
    let label = source.label();
    info!("Scraping {} tickers ({label}): {}", tickers.len(), tickers.join(", "));

    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("failed to create {}", config.output_dir.display()))?;

    let finance = FinanceService::new(ProviderSettings::from(&config))
        .context("failed to initialize finance service")?;
    let (from, to) = history_window(exchange_today(config.exchange_tz), config.history_months);

    let summary = scrape_tickers(&finance, &tickers, from, to, &config.output_dir, &label).await;

    println!("Successful: {}/{}", summary.saved.len(), summary.total());
    for saved in &summary.saved {
        println!("  {} -> {} ({} rows)", saved.symbol, saved.path.display(), saved.rows);
    }
    if !summary.failed.is_empty() {
        println!("Failed: {}/{}", summary.failed.len(), summary.total());
        for failure in &summary.failed {
            println!("  {}: {}", failure.symbol, failure.reason);
        }
    }

    if summary.saved.is_empty() {
        bail!("no price history could be downloaded");
    }
    Ok(())
}
