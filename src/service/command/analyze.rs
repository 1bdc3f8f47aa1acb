use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::{info, warn};

use crate::cli::AnalyzeArgs;
use crate::config::AppConfig;
use crate::models::EarningsEvent;
use crate::service::analytics::dates::exchange_today;
use crate::service::automation::{AnalysisSettings, Analyzer};
use crate::service::finance::earnings::load_earnings_file;
use crate::service::finance::{FinanceService, ProviderSettings};
use crate::service::report::{render_run, write_run_csv};

use super::{apply_selection, select_source};

pub async fn handle(args: AnalyzeArgs, mut config: AppConfig) -> anyhow::Result<()> {
    apply_selection(&mut config, &args.selection);
    if let Some(path) = &args.earnings_file {
        config.earnings_file = Some(path.clone());
    }
    if let Some(timing) = args.default_timing {
        config.default_timing = timing;
    }

    let Some(source) = select_source(&config, &args.selection) else {
        return Ok(());
    };

    let local_events: Vec<EarningsEvent> = match &config.earnings_file {
        Some(path) => load_earnings_file(path, config.default_timing)
            .with_context(|| format!("failed to read earnings file {}", path.display()))?,
        None => Vec::new(),
    };

    let finance = Arc::new(
        FinanceService::new(ProviderSettings::from(&config))
            .context("failed to initialize finance service")?,
    );
    let analyzer = Analyzer::new(finance, AnalysisSettings::from(&config));

    let today = exchange_today(config.exchange_tz);
    let run = analyzer.run(&source, local_events, today).await?;

    println!("{}", render_run(&run));

    if args.no_save {
        info!("--no-save given; skipping CSV output");
    } else if !run.analyses.is_empty() {
        let written = write_run_csv(&run, &config.output_dir)
            .with_context(|| format!("failed to write reports to {}", config.output_dir.display()))?;
        if written.earnings.is_none() {
            warn!("No earnings moves were computed; only the summary was written");
        }
    }

    if run.analyses.is_empty() {
        bail!(
            "all {} tickers failed for {}",
            run.failures.len(),
            run.label
        );
    }
    Ok(())
}
