use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use earnings_playbook::cli::{self, Cli};
use earnings_playbook::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    debug!(
        "Playbook {} [{}], {} months of history, output to {}",
        config.playbook_path.display(),
        config.playbook_sheet,
        config.history_months,
        config.output_dir.display()
    );

    cli::run(cli, config).await
}
