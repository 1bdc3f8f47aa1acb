use std::path::PathBuf;

use chrono::Weekday;
use clap::{Args, Parser, Subcommand};

use crate::config::AppConfig;
use crate::models::EarningsTiming;
use crate::service::command;

#[derive(Parser, Debug)]
#[command(name = "earnings-playbook")]
#[command(about = "Playbook-driven returns and post-earnings price moves", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze YTD, one-year and post-earnings returns for a ticker list
    Analyze(AnalyzeArgs),
    /// Download daily price history CSVs for a ticker list
    Scrape(SelectionArgs),
    /// Report price moves around earnings dates from a local history CSV
    Earnings(EarningsArgs),
}

/// Which tickers to process and where to put the output.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Playbook weekday column to use (defaults to today's)
    #[arg(short, long, value_parser = parse_weekday)]
    pub day: Option<Weekday>,

    /// Explicit tickers, comma separated; bypasses the playbook
    #[arg(short, long, value_delimiter = ',')]
    pub tickers: Vec<String>,

    /// Playbook spreadsheet (.xlsx, .xls, .ods or .csv)
    #[arg(long)]
    pub playbook: Option<PathBuf>,

    /// Sheet name inside the playbook workbook
    #[arg(long)]
    pub sheet: Option<String>,

    /// Months of daily history to fetch
    #[arg(short, long)]
    pub months: Option<u32>,

    /// Directory for CSV output
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// CSV of `ticker,date[,timing]` earnings events
    #[arg(long)]
    pub earnings_file: Option<PathBuf>,

    /// Timing assumed when an earnings source gives none (bmo, amc, unknown)
    #[arg(long)]
    pub default_timing: Option<EarningsTiming>,

    /// Print the report without writing CSV files
    #[arg(long)]
    pub no_save: bool,
}

#[derive(Args, Debug, Clone)]
pub struct EarningsArgs {
    /// Daily history CSV (as written by `scrape` or exported from Yahoo)
    #[arg(long)]
    pub history: PathBuf,

    /// Ticker symbol for report titles (defaults to the file name prefix)
    #[arg(short, long)]
    pub symbol: Option<String>,

    /// Earnings date, repeatable (e.g. "July 18, 2024" or 2024-07-18)
    #[arg(long = "date")]
    pub dates: Vec<String>,

    /// File with one `date[,timing]` per line
    #[arg(long)]
    pub dates_file: Option<PathBuf>,

    /// Announcement timing for dates without one (bmo, amc, unknown)
    #[arg(long)]
    pub timing: Option<EarningsTiming>,

    /// Where to write the results CSV
    #[arg(short, long, default_value = "earnings_analysis_results.csv")]
    pub output: PathBuf,
}

/// Accepts `mon`, `Tuesday`, `weds`, `thur`, ...
pub fn parse_weekday(raw: &str) -> Result<Weekday, String> {
    let lower = raw.trim().to_ascii_lowercase();
    let prefix = lower.get(..3).unwrap_or(lower.as_str());
    match prefix {
        "mon" => Ok(Weekday::Mon),
        "tue" => Ok(Weekday::Tue),
        "wed" => Ok(Weekday::Wed),
        "thu" => Ok(Weekday::Thu),
        "fri" => Ok(Weekday::Fri),
        "sat" => Ok(Weekday::Sat),
        "sun" => Ok(Weekday::Sun),
        _ => Err(format!("'{raw}' is not a weekday")),
    }
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Analyze(args) => command::analyze::handle(args, config).await,
        Commands::Scrape(args) => command::scrape::handle(args, config).await,
        Commands::Earnings(args) => command::earnings::handle(args, config),
    }
}
