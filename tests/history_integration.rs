use chrono::NaiveDate;

use earnings_playbook::config::AppConfig;
use earnings_playbook::service::finance::{FinanceService, ProviderSettings};

/// Integration test that calls the Yahoo chart and quote summary endpoints.
///
/// Ignored by default to avoid CI failures. Run manually with:
/// `cargo test -- --ignored fetches_daily_history`.
#[tokio::test]
#[ignore = "requires external network access"]
async fn fetches_daily_history() -> Result<(), Box<dyn std::error::Error>> {
    let finance = FinanceService::new(ProviderSettings::from(&AppConfig::default()))?;

    let from = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
    let to = NaiveDate::from_ymd_opt(2024, 7, 31).unwrap();
    let series = finance.get_price_history("NFLX", from, to).await?;

    println!(
        "NFLX: {} bars, {:?} -> {:?}",
        series.len(),
        series.first().map(|b| b.date),
        series.last().map(|b| b.date)
    );
    assert!(series.len() >= 20, "expected a month of trading days");
    assert!(series.first().unwrap().date >= from);
    assert!(series.last().unwrap().date <= to);

    let next = finance.get_next_earnings("NFLX").await?;
    println!("NFLX next earnings: {next:?}");

    Ok(())
}
