use chrono::NaiveDate;

use crate::models::{EarningsImpact, ImpactStats, PriceSeries};

/// Trading days in a calendar year, used for the one-year lookback.
pub const TRADING_DAYS_PER_YEAR: usize = 252;

/// Percent change from `before` to `after`, sign-preserving.
pub fn percent_change(before: f64, after: f64) -> f64 {
    (after - before) / before * 100.0
}

/// Return from the first trading day of `year` to the latest close.
///
/// Needs at least two bars inside the year.
pub fn ytd_return(series: &PriceSeries, year: i32) -> Option<f64> {
    let year_start = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let bars = series.since(year_start);
    if bars.len() < 2 {
        return None;
    }

    let first = bars.first()?.close;
    let last = bars.last()?.close;
    Some(percent_change(first, last))
}

/// Return between the close `days` trading days before the latest bar and
/// the latest close. Windows longer than the series clamp to its first bar.
pub fn trailing_return(series: &PriceSeries, days: usize) -> Option<f64> {
    let bars = series.bars();
    if bars.len() < 2 || days == 0 {
        return None;
    }

    let last_idx = bars.len() - 1;
    let back = days.min(last_idx);
    Some(percent_change(bars[last_idx - back].close, bars[last_idx].close))
}

pub fn one_year_return(series: &PriceSeries) -> Option<f64> {
    trailing_return(series, TRADING_DAYS_PER_YEAR)
}

pub fn impact_stats(impacts: &[EarningsImpact]) -> ImpactStats {
    if impacts.is_empty() {
        return ImpactStats::default();
    }

    let changes: Vec<f64> = impacts.iter().map(|i| i.percent_change).collect();
    let sum: f64 = changes.iter().sum();

    ImpactStats {
        count: changes.len(),
        positive: changes.iter().filter(|c| **c > 0.0).count(),
        negative: changes.iter().filter(|c| **c < 0.0).count(),
        average: Some(sum / changes.len() as f64),
        best: changes.iter().copied().reduce(f64::max),
        worst: changes.iter().copied().reduce(f64::min),
    }
}
