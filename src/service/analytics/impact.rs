use tracing::debug;

use crate::models::{ComparisonKind, EarningsEvent, EarningsImpact, EarningsTiming, PriceSeries};

use super::returns::percent_change;

/// Price reaction to one earnings event.
///
/// The event resolves to its anchor day, the first trading day on or after
/// the event date, so weekend and holiday dates slide forward. Before-open
/// announcements compare the anchor close with the previous close; every
/// other timing compares the next close with the anchor close.
///
/// Returns `None` when the event predates the series, lies beyond its last
/// bar, or either comparison day falls outside the series.
pub fn compute_impact(series: &PriceSeries, event: &EarningsEvent) -> Option<EarningsImpact> {
    let first = series.first()?;
    if event.date < first.date {
        return None;
    }

    let anchor = series.anchor_index(event.date)?;
    let bars = series.bars();

    let (before, after, comparison_kind) = match event.timing {
        EarningsTiming::BeforeOpen => {
            let prev = anchor.checked_sub(1)?;
            (&bars[prev], &bars[anchor], ComparisonKind::SameDayVsPrevious)
        }
        EarningsTiming::AfterClose | EarningsTiming::Unknown => {
            let next = bars.get(anchor + 1)?;
            (&bars[anchor], next, ComparisonKind::NextDayVsEarnings)
        }
    };

    Some(EarningsImpact {
        event_date: event.date,
        anchor_date: bars[anchor].date,
        timing: event.timing,
        comparison_kind,
        price_before: before.close,
        price_after: after.close,
        percent_change: percent_change(before.close, after.close),
    })
}

/// Impacts for every event the series can bracket, in event order.
pub fn compute_impacts(series: &PriceSeries, events: &[EarningsEvent]) -> Vec<EarningsImpact> {
    events
        .iter()
        .filter_map(|event| {
            let impact = compute_impact(series, event);
            if impact.is_none() {
                debug!(
                    "{} earnings on {} ({}) not bracketed by price data",
                    event.symbol,
                    event.date,
                    event.timing.code()
                );
            }
            impact
        })
        .collect()
}
