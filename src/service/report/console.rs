use crate::models::{AnalysisRun, EarningsImpact, TickerAnalysis};
use crate::service::analytics::impact_stats;

use super::files::{IMPACT_HEADER, SUMMARY_HEADER};
use super::{format_percent, format_price, format_price_change};

const RULE_WIDTH: usize = 80;

/// Left-aligned text table with a dashed rule under the header.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(idx) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let render_row = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_row(headers.to_vec()));
    lines.push("-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));
    for row in rows {
        lines.push(render_row(row.iter().map(String::as_str).collect()));
    }
    lines.join("\n")
}

fn summary_row(analysis: &TickerAnalysis) -> Vec<String> {
    vec![
        analysis.symbol.clone(),
        format_price(analysis.current_price),
        format_percent(analysis.ytd_return),
        format_percent(analysis.one_year_return),
        analysis
            .next_earnings
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "N/A".to_string()),
        analysis.impacts.len().to_string(),
    ]
}

fn impact_row(impact: &EarningsImpact) -> Vec<String> {
    vec![
        impact.event_date.format("%Y-%m-%d").to_string(),
        impact.timing.label().to_string(),
        impact.comparison_kind.label().to_string(),
        format_price(impact.price_before),
        format_price(impact.price_after),
        format_percent(Some(impact.percent_change)),
    ]
}

/// Full console report for an orchestrated run.
pub fn render_run(run: &AnalysisRun) -> String {
    let mut lines = Vec::new();
    lines.push("=".repeat(RULE_WIDTH));
    lines.push(format!(
        "DAILY PLAYBOOK ANALYSIS - {} TICKERS",
        run.label.to_uppercase()
    ));
    lines.push("=".repeat(RULE_WIDTH));
    lines.push(format!(
        "Generated: {} (as of {})",
        run.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        run.as_of.format("%Y-%m-%d")
    ));
    lines.push(String::new());

    if !run.analyses.is_empty() {
        lines.push("PERFORMANCE SUMMARY".to_string());
        lines.push("-".repeat(RULE_WIDTH));
        let rows: Vec<Vec<String>> = run.analyses.iter().map(summary_row).collect();
        lines.push(render_table(&SUMMARY_HEADER, &rows));
        lines.push(String::new());
    }

    for analysis in run.analyses.iter().filter(|a| !a.impacts.is_empty()) {
        lines.push(format!("{} - POST-EARNINGS PERFORMANCE", analysis.symbol));
        lines.push("-".repeat(RULE_WIDTH));
        let rows: Vec<Vec<String>> = analysis.impacts.iter().map(impact_row).collect();
        lines.push(render_table(
            &["Date", "Timing", "Comparison", "Price Before", "Price After", "Return"],
            &rows,
        ));

        let stats = impact_stats(&analysis.impacts);
        lines.push(String::new());
        lines.push(format!(
            "Average Post-Earnings Return: {}",
            format_percent(stats.average)
        ));
        lines.push(format!(
            "Positive Moves: {}/{} | Negative Moves: {}/{}",
            stats.positive, stats.count, stats.negative, stats.count
        ));
        lines.push(String::new());
    }

    if !run.failures.is_empty() {
        lines.push("FAILED TICKERS".to_string());
        lines.push("-".repeat(RULE_WIDTH));
        for failure in &run.failures {
            lines.push(format!("{}: {}", failure.symbol, failure.reason));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Single-ticker report of price moves around earnings dates.
pub fn render_impact_report(symbol: &str, impacts: &[EarningsImpact]) -> String {
    if impacts.is_empty() {
        return "No earnings date analysis could be completed".to_string();
    }

    let mut lines = Vec::new();
    lines.push("=".repeat(RULE_WIDTH));
    lines.push(format!(
        "{} EARNINGS DATE STOCK PRICE ANALYSIS",
        symbol.to_uppercase()
    ));
    lines.push("=".repeat(RULE_WIDTH));

    let rows: Vec<Vec<String>> = impacts
        .iter()
        .map(|i| {
            vec![
                i.event_date.format("%Y-%m-%d").to_string(),
                i.anchor_date.format("%Y-%m-%d").to_string(),
                i.comparison_kind.label().to_string(),
                format_price(i.price_before),
                format_price(i.price_after),
                format_price_change(i.price_change()),
                format_percent(Some(i.percent_change)),
            ]
        })
        .collect();
    lines.push(render_table(&IMPACT_HEADER, &rows));

    let stats = impact_stats(impacts);
    lines.push(String::new());
    lines.push("SUMMARY:".to_string());
    lines.push(format!("Total earnings dates analyzed: {}", stats.count));
    lines.push(format!("Positive price movements: {}", stats.positive));
    lines.push(format!("Negative price movements: {}", stats.negative));
    lines.push(format!("Average price change: {}", format_percent(stats.average)));

    let by_change = |a: &&EarningsImpact, b: &&EarningsImpact| {
        a.percent_change.total_cmp(&b.percent_change)
    };
    if let Some(best) = impacts.iter().max_by(by_change) {
        lines.push(format!(
            "Largest gain: {} on {}",
            format_percent(Some(best.percent_change)),
            best.event_date.format("%Y-%m-%d")
        ));
    }
    if let Some(worst) = impacts.iter().min_by(by_change) {
        lines.push(format!(
            "Largest loss: {} on {}",
            format_percent(Some(worst.percent_change)),
            worst.event_date.format("%Y-%m-%d")
        ));
    }

    lines.join("\n")
}
