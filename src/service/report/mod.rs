pub mod console;
pub mod files;

pub use console::{render_impact_report, render_run};
pub use files::{write_impacts_csv, write_run_csv, ReportError, WrittenReports};

/// `+1.23%`, or `N/A` when absent.
pub fn format_percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:+.2}%"))
        .unwrap_or_else(|| "N/A".to_string())
}

/// `$1,234.56`
pub fn format_price(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", value.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}${grouped}.{frac}")
}

/// `+$12.34` / `-$1.00`
pub fn format_price_change(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "+" };
    let body = format_price(value.abs());
    format!("{sign}{body}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_are_grouped_by_thousands() {
        assert_eq!(format_price(643.04), "$643.04");
        assert_eq!(format_price(1234.5), "$1,234.50");
        assert_eq!(format_price(1_234_567.891), "$1,234,567.89");
    }

    #[test]
    fn changes_carry_explicit_sign() {
        assert_eq!(format_price_change(-9.7), "-$9.70");
        assert_eq!(format_price_change(84.31), "+$84.31");
        assert_eq!(format_percent(Some(-1.5084)), "-1.51%");
        assert_eq!(format_percent(None), "N/A");
    }
}
