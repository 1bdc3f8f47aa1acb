use std::path::PathBuf;

use chrono::Weekday;

pub mod playbook;

pub use playbook::{read_playbook_column, PlaybookError};

/// Where a run gets its tickers from.
#[derive(Debug, Clone, PartialEq)]
pub enum TickerSource {
    /// A weekday column of the playbook spreadsheet.
    Playbook {
        path: PathBuf,
        sheet: String,
        column: String,
    },
    /// List from configuration.
    Fixed(Vec<String>),
    /// Tickers passed on the command line.
    Args(Vec<String>),
}

impl TickerSource {
    /// Playbook column for `weekday`, or `None` on weekends.
    pub fn for_weekday(path: PathBuf, sheet: String, weekday: Weekday) -> Option<Self> {
        playbook_column(weekday).map(|column| TickerSource::Playbook {
            path,
            sheet,
            column: column.to_string(),
        })
    }

    /// Normalized, de-duplicated tickers in source order. An empty result
    /// is an error.
    pub fn resolve(&self) -> Result<Vec<String>, PlaybookError> {
        let raw = match self {
            TickerSource::Playbook {
                path,
                sheet,
                column,
            } => read_playbook_column(path, sheet, column)?,
            TickerSource::Fixed(list) | TickerSource::Args(list) => {
                list.iter().filter_map(|t| normalize_ticker(t)).collect()
            }
        };

        let mut tickers: Vec<String> = Vec::with_capacity(raw.len());
        for ticker in raw {
            if !tickers.contains(&ticker) {
                tickers.push(ticker);
            }
        }

        if tickers.is_empty() {
            return Err(PlaybookError::NoTickers(self.label()));
        }
        Ok(tickers)
    }

    /// Short label for report titles and file names.
    pub fn label(&self) -> String {
        match self {
            TickerSource::Playbook { column, .. } => column.to_ascii_lowercase(),
            TickerSource::Fixed(_) => "fixed".to_string(),
            TickerSource::Args(list) if list.len() == 1 => list[0].trim().to_ascii_lowercase(),
            TickerSource::Args(_) => "tickers".to_string(),
        }
    }
}

/// Trim and upper-case a ticker cell; blanks yield `None`.
pub fn normalize_ticker(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return None;
    }
    Some(trimmed.to_ascii_uppercase())
}

/// Playbook column holding a weekday's tickers.
pub fn playbook_column(weekday: Weekday) -> Option<&'static str> {
    match weekday {
        Weekday::Mon => Some("Mon"),
        Weekday::Tue => Some("Tue"),
        Weekday::Wed => Some("Wed"),
        Weekday::Thu => Some("Thu"),
        Weekday::Fri => Some("Fri"),
        Weekday::Sat | Weekday::Sun => None,
    }
}

/// Header spellings accepted for a column name.
pub(crate) fn column_aliases(column: &str) -> Vec<String> {
    let extra: &[&str] = match column.to_ascii_lowercase().as_str() {
        "mon" => &["Monday"],
        "tue" => &["Tues", "Tuesday"],
        "wed" => &["Weds", "Wednesday"],
        "thu" => &["Thur", "Thurs", "Thursday"],
        "fri" => &["Friday"],
        _ => &[],
    };

    std::iter::once(column)
        .chain(extra.iter().copied())
        .map(str::to_string)
        .collect()
}
