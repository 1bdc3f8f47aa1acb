use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use thiserror::Error;
use tracing::info;

use super::normalize_ticker;

#[derive(Debug, Error)]
pub enum PlaybookError {
    #[error("failed to read playbook {}: {source}", .path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("failed to read playbook {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("column '{column}' not found in playbook (available: {})", .available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
    #[error("playbook sheet is empty")]
    Empty,
    #[error("no tickers found for {0}")]
    NoTickers(String),
}

/// Tickers listed under `column` in the playbook at `path`.
///
/// `.csv` files are read directly; anything else goes through calamine
/// (`.xlsx`, `.xlsm`, `.xls`, `.ods`) using `sheet`.
pub fn read_playbook_column(
    path: &Path,
    sheet: &str,
    column: &str,
) -> Result<Vec<String>, PlaybookError> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    let rows = if is_csv {
        read_csv_rows(path)?
    } else {
        read_sheet_rows(path, sheet)?
    };

    let tickers = column_values(&rows, column)?;
    info!(
        "Read {} tickers from {} column '{}'",
        tickers.len(),
        path.display(),
        column
    );
    Ok(tickers)
}

fn read_sheet_rows(path: &Path, sheet: &str) -> Result<Vec<Vec<String>>, PlaybookError> {
    let wrap = |source: calamine::Error| PlaybookError::Workbook {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = open_workbook_auto(path).map_err(wrap)?;
    let range = workbook.worksheet_range(sheet).map_err(wrap)?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>, PlaybookError> {
    let wrap = |source: csv::Error| PlaybookError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(wrap)?;

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect())
                .map_err(wrap)
        })
        .collect()
}

/// Values below the header cell matching `column`, normalized as tickers.
///
/// The header match is case-insensitive and also accepts the long weekday
/// spellings some playbooks use (`Weds`, `Thur`).
pub fn column_values(rows: &[Vec<String>], column: &str) -> Result<Vec<String>, PlaybookError> {
    let (header, body) = rows.split_first().ok_or(PlaybookError::Empty)?;
    let candidates = super::column_aliases(column);

    let idx = header
        .iter()
        .position(|h| {
            let h = h.trim();
            candidates.iter().any(|c| h.eq_ignore_ascii_case(c))
        })
        .ok_or_else(|| PlaybookError::MissingColumn {
            column: column.to_string(),
            available: header
                .iter()
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
                .collect(),
        })?;

    Ok(body
        .iter()
        .filter_map(|row| row.get(idx))
        .filter_map(|cell| normalize_ticker(cell))
        .collect())
}
