use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One daily bar. Only `close` feeds the return calculations; the other
/// fields are carried so history files round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    pub close: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
}

impl PriceBar {
    /// Bar carrying only a close, enough for every calculation.
    pub fn close_only(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("duplicate trading day {0} in price series")]
    DuplicateDate(NaiveDate),
    #[error("invalid close {close} on {date}; closes must be finite and positive")]
    InvalidClose { date: NaiveDate, close: f64 },
}

/// Daily closes ordered ascending by date with unique dates.
///
/// Construction validates every close, so anything downstream can divide by
/// a close without checking it again.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn from_bars(mut bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        bars.sort_by_key(|b| b.date);

        for pair in bars.windows(2) {
            if pair[0].date == pair[1].date {
                return Err(SeriesError::DuplicateDate(pair[0].date));
            }
        }

        if let Some(bad) = bars.iter().find(|b| !b.close.is_finite() || b.close <= 0.0) {
            return Err(SeriesError::InvalidClose {
                date: bad.date,
                close: bad.close,
            });
        }

        Ok(Self { bars })
    }

    /// Convenience for `(date, close)` pairs.
    pub fn from_closes<I>(closes: I) -> Result<Self, SeriesError>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        Self::from_bars(
            closes
                .into_iter()
                .map(|(date, close)| PriceBar::close_only(date, close))
                .collect(),
        )
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn current_price(&self) -> Option<f64> {
        self.last().map(|b| b.close)
    }

    /// Index of the first bar dated on or after `date` (the anchor day).
    pub fn anchor_index(&self, date: NaiveDate) -> Option<usize> {
        let idx = self.bars.partition_point(|b| b.date < date);
        (idx < self.bars.len()).then_some(idx)
    }

    /// Bars dated on or after `date`.
    pub fn since(&self, date: NaiveDate) -> &[PriceBar] {
        let idx = self.bars.partition_point(|b| b.date < date);
        &self.bars[idx..]
    }
}
