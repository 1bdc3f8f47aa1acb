use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// When the company announced relative to the regular session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EarningsTiming {
    BeforeOpen,
    AfterClose,
    Unknown,
}

impl EarningsTiming {
    pub fn label(&self) -> &'static str {
        match self {
            EarningsTiming::BeforeOpen => "Before Market Open",
            EarningsTiming::AfterClose => "After Market Close",
            EarningsTiming::Unknown => "Unknown",
        }
    }

    /// Short session code (BMO/AMC/TBA).
    pub fn code(&self) -> &'static str {
        match self {
            EarningsTiming::BeforeOpen => "BMO",
            EarningsTiming::AfterClose => "AMC",
            EarningsTiming::Unknown => "TBA",
        }
    }
}

impl fmt::Display for EarningsTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EarningsTiming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "bmo" | "before" | "before open" | "before market open" | "pre" => {
                Ok(EarningsTiming::BeforeOpen)
            }
            "amc" | "after" | "after close" | "after market close" | "post" => {
                Ok(EarningsTiming::AfterClose)
            }
            "unknown" | "tba" | "tbd" | "" => Ok(EarningsTiming::Unknown),
            other => Err(format!(
                "unrecognized earnings timing '{other}' (expected bmo, amc or unknown)"
            )),
        }
    }
}

/// A nominal earnings announcement for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsEvent {
    pub symbol: String,
    pub date: NaiveDate,
    pub timing: EarningsTiming,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>, // raw provider value, e.g. "amc" or "16:00"
}

impl EarningsEvent {
    pub fn new(symbol: impl Into<String>, date: NaiveDate, timing: EarningsTiming) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            timing,
            time_of_day: None,
        }
    }
}

/// Which two closes an impact compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonKind {
    /// Anchor close against the previous trading day's close.
    SameDayVsPrevious,
    /// Next trading day's close against the anchor close.
    NextDayVsEarnings,
}

impl ComparisonKind {
    pub fn label(&self) -> &'static str {
        match self {
            ComparisonKind::SameDayVsPrevious => "Same Day vs Previous",
            ComparisonKind::NextDayVsEarnings => "Next Day vs Earnings",
        }
    }
}

impl fmt::Display for ComparisonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Price reaction attributed to one earnings event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsImpact {
    pub event_date: NaiveDate,
    /// Trading day the event resolved to.
    pub anchor_date: NaiveDate,
    pub timing: EarningsTiming,
    pub comparison_kind: ComparisonKind,
    pub price_before: f64,
    pub price_after: f64,
    pub percent_change: f64,
}

impl EarningsImpact {
    pub fn price_change(&self) -> f64 {
        self.price_after - self.price_before
    }
}
