pub mod analysis;
pub mod earnings;
pub mod price;

pub use analysis::{AnalysisRun, ImpactStats, TickerAnalysis, TickerFailure};
pub use earnings::{ComparisonKind, EarningsEvent, EarningsImpact, EarningsTiming};
pub use price::{PriceBar, PriceSeries, SeriesError};
