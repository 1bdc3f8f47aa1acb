//! Pure calculations over already-fetched price data.

pub mod dates;
pub mod impact;
pub mod returns;

pub use dates::{parse_calendar_date, parse_price, trading_date, DateParseError};
pub use impact::{compute_impact, compute_impacts};
pub use returns::{
    impact_stats, one_year_return, percent_change, trailing_return, ytd_return,
    TRADING_DAYS_PER_YEAR,
};
