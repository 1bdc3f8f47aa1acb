pub mod analytics;
pub mod automation;
pub mod command;
pub mod finance;
pub mod report;
pub mod tickers;
