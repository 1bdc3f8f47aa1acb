pub mod daily_analysis;
pub mod scraper;

// Re-export for convenient access
pub use daily_analysis::*;
pub use scraper::*;
