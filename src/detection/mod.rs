//! Detection of seasonal structure at a known period.

mod seasonality;

pub use seasonality::{SeasonalityDetector, SeasonalityTestError, SeasonalityVerdict};
