//! Data transformations for time series.
//!
//! # Example
//!
//! ```
//! use sales_forecast::transform::{difference, undifference};
//!
//! let series = vec![10.0, 12.0, 11.0, 15.0];
//! let diffs = difference(&series);
//! assert_eq!(undifference(&diffs, series[0]), series);
//! ```

pub mod difference;

pub use difference::{difference, seasonal_difference, undifference, Differencer};
