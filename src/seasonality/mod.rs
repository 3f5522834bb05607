//! Seasonal decomposition.
//!
//! Classical additive decomposition at a caller-supplied period; used by the
//! seasonality detector to measure how much of a series' variance is
//! seasonal.

mod classical;

pub use classical::{ClassicalDecomposition, ClassicalResult};
