//! Statistical tests run before model selection.

pub mod stationarity;

pub use stationarity::{
    mackinnon_p_value, CriticalValues, LagSelection, StationarityTestError, StationarityTester,
    StationarityVerdict,
};
