//! Univariate time series of timestamped observations.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Policy for handling missing values (NaN/Inf).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MissingValuePolicy {
    /// Drop observations with missing values.
    Drop,
    /// Fill with a specific value.
    Fill(f64),
    /// Forward fill (use previous valid value).
    ForwardFill,
    /// Return error if missing values found.
    Error,
}

/// Sampling interval of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    /// Constant spacing in wall-clock time (hourly, daily, weekly...).
    Fixed(#[serde(with = "duration_seconds")] Duration),
    /// Whole calendar months, anchored on the day of month.
    Months(u32),
    /// Whole calendar months, anchored on the last day of the month.
    MonthEnds(u32),
}

impl Frequency {
    /// Timestamp `steps` intervals after `from`.
    pub fn advance(&self, from: DateTime<Utc>, steps: u32) -> Option<DateTime<Utc>> {
        match *self {
            Frequency::Fixed(step) => from.checked_add_signed(step * steps as i32),
            Frequency::Months(m) => from.checked_add_months(Months::new(m.checked_mul(steps)?)),
            Frequency::MonthEnds(m) => from
                .checked_add_months(Months::new(m.checked_mul(steps)?))
                .and_then(end_of_month),
        }
    }
}

/// Last day of the month of `t`, keeping the time of day.
fn end_of_month(t: DateTime<Utc>) -> Option<DateTime<Utc>> {
    t.with_day(1)?
        .checked_add_months(Months::new(1))?
        .checked_sub_signed(Duration::days(1))
}

fn is_month_end(t: &DateTime<Utc>) -> bool {
    end_of_month(*t).is_some_and(|end| end.day() == t.day())
}

mod duration_seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(d.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        i64::deserialize(d).map(Duration::seconds)
    }
}

/// A univariate time series with strictly increasing timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
    label: Option<String>,
}

impl TimeSeries {
    /// Create a series from parallel timestamp and value vectors.
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if values.len() != timestamps.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }

        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(ForecastError::TimestampError(format!(
                    "timestamps must be strictly increasing (position {i})"
                )));
            }
        }

        Ok(Self {
            timestamps,
            values,
            label: None,
        })
    }

    /// Create a regularly spaced series starting at `start`.
    pub fn regular(start: DateTime<Utc>, frequency: Frequency, values: Vec<f64>) -> Result<Self> {
        let timestamps = (0..values.len())
            .map(|i| {
                frequency.advance(start, i as u32).ok_or_else(|| {
                    ForecastError::TimestampError("timestamp out of range".to_string())
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(timestamps, values)
    }

    /// Attach a display label (e.g. the product or store name).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    /// Extract observations `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start > end || end > self.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "invalid slice {start}..{end} of series with {} observations",
                self.len()
            )));
        }
        Ok(TimeSeries {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
            label: self.label.clone(),
        })
    }

    /// Check if series has missing values (NaN or Inf).
    pub fn has_missing_values(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }

    /// Return a sanitized copy with missing values handled.
    pub fn sanitized(&self, policy: MissingValuePolicy) -> Result<TimeSeries> {
        let values = match policy {
            MissingValuePolicy::Error => {
                if self.has_missing_values() {
                    return Err(ForecastError::MissingValues);
                }
                return Ok(self.clone());
            }
            MissingValuePolicy::Drop => {
                let (timestamps, values) = self
                    .timestamps
                    .iter()
                    .zip(self.values.iter())
                    .filter(|(_, v)| v.is_finite())
                    .map(|(t, v)| (*t, *v))
                    .unzip();
                return Ok(TimeSeries {
                    timestamps,
                    values,
                    label: self.label.clone(),
                });
            }
            MissingValuePolicy::Fill(fill_value) => self
                .values
                .iter()
                .map(|&v| if v.is_finite() { v } else { fill_value })
                .collect(),
            MissingValuePolicy::ForwardFill => {
                let mut last_valid = None;
                self.values
                    .iter()
                    .map(|&v| {
                        if v.is_finite() {
                            last_valid = Some(v);
                            v
                        } else {
                            last_valid.unwrap_or(v)
                        }
                    })
                    .collect()
            }
        };

        Ok(TimeSeries {
            timestamps: self.timestamps.clone(),
            values,
            label: self.label.clone(),
        })
    }

    /// Infer the sampling frequency from the timestamps.
    ///
    /// Series whose observations all fall on the same day of consecutive
    /// months are reported as [`Frequency::Months`]; otherwise the modal
    /// spacing must cover at least `tolerance` of all gaps.
    pub fn infer_frequency(&self, tolerance: f64) -> Result<Frequency> {
        if self.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: self.len(),
            });
        }

        if let Some(frequency) = self.monthly_frequency() {
            return Ok(frequency);
        }

        let mut counts: HashMap<i64, usize> = HashMap::new();
        for w in self.timestamps.windows(2) {
            *counts.entry((w[1] - w[0]).num_seconds()).or_insert(0) += 1;
        }

        // Ties resolve to the shortest spacing so the result is deterministic
        let (modal_diff, modal_count) = counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(&diff, &count)| (diff, count))
            .ok_or(ForecastError::FrequencyInference(
                "empty spacing data".to_string(),
            ))?;

        let modal_ratio = modal_count as f64 / (self.len() - 1) as f64;
        if modal_ratio < tolerance {
            return Err(ForecastError::FrequencyInference(
                "no unique modal spacing found".to_string(),
            ));
        }

        Ok(Frequency::Fixed(Duration::seconds(modal_diff)))
    }

    /// Timestamps of the `horizon` periods following the last observation.
    pub fn future_timestamps(&self, horizon: usize) -> Result<Vec<DateTime<Utc>>> {
        let last = self.last_timestamp().ok_or(ForecastError::EmptyData)?;
        let frequency = self.infer_frequency(0.5)?;
        (1..=horizon)
            .map(|step| {
                frequency.advance(last, step as u32).ok_or_else(|| {
                    ForecastError::TimestampError("forecast timestamp out of range".to_string())
                })
            })
            .collect()
    }

    /// Calendar-month spacing, anchored either on month ends or on a fixed
    /// day of month.
    fn monthly_frequency(&self) -> Option<Frequency> {
        let first = self.timestamps[0];
        let month_index = |t: &DateTime<Utc>| t.year() * 12 + t.month0() as i32;
        let step = month_index(&self.timestamps[1]) - month_index(&first);
        if step <= 0 {
            return None;
        }
        let evenly_spaced = self.timestamps.windows(2).all(|w| {
            month_index(&w[1]) - month_index(&w[0]) == step && w[1].time() == first.time()
        });
        if !evenly_spaced {
            return None;
        }

        let step = step as u32;
        if self.timestamps.iter().all(is_month_end) {
            Some(Frequency::MonthEnds(step))
        } else if self.timestamps.iter().all(|t| t.day() == first.day()) {
            Some(Frequency::Months(step))
        } else {
            None
        }
    }
}
