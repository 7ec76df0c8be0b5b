//! Query parameters for magnitude-range lookups

use crate::error::{QuakeError, Result};
use serde::Serialize;

pub const DEFAULT_MIN_MAGNITUDE: f64 = 0.0;
pub const DEFAULT_MAX_MAGNITUDE: f64 = 10.0;

/// Inclusive magnitude range requested by a client.
///
/// Both bounds are guaranteed finite. Their relative order is not checked:
/// an inverted range is passed through to the executor, which returns no rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QueryParameters {
    min_magnitude: f64,
    max_magnitude: f64,
}

impl QueryParameters {
    pub fn new(min_magnitude: f64, max_magnitude: f64) -> Result<Self> {
        validate_bound("min_magnitude", min_magnitude)?;
        validate_bound("max_magnitude", max_magnitude)?;
        Ok(Self {
            min_magnitude,
            max_magnitude,
        })
    }

    /// Parse bounds from raw text, as submitted by a form or command line
    pub fn parse(min: &str, max: &str) -> Result<Self> {
        let min_magnitude = parse_bound("min_magnitude", min)?;
        let max_magnitude = parse_bound("max_magnitude", max)?;
        Self::new(min_magnitude, max_magnitude)
    }

    pub fn min_magnitude(&self) -> f64 {
        self.min_magnitude
    }

    pub fn max_magnitude(&self) -> f64 {
        self.max_magnitude
    }

    /// Whether `magnitude` falls inside the inclusive range
    pub fn contains(&self, magnitude: f64) -> bool {
        magnitude >= self.min_magnitude && magnitude <= self.max_magnitude
    }
}

impl Default for QueryParameters {
    fn default() -> Self {
        Self {
            min_magnitude: DEFAULT_MIN_MAGNITUDE,
            max_magnitude: DEFAULT_MAX_MAGNITUDE,
        }
    }
}

impl std::fmt::Display for QueryParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mag {}..={}", self.min_magnitude, self.max_magnitude)
    }
}

fn validate_bound(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(QuakeError::InvalidParameter(format!(
            "{} must be a finite number, got {}",
            name, value
        )))
    }
}

fn parse_bound(name: &str, raw: &str) -> Result<f64> {
    raw.trim().parse::<f64>().map_err(|_| {
        QuakeError::InvalidParameter(format!("{} is not a number: {:?}", name, raw))
    })
}
