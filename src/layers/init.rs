use serde::{Deserialize, Serialize};

use crate::error::{NetError, Result};

/// Half-open range `[low, high)` fresh weights are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitRange {
    pub low: f64,
    pub high: f64,
}

impl InitRange {
    pub fn new(low: f64, high: f64) -> Result<InitRange> {
        let range = InitRange { low, high };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.low.is_finite() || !self.high.is_finite() || self.low >= self.high {
            return Err(NetError::InvalidArgument(format!(
                "init range [{}, {}) is empty or not finite",
                self.low, self.high
            )));
        }
        Ok(())
    }
}

impl Default for InitRange {
    fn default() -> Self {
        InitRange { low: -1.0, high: 1.0 }
    }
}
