use serde::{Deserialize, Serialize};
use std::fmt;

/// Bounded [0, 1] estimate of how strongly a news item may move a price.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct ImpactScore(f64);

impl ImpactScore {
    pub fn new(value: f64) -> Result<Self, String> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(format!(
                "Impact score must be between 0.0 and 1.0, got {value}"
            ));
        }
        Ok(ImpactScore(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for ImpactScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

impl Default for ImpactScore {
    fn default() -> Self {
        ImpactScore(0.0)
    }
}
