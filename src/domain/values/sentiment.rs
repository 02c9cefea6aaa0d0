use serde::{Deserialize, Serialize};
use std::fmt;

/// Signed polarity of a text sample, always within [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Sentiment(f64);

impl Sentiment {
    pub const NEUTRAL: Sentiment = Sentiment(0.0);

    pub fn new(value: f64) -> Result<Self, String> {
        if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
            return Err(format!(
                "Sentiment must be between -1.0 and 1.0, got {value}"
            ));
        }
        Ok(Sentiment(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn label(&self) -> &'static str {
        if self.0 > 0.1 {
            "positive"
        } else if self.0 < -0.1 {
            "negative"
        } else {
            "neutral"
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+.3}", self.0)
    }
}
