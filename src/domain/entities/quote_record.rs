use crate::domain::values::interval::SamplingInterval;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV bar for a symbol. Deduplicated by `(symbol, timestamp)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub symbol: String,
    pub interval: SamplingInterval,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl QuoteRecord {
    /// Reference used by alert events: `quote:<SYMBOL>:<rfc3339>`.
    pub fn record_ref(&self) -> String {
        format!("quote:{}:{}", self.symbol, self.timestamp.to_rfc3339())
    }

    /// Reject bars a provider should never have produced.
    pub fn validate(&self) -> Result<(), String> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(format!("{} bar at {} has non-finite price", self.symbol, self.timestamp));
        }
        if prices.iter().any(|p| *p < 0.0) {
            return Err(format!("{} bar at {} has negative price", self.symbol, self.timestamp));
        }
        if self.high < self.low {
            return Err(format!(
                "{} bar at {} has high {} below low {}",
                self.symbol, self.timestamp, self.high, self.low
            ));
        }
        Ok(())
    }
}
