use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A ticker identifier. Belongs to exactly one sector and never changes once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    ticker: String,
    sector: String,
}

impl Symbol {
    pub fn new(ticker: &str, sector: &str) -> Self {
        Self {
            ticker: ticker.trim().to_uppercase(),
            sector: sector.trim().to_lowercase(),
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn sector(&self) -> &str {
        &self.sector
    }
}

/// Named grouping of symbols with a display color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    pub name: String,
    pub color: String,
    pub symbols: Vec<String>,
}

/// Aggregate return of a sector, recomputed after each quote batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorSnapshot {
    pub sector: String,
    /// Mean percent change between the last two closes of reporting members.
    pub aggregate_return_pct: f64,
    pub members_reporting: usize,
    pub computed_at: DateTime<Utc>,
}
