use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    PriceThreshold,
    NewsImpact,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::PriceThreshold => write!(f, "price_threshold"),
            AlertKind::NewsImpact => write!(f, "news_impact"),
        }
    }
}

impl FromStr for AlertKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "price_threshold" | "price" => Ok(AlertKind::PriceThreshold),
            "news_impact" | "news" => Ok(AlertKind::NewsImpact),
            _ => Err(format!("Unknown alert kind: {s}")),
        }
    }
}
