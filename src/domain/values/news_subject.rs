use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a news item, or a news query, is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "name", rename_all = "lowercase")]
pub enum NewsSubject {
    Symbol(String),
    Sector(String),
}

impl NewsSubject {
    pub fn name(&self) -> &str {
        match self {
            NewsSubject::Symbol(s) | NewsSubject::Sector(s) => s,
        }
    }

    pub fn scope(&self) -> &'static str {
        match self {
            NewsSubject::Symbol(_) => "symbol",
            NewsSubject::Sector(_) => "sector",
        }
    }
}

/// Rendered as `symbol:LMT` / `sector:defense`.
impl fmt::Display for NewsSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope(), self.name())
    }
}

impl FromStr for NewsSubject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("symbol", name)) if !name.is_empty() => Ok(NewsSubject::Symbol(name.to_uppercase())),
            Some(("sector", name)) if !name.is_empty() => Ok(NewsSubject::Sector(name.to_lowercase())),
            _ => Err(format!("Invalid news subject: '{s}'. Use symbol:<TICKER> or sector:<name>")),
        }
    }
}
