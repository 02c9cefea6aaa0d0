use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two independent ingestion streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Quotes,
    News,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Quotes => write!(f, "quotes"),
            StreamKind::News => write!(f, "news"),
        }
    }
}

impl FromStr for StreamKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quotes" | "quote" | "prices" => Ok(StreamKind::Quotes),
            "news" => Ok(StreamKind::News),
            _ => Err(format!("Unknown stream: '{s}'. Use 'quotes' or 'news'")),
        }
    }
}

/// Where a stream is in its `Idle → Running → outcome → Idle` cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamPhase {
    Idle,
    Running,
}

/// Outcome of a single batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    PartialFailure,
    Failure,
    /// Another run of the same stream was in flight, or the stream is outside its window.
    Skipped,
}

impl RunStatus {
    /// Classify a batch from its item counts.
    pub fn classify(attempted: usize, failed: usize) -> Self {
        if failed == 0 {
            RunStatus::Success
        } else if failed >= attempted {
            RunStatus::Failure
        } else {
            RunStatus::PartialFailure
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::PartialFailure => write!(f, "partial_failure"),
            RunStatus::Failure => write!(f, "failure"),
            RunStatus::Skipped => write!(f, "skipped"),
        }
    }
}
