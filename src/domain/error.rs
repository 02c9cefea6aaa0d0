use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid thresholds, cadences or sector mappings. Fatal at startup.
    #[error("Config error: {0}")]
    Config(String),

    /// Storage sink failure. Logged per record, never aborts a batch.
    #[error("Sink error: {0}")]
    Sink(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Per-item failure reported by a quote or news provider.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// Network/HTTP failure or timeout. Retried next cycle.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider throttling. Retried next cycle after an added backoff.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Unexpected payload shape. The item is dropped, the batch continues.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited(_))
    }
}

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        DomainError::Sink(e.to_string())
    }
}
