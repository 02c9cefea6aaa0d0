use crate::domain::error::FetchError;
use crate::domain::values::stream::{RunStatus, StreamKind};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A symbol or query that failed for the whole batch.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub item: String,
    pub error: String,
    pub rate_limited: bool,
}

impl ItemFailure {
    pub fn new(item: &str, error: &FetchError) -> Self {
        Self {
            item: item.to_string(),
            error: error.to_string(),
            rate_limited: error.is_rate_limited(),
        }
    }
}

/// Result of one batch run: what was fetched, stored, deduped or lost.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub stream: StreamKind,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Symbols (quotes) or queries (news) attempted.
    pub attempted: usize,
    /// Records returned by the provider.
    pub fetched: usize,
    pub stored: usize,
    pub duplicates: usize,
    /// Records rejected as malformed or failing the scoring contract.
    pub dropped: usize,
    /// Records lost to sink errors this cycle.
    pub sink_errors: usize,
    pub alerts: usize,
    pub failures: Vec<ItemFailure>,
}

impl RunReport {
    pub fn begin(stream: StreamKind, attempted: usize) -> Self {
        let now = Utc::now();
        Self {
            stream,
            status: RunStatus::Success,
            started_at: now,
            finished_at: now,
            attempted,
            fetched: 0,
            stored: 0,
            duplicates: 0,
            dropped: 0,
            sink_errors: 0,
            alerts: 0,
            failures: vec![],
        }
    }

    /// A run that never started.
    pub fn skipped(stream: StreamKind) -> Self {
        let mut report = Self::begin(stream, 0);
        report.status = RunStatus::Skipped;
        report
    }

    pub fn finish(mut self) -> Self {
        self.status = RunStatus::classify(self.attempted, self.failures.len());
        self.finished_at = Utc::now();
        tracing::info!(
            stream = %self.stream,
            status = %self.status,
            attempted = self.attempted,
            fetched = self.fetched,
            stored = self.stored,
            duplicates = self.duplicates,
            dropped = self.dropped,
            sink_errors = self.sink_errors,
            alerts = self.alerts,
            failed = self.failures.len(),
            "batch finished"
        );
        self
    }

    pub fn rate_limited(&self) -> bool {
        self.failures.iter().any(|f| f.rate_limited)
    }
}
