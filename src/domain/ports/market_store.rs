use crate::domain::entities::alert_event::AlertEvent;
use crate::domain::entities::news_record::{NewsKey, NewsRecord};
use crate::domain::entities::quote_record::QuoteRecord;
use crate::domain::entities::sector::SectorSnapshot;
use crate::domain::error::DomainError;
use crate::domain::values::news_subject::NewsSubject;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct NewsFilter {
    pub subject: Option<NewsSubject>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PruneStats {
    pub quotes: usize,
    pub news: usize,
    pub alerts: usize,
}

/// Storage side of the sink boundary.
///
/// Appends are idempotent: a duplicate `(symbol, timestamp)` quote or
/// `(source, headline, published_at)` article is ignored and reported as
/// `Ok(false)`. Implementations must tolerate concurrent appends from both
/// ingestion streams.
pub trait MarketStore: Send + Sync {
    fn append_quote(&self, quote: &QuoteRecord) -> Result<bool, DomainError>;
    fn append_news(&self, news: &NewsRecord) -> Result<bool, DomainError>;
    fn append_alert(&self, alert: &AlertEvent) -> Result<(), DomainError>;
    fn record_sector_snapshot(&self, snapshot: &SectorSnapshot) -> Result<(), DomainError>;

    /// Most recent bars for a symbol, newest first.
    fn latest_quotes(&self, symbol: &str, limit: usize) -> Result<Vec<QuoteRecord>, DomainError>;
    /// Bars for a symbol stamped at or after `since`, oldest first.
    fn quotes_since(&self, symbol: &str, since: DateTime<Utc>) -> Result<Vec<QuoteRecord>, DomainError>;
    fn news(&self, filter: &NewsFilter) -> Result<Vec<NewsRecord>, DomainError>;
    /// Dedup keys of articles published at or after `since`.
    fn news_keys_since(&self, since: DateTime<Utc>) -> Result<Vec<NewsKey>, DomainError>;
    fn recent_alerts(&self, limit: usize) -> Result<Vec<AlertEvent>, DomainError>;
    fn latest_sector_snapshot(&self, sector: &str) -> Result<Option<SectorSnapshot>, DomainError>;

    fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<PruneStats, DomainError>;
}
