use crate::domain::entities::alert_event::AlertEvent;
use crate::domain::entities::news_record::{NewsKey, NewsRecord};
use crate::domain::entities::quote_record::QuoteRecord;
use crate::domain::entities::sector::SectorSnapshot;
use crate::domain::error::DomainError;
use crate::domain::ports::market_store::*;
use crate::domain::values::impact::ImpactScore;
use crate::domain::values::sentiment::Sentiment;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::sync::Mutex;

const NEWS_COLS: &str =
    "id, scope, subject, headline, summary, source, url, published_at, sentiment, impact_score, ingested_at";

/// SQLite sink. A single connection behind a mutex serializes writes from
/// both streams; uniqueness constraints make appends idempotent.
pub struct SqliteMarketStore {
    conn: Mutex<Connection>,
}

/// Fixed-width UTC timestamps so lexical order matches time order.
fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))
}

fn conversion_error(msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        msg.into(),
    )
}

impl SqliteMarketStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open (or create) a database file, enable WAL and run migrations.
    /// `":memory:"` gives a private in-memory database.
    pub fn open(path: &str) -> Result<Self, DomainError> {
        let conn = Connection::open(path).map_err(|e| DomainError::Sink(format!("DB error: {e}")))?;
        if path != ":memory:" {
            conn.pragma_update(None, "journal_mode", "WAL")
                .map_err(|e| DomainError::Sink(format!("WAL error: {e}")))?;
        }
        super::migrations::run_migrations(&conn)?;
        Ok(Self::new(conn))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, DomainError> {
        self.conn
            .lock()
            .map_err(|e| DomainError::Sink(e.to_string()))
    }

    fn row_to_quote(row: &rusqlite::Row) -> Result<QuoteRecord, rusqlite::Error> {
        let interval: String = row.get(1)?;
        let ts_str: String = row.get(2)?;
        let volume: i64 = row.get(7)?;
        Ok(QuoteRecord {
            symbol: row.get(0)?,
            interval: interval.parse().map_err(conversion_error)?,
            timestamp: parse_ts(&ts_str)?,
            open: row.get(3)?,
            high: row.get(4)?,
            low: row.get(5)?,
            close: row.get(6)?,
            volume: volume.max(0) as u64,
        })
    }

    fn row_to_news(row: &rusqlite::Row) -> Result<NewsRecord, rusqlite::Error> {
        let scope: String = row.get(1)?;
        let subject: String = row.get(2)?;
        let published: String = row.get(7)?;
        let sentiment: f64 = row.get(8)?;
        let impact: f64 = row.get(9)?;
        let ingested: String = row.get(10)?;
        Ok(NewsRecord {
            id: row.get(0)?,
            subject: format!("{scope}:{subject}").parse().map_err(conversion_error)?,
            headline: row.get(3)?,
            summary: row.get(4)?,
            source: row.get(5)?,
            url: row.get(6)?,
            published_at: parse_ts(&published)?,
            sentiment: Sentiment::new(sentiment).map_err(conversion_error)?,
            impact_score: ImpactScore::new(impact).map_err(conversion_error)?,
            ingested_at: parse_ts(&ingested)?,
        })
    }

    fn row_to_alert(row: &rusqlite::Row) -> Result<AlertEvent, rusqlite::Error> {
        let kind: String = row.get(2)?;
        let created: String = row.get(6)?;
        Ok(AlertEvent {
            id: row.get(0)?,
            subject_symbol: row.get(1)?,
            kind: kind.parse().map_err(conversion_error)?,
            triggering_record_ref: row.get(3)?,
            computed_value: row.get(4)?,
            threshold: row.get(5)?,
            created_at: parse_ts(&created)?,
        })
    }
}

impl MarketStore for SqliteMarketStore {
    fn append_quote(&self, quote: &QuoteRecord) -> Result<bool, DomainError> {
        let conn = self.lock()?;
        let rows = conn
            .execute(
                "INSERT OR IGNORE INTO quotes (symbol, interval, ts, open, high, low, close, volume, ingested_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    quote.symbol,
                    quote.interval.as_str(),
                    ts(&quote.timestamp),
                    quote.open,
                    quote.high,
                    quote.low,
                    quote.close,
                    quote.volume as i64,
                    ts(&Utc::now()),
                ],
            )
            .map_err(|e| DomainError::Sink(format!("Failed to add quote: {e}")))?;
        Ok(rows > 0)
    }

    fn append_news(&self, news: &NewsRecord) -> Result<bool, DomainError> {
        let conn = self.lock()?;
        let rows = conn
            .execute(
                &format!("INSERT OR IGNORE INTO news ({NEWS_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"),
                params![
                    news.id,
                    news.subject.scope(),
                    news.subject.name(),
                    news.headline,
                    news.summary,
                    news.source,
                    news.url,
                    ts(&news.published_at),
                    news.sentiment.value(),
                    news.impact_score.value(),
                    ts(&news.ingested_at),
                ],
            )
            .map_err(|e| DomainError::Sink(format!("Failed to add news: {e}")))?;
        Ok(rows > 0)
    }

    fn append_alert(&self, alert: &AlertEvent) -> Result<(), DomainError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO alerts (id, subject_symbol, kind, record_ref, computed_value, threshold, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                alert.id,
                alert.subject_symbol,
                alert.kind.to_string(),
                alert.triggering_record_ref,
                alert.computed_value,
                alert.threshold,
                ts(&alert.created_at),
            ],
        )
        .map_err(|e| DomainError::Sink(format!("Failed to add alert: {e}")))?;
        Ok(())
    }

    fn record_sector_snapshot(&self, snapshot: &SectorSnapshot) -> Result<(), DomainError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO sector_snapshots (sector, computed_at, aggregate_return_pct, members_reporting)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                snapshot.sector,
                ts(&snapshot.computed_at),
                snapshot.aggregate_return_pct,
                snapshot.members_reporting as i64,
            ],
        )
        .map_err(|e| DomainError::Sink(format!("Failed to add sector snapshot: {e}")))?;
        Ok(())
    }

    fn latest_quotes(&self, symbol: &str, limit: usize) -> Result<Vec<QuoteRecord>, DomainError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT symbol, interval, ts, open, high, low, close, volume FROM quotes
             WHERE symbol = ?1 ORDER BY ts DESC LIMIT ?2",
        )?;
        let quotes = stmt
            .query_map(params![symbol.to_uppercase(), limit as i64], Self::row_to_quote)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(quotes)
    }

    fn quotes_since(&self, symbol: &str, since: DateTime<Utc>) -> Result<Vec<QuoteRecord>, DomainError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT symbol, interval, ts, open, high, low, close, volume FROM quotes
             WHERE symbol = ?1 AND ts >= ?2 ORDER BY ts ASC",
        )?;
        let quotes = stmt
            .query_map(params![symbol.to_uppercase(), ts(&since)], Self::row_to_quote)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(quotes)
    }

    fn news(&self, filter: &NewsFilter) -> Result<Vec<NewsRecord>, DomainError> {
        let conn = self.lock()?;
        let mut sql = format!("SELECT {NEWS_COLS} FROM news WHERE 1=1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(subject) = &filter.subject {
            sql.push_str(&format!(
                " AND scope = ?{} AND subject = ?{}",
                param_values.len() + 1,
                param_values.len() + 2
            ));
            param_values.push(Box::new(subject.scope().to_string()));
            param_values.push(Box::new(subject.name().to_string()));
        }
        if let Some(since) = &filter.since {
            sql.push_str(&format!(" AND published_at >= ?{}", param_values.len() + 1));
            param_values.push(Box::new(ts(since)));
        }
        sql.push_str(" ORDER BY published_at DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT ?{}", param_values.len() + 1));
            param_values.push(Box::new(limit as i64));
        }

        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let news = stmt
            .query_map(params_refs.as_slice(), Self::row_to_news)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(news)
    }

    fn news_keys_since(&self, since: DateTime<Utc>) -> Result<Vec<NewsKey>, DomainError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT source, headline, published_at FROM news WHERE published_at >= ?1",
        )?;
        let keys = stmt
            .query_map(params![ts(&since)], |row| {
                let published: String = row.get(2)?;
                Ok(NewsKey {
                    source: row.get(0)?,
                    headline: row.get(1)?,
                    published_at: parse_ts(&published)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    fn recent_alerts(&self, limit: usize) -> Result<Vec<AlertEvent>, DomainError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, subject_symbol, kind, record_ref, computed_value, threshold, created_at
             FROM alerts ORDER BY created_at DESC LIMIT ?1",
        )?;
        let alerts = stmt
            .query_map(params![limit as i64], Self::row_to_alert)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(alerts)
    }

    fn latest_sector_snapshot(&self, sector: &str) -> Result<Option<SectorSnapshot>, DomainError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT sector, computed_at, aggregate_return_pct, members_reporting
             FROM sector_snapshots WHERE sector = ?1 ORDER BY computed_at DESC LIMIT 1",
        )?;
        let mut rows = stmt.query_map(params![sector], |row| {
            let computed: String = row.get(1)?;
            let members: i64 = row.get(3)?;
            Ok(SectorSnapshot {
                sector: row.get(0)?,
                computed_at: parse_ts(&computed)?,
                aggregate_return_pct: row.get(2)?,
                members_reporting: members.max(0) as usize,
            })
        })?;
        Ok(rows.next().transpose()?)
    }

    fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<PruneStats, DomainError> {
        let conn = self.lock()?;
        let cutoff = ts(&cutoff);
        let quotes = conn.execute("DELETE FROM quotes WHERE ts < ?1", params![cutoff])?;
        let news = conn.execute("DELETE FROM news WHERE published_at < ?1", params![cutoff])?;
        let alerts = conn.execute("DELETE FROM alerts WHERE created_at < ?1", params![cutoff])?;
        conn.execute("DELETE FROM sector_snapshots WHERE computed_at < ?1", params![cutoff])?;
        Ok(PruneStats { quotes, news, alerts })
    }
}
