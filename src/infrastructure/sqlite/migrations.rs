use crate::domain::error::DomainError;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<(), DomainError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS quotes (
            symbol TEXT NOT NULL,
            interval TEXT NOT NULL,
            ts TEXT NOT NULL,
            open REAL NOT NULL,
            high REAL NOT NULL,
            low REAL NOT NULL,
            close REAL NOT NULL,
            volume INTEGER NOT NULL DEFAULT 0,
            ingested_at TEXT NOT NULL,
            PRIMARY KEY (symbol, ts)
        );

        CREATE TABLE IF NOT EXISTS news (
            id TEXT PRIMARY KEY,
            scope TEXT NOT NULL,
            subject TEXT NOT NULL,
            headline TEXT NOT NULL,
            summary TEXT,
            source TEXT NOT NULL,
            url TEXT,
            published_at TEXT NOT NULL,
            sentiment REAL NOT NULL CHECK (sentiment BETWEEN -1.0 AND 1.0),
            impact_score REAL NOT NULL CHECK (impact_score BETWEEN 0.0 AND 1.0),
            ingested_at TEXT NOT NULL,
            UNIQUE (source, headline, published_at)
        );

        CREATE TABLE IF NOT EXISTS alerts (
            id TEXT PRIMARY KEY,
            subject_symbol TEXT NOT NULL,
            kind TEXT NOT NULL,
            record_ref TEXT NOT NULL,
            computed_value REAL NOT NULL,
            threshold REAL NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sector_snapshots (
            sector TEXT NOT NULL,
            computed_at TEXT NOT NULL,
            aggregate_return_pct REAL NOT NULL,
            members_reporting INTEGER NOT NULL,
            PRIMARY KEY (sector, computed_at)
        );

        CREATE INDEX IF NOT EXISTS idx_quotes_symbol_ts ON quotes(symbol, ts DESC);
        CREATE INDEX IF NOT EXISTS idx_news_subject ON news(scope, subject, published_at DESC);
        CREATE INDEX IF NOT EXISTS idx_news_published ON news(published_at);
        CREATE INDEX IF NOT EXISTS idx_alerts_created ON alerts(created_at DESC);
        ",
    )
    .map_err(|e| DomainError::Sink(format!("Migration failed: {e}")))
}
