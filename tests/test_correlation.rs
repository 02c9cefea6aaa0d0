mod common;

use chrono::{DateTime, Days, Utc};
use common::*;
use sectorpulse::domain::entities::news_record::{NewsRecord, RawArticle};
use sectorpulse::domain::entities::quote_record::QuoteRecord;
use sectorpulse::domain::error::DomainError;
use sectorpulse::domain::ports::market_store::MarketStore;
use sectorpulse::domain::values::impact::ImpactScore;
use sectorpulse::domain::values::interval::SamplingInterval;
use sectorpulse::domain::values::news_subject::NewsSubject;
use sectorpulse::domain::values::sentiment::Sentiment;
use sectorpulse::infrastructure::sqlite::market_store::SqliteMarketStore;
use sectorpulse::{Providers, SectorPulse};
use std::sync::Arc;

/// Noon UTC `days` days ago, plus `hours`.
fn at(days: u64, hours: i64) -> DateTime<Utc> {
    let noon = Utc::now().date_naive().checked_sub_days(Days::new(days)).unwrap();
    noon.and_hms_opt(12, 0, 0).unwrap().and_utc() + chrono::Duration::hours(hours)
}

fn close(symbol: &str, timestamp: DateTime<Utc>, close: f64) -> QuoteRecord {
    QuoteRecord {
        symbol: symbol.into(),
        interval: SamplingInterval::Hourly,
        timestamp,
        open: close,
        high: close,
        low: close,
        close,
        volume: 500,
    }
}

fn story(headline: &str, published_at: DateTime<Utc>, sentiment: f64) -> NewsRecord {
    NewsRecord::new(
        NewsSubject::Symbol("LMT".into()),
        RawArticle {
            headline: headline.into(),
            summary: None,
            source: "reuters.com".into(),
            published_at,
            url: None,
        },
        Sentiment::new(sentiment).unwrap(),
        ImpactScore::new(0.4).unwrap(),
    )
}

fn pulse(store: Arc<SqliteMarketStore>) -> SectorPulse {
    SectorPulse::with_store(
        test_config(),
        store,
        Providers {
            quotes: Arc::new(MockQuoteSource::default()),
            news: Arc::new(MockNewsSource::default()),
            sentiment: Arc::new(FixedSentiment(0.0)),
            notifier: Arc::new(RecordingNotifier::default()),
        },
    )
    .unwrap()
}

#[tokio::test]
async fn test_correlation_joins_daily_moves_and_news() {
    let store = Arc::new(SqliteMarketStore::open(":memory:").unwrap());
    for q in [
        close("LMT", at(4, 0), 400.0),
        close("LMT", at(3, -2), 390.0),
        close("LMT", at(3, 4), 420.0),
        close("LMT", at(2, 4), 399.0),
        close("LMT", at(1, 4), 418.95),
        close("RTX", at(1, 4), 90.0),
    ] {
        store.append_quote(&q).unwrap();
    }
    for n in [
        story("Lockheed wins contract", at(3, 1), 0.6),
        story("Lockheed raises guidance", at(3, 2), 0.4),
        story("Lockheed program delayed", at(2, 0), -0.5),
        story("Lockheed rebounds", at(1, 0), 0.3),
    ] {
        store.append_news(&n).unwrap();
    }
    let pulse = pulse(store);

    let report = pulse.correlation("lmt", 30).unwrap();

    assert_eq!(report.symbol, "LMT");
    assert_eq!(report.days.len(), 3);
    let first = &report.days[0];
    assert_eq!(first.date, at(3, 0).date_naive());
    assert_eq!(first.close, 420.0);
    assert!((first.price_change_pct - 5.0).abs() < 1e-9);
    assert_eq!(first.news_count, 2);
    assert!((first.avg_sentiment - 0.5).abs() < 1e-9);
    assert!((first.correlation_strength - 0.025).abs() < 1e-9);

    assert!((report.days[1].price_change_pct + 5.0).abs() < 1e-9);
    assert!((report.days[2].price_change_pct - 5.0).abs() < 1e-9);
    // Sentiment tracks the price direction on every day.
    assert!(report.coefficient.unwrap() > 0.9);
}

#[tokio::test]
async fn test_correlation_without_data_is_empty() {
    let pulse = pulse(Arc::new(SqliteMarketStore::open(":memory:").unwrap()));
    let report = pulse.correlation("NOC", 30).unwrap();
    assert!(report.days.is_empty());
    assert!(report.coefficient.is_none());
}

#[tokio::test]
async fn test_correlation_rejects_bad_windows() {
    let pulse = pulse(Arc::new(SqliteMarketStore::open(":memory:").unwrap()));
    assert!(matches!(pulse.correlation("LMT", 0), Err(DomainError::InvalidInput(_))));
    assert!(matches!(pulse.correlation("LMT", u32::MAX), Err(DomainError::InvalidInput(_))));
    assert!(matches!(pulse.correlation("  ", 30), Err(DomainError::InvalidInput(_))));
}
