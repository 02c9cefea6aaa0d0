//! Shared test helpers: scripted providers and a recording notifier.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sectorpulse::config::PulseConfig;
use sectorpulse::domain::entities::alert_event::AlertEvent;
use sectorpulse::domain::entities::news_record::RawArticle;
use sectorpulse::domain::entities::quote_record::QuoteRecord;
use sectorpulse::domain::error::FetchError;
use sectorpulse::domain::ports::news_source::NewsSource;
use sectorpulse::domain::ports::notifier::Notifier;
use sectorpulse::domain::ports::quote_source::QuoteSource;
use sectorpulse::domain::ports::scoring::SentimentModel;
use sectorpulse::domain::values::interval::SamplingInterval;
use sectorpulse::domain::values::news_subject::NewsSubject;
use sectorpulse::{Providers, SectorPulse};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const DEFENSE: [&str; 5] = ["LMT", "RTX", "NOC", "GD", "BA"];

/// One sector of five symbols, LMT threshold 450, no market-hours window.
pub fn test_config() -> PulseConfig {
    PulseConfig::from_json(
        r##"{
            "sectors": {
                "defense": {"color": "#1f77b4", "symbols": ["LMT", "RTX", "NOC", "GD", "BA"]}
            },
            "quotes": {"cadence_secs": 3600, "interval": "60m"},
            "news": {"cadence_secs": 3600, "lookback_hours": 24, "sector_queries": ["defense"]},
            "alerts": {"price_thresholds": {"LMT": 450.0}, "impact_threshold": 0.7},
            "runtime": {"workers": 3, "fetch_timeout_secs": 2, "rate_limit_backoff_secs": 300,
                        "shutdown_grace_secs": 1, "notify_timeout_secs": 1}
        }"##,
    )
    .unwrap()
}

pub struct Harness {
    pub pulse: SectorPulse,
    pub quotes: Arc<MockQuoteSource>,
    pub news: Arc<MockNewsSource>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn setup() -> Harness {
    setup_with(test_config(), ":memory:", 0.5)
}

pub fn setup_with(config: PulseConfig, db_path: &str, sentiment: f64) -> Harness {
    let quotes = Arc::new(MockQuoteSource::default());
    let news = Arc::new(MockNewsSource::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let pulse = SectorPulse::with_providers(
        config,
        db_path,
        Providers {
            quotes: quotes.clone(),
            news: news.clone(),
            sentiment: Arc::new(FixedSentiment(sentiment)),
            notifier: notifier.clone(),
        },
    )
    .unwrap();
    Harness {
        pulse,
        quotes,
        news,
        notifier,
    }
}

/// A pulse on the test config whose alerts go to `notifier`.
pub fn pulse_with_notifier(notifier: Arc<dyn Notifier>) -> (SectorPulse, Arc<MockQuoteSource>) {
    let quotes = Arc::new(MockQuoteSource::default());
    let pulse = SectorPulse::with_providers(
        test_config(),
        ":memory:",
        Providers {
            quotes: quotes.clone(),
            news: Arc::new(MockNewsSource::default()),
            sentiment: Arc::new(FixedSentiment(0.5)),
            notifier,
        },
    )
    .unwrap();
    (pulse, quotes)
}

pub fn bar(symbol: &str, minutes_ago: i64, close: f64) -> QuoteRecord {
    let ts = (Utc::now() - Duration::minutes(minutes_ago)).timestamp();
    QuoteRecord {
        symbol: symbol.to_string(),
        interval: SamplingInterval::Hourly,
        timestamp: DateTime::<Utc>::from_timestamp(ts, 0).unwrap(),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1_000,
    }
}

pub fn article(headline: &str, source: &str, minutes_ago: i64) -> RawArticle {
    let ts = (Utc::now() - Duration::minutes(minutes_ago)).timestamp();
    RawArticle {
        headline: headline.to_string(),
        summary: None,
        source: source.to_string(),
        published_at: DateTime::<Utc>::from_timestamp(ts, 0).unwrap(),
        url: None,
    }
}

/// Scripted per-symbol responses. Unscripted symbols return no bars.
#[derive(Default)]
pub struct MockQuoteSource {
    responses: Mutex<HashMap<String, Result<Vec<QuoteRecord>, FetchError>>>,
    delay: Mutex<Option<std::time::Duration>>,
    pub calls: AtomicUsize,
}

impl MockQuoteSource {
    pub fn set(&self, symbol: &str, response: Result<Vec<QuoteRecord>, FetchError>) {
        self.responses.lock().unwrap().insert(symbol.to_string(), response);
    }

    pub fn set_delay(&self, delay: std::time::Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSource for MockQuoteSource {
    fn name(&self) -> &str {
        "mock_quotes"
    }

    async fn fetch_bars(
        &self,
        symbol: &str,
        _interval: SamplingInterval,
    ) -> Result<Vec<QuoteRecord>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .unwrap_or(Ok(vec![]))
    }
}

/// Scripted per-subject responses, filtered by `since` like a real provider.
#[derive(Default)]
pub struct MockNewsSource {
    responses: Mutex<HashMap<NewsSubject, Result<Vec<RawArticle>, FetchError>>>,
    pub calls: AtomicUsize,
}

impl MockNewsSource {
    pub fn set(&self, subject: NewsSubject, response: Result<Vec<RawArticle>, FetchError>) {
        self.responses.lock().unwrap().insert(subject, response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NewsSource for MockNewsSource {
    fn name(&self) -> &str {
        "mock_news"
    }

    async fn fetch_articles(
        &self,
        query: &NewsSubject,
        since: DateTime<Utc>,
    ) -> Result<Vec<RawArticle>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self
            .responses
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or(Ok(vec![]));
        response.map(|articles| {
            articles
                .into_iter()
                .filter(|a| a.published_at >= since)
                .collect()
        })
    }
}

pub struct FixedSentiment(pub f64);

impl SentimentModel for FixedSentiment {
    fn name(&self) -> &str {
        "fixed"
    }

    fn score(&self, _text: &str) -> f64 {
        self.0
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<AlertEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<AlertEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Delivery is spawned; give it a moment to land.
    pub async fn wait_for(&self, count: usize) -> Vec<AlertEvent> {
        for _ in 0..50 {
            if self.events.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        self.events()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn notify(&self, event: &AlertEvent) -> Result<(), String> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Rejects every delivery, like a webhook answering 500.
#[derive(Default)]
pub struct FailingNotifier {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl Notifier for FailingNotifier {
    fn name(&self) -> &str {
        "failing"
    }

    async fn notify(&self, _event: &AlertEvent) -> Result<(), String> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err("webhook returned 500".into())
    }
}

/// Never answers within any reasonable timeout.
pub struct HangingNotifier;

#[async_trait]
impl Notifier for HangingNotifier {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn notify(&self, _event: &AlertEvent) -> Result<(), String> {
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        Ok(())
    }
}
