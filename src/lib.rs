pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

use crate::application::alerts::{AlertDispatcher, AlertEvaluator};
use crate::application::correlation::{CorrelationReport, CorrelationUseCase};
use crate::application::impact::KeywordImpactScorer;
use crate::application::ingest_news::{NewsIngestUseCase, NewsScorer, Scores};
use crate::application::ingest_quotes::{FetchLimits, QuoteIngestUseCase};
use crate::application::run_report::RunReport;
use crate::application::scheduler::{IngestionScheduler, SchedulerHandle, StreamRunner, StreamState};
use crate::application::sectors::{SectorReport, SectorUseCase};
use crate::config::PulseConfig;
use crate::domain::entities::alert_event::AlertEvent;
use crate::domain::entities::news_record::NewsRecord;
use crate::domain::entities::quote_record::QuoteRecord;
use crate::domain::entities::sector::Sector;
use crate::domain::error::DomainError;
use crate::domain::ports::market_store::{MarketStore, NewsFilter, PruneStats};
use crate::domain::ports::news_source::NewsSource;
use crate::domain::ports::notifier::Notifier;
use crate::domain::ports::quote_source::QuoteSource;
use crate::domain::ports::scoring::SentimentModel;
use crate::domain::values::news_subject::NewsSubject;
use crate::domain::values::stream::StreamKind;
use crate::infrastructure::feeds::finnhub::FinnhubNewsSource;
use crate::infrastructure::feeds::multi::MultiNewsSource;
use crate::infrastructure::feeds::newsapi::NewsApiSource;
use crate::infrastructure::feeds::yahoo::YahooQuoteSource;
use crate::infrastructure::notify::log::LogNotifier;
use crate::infrastructure::notify::webhook::WebhookNotifier;
use crate::infrastructure::sentiment::lexicon::LexiconSentiment;
use crate::infrastructure::sqlite::market_store::SqliteMarketStore;
use chrono::Utc;
use std::sync::Arc;

/// External collaborators. Swapped for mocks in tests.
pub struct Providers {
    pub quotes: Arc<dyn QuoteSource>,
    pub news: Arc<dyn NewsSource>,
    pub sentiment: Arc<dyn SentimentModel>,
    pub notifier: Arc<dyn Notifier>,
}

impl Providers {
    /// Yahoo quotes, news from every provider with a key (`FINNHUB_API_KEY`,
    /// `NEWSAPI_KEY`; Finnhub alone when neither is set), the lexicon
    /// sentiment model, and a webhook notifier when
    /// `SECTORPULSE_WEBHOOK_URL` is set (log notifier otherwise).
    pub fn from_env(config: &PulseConfig) -> Self {
        let timeout = config.fetch_timeout();
        let sector_terms = config
            .sector_list()
            .into_iter()
            .map(|s| (s.name, s.symbols))
            .collect();
        let notifier: Arc<dyn Notifier> = match std::env::var("SECTORPULSE_WEBHOOK_URL") {
            Ok(url) if !url.trim().is_empty() => Arc::new(WebhookNotifier::new(
                url,
                std::time::Duration::from_secs(config.runtime.notify_timeout_secs),
            )),
            _ => Arc::new(LogNotifier),
        };

        let finnhub_key = env_key("FINNHUB_API_KEY");
        let newsapi_key = env_key("NEWSAPI_KEY");
        let mut news: Vec<Arc<dyn NewsSource>> = Vec::new();
        if finnhub_key.is_some() || newsapi_key.is_none() {
            news.push(Arc::new(FinnhubNewsSource::new(finnhub_key, sector_terms, timeout)));
        }
        if newsapi_key.is_some() {
            news.push(Arc::new(NewsApiSource::new(newsapi_key, timeout)));
        }
        let news: Arc<dyn NewsSource> = if news.len() == 1 {
            news.remove(0)
        } else {
            Arc::new(MultiNewsSource::new(news))
        };

        Self {
            quotes: Arc::new(YahooQuoteSource::new(timeout)),
            news,
            sentiment: Arc::new(LexiconSentiment::new()),
            notifier,
        }
    }
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|k| !k.trim().is_empty())
}

pub struct SectorPulse {
    config: PulseConfig,
    store: Arc<dyn MarketStore>,
    scorer: Arc<NewsScorer>,
    sectors: Arc<SectorUseCase>,
    correlation: CorrelationUseCase,
    quotes: Arc<StreamRunner>,
    news: Arc<StreamRunner>,
}

impl SectorPulse {
    pub fn new(config: PulseConfig, db_path: &str) -> Result<Self, DomainError> {
        let providers = Providers::from_env(&config);
        Self::with_providers(config, db_path, providers)
    }

    pub fn with_providers(
        config: PulseConfig,
        db_path: &str,
        providers: Providers,
    ) -> Result<Self, DomainError> {
        let store = Arc::new(SqliteMarketStore::open(db_path)?);
        Self::with_store(config, store, providers)
    }

    /// Wire everything around an arbitrary sink.
    pub fn with_store(
        config: PulseConfig,
        store: Arc<dyn MarketStore>,
        providers: Providers,
    ) -> Result<Self, DomainError> {
        config.validate()?;

        let scorer = Arc::new(NewsScorer::new(
            providers.sentiment,
            Arc::new(KeywordImpactScorer::from_config(&config.scoring)),
        ));
        let sectors = Arc::new(SectorUseCase::new(store.clone(), config.sector_list()));
        let evaluator = Arc::new(AlertEvaluator::from_config(&config.alerts));
        let dispatcher = Arc::new(AlertDispatcher::new(
            store.clone(),
            providers.notifier,
            std::time::Duration::from_secs(config.runtime.notify_timeout_secs),
        ));
        let limits = FetchLimits {
            workers: config.runtime.workers,
            timeout: config.fetch_timeout(),
        };

        let symbols: Vec<String> = config.symbols().into_keys().collect();
        let mut queries: Vec<NewsSubject> = symbols.iter().cloned().map(NewsSubject::Symbol).collect();
        queries.extend(
            config
                .news
                .sector_queries
                .iter()
                .map(|s| NewsSubject::Sector(s.trim().to_lowercase())),
        );

        let quote_job = QuoteIngestUseCase::new(
            providers.quotes,
            store.clone(),
            sectors.clone(),
            evaluator.clone(),
            dispatcher.clone(),
            symbols,
            config.quotes.interval,
            config.quotes.market_hours.clone(),
            limits,
        );
        let news_job = NewsIngestUseCase::new(
            providers.news,
            store.clone(),
            scorer.clone(),
            evaluator,
            dispatcher,
            queries,
            config.news_lookback(),
            limits,
        );

        let backoff = config.rate_limit_backoff();
        let quotes = Arc::new(StreamRunner::new(Arc::new(quote_job), config.quote_cadence(), backoff));
        let news = Arc::new(StreamRunner::new(Arc::new(news_job), config.news_cadence(), backoff));

        Ok(Self {
            config,
            correlation: CorrelationUseCase::new(store.clone()),
            store,
            scorer,
            sectors,
            quotes,
            news,
        })
    }

    pub fn config(&self) -> &PulseConfig {
        &self.config
    }

    fn runner(&self, kind: StreamKind) -> &Arc<StreamRunner> {
        match kind {
            StreamKind::Quotes => &self.quotes,
            StreamKind::News => &self.news,
        }
    }

    /// Run one batch of a stream now, outside the schedule and regardless
    /// of market hours. Still skipped if a scheduled run is in flight.
    pub async fn ingest(&self, kind: StreamKind) -> RunReport {
        self.runner(kind).trigger_now().await
    }

    /// Start both streams on their own cadences.
    pub fn start_scheduler(&self) -> SchedulerHandle {
        IngestionScheduler::new(
            vec![self.quotes.clone(), self.news.clone()],
            self.config.shutdown_grace(),
        )
        .start()
    }

    pub fn stream_state(&self, kind: StreamKind) -> StreamState {
        self.runner(kind).state()
    }

    pub fn score(&self, text: &str, source: &str) -> Result<Scores, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::InvalidInput("Text to score is empty".into()));
        }
        self.scorer
            .score(source, text)
            .map_err(DomainError::InvalidInput)
    }

    pub fn sectors(&self) -> &[Sector] {
        self.sectors.sectors()
    }

    pub fn sector_report(&self, name: &str, window_days: u32) -> Result<SectorReport, DomainError> {
        self.sectors.report(name, window_days)
    }

    /// Daily price moves of `symbol` against its news sentiment.
    pub fn correlation(&self, symbol: &str, window_days: u32) -> Result<CorrelationReport, DomainError> {
        self.correlation.report(symbol, window_days)
    }

    pub fn recent_alerts(&self, limit: usize) -> Result<Vec<AlertEvent>, DomainError> {
        self.store.recent_alerts(limit)
    }

    pub fn news(&self, filter: &NewsFilter) -> Result<Vec<NewsRecord>, DomainError> {
        self.store.news(filter)
    }

    pub fn latest_quotes(&self, symbol: &str, limit: usize) -> Result<Vec<QuoteRecord>, DomainError> {
        self.store.latest_quotes(symbol, limit)
    }

    /// Delete stored quotes, news and alerts older than `days`.
    pub fn prune(&self, days: u32) -> Result<PruneStats, DomainError> {
        if days == 0 {
            return Err(DomainError::InvalidInput("Retention must be at least one day".into()));
        }
        let cutoff = days_ago(days).ok_or_else(|| {
            DomainError::InvalidInput(format!("Retention of {days} days is out of range"))
        })?;
        let stats = self.store.prune_before(cutoff)?;
        tracing::info!(
            quotes = stats.quotes,
            news = stats.news,
            alerts = stats.alerts,
            %cutoff,
            "pruned old records"
        );
        Ok(stats)
    }
}

/// `now - days`, or `None` when the result is not a representable time.
pub fn days_ago(days: u32) -> Option<chrono::DateTime<Utc>> {
    chrono::Duration::try_days(days as i64).and_then(|d| Utc::now().checked_sub_signed(d))
}

/// `now - hours`, or `None` when the result is not a representable time.
pub fn hours_ago(hours: u32) -> Option<chrono::DateTime<Utc>> {
    chrono::Duration::try_hours(hours as i64).and_then(|d| Utc::now().checked_sub_signed(d))
}
