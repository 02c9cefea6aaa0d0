use crate::application::alerts::{AlertDispatcher, AlertEvaluator};
use crate::application::ingest_quotes::FetchLimits;
use crate::application::run_report::{ItemFailure, RunReport};
use crate::application::scheduler::IngestJob;
use crate::domain::entities::news_record::{NewsKey, NewsRecord, RawArticle};
use crate::domain::error::FetchError;
use crate::domain::ports::market_store::MarketStore;
use crate::domain::ports::news_source::NewsSource;
use crate::domain::ports::scoring::{ImpactModel, SentimentModel};
use crate::domain::values::impact::ImpactScore;
use crate::domain::values::news_subject::NewsSubject;
use crate::domain::values::sentiment::Sentiment;
use crate::domain::values::stream::StreamKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Sentiment and impact for one piece of text.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct Scores {
    pub sentiment: Sentiment,
    pub impact: ImpactScore,
}

/// Runs the configured sentiment and impact strategies and enforces their
/// output ranges.
pub struct NewsScorer {
    sentiment: Arc<dyn SentimentModel>,
    impact: Arc<dyn ImpactModel>,
}

impl NewsScorer {
    pub fn new(sentiment: Arc<dyn SentimentModel>, impact: Arc<dyn ImpactModel>) -> Self {
        Self { sentiment, impact }
    }

    pub fn score(&self, source: &str, text: &str) -> Result<Scores, String> {
        let sentiment = Sentiment::new(self.sentiment.score(text))
            .map_err(|e| format!("sentiment model '{}': {e}", self.sentiment.name()))?;
        let impact = ImpactScore::new(self.impact.score(sentiment, source, text))?;
        Ok(Scores { sentiment, impact })
    }
}

/// Fetch articles for every query, drop what was already seen, score the
/// rest and store them, then raise impact alerts.
///
/// The seen-set is seeded from the store on the first run, so a restarted
/// process does not reprocess articles it stored before. Keys older than
/// the look-back window are evicted, since no query can return them again.
pub struct NewsIngestUseCase {
    source: Arc<dyn NewsSource>,
    store: Arc<dyn MarketStore>,
    scorer: Arc<NewsScorer>,
    evaluator: Arc<AlertEvaluator>,
    dispatcher: Arc<AlertDispatcher>,
    queries: Vec<NewsSubject>,
    lookback: chrono::Duration,
    limits: FetchLimits,
    seen: Mutex<HashSet<NewsKey>>,
    seeded: AtomicBool,
}

impl NewsIngestUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<dyn NewsSource>,
        store: Arc<dyn MarketStore>,
        scorer: Arc<NewsScorer>,
        evaluator: Arc<AlertEvaluator>,
        dispatcher: Arc<AlertDispatcher>,
        queries: Vec<NewsSubject>,
        lookback: chrono::Duration,
        limits: FetchLimits,
    ) -> Self {
        Self {
            source,
            store,
            scorer,
            evaluator,
            dispatcher,
            queries,
            lookback,
            limits,
            seen: Mutex::new(HashSet::new()),
            seeded: AtomicBool::new(false),
        }
    }

    pub async fn execute(&self) -> RunReport {
        let mut report = RunReport::begin(StreamKind::News, self.queries.len());
        let since = Utc::now()
            .checked_sub_signed(self.lookback)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.refresh_seen(since);

        let results: Vec<(NewsSubject, Result<Vec<RawArticle>, FetchError>)> =
            stream::iter(self.queries.iter().cloned())
                .map(|query| async move {
                    let result = self.fetch_one(&query, since).await;
                    (query, result)
                })
                .buffer_unordered(self.limits.workers.max(1))
                .collect()
                .await;

        let mut fresh = Vec::new();
        for (query, result) in results {
            let articles = match result {
                Ok(articles) => articles,
                Err(e) => {
                    tracing::warn!(stream = "news", query = %query, error = %e, "news fetch failed");
                    report.failures.push(ItemFailure::new(&query.to_string(), &e));
                    continue;
                }
            };
            report.fetched += articles.len();

            for article in articles {
                if let Some(record) = self.process(&query, article, since, &mut report) {
                    fresh.push(record);
                }
            }
        }

        if !fresh.is_empty() {
            let events = self.evaluator.evaluate_news(&fresh);
            report.alerts = self.dispatcher.dispatch(events);
        }

        report.finish()
    }

    fn process(
        &self,
        query: &NewsSubject,
        article: RawArticle,
        since: DateTime<Utc>,
        report: &mut RunReport,
    ) -> Option<NewsRecord> {
        if article.headline.trim().is_empty() || article.source.trim().is_empty() {
            tracing::warn!(stream = "news", query = %query, "article without headline or source dropped");
            report.dropped += 1;
            return None;
        }
        if article.published_at < since {
            return None;
        }

        let key = article.dedup_key();
        if self.is_seen(&key) {
            report.duplicates += 1;
            return None;
        }

        let scores = match self.scorer.score(&article.source, &article.full_text()) {
            Ok(scores) => scores,
            Err(e) => {
                tracing::error!(stream = "news", query = %query, headline = %article.headline, error = %e, "scoring contract violated, article dropped");
                report.dropped += 1;
                return None;
            }
        };

        let record = NewsRecord::new(query.clone(), article, scores.sentiment, scores.impact);
        match self.store.append_news(&record) {
            Ok(true) => {
                self.mark_seen(key);
                report.stored += 1;
                Some(record)
            }
            Ok(false) => {
                self.mark_seen(key);
                report.duplicates += 1;
                None
            }
            Err(e) => {
                // Not marked seen: it is picked up again next cycle if still returned.
                tracing::error!(stream = "news", query = %query, error = %e, "failed to store news");
                report.sink_errors += 1;
                None
            }
        }
    }

    async fn fetch_one(
        &self,
        query: &NewsSubject,
        since: DateTime<Utc>,
    ) -> Result<Vec<RawArticle>, FetchError> {
        match tokio::time::timeout(self.limits.timeout, self.source.fetch_articles(query, since)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Provider(format!(
                "{} timed out after {:?}",
                self.source.name(),
                self.limits.timeout
            ))),
        }
    }

    fn refresh_seen(&self, since: DateTime<Utc>) {
        let mut seen = self.seen.lock().unwrap_or_else(|p| p.into_inner());
        if !self.seeded.load(Ordering::Acquire) {
            match self.store.news_keys_since(since) {
                Ok(keys) => {
                    tracing::debug!(count = keys.len(), "seeded news seen-set from store");
                    seen.extend(keys);
                    self.seeded.store(true, Ordering::Release);
                }
                // Store idempotence still prevents duplicates; retry seeding next run.
                Err(e) => tracing::warn!(error = %e, "cannot seed news seen-set"),
            }
        }
        seen.retain(|k| k.published_at >= since);
    }

    fn is_seen(&self, key: &NewsKey) -> bool {
        self.seen
            .lock()
            .map(|s| s.contains(key))
            .unwrap_or_else(|p| p.into_inner().contains(key))
    }

    fn mark_seen(&self, key: NewsKey) {
        self.seen.lock().unwrap_or_else(|p| p.into_inner()).insert(key);
    }
}

#[async_trait]
impl IngestJob for NewsIngestUseCase {
    fn kind(&self) -> StreamKind {
        StreamKind::News
    }

    async fn run(&self) -> RunReport {
        self.execute().await
    }
}
