use crate::application::alerts::{AlertDispatcher, AlertEvaluator};
use crate::application::run_report::{ItemFailure, RunReport};
use crate::application::scheduler::IngestJob;
use crate::application::sectors::SectorUseCase;
use crate::config::MarketHours;
use crate::domain::entities::quote_record::QuoteRecord;
use crate::domain::error::FetchError;
use crate::domain::ports::market_store::MarketStore;
use crate::domain::ports::quote_source::QuoteSource;
use crate::domain::values::interval::SamplingInterval;
use crate::domain::values::stream::StreamKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;

/// Bounded parallelism and per-call timeout for provider fetches.
#[derive(Debug, Clone, Copy)]
pub struct FetchLimits {
    pub workers: usize,
    pub timeout: Duration,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            workers: 4,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Fetch bars for every configured symbol, store the new ones, recompute
/// sector returns and raise price alerts.
pub struct QuoteIngestUseCase {
    source: Arc<dyn QuoteSource>,
    store: Arc<dyn MarketStore>,
    sectors: Arc<SectorUseCase>,
    evaluator: Arc<AlertEvaluator>,
    dispatcher: Arc<AlertDispatcher>,
    symbols: Vec<String>,
    interval: SamplingInterval,
    market_hours: Option<MarketHours>,
    limits: FetchLimits,
}

impl QuoteIngestUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<dyn QuoteSource>,
        store: Arc<dyn MarketStore>,
        sectors: Arc<SectorUseCase>,
        evaluator: Arc<AlertEvaluator>,
        dispatcher: Arc<AlertDispatcher>,
        symbols: Vec<String>,
        interval: SamplingInterval,
        market_hours: Option<MarketHours>,
        limits: FetchLimits,
    ) -> Self {
        Self {
            source,
            store,
            sectors,
            evaluator,
            dispatcher,
            symbols,
            interval,
            market_hours,
            limits,
        }
    }

    pub async fn execute(&self) -> RunReport {
        let mut report = RunReport::begin(StreamKind::Quotes, self.symbols.len());

        let results: Vec<(String, Result<Vec<QuoteRecord>, FetchError>)> =
            stream::iter(self.symbols.iter().cloned())
                .map(|symbol| async move {
                    let result = self.fetch_one(&symbol).await;
                    (symbol, result)
                })
                .buffer_unordered(self.limits.workers.max(1))
                .collect()
                .await;

        let mut fresh = Vec::new();
        for (symbol, result) in results {
            let bars = match result {
                Ok(bars) => bars,
                Err(e) => {
                    tracing::warn!(stream = "quotes", symbol = %symbol, error = %e, "symbol fetch failed");
                    report.failures.push(ItemFailure::new(&symbol, &e));
                    continue;
                }
            };
            report.fetched += bars.len();

            for bar in bars {
                if bar.symbol != symbol {
                    tracing::warn!(
                        stream = "quotes",
                        symbol = %symbol,
                        returned = %bar.symbol,
                        "provider returned a bar for another symbol, dropped"
                    );
                    report.dropped += 1;
                    continue;
                }
                if let Err(msg) = bar.validate() {
                    tracing::warn!(stream = "quotes", symbol = %symbol, error = %msg, "malformed bar dropped");
                    report.dropped += 1;
                    continue;
                }
                match self.store.append_quote(&bar) {
                    Ok(true) => {
                        report.stored += 1;
                        fresh.push(bar);
                    }
                    Ok(false) => report.duplicates += 1,
                    Err(e) => {
                        tracing::error!(stream = "quotes", symbol = %symbol, error = %e, "failed to store quote");
                        report.sink_errors += 1;
                    }
                }
            }
        }

        if !fresh.is_empty() {
            self.sectors.recompute();
            let events = self.evaluator.evaluate_quotes(&fresh);
            report.alerts = self.dispatcher.dispatch(events);
        }

        report.finish()
    }

    async fn fetch_one(&self, symbol: &str) -> Result<Vec<QuoteRecord>, FetchError> {
        match tokio::time::timeout(
            self.limits.timeout,
            self.source.fetch_bars(symbol, self.interval),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::Provider(format!(
                "{} timed out after {:?}",
                self.source.name(),
                self.limits.timeout
            ))),
        }
    }
}

#[async_trait]
impl IngestJob for QuoteIngestUseCase {
    fn kind(&self) -> StreamKind {
        StreamKind::Quotes
    }

    fn in_window(&self, now: DateTime<Utc>) -> bool {
        match &self.market_hours {
            None => true,
            // Validated at startup, so an error here means "closed".
            Some(hours) => hours.contains(now).unwrap_or(false),
        }
    }

    async fn run(&self) -> RunReport {
        self.execute().await
    }
}
