use crate::config::AlertConfig;
use crate::domain::entities::alert_event::AlertEvent;
use crate::domain::entities::news_record::NewsRecord;
use crate::domain::entities::quote_record::QuoteRecord;
use crate::domain::ports::market_store::MarketStore;
use crate::domain::ports::notifier::Notifier;
use crate::domain::values::alert_kind::AlertKind;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Threshold checks over freshly ingested records.
///
/// Quotes fire when the newest fresh bar of a symbol has
/// `close > threshold`, so a backfilled history yields at most one event
/// per symbol and batch. News fires when
/// `impact_score > impact_threshold`. Both comparisons are strict. Without
/// a cooldown every breach produces an event; with one, repeats for the
/// same `(subject, kind)` inside the window are suppressed.
pub struct AlertEvaluator {
    price_thresholds: HashMap<String, f64>,
    impact_threshold: f64,
    cooldown: Option<chrono::Duration>,
    last_fired: Mutex<HashMap<(String, AlertKind), DateTime<Utc>>>,
}

impl AlertEvaluator {
    pub fn new(
        price_thresholds: HashMap<String, f64>,
        impact_threshold: f64,
        cooldown: Option<Duration>,
    ) -> Self {
        Self {
            price_thresholds: price_thresholds
                .into_iter()
                .map(|(k, v)| (k.to_uppercase(), v))
                .collect(),
            impact_threshold,
            cooldown: cooldown.and_then(|d| chrono::Duration::from_std(d).ok()),
            last_fired: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &AlertConfig) -> Self {
        Self::new(
            config.price_thresholds.clone().into_iter().collect(),
            config.impact_threshold,
            config.cooldown_secs.map(Duration::from_secs),
        )
    }

    pub fn evaluate_quotes(&self, quotes: &[QuoteRecord]) -> Vec<AlertEvent> {
        let mut newest: HashMap<&str, &QuoteRecord> = HashMap::new();
        for q in quotes {
            newest
                .entry(q.symbol.as_str())
                .and_modify(|cur| {
                    if q.timestamp > cur.timestamp {
                        *cur = q;
                    }
                })
                .or_insert(q);
        }
        let mut latest: Vec<&QuoteRecord> = newest.into_values().collect();
        latest.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        latest
            .into_iter()
            .filter_map(|q| {
                let threshold = *self.price_thresholds.get(&q.symbol)?;
                if q.close > threshold {
                    Some(AlertEvent::new(
                        q.symbol.clone(),
                        AlertKind::PriceThreshold,
                        q.record_ref(),
                        q.close,
                        threshold,
                        q.timestamp,
                    ))
                } else {
                    None
                }
            })
            .filter(|e| self.admit(e))
            .collect()
    }

    /// Sector-scoped news raises alerts against the sector name.
    pub fn evaluate_news(&self, news: &[NewsRecord]) -> Vec<AlertEvent> {
        news.iter()
            .filter(|n| n.impact_score.value() > self.impact_threshold)
            .map(|n| {
                AlertEvent::new(
                    n.subject.name().to_string(),
                    AlertKind::NewsImpact,
                    n.record_ref(),
                    n.impact_score.value(),
                    self.impact_threshold,
                    n.published_at.max(n.ingested_at),
                )
            })
            .filter(|e| self.admit(e))
            .collect()
    }

    fn admit(&self, event: &AlertEvent) -> bool {
        let Some(cooldown) = self.cooldown else {
            return true;
        };
        let mut last = match self.last_fired.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let key = (event.subject_symbol.clone(), event.kind);
        match last.get(&key) {
            Some(prev) if event.created_at - *prev < cooldown => {
                tracing::debug!(symbol = %event.subject_symbol, kind = %event.kind, "alert suppressed by cooldown");
                false
            }
            _ => {
                last.insert(key, event.created_at);
                true
            }
        }
    }
}

/// Persists alert events and hands them to the notifier without waiting.
pub struct AlertDispatcher {
    store: Arc<dyn MarketStore>,
    notifier: Arc<dyn Notifier>,
    notify_timeout: Duration,
}

impl AlertDispatcher {
    pub fn new(store: Arc<dyn MarketStore>, notifier: Arc<dyn Notifier>, notify_timeout: Duration) -> Self {
        Self {
            store,
            notifier,
            notify_timeout,
        }
    }

    /// Store every event, then spawn delivery. Returns how many were stored.
    /// Delivery failures and timeouts are logged; they never reach the caller.
    pub fn dispatch(&self, events: Vec<AlertEvent>) -> usize {
        let mut stored = 0;
        for event in events {
            match self.store.append_alert(&event) {
                Ok(()) => stored += 1,
                Err(e) => tracing::error!(
                    symbol = %event.subject_symbol,
                    kind = %event.kind,
                    error = %e,
                    "failed to store alert"
                ),
            }
            tracing::info!(
                symbol = %event.subject_symbol,
                kind = %event.kind,
                value = event.computed_value,
                threshold = event.threshold,
                "alert fired"
            );

            let notifier = self.notifier.clone();
            let timeout = self.notify_timeout;
            tokio::spawn(async move {
                match tokio::time::timeout(timeout, notifier.notify(&event)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::error!(
                        notifier = notifier.name(),
                        alert_id = %event.id,
                        error = %e,
                        "alert delivery failed"
                    ),
                    Err(_) => tracing::error!(
                        notifier = notifier.name(),
                        alert_id = %event.id,
                        "alert delivery timed out"
                    ),
                }
            });
        }
        stored
    }
}
