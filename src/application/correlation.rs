use crate::domain::entities::news_record::NewsRecord;
use crate::domain::entities::quote_record::QuoteRecord;
use crate::domain::error::DomainError;
use crate::domain::ports::market_store::{MarketStore, NewsFilter};
use crate::domain::values::news_subject::NewsSubject;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Days with news needed before a coefficient is reported.
const MIN_PAIRED_DAYS: usize = 3;

/// One trading day: close-to-close move next to that day's news tone.
#[derive(Debug, Clone, Serialize)]
pub struct DailyCorrelation {
    pub date: NaiveDate,
    pub close: f64,
    pub price_change_pct: f64,
    pub avg_sentiment: f64,
    pub avg_impact: f64,
    pub news_count: usize,
    /// `|avg_sentiment * price_change_pct| / 100`; zero on days without news.
    pub correlation_strength: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationReport {
    pub symbol: String,
    pub window_days: u32,
    pub days: Vec<DailyCorrelation>,
    /// Pearson coefficient of daily sentiment against daily price change,
    /// over days that had news.
    pub coefficient: Option<f64>,
}

/// Joins stored daily closes with the symbol's scored news.
pub struct CorrelationUseCase {
    store: Arc<dyn MarketStore>,
}

impl CorrelationUseCase {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    pub fn report(&self, symbol: &str, window_days: u32) -> Result<CorrelationReport, DomainError> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(DomainError::InvalidInput("Symbol is empty".into()));
        }
        if window_days == 0 {
            return Err(DomainError::InvalidInput("Correlation window must be at least one day".into()));
        }
        let since = crate::days_ago(window_days).ok_or_else(|| {
            DomainError::InvalidInput(format!("Correlation window of {window_days} days is out of range"))
        })?;

        let bars = self.store.quotes_since(&symbol, since)?;
        let news = self.store.news(&NewsFilter {
            subject: Some(NewsSubject::Symbol(symbol.clone())),
            since: Some(since),
            limit: None,
        })?;

        let days = daily_rows(&bars, &news);
        let coefficient = pearson(
            days.iter()
                .filter(|d| d.news_count > 0)
                .map(|d| (d.avg_sentiment, d.price_change_pct)),
        );
        tracing::debug!(symbol = %symbol, days = days.len(), ?coefficient, "correlation computed");

        Ok(CorrelationReport {
            symbol,
            window_days,
            days,
            coefficient,
        })
    }
}

/// Last close of each UTC day, paired with the previous day's close and
/// that day's news averages. The first day has no previous close and is
/// left out.
pub(crate) fn daily_rows(bars: &[QuoteRecord], news: &[NewsRecord]) -> Vec<DailyCorrelation> {
    let mut closes: BTreeMap<NaiveDate, (chrono::DateTime<chrono::Utc>, f64)> = BTreeMap::new();
    for bar in bars {
        let day = bar.timestamp.date_naive();
        match closes.get(&day) {
            Some((ts, _)) if *ts > bar.timestamp => {}
            _ => {
                closes.insert(day, (bar.timestamp, bar.close));
            }
        }
    }

    let mut by_day: BTreeMap<NaiveDate, (f64, f64, usize)> = BTreeMap::new();
    for n in news {
        let entry = by_day.entry(n.published_at.date_naive()).or_default();
        entry.0 += n.sentiment.value();
        entry.1 += n.impact_score.value();
        entry.2 += 1;
    }

    let mut rows = Vec::new();
    let mut prev: Option<f64> = None;
    for (date, (_, close)) in closes {
        if let Some(prev_close) = prev.filter(|p| *p > 0.0) {
            let price_change_pct = (close - prev_close) / prev_close * 100.0;
            let (sentiment_sum, impact_sum, count) = by_day.get(&date).copied().unwrap_or_default();
            let (avg_sentiment, avg_impact) = if count > 0 {
                (sentiment_sum / count as f64, impact_sum / count as f64)
            } else {
                (0.0, 0.0)
            };
            rows.push(DailyCorrelation {
                date,
                close,
                price_change_pct,
                avg_sentiment,
                avg_impact,
                news_count: count,
                correlation_strength: (avg_sentiment * price_change_pct).abs() / 100.0,
            });
        }
        prev = Some(close);
    }
    rows
}

fn pearson(pairs: impl Iterator<Item = (f64, f64)>) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = pairs.collect();
    if pairs.len() < MIN_PAIRED_DAYS {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}
