use crate::domain::entities::news_record::NewsRecord;
use crate::domain::entities::sector::{Sector, SectorSnapshot};
use crate::domain::error::DomainError;
use crate::domain::ports::market_store::{MarketStore, NewsFilter};
use crate::domain::values::news_subject::NewsSubject;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

/// Bars used for the per-symbol short-term change in reports.
const REPORT_BARS: usize = 5;

pub struct SectorUseCase {
    store: Arc<dyn MarketStore>,
    sectors: Vec<Sector>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolSummary {
    pub symbol: String,
    pub latest_close: Option<f64>,
    /// Percent change across the last few stored bars.
    pub recent_change_pct: f64,
    pub avg_sentiment: f64,
    pub avg_impact: f64,
    pub news_count: usize,
    pub top_headlines: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectorReport {
    pub sector: String,
    pub color: String,
    pub window_days: u32,
    pub aggregate_return_pct: Option<f64>,
    pub avg_sentiment: f64,
    pub avg_impact: f64,
    /// Symbol-scoped plus sector-scoped articles in the window.
    pub total_news: usize,
    pub sector_news_count: usize,
    pub sector_headlines: Vec<String>,
    pub most_active: Option<String>,
    pub most_volatile: Option<String>,
    pub symbols: Vec<SymbolSummary>,
}

impl SectorUseCase {
    pub fn new(store: Arc<dyn MarketStore>, sectors: Vec<Sector>) -> Self {
        Self { store, sectors }
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    /// Recompute and store each sector's aggregate return from the last two
    /// closes of every member that has them. Sectors with no reporting
    /// members are left without a new snapshot.
    pub fn recompute(&self) -> Vec<SectorSnapshot> {
        let mut snapshots = Vec::new();
        for sector in &self.sectors {
            let mut returns = Vec::new();
            for symbol in &sector.symbols {
                match self.store.latest_quotes(symbol, 2) {
                    Ok(bars) if bars.len() == 2 && bars[1].close > 0.0 => {
                        returns.push((bars[0].close - bars[1].close) / bars[1].close * 100.0);
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(sector = %sector.name, symbol = %symbol, error = %e, "cannot read quotes"),
                }
            }
            if returns.is_empty() {
                continue;
            }
            let snapshot = SectorSnapshot {
                sector: sector.name.clone(),
                aggregate_return_pct: returns.iter().sum::<f64>() / returns.len() as f64,
                members_reporting: returns.len(),
                computed_at: Utc::now(),
            };
            if let Err(e) = self.store.record_sector_snapshot(&snapshot) {
                tracing::error!(sector = %sector.name, error = %e, "failed to store sector snapshot");
            }
            snapshots.push(snapshot);
        }
        snapshots
    }

    pub fn report(&self, name: &str, window_days: u32) -> Result<SectorReport, DomainError> {
        let sector = self
            .sectors
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| DomainError::NotFound(format!("Sector not found: {name}")))?;
        let since = crate::days_ago(window_days).ok_or_else(|| {
            DomainError::InvalidInput(format!("Report window of {window_days} days is out of range"))
        })?;

        let mut symbols = Vec::with_capacity(sector.symbols.len());
        for symbol in &sector.symbols {
            let bars = self.store.latest_quotes(symbol, REPORT_BARS)?;
            let news = self.store.news(&NewsFilter {
                subject: Some(NewsSubject::Symbol(symbol.clone())),
                since: Some(since),
                limit: None,
            })?;

            let recent_change_pct = match (bars.first(), bars.last()) {
                (Some(newest), Some(oldest)) if bars.len() >= 2 && oldest.close > 0.0 => {
                    (newest.close - oldest.close) / oldest.close * 100.0
                }
                _ => 0.0,
            };

            symbols.push(SymbolSummary {
                symbol: symbol.clone(),
                latest_close: bars.first().map(|b| b.close),
                recent_change_pct,
                avg_sentiment: mean(&news, |n| n.sentiment.value()),
                avg_impact: mean(&news, |n| n.impact_score.value()),
                news_count: news.len(),
                top_headlines: news.iter().take(3).map(|n| n.headline.clone()).collect(),
            });
        }

        let sector_news = self.store.news(&NewsFilter {
            subject: Some(NewsSubject::Sector(sector.name.to_lowercase())),
            since: Some(since),
            limit: None,
        })?;

        let symbol_news: usize = symbols.iter().map(|s| s.news_count).sum();
        let most_active = if symbol_news > 0 {
            symbols.iter().max_by_key(|s| s.news_count).map(|s| s.symbol.clone())
        } else {
            None
        };
        let most_volatile = symbols
            .iter()
            .filter(|s| s.latest_close.is_some())
            .max_by(|a, b| a.recent_change_pct.abs().total_cmp(&b.recent_change_pct.abs()))
            .map(|s| s.symbol.clone());

        Ok(SectorReport {
            sector: sector.name.clone(),
            color: sector.color.clone(),
            window_days,
            aggregate_return_pct: self
                .store
                .latest_sector_snapshot(&sector.name)?
                .map(|s| s.aggregate_return_pct),
            avg_sentiment: weighted(&symbols, &sector_news, |s| s.avg_sentiment, |n| n.sentiment.value()),
            avg_impact: weighted(&symbols, &sector_news, |s| s.avg_impact, |n| n.impact_score.value()),
            total_news: symbol_news + sector_news.len(),
            sector_news_count: sector_news.len(),
            sector_headlines: sector_news.iter().take(3).map(|n| n.headline.clone()).collect(),
            most_active,
            most_volatile,
            symbols,
        })
    }
}

/// Per-article average over every symbol's news and the sector's own news.
fn weighted(
    symbols: &[SymbolSummary],
    sector_news: &[NewsRecord],
    by_symbol: impl Fn(&SymbolSummary) -> f64,
    by_record: impl Fn(&NewsRecord) -> f64,
) -> f64 {
    let total = symbols.iter().map(|s| s.news_count).sum::<usize>() + sector_news.len();
    if total == 0 {
        return 0.0;
    }
    let sum = symbols.iter().map(|s| by_symbol(s) * s.news_count as f64).sum::<f64>()
        + sector_news.iter().map(by_record).sum::<f64>();
    sum / total as f64
}

fn mean(news: &[NewsRecord], f: impl Fn(&NewsRecord) -> f64) -> f64 {
    if news.is_empty() {
        return 0.0;
    }
    news.iter().map(f).sum::<f64>() / news.len() as f64
}
