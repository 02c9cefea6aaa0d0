//! Runtime configuration.
//!
//! Everything the core needs to know about the market is supplied here:
//! the symbol-to-sector map, stream cadences, alert thresholds, the
//! source-weight table and the high-impact keyword list. The built-in
//! defaults exist only to seed `init-config` and tests.

use crate::domain::entities::sector::{Sector, Symbol};
use crate::domain::error::DomainError;
use crate::domain::values::interval::SamplingInterval;
use chrono::{Datelike, FixedOffset, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorConfig {
    pub color: String,
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketHours {
    /// Local opening time, `HH:MM`.
    pub open: String,
    /// Local closing time, `HH:MM`.
    pub close: String,
    /// Offset of the exchange's local time from UTC.
    pub utc_offset_minutes: i32,
    #[serde(default = "default_true")]
    pub weekdays_only: bool,
}

impl MarketHours {
    /// Whether `now` falls inside the window (open inclusive, close exclusive).
    pub fn contains(&self, now: chrono::DateTime<Utc>) -> Result<bool, DomainError> {
        let open = parse_hhmm(&self.open)?;
        let close = parse_hhmm(&self.close)?;
        let offset = FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            DomainError::Config(format!("utc_offset_minutes out of range: {}", self.utc_offset_minutes))
        })?;
        let local = now.with_timezone(&offset);
        if self.weekdays_only && matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return Ok(false);
        }
        let t = local.time();
        Ok(t >= open && t < close)
    }
}

fn parse_hhmm(s: &str) -> Result<NaiveTime, DomainError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|e| DomainError::Config(format!("Invalid time '{s}' (expected HH:MM): {e}")))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteStreamConfig {
    #[serde(default = "default_quote_cadence")]
    pub cadence_secs: u64,
    #[serde(default)]
    pub interval: SamplingInterval,
    /// Quotes are only polled inside this window. `None` polls continuously.
    #[serde(default)]
    pub market_hours: Option<MarketHours>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsStreamConfig {
    #[serde(default = "default_news_cadence")]
    pub cadence_secs: u64,
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: u32,
    /// Sectors that are also queried by name, in addition to every symbol.
    #[serde(default)]
    pub sector_queries: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Per-symbol upper close thresholds.
    #[serde(default)]
    pub price_thresholds: BTreeMap<String, f64>,
    #[serde(default = "default_impact_threshold")]
    pub impact_threshold: f64,
    /// Suppress repeat alerts for the same (symbol, kind) within this window.
    /// Unset means every breach fires.
    #[serde(default)]
    pub cooldown_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_source_weights")]
    pub source_weights: BTreeMap<String, f64>,
    #[serde(default = "default_source_weight")]
    pub default_source_weight: f64,
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    #[serde(default = "default_keyword_increment")]
    pub keyword_increment: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_backoff")]
    pub rate_limit_backoff_secs: u64,
    #[serde(default = "default_grace")]
    pub shutdown_grace_secs: u64,
    #[serde(default = "default_notify_timeout")]
    pub notify_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseConfig {
    pub sectors: BTreeMap<String, SectorConfig>,
    #[serde(default = "QuoteStreamConfig::default")]
    pub quotes: QuoteStreamConfig,
    #[serde(default = "NewsStreamConfig::default")]
    pub news: NewsStreamConfig,
    #[serde(default = "AlertConfig::default")]
    pub alerts: AlertConfig,
    #[serde(default = "ScoringConfig::default")]
    pub scoring: ScoringConfig,
    #[serde(default = "RuntimeConfig::default")]
    pub runtime: RuntimeConfig,
}

fn default_true() -> bool {
    true
}
fn default_quote_cadence() -> u64 {
    15 * 60
}
fn default_news_cadence() -> u64 {
    30 * 60
}
/// Upper bound for `news.lookback_hours`: one leap year.
pub const MAX_LOOKBACK_HOURS: u32 = 24 * 366;

fn default_lookback_hours() -> u32 {
    24
}
fn default_impact_threshold() -> f64 {
    0.7
}
fn default_source_weight() -> f64 {
    0.8
}
fn default_keyword_increment() -> f64 {
    0.1
}
fn default_workers() -> usize {
    4
}
fn default_fetch_timeout() -> u64 {
    10
}
fn default_backoff() -> u64 {
    5 * 60
}
fn default_grace() -> u64 {
    30
}
fn default_notify_timeout() -> u64 {
    10
}

fn default_source_weights() -> BTreeMap<String, f64> {
    [
        ("reuters.com", 1.2),
        ("bloomberg.com", 1.2),
        ("wsj.com", 1.15),
        ("cnbc.com", 1.1),
        ("marketwatch.com", 1.05),
        ("seekingalpha.com", 1.0),
        ("yahoo.com", 0.9),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn default_keywords() -> Vec<String> {
    [
        "earnings",
        "revenue",
        "profit",
        "loss",
        "merger",
        "acquisition",
        "lawsuit",
        "regulation",
        "contract",
        "order",
        "guidance",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for QuoteStreamConfig {
    fn default() -> Self {
        Self {
            cadence_secs: default_quote_cadence(),
            interval: SamplingInterval::default(),
            market_hours: Some(MarketHours {
                open: "09:30".into(),
                close: "16:00".into(),
                utc_offset_minutes: -5 * 60,
                weekdays_only: true,
            }),
        }
    }
}

impl Default for NewsStreamConfig {
    fn default() -> Self {
        Self {
            cadence_secs: default_news_cadence(),
            lookback_hours: default_lookback_hours(),
            sector_queries: vec![],
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            price_thresholds: BTreeMap::new(),
            impact_threshold: default_impact_threshold(),
            cooldown_secs: None,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            source_weights: default_source_weights(),
            default_source_weight: default_source_weight(),
            keywords: default_keywords(),
            keyword_increment: default_keyword_increment(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            fetch_timeout_secs: default_fetch_timeout(),
            rate_limit_backoff_secs: default_backoff(),
            shutdown_grace_secs: default_grace(),
            notify_timeout_secs: default_notify_timeout(),
        }
    }
}

impl Default for PulseConfig {
    fn default() -> Self {
        let sectors = [
            ("defense", "#1f77b4", ["LMT", "RTX", "BA", "GD", "NOC", "LHX"]),
            ("tech", "#ff7f0e", ["AAPL", "MSFT", "GOOGL", "AMZN", "META", "NVDA"]),
            ("finance", "#2ca02c", ["JPM", "BAC", "WFC", "GS", "MS", "C"]),
            ("healthcare", "#d62728", ["JNJ", "PFE", "UNH", "MRK", "ABT", "TMO"]),
            ("energy", "#9467bd", ["XOM", "CVX", "COP", "EOG", "SLB", "OXY"]),
        ]
        .into_iter()
        .map(|(name, color, symbols)| {
            (
                name.to_string(),
                SectorConfig {
                    color: color.to_string(),
                    symbols: symbols.iter().map(|s| s.to_string()).collect(),
                },
            )
        })
        .collect();

        Self {
            sectors,
            quotes: QuoteStreamConfig::default(),
            news: NewsStreamConfig::default(),
            alerts: AlertConfig::default(),
            scoring: ScoringConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl PulseConfig {
    /// Load and validate. A missing file yields the built-in defaults.
    pub fn load(path: &Path) -> Result<Self, DomainError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DomainError::Config(format!("Cannot read {}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, DomainError> {
        let config: PulseConfig = serde_json::from_str(raw)
            .map_err(|e| DomainError::Config(format!("Invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, DomainError> {
        serde_json::to_string_pretty(self).map_err(|e| DomainError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.sectors.is_empty() {
            return Err(DomainError::Config("At least one sector is required".into()));
        }
        let mut owner: HashMap<String, &str> = HashMap::new();
        for (name, sector) in &self.sectors {
            if sector.symbols.is_empty() {
                return Err(DomainError::Config(format!("Sector '{name}' has no symbols")));
            }
            for raw in &sector.symbols {
                let ticker = raw.trim().to_uppercase();
                if ticker.is_empty() {
                    return Err(DomainError::Config(format!("Sector '{name}' has an empty symbol")));
                }
                if let Some(prev) = owner.insert(ticker.clone(), name.as_str()) {
                    return Err(DomainError::Config(format!(
                        "Symbol {ticker} is mapped to both '{prev}' and '{name}'"
                    )));
                }
            }
        }

        if self.quotes.cadence_secs == 0 || self.news.cadence_secs == 0 {
            return Err(DomainError::Config("Stream cadence must be positive".into()));
        }
        if let Some(hours) = &self.quotes.market_hours {
            let open = parse_hhmm(&hours.open)?;
            let close = parse_hhmm(&hours.close)?;
            if open >= close {
                return Err(DomainError::Config(format!(
                    "Market open {} must be before close {}",
                    hours.open, hours.close
                )));
            }
            hours.contains(Utc::now())?;
        }
        if self.news.lookback_hours == 0 || self.news.lookback_hours > MAX_LOOKBACK_HOURS {
            return Err(DomainError::Config(format!(
                "news.lookback_hours must be between 1 and {MAX_LOOKBACK_HOURS}, got {}",
                self.news.lookback_hours
            )));
        }
        for sector in &self.news.sector_queries {
            if !self.sectors.keys().any(|k| k.eq_ignore_ascii_case(sector)) {
                return Err(DomainError::Config(format!("Unknown sector query '{sector}'")));
            }
        }

        for (symbol, threshold) in &self.alerts.price_thresholds {
            if !threshold.is_finite() || *threshold < 0.0 {
                return Err(DomainError::Config(format!(
                    "Invalid price threshold for {symbol}: {threshold}"
                )));
            }
            if !owner.contains_key(&symbol.to_uppercase()) {
                return Err(DomainError::Config(format!(
                    "Price threshold set for unknown symbol {symbol}"
                )));
            }
        }
        let t = self.alerts.impact_threshold;
        if !t.is_finite() || !(0.0..=1.0).contains(&t) {
            return Err(DomainError::Config(format!(
                "Impact threshold must be between 0.0 and 1.0, got {t}"
            )));
        }

        let weights = self
            .scoring
            .source_weights
            .values()
            .chain(std::iter::once(&self.scoring.default_source_weight));
        for w in weights {
            if !w.is_finite() || *w < 0.0 {
                return Err(DomainError::Config(format!("Invalid source weight: {w}")));
            }
        }
        if !self.scoring.keyword_increment.is_finite() || self.scoring.keyword_increment < 0.0 {
            return Err(DomainError::Config(format!(
                "Invalid keyword increment: {}",
                self.scoring.keyword_increment
            )));
        }

        if self.runtime.workers == 0 {
            return Err(DomainError::Config("runtime.workers must be at least 1".into()));
        }
        if self.runtime.fetch_timeout_secs == 0 {
            return Err(DomainError::Config("runtime.fetch_timeout_secs must be positive".into()));
        }
        if self.runtime.notify_timeout_secs == 0 {
            return Err(DomainError::Config("runtime.notify_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// Every configured symbol, keyed by ticker.
    pub fn symbols(&self) -> BTreeMap<String, Symbol> {
        self.sectors
            .iter()
            .flat_map(|(name, sector)| {
                sector.symbols.iter().map(move |s| {
                    let symbol = Symbol::new(s, name);
                    (symbol.ticker().to_string(), symbol)
                })
            })
            .collect()
    }

    pub fn sector_list(&self) -> Vec<Sector> {
        self.sectors
            .iter()
            .map(|(name, sector)| Sector {
                name: name.to_lowercase(),
                color: sector.color.clone(),
                symbols: sector.symbols.iter().map(|s| s.trim().to_uppercase()).collect(),
            })
            .collect()
    }

    /// Thresholds keyed by upper-cased ticker.
    pub fn price_thresholds(&self) -> HashMap<String, f64> {
        self.alerts
            .price_thresholds
            .iter()
            .map(|(k, v)| (k.to_uppercase(), *v))
            .collect()
    }

    pub fn quote_cadence(&self) -> Duration {
        Duration::from_secs(self.quotes.cadence_secs)
    }

    pub fn news_cadence(&self) -> Duration {
        Duration::from_secs(self.news.cadence_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.runtime.fetch_timeout_secs)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_secs(self.runtime.rate_limit_backoff_secs)
    }

    pub fn news_lookback(&self) -> chrono::Duration {
        chrono::Duration::hours(self.news.lookback_hours.min(MAX_LOOKBACK_HOURS) as i64)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.runtime.shutdown_grace_secs)
    }
}
