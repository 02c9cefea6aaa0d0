use crate::config::ScoringConfig;
use crate::domain::ports::scoring::ImpactModel;
use crate::domain::values::sentiment::Sentiment;
use std::collections::HashMap;

/// Source-weighted, keyword-amplified impact scoring.
///
/// `impact = min(|sentiment| * source_multiplier * keyword_multiplier, 1.0)`
///
/// The keyword multiplier starts at 1.0 and gains `increment` for every
/// configured keyword found anywhere in the text (case-insensitive
/// substring match, so "order" also matches "border"). There is no cap on
/// the multiplier itself; only the final score is clamped. Stored scores
/// depend on this exact formula.
pub struct KeywordImpactScorer {
    source_weights: HashMap<String, f64>,
    default_weight: f64,
    keywords: Vec<String>,
    increment: f64,
}

impl KeywordImpactScorer {
    pub fn new(
        source_weights: HashMap<String, f64>,
        default_weight: f64,
        keywords: Vec<String>,
        increment: f64,
    ) -> Self {
        Self {
            source_weights: source_weights
                .into_iter()
                .map(|(k, v)| (normalize_source(&k), v))
                .collect(),
            default_weight,
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
            increment,
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(
            config.source_weights.clone().into_iter().collect(),
            config.default_source_weight,
            config.keywords.clone(),
            config.keyword_increment,
        )
    }

    pub fn source_multiplier(&self, source: &str) -> f64 {
        let normalized = normalize_source(source);
        if let Some(w) = self.source_weights.get(&normalized) {
            return *w;
        }
        // Providers often report a bare outlet name ("Reuters") instead of a domain.
        if !normalized.contains('.') && !normalized.is_empty() {
            let guess = format!("{}.com", normalized.replace(' ', ""));
            if let Some(w) = self.source_weights.get(&guess) {
                return *w;
            }
        }
        self.default_weight
    }

    pub fn keyword_multiplier(&self, text: &str) -> f64 {
        let lower = text.to_lowercase();
        let mut multiplier = 1.0;
        for keyword in &self.keywords {
            if lower.contains(keyword.as_str()) {
                multiplier += self.increment;
            }
        }
        multiplier
    }

    pub fn matched_keywords(&self, text: &str) -> Vec<&str> {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|k| lower.contains(k.as_str()))
            .map(|k| k.as_str())
            .collect()
    }
}

impl ImpactModel for KeywordImpactScorer {
    fn score(&self, sentiment: Sentiment, source: &str, text: &str) -> f64 {
        let base = sentiment.value().abs();
        let raw = base * self.source_multiplier(source) * self.keyword_multiplier(text);
        raw.min(1.0)
    }
}

/// Lowercase, drop scheme, `www.`, port and path: `https://www.Reuters.com/x` → `reuters.com`.
pub fn normalize_source(source: &str) -> String {
    let s = source.trim().to_lowercase();
    let s = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))
        .unwrap_or(&s);
    let s = s.strip_prefix("www.").unwrap_or(s);
    let host = s.split('/').next().unwrap_or(s);
    let host = host.split(':').next().unwrap_or(host);
    host.to_string()
}
