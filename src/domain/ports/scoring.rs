//! Pluggable scoring strategies.
//!
//! Both traits expose a single scoring method so lexicon-based and
//! model-based implementations can be swapped without touching the
//! ingestion pipeline. The pipeline checks the output range itself; an
//! implementation that returns an out-of-range value gets its article
//! dropped, not clamped.

use crate::domain::values::sentiment::Sentiment;

/// Maps text to a signed polarity. Must return a value in [-1, 1] and be
/// deterministic for identical input.
pub trait SentimentModel: Send + Sync {
    fn name(&self) -> &str;

    fn score(&self, text: &str) -> f64;
}

/// Maps (sentiment, source, text) to an impact estimate in [0, 1].
pub trait ImpactModel: Send + Sync {
    fn score(&self, sentiment: Sentiment, source: &str, text: &str) -> f64;
}
