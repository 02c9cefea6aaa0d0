use crate::domain::ports::scoring::SentimentModel;
use std::collections::HashMap;

/// Financial-news polarity lexicon. Values are in [-1, 1].
const LEXICON: &[(&str, f64)] = &[
    ("beat", 0.6),
    ("beats", 0.6),
    ("surge", 0.7),
    ("surges", 0.7),
    ("soar", 0.8),
    ("soars", 0.8),
    ("jump", 0.5),
    ("jumps", 0.5),
    ("rally", 0.6),
    ("rallies", 0.6),
    ("gain", 0.4),
    ("gains", 0.4),
    ("rise", 0.3),
    ("rises", 0.3),
    ("record", 0.4),
    ("strong", 0.5),
    ("growth", 0.4),
    ("profit", 0.3),
    ("upgrade", 0.6),
    ("upgraded", 0.6),
    ("outperform", 0.5),
    ("bullish", 0.6),
    ("win", 0.5),
    ("wins", 0.5),
    ("awarded", 0.5),
    ("approval", 0.5),
    ("approved", 0.5),
    ("breakthrough", 0.7),
    ("positive", 0.5),
    ("good", 0.5),
    ("great", 0.8),
    ("excellent", 1.0),
    ("optimistic", 0.5),
    ("raises", 0.3),
    ("boost", 0.4),
    ("miss", -0.5),
    ("misses", -0.5),
    ("plunge", -0.8),
    ("plunges", -0.8),
    ("tumble", -0.7),
    ("tumbles", -0.7),
    ("fall", -0.4),
    ("falls", -0.4),
    ("drop", -0.4),
    ("drops", -0.4),
    ("decline", -0.4),
    ("declines", -0.4),
    ("slump", -0.6),
    ("weak", -0.5),
    ("loss", -0.4),
    ("losses", -0.4),
    ("downgrade", -0.6),
    ("downgraded", -0.6),
    ("underperform", -0.5),
    ("bearish", -0.6),
    ("lawsuit", -0.4),
    ("subpoena", -0.4),
    ("investigation", -0.4),
    ("recall", -0.5),
    ("bankruptcy", -0.9),
    ("fraud", -0.9),
    ("layoffs", -0.5),
    ("cuts", -0.3),
    ("delay", -0.3),
    ("delays", -0.3),
    ("warning", -0.4),
    ("negative", -0.5),
    ("bad", -0.7),
    ("terrible", -1.0),
    ("pessimistic", -0.5),
    ("concern", -0.3),
    ("concerns", -0.3),
];

const NEGATIONS: &[&str] = &["not", "no", "never", "without", "isn't", "wasn't", "don't", "doesn't", "didn't"];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("highly", 1.3),
    ("sharply", 1.4),
    ("strongly", 1.3),
    ("significantly", 1.3),
    ("slightly", 0.6),
];

/// How many following tokens a negation applies to.
const NEGATION_SCOPE: usize = 3;

/// Deterministic lexicon-based sentiment.
///
/// Each lexicon hit contributes its valence, scaled by a preceding
/// intensifier and flipped (at half strength) inside a negation scope. The
/// score is the mean of the contributions, clamped to [-1, 1]. Text with
/// no hits scores 0.
pub struct LexiconSentiment {
    lexicon: HashMap<&'static str, f64>,
    intensifiers: HashMap<&'static str, f64>,
}

impl LexiconSentiment {
    pub fn new() -> Self {
        Self {
            lexicon: LEXICON.iter().copied().collect(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
        }
    }
}

impl Default for LexiconSentiment {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentModel for LexiconSentiment {
    fn name(&self) -> &str {
        "lexicon"
    }

    fn score(&self, text: &str) -> f64 {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|t| !t.is_empty())
            .collect();

        let mut total = 0.0;
        let mut hits = 0usize;
        let mut negated_for = 0usize;
        let mut intensity = 1.0;

        for token in tokens {
            if NEGATIONS.contains(&token) {
                negated_for = NEGATION_SCOPE;
                continue;
            }
            if let Some(factor) = self.intensifiers.get(token) {
                intensity = *factor;
                continue;
            }
            if let Some(valence) = self.lexicon.get(token) {
                let mut v = valence * intensity;
                if negated_for > 0 {
                    v *= -0.5;
                }
                total += v;
                hits += 1;
            }
            intensity = 1.0;
            negated_for = negated_for.saturating_sub(1);
        }

        if hits == 0 {
            return 0.0;
        }
        (total / hits as f64).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity() {
        let model = LexiconSentiment::new();
        assert!(model.score("Lockheed beats estimates, shares surge") > 0.0);
        assert!(model.score("Boeing shares plunge after recall") < 0.0);
        assert_eq!(model.score("Company holds annual meeting"), 0.0);
        assert_eq!(model.score(""), 0.0);
    }

    #[test]
    fn test_negation_flips() {
        let model = LexiconSentiment::new();
        assert!(model.score("results were not strong") < 0.0);
    }

    #[test]
    fn test_intensifier_clamped() {
        let model = LexiconSentiment::new();
        let v = model.score("very excellent");
        assert_eq!(v, 1.0);
        let v = model.score("sharply terrible");
        assert_eq!(v, -1.0);
    }

    #[test]
    fn test_deterministic_and_bounded() {
        let model = LexiconSentiment::new();
        let samples = [
            "not not not bad",
            "great great terrible fraud bankruptcy soars",
            "slightly weak but very strong growth, no losses",
            "!!! ??? 123",
        ];
        for text in samples {
            let a = model.score(text);
            assert_eq!(a, model.score(text));
            assert!((-1.0..=1.0).contains(&a), "{text}: {a}");
        }
    }
}
