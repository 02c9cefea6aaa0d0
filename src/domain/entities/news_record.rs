use crate::domain::values::impact::ImpactScore;
use crate::domain::values::news_subject::NewsSubject;
use crate::domain::values::sentiment::Sentiment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An article as returned by a news provider, before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    pub headline: String,
    pub summary: Option<String>,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub url: Option<String>,
}

impl RawArticle {
    /// Dedup key: `(source, headline, published_at)`.
    pub fn dedup_key(&self) -> NewsKey {
        NewsKey {
            source: self.source.clone(),
            headline: self.headline.clone(),
            published_at: self.published_at,
        }
    }

    /// Headline and summary joined, the text both scorers read.
    pub fn full_text(&self) -> String {
        match &self.summary {
            Some(summary) if !summary.is_empty() => format!("{} {}", self.headline, summary),
            _ => self.headline.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewsKey {
    pub source: String,
    pub headline: String,
    pub published_at: DateTime<Utc>,
}

/// A scored article. Scores are set once at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsRecord {
    pub id: String,
    pub subject: NewsSubject,
    pub headline: String,
    pub summary: Option<String>,
    pub source: String,
    pub url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub sentiment: Sentiment,
    pub impact_score: ImpactScore,
    pub ingested_at: DateTime<Utc>,
}

impl NewsRecord {
    pub fn new(
        subject: NewsSubject,
        article: RawArticle,
        sentiment: Sentiment,
        impact_score: ImpactScore,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            subject,
            headline: article.headline,
            summary: article.summary,
            source: article.source,
            url: article.url,
            published_at: article.published_at,
            sentiment,
            impact_score,
            ingested_at: Utc::now(),
        }
    }

    pub fn record_ref(&self) -> String {
        format!("news:{}", self.id)
    }

    pub fn dedup_key(&self) -> NewsKey {
        NewsKey {
            source: self.source.clone(),
            headline: self.headline.clone(),
            published_at: self.published_at,
        }
    }
}
