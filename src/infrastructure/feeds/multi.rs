use crate::domain::entities::news_record::RawArticle;
use crate::domain::error::FetchError;
use crate::domain::ports::news_source::NewsSource;
use crate::domain::values::news_subject::NewsSubject;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;

/// Fans one query out to several providers and merges the answers.
///
/// A provider that fails is logged and left out as long as another one
/// answered. The query fails only when every provider does, and then as
/// throttled if any of them was throttled.
pub struct MultiNewsSource {
    sources: Vec<Arc<dyn NewsSource>>,
    name: String,
}

impl MultiNewsSource {
    pub fn new(sources: Vec<Arc<dyn NewsSource>>) -> Self {
        let name = sources.iter().map(|s| s.name()).collect::<Vec<_>>().join("+");
        Self { sources, name }
    }
}

#[async_trait]
impl NewsSource for MultiNewsSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_articles(
        &self,
        query: &NewsSubject,
        since: DateTime<Utc>,
    ) -> Result<Vec<RawArticle>, FetchError> {
        let results = join_all(self.sources.iter().map(|s| s.fetch_articles(query, since))).await;

        let mut merged = Vec::new();
        let mut seen = HashSet::new();
        let mut errors = Vec::new();
        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(articles) => {
                    for article in articles {
                        if seen.insert(article.dedup_key()) {
                            merged.push(article);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(provider = source.name(), query = %query, error = %e, "news provider failed");
                    errors.push(e);
                }
            }
        }

        if !errors.is_empty() && errors.len() == self.sources.len() {
            let throttled = errors.iter().position(|e| e.is_rate_limited());
            return Err(errors.swap_remove(throttled.unwrap_or(0)));
        }
        Ok(merged)
    }
}
