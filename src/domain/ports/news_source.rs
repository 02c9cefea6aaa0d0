use crate::domain::entities::news_record::RawArticle;
use crate::domain::error::FetchError;
use crate::domain::values::news_subject::NewsSubject;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// External news provider.
#[async_trait]
pub trait NewsSource: Send + Sync {
    fn name(&self) -> &str;

    /// Articles about `query` published at or after `since`.
    async fn fetch_articles(
        &self,
        query: &NewsSubject,
        since: DateTime<Utc>,
    ) -> Result<Vec<RawArticle>, FetchError>;
}
