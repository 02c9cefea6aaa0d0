use super::{http_client, network_error, status_error};
use crate::domain::entities::news_record::RawArticle;
use crate::domain::error::FetchError;
use crate::domain::ports::news_source::NewsSource;
use crate::domain::values::news_subject::NewsSubject;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;

const EVERYTHING_URL: &str = "https://newsapi.org/v2/everything";
const PAGE_SIZE: &str = "20";

/// NewsAPI `everything` search. Symbols are searched as tickers next to
/// market terms; sectors by name.
pub struct NewsApiSource {
    api_key: Option<String>,
    client: reqwest::Client,
}

impl NewsApiSource {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client: http_client(timeout),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    #[serde(default)]
    source: ArticleSource,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct ArticleSource {
    #[serde(default)]
    name: Option<String>,
}

fn search_terms(query: &NewsSubject) -> String {
    match query {
        NewsSubject::Symbol(symbol) => format!("{symbol} AND (stock OR shares)"),
        NewsSubject::Sector(sector) => format!("\"{sector}\" AND (stocks OR sector)"),
    }
}

/// Parse an `everything` payload, keeping articles published at or after
/// `since`. Removed articles and unusable timestamps are skipped. An error
/// envelope maps `rateLimited` to throttling.
pub(crate) fn parse_everything(body: &str, since: DateTime<Utc>) -> Result<Vec<RawArticle>, FetchError> {
    let data: EverythingResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    if data.status != "ok" {
        let code = data.code.unwrap_or_default();
        let message = data.message.unwrap_or_default();
        return Err(if code == "rateLimited" {
            FetchError::RateLimited(format!("NewsAPI: {message}"))
        } else {
            FetchError::Provider(format!("NewsAPI {code}: {message}"))
        });
    }

    Ok(data
        .articles
        .into_iter()
        .filter_map(|a| {
            let headline = a.title?.trim().to_string();
            if headline == "[Removed]" {
                return None;
            }
            let published_at = DateTime::parse_from_rfc3339(a.published_at.as_deref()?)
                .ok()?
                .with_timezone(&Utc);
            if published_at < since {
                return None;
            }
            Some(RawArticle {
                headline,
                summary: a.description.filter(|s| !s.trim().is_empty()),
                source: a.source.name.unwrap_or_default().trim().to_string(),
                published_at,
                url: a.url.filter(|u| !u.is_empty()),
            })
        })
        .collect())
}

#[async_trait]
impl NewsSource for NewsApiSource {
    fn name(&self) -> &str {
        "newsapi"
    }

    async fn fetch_articles(
        &self,
        query: &NewsSubject,
        since: DateTime<Utc>,
    ) -> Result<Vec<RawArticle>, FetchError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| FetchError::Provider("NEWSAPI_KEY is not set".into()))?;
        let item = query.to_string();

        let resp = self
            .client
            .get(EVERYTHING_URL)
            .header("X-Api-Key", key)
            .query(&[
                ("q", search_terms(query).as_str()),
                ("from", since.to_rfc3339_opts(SecondsFormat::Secs, true).as_str()),
                ("sortBy", "publishedAt"),
                ("language", "en"),
                ("pageSize", PAGE_SIZE),
            ])
            .send()
            .await
            .map_err(network_error)?;
        if !resp.status().is_success() {
            return Err(status_error("NewsAPI", &item, resp.status()));
        }

        let body = resp.text().await.map_err(network_error)?;
        parse_everything(&body, since)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const BODY: &str = r#"{
        "status": "ok",
        "totalResults": 3,
        "articles": [
            {"source": {"id": "reuters", "name": "Reuters"}, "author": null,
             "title": "Lockheed wins hypersonic contract ", "description": "Army award",
             "url": "https://x/1", "publishedAt": "2024-03-04T14:05:00Z", "content": null},
            {"source": {"id": null, "name": "[Removed]"}, "title": "[Removed]",
             "description": "[Removed]", "url": "https://removed.com", "publishedAt": "2024-03-04T15:00:00Z"},
            {"source": {"id": null, "name": "Yahoo Entertainment"}, "title": "Old story",
             "description": "", "url": "https://x/2", "publishedAt": "2024-02-01T10:00:00Z"}
        ]
    }"#;

    #[test]
    fn test_parse_everything_keeps_fresh_articles() {
        let since = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let articles = parse_everything(BODY, since).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].headline, "Lockheed wins hypersonic contract");
        assert_eq!(articles[0].source, "Reuters");
        assert_eq!(articles[0].summary.as_deref(), Some("Army award"));
        assert_eq!(articles[0].published_at, Utc.with_ymd_and_hms(2024, 3, 4, 14, 5, 0).unwrap());
    }

    #[test]
    fn test_error_envelope() {
        let since = Utc::now();
        let limited = r#"{"status": "error", "code": "rateLimited", "message": "Too many requests"}"#;
        assert!(parse_everything(limited, since).unwrap_err().is_rate_limited());

        let bad_key = r#"{"status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid"}"#;
        assert!(matches!(parse_everything(bad_key, since), Err(FetchError::Provider(_))));

        assert!(matches!(parse_everything("<html>", since), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_search_terms() {
        assert_eq!(search_terms(&NewsSubject::Symbol("LMT".into())), "LMT AND (stock OR shares)");
        assert_eq!(search_terms(&NewsSubject::Sector("defense".into())), "\"defense\" AND (stocks OR sector)");
    }

    #[tokio::test]
    async fn test_missing_key_is_provider_error() {
        let source = NewsApiSource::new(Some("  ".into()), Duration::from_secs(1));
        let err = source
            .fetch_articles(&NewsSubject::Symbol("LMT".into()), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Provider(_)));
    }
}
