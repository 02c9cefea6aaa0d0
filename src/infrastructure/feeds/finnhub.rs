use super::{http_client, network_error, status_error};
use crate::domain::entities::news_record::RawArticle;
use crate::domain::error::FetchError;
use crate::domain::ports::news_source::NewsSource;
use crate::domain::values::news_subject::NewsSubject;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

const BASE_URL: &str = "https://finnhub.io/api/v1";

/// Finnhub news. Symbol queries use `company-news`; sector queries filter
/// the general market feed by the sector's name and member tickers.
pub struct FinnhubNewsSource {
    api_key: Option<String>,
    /// Lowercased search terms per sector name.
    sector_terms: HashMap<String, Vec<String>>,
    client: reqwest::Client,
}

impl FinnhubNewsSource {
    pub fn new(
        api_key: Option<String>,
        sector_terms: HashMap<String, Vec<String>>,
        timeout: Duration,
    ) -> Self {
        let sector_terms = sector_terms
            .into_iter()
            .map(|(sector, terms)| {
                let terms = terms.iter().map(|t| t.to_lowercase()).collect();
                (sector.to_lowercase(), terms)
            })
            .collect();
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            sector_terms,
            client: http_client(timeout),
        }
    }

    async fn get(&self, url: &str, item: &str) -> Result<String, FetchError> {
        let token = self
            .api_key
            .as_deref()
            .ok_or_else(|| FetchError::Provider("FINNHUB_API_KEY is not set".into()))?;

        let resp = self
            .client
            .get(url)
            .header("X-Finnhub-Token", token)
            .send()
            .await
            .map_err(network_error)?;
        if !resp.status().is_success() {
            return Err(status_error("Finnhub", item, resp.status()));
        }
        resp.text().await.map_err(network_error)
    }
}

#[derive(Debug, serde::Deserialize)]
struct FinnhubArticle {
    #[serde(default)]
    datetime: i64,
    #[serde(default)]
    headline: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Parse a Finnhub news array, keeping articles published at or after
/// `since`. Articles with an unusable timestamp are skipped.
pub(crate) fn parse_articles(body: &str, since: DateTime<Utc>) -> Result<Vec<RawArticle>, FetchError> {
    let items: Vec<FinnhubArticle> =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    Ok(items
        .into_iter()
        .filter_map(|a| {
            let published_at = DateTime::<Utc>::from_timestamp(a.datetime, 0)?;
            if a.datetime <= 0 || published_at < since {
                return None;
            }
            Some(RawArticle {
                headline: a.headline.trim().to_string(),
                summary: a.summary.filter(|s| !s.trim().is_empty()),
                source: a.source.trim().to_string(),
                published_at,
                url: a.url.filter(|u| !u.is_empty()),
            })
        })
        .collect())
}

fn mentions_any(article: &RawArticle, terms: &[String]) -> bool {
    let text = article.full_text().to_lowercase();
    terms.iter().any(|t| {
        text.split(|c: char| !c.is_alphanumeric())
            .any(|word| word == t.as_str())
    })
}

#[async_trait]
impl NewsSource for FinnhubNewsSource {
    fn name(&self) -> &str {
        "finnhub"
    }

    async fn fetch_articles(
        &self,
        query: &NewsSubject,
        since: DateTime<Utc>,
    ) -> Result<Vec<RawArticle>, FetchError> {
        match query {
            NewsSubject::Symbol(symbol) => {
                let url = format!(
                    "{BASE_URL}/company-news?symbol={symbol}&from={}&to={}",
                    since.format("%Y-%m-%d"),
                    Utc::now().format("%Y-%m-%d")
                );
                let body = self.get(&url, symbol).await?;
                parse_articles(&body, since)
            }
            NewsSubject::Sector(sector) => {
                let mut terms = self.sector_terms.get(sector).cloned().unwrap_or_default();
                terms.push(sector.to_lowercase());
                let body = self.get(&format!("{BASE_URL}/news?category=general"), sector).await?;
                Ok(parse_articles(&body, since)?
                    .into_iter()
                    .filter(|a| mentions_any(a, &terms))
                    .collect())
            }
        }
    }
}
