pub mod finnhub;
pub mod multi;
pub mod newsapi;
pub mod yahoo;

use crate::domain::error::FetchError;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/120.0.0.0 Safari/537.36";

pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// Map a non-success status to a fetch error. 429 is throttling; anything
/// else is a provider failure retried next cycle.
pub(crate) fn status_error(provider: &str, item: &str, status: reqwest::StatusCode) -> FetchError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        FetchError::RateLimited(format!("{provider} throttled request for {item}"))
    } else {
        FetchError::Provider(format!("{provider} returned {status} for {item}"))
    }
}

pub(crate) fn network_error(e: reqwest::Error) -> FetchError {
    FetchError::Provider(e.to_string())
}
