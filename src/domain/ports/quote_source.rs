use crate::domain::entities::quote_record::QuoteRecord;
use crate::domain::error::FetchError;
use crate::domain::values::interval::SamplingInterval;
use async_trait::async_trait;

/// External market-data provider.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Recent completed bars for one symbol at the given sampling interval.
    /// The bar still forming at the time of the call is not returned.
    /// Rate limiting must surface as [`FetchError::RateLimited`].
    async fn fetch_bars(
        &self,
        symbol: &str,
        interval: SamplingInterval,
    ) -> Result<Vec<QuoteRecord>, FetchError>;
}
