pub mod market_store;
pub mod news_source;
pub mod notifier;
pub mod quote_source;
pub mod scoring;
