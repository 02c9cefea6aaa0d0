pub mod market_store;
pub mod migrations;
