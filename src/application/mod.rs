pub mod alerts;
pub mod correlation;
pub mod impact;
pub mod ingest_news;
pub mod ingest_quotes;
pub mod run_report;
pub mod scheduler;
pub mod sectors;
