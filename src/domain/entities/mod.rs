pub mod alert_event;
pub mod news_record;
pub mod quote_record;
pub mod sector;
