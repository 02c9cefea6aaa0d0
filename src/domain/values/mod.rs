pub mod alert_kind;
pub mod impact;
pub mod interval;
pub mod news_subject;
pub mod sentiment;
pub mod stream;
