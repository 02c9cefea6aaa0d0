pub mod feeds;
pub mod notify;
pub mod sentiment;
pub mod sqlite;
