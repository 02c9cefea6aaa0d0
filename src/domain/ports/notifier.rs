use crate::domain::entities::alert_event::AlertEvent;
use async_trait::async_trait;

/// Notification side of the sink boundary (email, SMS, Slack, ...).
///
/// Delivery is at-least-once; receivers tolerate duplicates.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, event: &AlertEvent) -> Result<(), String>;
}
