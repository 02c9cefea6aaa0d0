use crate::domain::entities::alert_event::AlertEvent;
use crate::domain::ports::notifier::Notifier;
use async_trait::async_trait;
use std::time::Duration;

/// Posts alerts to a Slack-compatible incoming webhook.
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: String, timeout: Duration) -> Self {
        Self {
            url,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

pub(crate) fn payload(event: &AlertEvent) -> serde_json::Value {
    serde_json::json!({
        "text": format!(":rotating_light: {}", event.message()),
        "alert": event,
    })
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn notify(&self, event: &AlertEvent) -> Result<(), String> {
        let resp = self
            .client
            .post(&self.url)
            .json(&payload(event))
            .send()
            .await
            .map_err(|e| format!("Webhook request failed: {e}"))?;

        if !resp.status().is_success() {
            return Err(format!("Webhook returned {}", resp.status()));
        }
        Ok(())
    }
}
