use crate::domain::entities::alert_event::AlertEvent;
use crate::domain::ports::notifier::Notifier;
use async_trait::async_trait;

/// Emits alerts as structured log lines. Used when no webhook is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, event: &AlertEvent) -> Result<(), String> {
        tracing::warn!(
            target: "sectorpulse::alert",
            id = %event.id,
            subject = %event.subject_symbol,
            kind = %event.kind,
            value = event.computed_value,
            threshold = event.threshold,
            record = %event.triggering_record_ref,
            "{}",
            event.message()
        );
        Ok(())
    }
}
