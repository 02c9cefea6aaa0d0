use crate::domain::values::alert_kind::AlertKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A threshold breach. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: String,
    pub subject_symbol: String,
    pub kind: AlertKind,
    pub triggering_record_ref: String,
    pub computed_value: f64,
    pub threshold: f64,
    pub created_at: DateTime<Utc>,
}

impl AlertEvent {
    /// `record_time` is the triggering record's published/ingested time.
    /// Creation time never precedes it, even if the provider clock runs ahead.
    pub fn new(
        subject_symbol: String,
        kind: AlertKind,
        triggering_record_ref: String,
        computed_value: f64,
        threshold: f64,
        record_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            subject_symbol,
            kind,
            triggering_record_ref,
            computed_value,
            threshold,
            created_at: Utc::now().max(record_time),
        }
    }

    pub fn message(&self) -> String {
        match self.kind {
            AlertKind::PriceThreshold => format!(
                "{} closed at {:.2}, above threshold {:.2}",
                self.subject_symbol, self.computed_value, self.threshold
            ),
            AlertKind::NewsImpact => format!(
                "{} news impact {:.2} exceeds {:.2} ({})",
                self.subject_symbol, self.computed_value, self.threshold, self.triggering_record_ref
            ),
        }
    }
}
