// SPDX-License-Identifier: GPL-3.0-only
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::registry::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Published,
    Updated,
    Unpublished,
}

/// Lifecycle change of a single record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub kind: EventKind,

    /// Record as stored after the change (last known state for `UNPUBLISHED`)
    pub record: Record,

    pub emitted_at: DateTime<Utc>,
}

impl StatusEvent {
    pub fn new(kind: EventKind, record: Record) -> Self {
        Self {
            kind,
            record,
            emitted_at: Utc::now(),
        }
    }

    pub fn registration_id(&self) -> Option<&str> {
        self.record.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialize_json() {
        let mut record = Record::new("orders", "http-endpoint");
        record.registration_id = Some("R1".to_string());
        let event = StatusEvent::new(EventKind::Unpublished, record);

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"], "UNPUBLISHED");
        assert_eq!(value["record"]["registrationId"], "R1");
        assert!(value["emitted_at"].is_string());
        assert_eq!(event.registration_id(), Some("R1"));
    }
}
