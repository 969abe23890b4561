//! Event models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A backend-emitted event. Merge order is defined by `observed` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event name (scope-prefixed once returned by the gateway)
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    /// Event type (e.g. "AppCreate", "SecretDelete")
    #[serde(rename = "type", default)]
    pub event_type: String,
    /// Who or what caused the event
    #[serde(default)]
    pub actor: String,
    /// Resource the event is about, as `"kind/name"`
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub severity: EventSeverity,
    #[serde(default)]
    pub description: String,
    /// When the backend observed the event
    pub observed: DateTime<Utc>,
    /// Backend resource version at which the event was recorded
    #[serde(default)]
    pub resource_version: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    #[default]
    Info,
    Error,
}

/// Result of a historical event listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventList {
    pub items: Vec<Event>,
    /// Backend cursor; a watch started from here sees only newer events
    #[serde(default)]
    pub resource_version: String,
}

/// Options for event listing and streaming
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventStreamOptions {
    /// Only the most recent N historical events per backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<usize>,
    /// Continue with live events after the snapshot
    #[serde(default)]
    pub follow: bool,
    /// Start from this cursor; skips the historical listing when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    /// Only events whose type matches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

impl EventStreamOptions {
    /// Whether `event` passes the type filter
    pub fn matches(&self, event: &Event) -> bool {
        self.event_type
            .as_deref()
            .map_or(true, |t| t == event.event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn event_wire_names() {
        let event: Event = serde_json::from_value(serde_json::json!({
            "name": "web-1",
            "type": "AppCreate",
            "severity": "error",
            "observed": "2024-01-01T00:00:00Z",
        }))
        .unwrap();
        assert_eq!(event.event_type, "AppCreate");
        assert_eq!(event.severity, EventSeverity::Error);
        assert_eq!(event.namespace, "");

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "AppCreate");
        assert_eq!(value["severity"], "error");
    }

    #[test]
    fn type_filter() {
        let event: Event = serde_json::from_value(serde_json::json!({
            "name": "web-1",
            "type": "AppCreate",
            "observed": "2024-01-01T00:00:00Z",
        }))
        .unwrap();

        assert!(EventStreamOptions::default().matches(&event));
        let only_deletes = EventStreamOptions {
            event_type: Some("AppDelete".into()),
            ..Default::default()
        };
        assert!(!only_deletes.matches(&event));
    }
}
