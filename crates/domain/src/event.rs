//! Event — an immutable record of something that happened.
//!
//! Events are ephemeral: they exist on the bus and in subscriber queues,
//! never in storage. The durable counterpart is the execution log, which
//! records one [`LogEntry`] per applied write.

use serde::{Deserialize, Serialize};

use crate::device::AttributeValue;
use crate::id::{RuleId, TaskId};
use crate::time::Timestamp;

/// A broadcast domain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A device attribute changed value.
    StateChanged {
        device: String,
        attribute: String,
        old: AttributeValue,
        new: AttributeValue,
    },
    /// A scheduled task reached its trigger time.
    ScheduleFired { task_id: TaskId },
    /// A rule's condition transitioned to satisfied and its action was
    /// submitted.
    RuleTriggered { rule_id: RuleId },
}

impl Event {
    /// The device this event concerns, if any.
    ///
    /// Used by the rule engine's device → rules index; `ScheduleFired`
    /// and `RuleTriggered` name no device and trigger a full re-scan or
    /// none at all.
    #[must_use]
    pub fn device(&self) -> Option<&str> {
        match self {
            Self::StateChanged { device, .. } => Some(device),
            Self::ScheduleFired { .. } | Self::RuleTriggered { .. } => None,
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StateChanged {
                device,
                attribute,
                old,
                new,
            } => write!(f, "state_changed({device}.{attribute}: {old} -> {new})"),
            Self::ScheduleFired { task_id } => write!(f, "schedule_fired({task_id})"),
            Self::RuleTriggered { rule_id } => write!(f, "rule_triggered({rule_id})"),
        }
    }
}

/// Provenance of an applied write, for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    UserCommand,
    ScheduledTask,
    Rule,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserCommand => f.write_str("user_command"),
            Self::ScheduledTask => f.write_str("scheduled_task"),
            Self::Rule => f.write_str("rule"),
        }
    }
}

/// One entry in the append-only execution log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub device: String,
    pub attribute: String,
    pub old: AttributeValue,
    pub new: AttributeValue,
    pub origin: Origin,
    pub timestamp: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_changed() -> Event {
        Event::StateChanged {
            device: "Living Room Light".to_string(),
            attribute: "power".to_string(),
            old: AttributeValue::Bool(false),
            new: AttributeValue::Bool(true),
        }
    }

    #[test]
    fn should_expose_device_for_state_changed() {
        assert_eq!(state_changed().device(), Some("Living Room Light"));
    }

    #[test]
    fn should_expose_no_device_for_schedule_fired() {
        let event = Event::ScheduleFired {
            task_id: TaskId::new(),
        };
        assert_eq!(event.device(), None);
    }

    #[test]
    fn should_serialize_with_type_tag() {
        let json = serde_json::to_value(state_changed()).unwrap();
        assert_eq!(json["type"], "state_changed");
        assert_eq!(json["old"], false);
        assert_eq!(json["new"], true);
    }

    #[test]
    fn should_roundtrip_events_through_serde_json() {
        let events = vec![
            state_changed(),
            Event::ScheduleFired {
                task_id: TaskId::new(),
            },
            Event::RuleTriggered {
                rule_id: RuleId::new(),
            },
        ];
        for event in &events {
            let json = serde_json::to_string(event).unwrap();
            let parsed: Event = serde_json::from_str(&json).unwrap();
            assert_eq!(&parsed, event);
        }
    }

    #[test]
    fn should_display_origin_snake_case() {
        assert_eq!(Origin::UserCommand.to_string(), "user_command");
        assert_eq!(Origin::ScheduledTask.to_string(), "scheduled_task");
        assert_eq!(Origin::Rule.to_string(), "rule");
    }

    #[test]
    fn should_roundtrip_log_entry_through_serde_json() {
        let entry = LogEntry {
            device: "Lamp".to_string(),
            attribute: "brightness".to_string(),
            old: AttributeValue::Int(50),
            new: AttributeValue::Int(80),
            origin: Origin::Rule,
            timestamp: crate::time::now(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        let parsed: LogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entry);
    }
}
