//! Scheduled task — a time-triggered attribute write with a lifecycle.

use serde::{Deserialize, Serialize};

use crate::device::AttributeValue;
use crate::error::HearthError;
use crate::id::TaskId;
use crate::time::{TimeOfDay, Timestamp};

/// How often a task's trigger repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    /// Fire once, then remain [`TaskState::Fired`] for history.
    Once,
    /// Fire every day at the trigger time.
    Daily,
}

impl std::fmt::Display for Recurrence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Once => f.write_str("once"),
            Self::Daily => f.write_str("daily"),
        }
    }
}

/// Lifecycle state of a scheduled task.
///
/// `Pending → Fired` (terminal for one-shot tasks); `Pending → Cancelled`.
/// Daily tasks stay `Pending` across firings, recording each firing in
/// [`ScheduledTask::last_fired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Fired,
    Cancelled,
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Fired => f.write_str("fired"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// A scheduled attribute write: "set `device.attribute = value` at `at`".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub device: String,
    pub attribute: String,
    pub value: AttributeValue,
    pub at: TimeOfDay,
    pub recurrence: Recurrence,
    pub state: TaskState,
    pub created_at: Timestamp,
    /// When the task last fired; guards against double-firing within one
    /// trigger minute.
    pub last_fired: Option<Timestamp>,
}

impl ScheduledTask {
    /// Create a pending task.
    #[must_use]
    pub fn new(
        device: impl Into<String>,
        attribute: impl Into<String>,
        value: AttributeValue,
        at: TimeOfDay,
        recurrence: Recurrence,
    ) -> Self {
        Self {
            id: TaskId::new(),
            device: device.into(),
            attribute: attribute.into(),
            value,
            at,
            recurrence,
            state: TaskState::Pending,
            created_at: crate::time::now(),
            last_fired: None,
        }
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::EmptyField`] when the device or attribute
    /// name is empty.
    pub fn validate(&self) -> Result<(), HearthError> {
        if self.device.is_empty() {
            return Err(HearthError::EmptyField {
                field: "task device",
            });
        }
        if self.attribute.is_empty() {
            return Err(HearthError::EmptyField {
                field: "task attribute",
            });
        }
        Ok(())
    }

    /// Whether the task is still waiting to fire.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state == TaskState::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn six_am() -> TimeOfDay {
        "06:00".parse().unwrap()
    }

    #[test]
    fn should_start_pending() {
        let task = ScheduledTask::new(
            "Living Room Light",
            "power",
            AttributeValue::Bool(true),
            six_am(),
            Recurrence::Once,
        );
        assert_eq!(task.state, TaskState::Pending);
        assert!(task.is_pending());
        assert!(task.last_fired.is_none());
    }

    #[test]
    fn should_reject_empty_device() {
        let task = ScheduledTask::new(
            "",
            "power",
            AttributeValue::Bool(true),
            six_am(),
            Recurrence::Once,
        );
        assert!(matches!(
            task.validate(),
            Err(HearthError::EmptyField { field: "task device" })
        ));
    }

    #[test]
    fn should_reject_empty_attribute() {
        let task = ScheduledTask::new(
            "Lamp",
            "",
            AttributeValue::Bool(true),
            six_am(),
            Recurrence::Daily,
        );
        assert!(matches!(task.validate(), Err(HearthError::EmptyField { .. })));
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let task = ScheduledTask::new(
            "Lamp",
            "brightness",
            AttributeValue::Int(80),
            six_am(),
            Recurrence::Daily,
        );
        let json = serde_json::to_string(&task).unwrap();
        let parsed: ScheduledTask = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, task.id);
        assert_eq!(parsed.at, task.at);
        assert_eq!(parsed.recurrence, Recurrence::Daily);
        assert_eq!(parsed.state, TaskState::Pending);
    }

    #[test]
    fn should_display_states_lowercase() {
        assert_eq!(TaskState::Pending.to_string(), "pending");
        assert_eq!(TaskState::Fired.to_string(), "fired");
        assert_eq!(TaskState::Cancelled.to_string(), "cancelled");
    }
}
