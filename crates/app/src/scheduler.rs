//! Scheduler — time-triggered tasks polled at minute resolution.
//!
//! The scheduler owns the task list and its lifecycle transitions. It does
//! not apply actions itself: [`Scheduler::due`] performs the atomic
//! check-and-transition and hands the due actions back to the caller (the
//! hub), which publishes `ScheduleFired` and submits them to the execution
//! coordinator.
//!
//! Missed trigger minutes are not backfilled: a tick only fires tasks whose
//! trigger matches the current minute, so firings that would have happened
//! while the process was down are skipped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hearth_domain::device::AttributeValue;
use hearth_domain::error::{AttributeErrorKind, HearthError};
use hearth_domain::id::TaskId;
use hearth_domain::rule::Action;
use hearth_domain::task::{Recurrence, ScheduledTask, TaskState};
use hearth_domain::time::{TimeOfDay, Timestamp, same_minute};

use crate::registry::DeviceRegistry;

/// Owns scheduled tasks and decides when they fire.
pub struct Scheduler {
    registry: Arc<DeviceRegistry>,
    tasks: Mutex<Vec<ScheduledTask>>,
}

impl Scheduler {
    /// Create a scheduler reading device existence from `registry`.
    #[must_use]
    pub fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self {
            registry,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Create a pending task.
    ///
    /// The target device and attribute are validated at creation time; the
    /// value itself is range-checked (and clamped) when the task fires.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::EmptyField`] for blank names,
    /// [`HearthError::UnknownDevice`] when the device is not registered,
    /// and [`HearthError::InvalidAttribute`] when the attribute is
    /// undeclared or the value's type does not match it.
    #[tracing::instrument(skip(self, value))]
    pub fn schedule(
        &self,
        device: &str,
        attribute: &str,
        value: AttributeValue,
        at: TimeOfDay,
        recurrence: Recurrence,
    ) -> Result<TaskId, HearthError> {
        let task = ScheduledTask::new(device, attribute, value, at, recurrence);
        task.validate()?;

        let snapshot = self.registry.get(device)?;
        let spec = snapshot
            .kind
            .spec(attribute)
            .ok_or_else(|| HearthError::InvalidAttribute {
                device: device.to_string(),
                attribute: attribute.to_string(),
                kind: AttributeErrorKind::Unknown,
            })?;
        spec.kind
            .accept(value)
            .map_err(|kind| HearthError::InvalidAttribute {
                device: device.to_string(),
                attribute: attribute.to_string(),
                kind,
            })?;

        let id = task.id;
        self.lock_tasks().push(task);
        tracing::debug!(%id, "task scheduled");
        Ok(id)
    }

    /// Cancel a pending task.
    ///
    /// Cancelling an already-cancelled task is a no-op. The state check and
    /// transition happen under the task-list lock, so a cancel racing a
    /// tick resolves to exactly one of the two outcomes.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::NotFound`] for an unknown id and
    /// [`HearthError::AlreadyFired`] when the task fired before the cancel
    /// arrived.
    #[tracing::instrument(skip(self))]
    pub fn cancel(&self, id: TaskId) -> Result<(), HearthError> {
        let mut tasks = self.lock_tasks();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| HearthError::NotFound {
                entity: "Task",
                id: id.to_string(),
            })?;
        match task.state {
            TaskState::Pending => {
                task.state = TaskState::Cancelled;
                Ok(())
            }
            TaskState::Cancelled => Ok(()),
            TaskState::Fired => Err(HearthError::AlreadyFired(id)),
        }
    }

    /// Snapshots of all tasks, in creation order.
    #[must_use]
    pub fn list(&self) -> Vec<ScheduledTask> {
        self.lock_tasks().clone()
    }

    /// Remove finished one-shot and cancelled tasks, returning how many
    /// were purged. Pending tasks (including daily recurrences) stay.
    pub fn purge_terminal(&self) -> usize {
        let mut tasks = self.lock_tasks();
        let before = tasks.len();
        tasks.retain(|t| t.state == TaskState::Pending);
        before - tasks.len()
    }

    /// Collect the actions of every task due at `now`, transitioning their
    /// lifecycle in the same locked step.
    ///
    /// A task is due when it is pending, its trigger matches the current
    /// minute, and it has not already fired within that minute. One-shot
    /// tasks become [`TaskState::Fired`]; daily tasks stay pending with
    /// `last_fired` recorded, which keeps them from re-firing until the
    /// trigger minute comes round again.
    pub fn due(&self, now: Timestamp) -> Vec<(TaskId, Action)> {
        let mut tasks = self.lock_tasks();
        let mut fired = Vec::new();
        for task in tasks.iter_mut() {
            if task.state != TaskState::Pending || !task.at.matches(now) {
                continue;
            }
            if matches!(task.last_fired, Some(prev) if same_minute(prev, now)) {
                continue;
            }
            task.last_fired = Some(now);
            if task.recurrence == Recurrence::Once {
                task.state = TaskState::Fired;
            }
            fired.push((
                task.id,
                Action {
                    device: task.device.clone(),
                    attribute: task.attribute.clone(),
                    value: task.value,
                },
            ));
        }
        fired
    }

    fn lock_tasks(&self) -> MutexGuard<'_, Vec<ScheduledTask>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
