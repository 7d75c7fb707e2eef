//! Hub — the facade the presentation layer talks to.
//!
//! Wires the registry, event bus, scheduler, rule engine, and execution
//! coordinator together, and owns the two control loops the components
//! themselves stay out of: the scheduler tick and the rule cascade.
//!
//! A cascade is everything one originating event causes, evaluated
//! synchronously: the event's actions are submitted, each resulting
//! `StateChanged` is fed back to the engine, and so on, bounded by
//! [`DEFAULT_CASCADE_DEPTH`] levels. Exceeding the bound abandons the rest
//! of the cascade and counts a `rule_cycle_breaks` diagnostic — writes
//! already applied stay applied, and the caller's own operation still
//! succeeds.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use hearth_domain::device::{AttributeValue, Device};
use hearth_domain::error::HearthError;
use hearth_domain::event::{Event, LogEntry, Origin};
use hearth_domain::id::{RuleId, TaskId};
use hearth_domain::rule::{Action, Condition, Rule};
use hearth_domain::task::{Recurrence, ScheduledTask};
use hearth_domain::time::{self, TimeOfDay, Timestamp};

use crate::coordinator::ExecutionCoordinator;
use crate::event_bus::{EventStream, InProcessEventBus};
use crate::ports::EventPublisher;
use crate::registry::DeviceRegistry;
use crate::rule_engine::RuleEngine;
use crate::scheduler::Scheduler;

/// Default per-subscriber event queue capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Default bound on cascade depth per originating event.
pub const DEFAULT_CASCADE_DEPTH: usize = 10;

/// Default scheduler polling period. Half the trigger resolution, so no
/// trigger minute is skipped.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(30);

/// Degradation counters surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Diagnostics {
    /// Events lost to lagging subscribers (the `EventBusOverflow`
    /// condition).
    pub bus_dropped_events: u64,
    /// Cascades abandoned at the depth bound (the `RuleCycleExceeded`
    /// condition).
    pub rule_cycle_breaks: u64,
}

/// The assembled control core.
pub struct Hub {
    registry: Arc<DeviceRegistry>,
    bus: Arc<InProcessEventBus>,
    scheduler: Scheduler,
    engine: RuleEngine<Arc<InProcessEventBus>>,
    coordinator: ExecutionCoordinator<Arc<InProcessEventBus>>,
    max_cascade_depth: usize,
    cycle_breaks: AtomicU64,
}

impl Hub {
    /// Assemble a hub around an already-populated registry.
    #[must_use]
    pub fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self::with_options(registry, DEFAULT_EVENT_CAPACITY, DEFAULT_CASCADE_DEPTH)
    }

    /// Assemble a hub with explicit bus capacity and cascade depth bound.
    #[must_use]
    pub fn with_options(
        registry: Arc<DeviceRegistry>,
        event_capacity: usize,
        max_cascade_depth: usize,
    ) -> Self {
        let bus = Arc::new(InProcessEventBus::new(event_capacity));
        Self {
            scheduler: Scheduler::new(Arc::clone(&registry)),
            engine: RuleEngine::new(Arc::clone(&registry), Arc::clone(&bus)),
            coordinator: ExecutionCoordinator::new(Arc::clone(&registry), Arc::clone(&bus)),
            registry,
            bus,
            max_cascade_depth,
            cycle_breaks: AtomicU64::new(0),
        }
    }

    // ── Devices ────────────────────────────────────────────────────

    /// Register a device.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::EmptyField`] or
    /// [`HearthError::DuplicateDevice`].
    pub fn register_device(&self, device: Device) -> Result<(), HearthError> {
        self.registry.register(device)
    }

    /// Snapshots of all devices, in registration order.
    #[must_use]
    pub fn list_devices(&self) -> Vec<Device> {
        self.registry.list()
    }

    /// Snapshot of one device.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::UnknownDevice`].
    pub fn get_device(&self, name: &str) -> Result<Device, HearthError> {
        self.registry.get(name)
    }

    /// Apply a user-issued attribute write and run its cascade.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::UnknownDevice`] or
    /// [`HearthError::InvalidAttribute`] without mutating anything. A
    /// cascade hitting the depth bound does not fail the command.
    #[tracing::instrument(skip(self, value))]
    pub async fn issue_command(
        &self,
        device: &str,
        attribute: &str,
        value: AttributeValue,
    ) -> Result<(), HearthError> {
        let event = self
            .coordinator
            .submit(device, attribute, value, Origin::UserCommand)
            .await?;
        self.cascade(&event).await;
        Ok(())
    }

    // ── Scheduling ─────────────────────────────────────────────────

    /// Schedule an attribute write for a time of day.
    ///
    /// # Errors
    ///
    /// See [`Scheduler::schedule`].
    pub fn schedule_task(
        &self,
        device: &str,
        attribute: &str,
        value: AttributeValue,
        at: TimeOfDay,
        recurrence: Recurrence,
    ) -> Result<TaskId, HearthError> {
        self.scheduler
            .schedule(device, attribute, value, at, recurrence)
    }

    /// Cancel a pending task.
    ///
    /// # Errors
    ///
    /// See [`Scheduler::cancel`].
    pub fn cancel_task(&self, id: TaskId) -> Result<(), HearthError> {
        self.scheduler.cancel(id)
    }

    /// All tasks, in creation order.
    #[must_use]
    pub fn list_tasks(&self) -> Vec<ScheduledTask> {
        self.scheduler.list()
    }

    /// Drop finished one-shot and cancelled tasks from the list.
    pub fn purge_tasks(&self) -> usize {
        self.scheduler.purge_terminal()
    }

    // ── Rules ──────────────────────────────────────────────────────

    /// Define a rule.
    ///
    /// # Errors
    ///
    /// See [`RuleEngine::define`].
    pub fn define_rule(&self, condition: Condition, action: Action) -> Result<RuleId, HearthError> {
        self.engine.define(condition, action)
    }

    /// Replace a rule's condition and action atomically.
    ///
    /// # Errors
    ///
    /// See [`RuleEngine::redefine`].
    pub fn redefine_rule(
        &self,
        id: RuleId,
        condition: Condition,
        action: Action,
    ) -> Result<(), HearthError> {
        self.engine.redefine(id, condition, action)
    }

    /// Enable a rule.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::NotFound`].
    pub fn enable_rule(&self, id: RuleId) -> Result<(), HearthError> {
        self.engine.set_enabled(id, true)
    }

    /// Disable a rule.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::NotFound`].
    pub fn disable_rule(&self, id: RuleId) -> Result<(), HearthError> {
        self.engine.set_enabled(id, false)
    }

    /// All rules, in creation order.
    #[must_use]
    pub fn list_rules(&self) -> Vec<Rule> {
        self.engine.list()
    }

    // ── Events, log, diagnostics ───────────────────────────────────

    /// Raw broadcast subscription (used by the SSE adapter).
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Overflow-absorbing subscription.
    #[must_use]
    pub fn event_stream(&self) -> EventStream {
        self.bus.stream()
    }

    /// The most recent `limit` execution-log entries, newest first.
    #[must_use]
    pub fn execution_log(&self, limit: usize) -> Vec<LogEntry> {
        self.coordinator.recent_log(limit)
    }

    /// Current degradation counters.
    #[must_use]
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            bus_dropped_events: self.bus.dropped_events(),
            rule_cycle_breaks: self.cycle_breaks.load(Ordering::Relaxed),
        }
    }

    // ── Control loops ──────────────────────────────────────────────

    /// Run one scheduler poll at `now`.
    ///
    /// Fires every due task: publishes `ScheduleFired`, re-evaluates rules
    /// on it, submits the task's action, and cascades from the resulting
    /// state change. A rejected action is reported and skipped; the tick
    /// itself never fails.
    pub async fn tick(&self, now: Timestamp) {
        for (task_id, action) in self.scheduler.due(now) {
            tracing::info!(%task_id, %action, "scheduled task fired");
            let fired = Event::ScheduleFired { task_id };
            let _ = self.bus.publish(fired.clone()).await;
            self.cascade(&fired).await;

            match self
                .coordinator
                .submit(&action.device, &action.attribute, action.value, Origin::ScheduledTask)
                .await
            {
                Ok(event) => self.cascade(&event).await,
                Err(err) => tracing::warn!(%err, %task_id, "scheduled action dropped"),
            }
        }
    }

    /// Spawn the background ticker driving [`tick`](Self::tick) at `period`.
    pub fn spawn_ticker(self: &Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let hub = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                hub.tick(time::now()).await;
            }
        })
    }

    /// Drive the rule cascade for one originating event.
    async fn cascade(&self, event: &Event) {
        let mut frontier = self.engine.react(event).await;
        let mut depth = 0usize;
        while !frontier.is_empty() {
            depth += 1;
            if depth > self.max_cascade_depth {
                self.cycle_breaks.fetch_add(1, Ordering::Relaxed);
                let err = HearthError::RuleCycleExceeded {
                    max_depth: self.max_cascade_depth,
                };
                tracing::warn!(%err, "abandoning rule cascade");
                return;
            }
            let mut next = Vec::new();
            for action in frontier {
                match self
                    .coordinator
                    .submit(&action.device, &action.attribute, action.value, Origin::Rule)
                    .await
                {
                    Ok(event) => next.extend(self.engine.react(&event).await),
                    Err(err) => tracing::warn!(%err, action = %action, "rule action dropped"),
                }
            }
            frontier = next;
        }
    }
}
