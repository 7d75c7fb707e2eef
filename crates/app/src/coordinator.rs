//! Execution coordinator — the single write path into the device registry.
//!
//! Every applied write, whatever its origin, goes through [`submit`]: the
//! per-device serialization slot is taken, the registry write applied, a
//! log entry appended, and the `StateChanged` event published. Writes to
//! the same device are strictly ordered; writes to different devices run
//! concurrently.
//!
//! [`submit`]: ExecutionCoordinator::submit

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hearth_domain::device::AttributeValue;
use hearth_domain::error::HearthError;
use hearth_domain::event::{Event, LogEntry, Origin};
use hearth_domain::time;

use crate::ports::EventPublisher;
use crate::registry::DeviceRegistry;

/// Applies writes, serializing per device, and keeps the execution log.
pub struct ExecutionCoordinator<P> {
    registry: Arc<DeviceRegistry>,
    publisher: P,
    log: Mutex<Vec<LogEntry>>,
    write_slots: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<P: EventPublisher> ExecutionCoordinator<P> {
    /// Create a coordinator writing into `registry` and publishing through
    /// `publisher`.
    pub fn new(registry: Arc<DeviceRegistry>, publisher: P) -> Self {
        Self {
            registry,
            publisher,
            log: Mutex::new(Vec::new()),
            write_slots: Mutex::new(HashMap::new()),
        }
    }

    /// Apply one attribute write.
    ///
    /// Returns the `StateChanged` event describing the applied write (with
    /// the stored, possibly clamped, new value) so callers can drive rule
    /// evaluation from it. The event is also published on the bus and the
    /// write recorded in the execution log, both while the device's
    /// serialization slot is still held — per-device event order matches
    /// write order.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::UnknownDevice`] or
    /// [`HearthError::InvalidAttribute`]; nothing is logged or published
    /// on error.
    #[tracing::instrument(skip(self, value, origin), fields(origin = %origin))]
    pub async fn submit(
        &self,
        device: &str,
        attribute: &str,
        value: AttributeValue,
        origin: Origin,
    ) -> Result<Event, HearthError> {
        let slot = self.write_slot(device);
        let _guard = slot.lock().await;

        let (old, new) = self.registry.set(device, attribute, value)?;

        self.lock_log().push(LogEntry {
            device: device.to_string(),
            attribute: attribute.to_string(),
            old,
            new,
            origin,
            timestamp: time::now(),
        });

        let event = Event::StateChanged {
            device: device.to_string(),
            attribute: attribute.to_string(),
            old,
            new,
        };
        let _ = self.publisher.publish(event.clone()).await;
        Ok(event)
    }

    /// The most recent `limit` log entries, newest first.
    #[must_use]
    pub fn recent_log(&self, limit: usize) -> Vec<LogEntry> {
        let log = self.lock_log();
        log.iter().rev().take(limit).cloned().collect()
    }

    /// Total number of applied writes.
    #[must_use]
    pub fn log_len(&self) -> usize {
        self.lock_log().len()
    }

    fn write_slot(&self, device: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut slots = self
            .write_slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(device.to_string()).or_default())
    }

    fn lock_log(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
