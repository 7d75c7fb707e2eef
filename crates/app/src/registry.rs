//! Device registry — the authoritative owner of all device state.
//!
//! All reads return snapshots; the single mutation entry point, [`set`],
//! is crate-private so that the execution coordinator remains the only
//! writer. A single `RwLock` guards the device list (the device count is
//! small), so readers never observe a partially applied write.
//!
//! [`set`]: DeviceRegistry::set

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use hearth_domain::device::{AttributeValue, Device};
use hearth_domain::error::HearthError;

/// Holds every registered device, in registration order.
#[derive(Default)]
pub struct DeviceRegistry {
    devices: RwLock<Vec<Device>>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new device.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::EmptyField`] for an unnamed device and
    /// [`HearthError::DuplicateDevice`] when the name is already taken.
    pub fn register(&self, device: Device) -> Result<(), HearthError> {
        device.validate()?;
        let mut devices = self.write_lock();
        if devices.iter().any(|d| d.name == device.name) {
            return Err(HearthError::DuplicateDevice(device.name));
        }
        devices.push(device);
        Ok(())
    }

    /// Snapshot of a device by name.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::UnknownDevice`] when no device has this name.
    pub fn get(&self, name: &str) -> Result<Device, HearthError> {
        self.read_lock()
            .iter()
            .find(|d| d.name == name)
            .cloned()
            .ok_or_else(|| HearthError::UnknownDevice(name.to_string()))
    }

    /// Whether a device with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.read_lock().iter().any(|d| d.name == name)
    }

    /// Snapshots of all devices, in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<Device> {
        self.read_lock().clone()
    }

    /// Apply a schema-validated write, returning `(old, new)` values.
    ///
    /// The stored `new` value may differ from the input when the schema
    /// clamps it into range. Crate-private: only the execution coordinator
    /// calls this.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::UnknownDevice`] or
    /// [`HearthError::InvalidAttribute`]; the registry is untouched on
    /// error.
    pub(crate) fn set(
        &self,
        name: &str,
        attribute: &str,
        value: AttributeValue,
    ) -> Result<(AttributeValue, AttributeValue), HearthError> {
        let mut devices = self.write_lock();
        let device = devices
            .iter_mut()
            .find(|d| d.name == name)
            .ok_or_else(|| HearthError::UnknownDevice(name.to_string()))?;
        let old = device
            .write(attribute, value)
            .map_err(|kind| HearthError::InvalidAttribute {
                device: name.to_string(),
                attribute: attribute.to_string(),
                kind,
            })?;
        let new = device.attribute(attribute).unwrap_or(value);
        Ok((old, new))
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, Vec<Device>> {
        self.devices.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, Vec<Device>> {
        self.devices.write().unwrap_or_else(PoisonError::into_inner)
    }
}
