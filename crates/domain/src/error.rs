//! Common error types used across the workspace.
//!
//! Boundary validation errors (`UnknownDevice`, `InvalidAttribute`,
//! `InvalidTime`, `EmptyField`) are returned to the caller before any state
//! is mutated. Lifecycle errors (`NotFound`, `AlreadyFired`) report a failed
//! operation on an existing store. `RuleCycleExceeded` is the one runtime
//! error: the cascade driver catches it, records it, and keeps running.

use crate::id::TaskId;

/// Base error enum for the hearth workspace.
#[derive(Debug, thiserror::Error)]
pub enum HearthError {
    /// No device with this name is registered.
    #[error("unknown device: {0}")]
    UnknownDevice(String),

    /// A device with this name is already registered.
    #[error("device already registered: {0}")]
    DuplicateDevice(String),

    /// The attribute does not exist on the device, or the value has the
    /// wrong type for it.
    #[error("invalid attribute {attribute:?} on device {device:?}: {kind}")]
    InvalidAttribute {
        device: String,
        attribute: String,
        #[source]
        kind: AttributeErrorKind,
    },

    /// A trigger time string that is not `HH:MM` within 00:00–23:59.
    #[error("malformed time {0:?}: expected HH:MM between 00:00 and 23:59")]
    InvalidTime(String),

    /// A required field was left empty.
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    /// A task or rule id that matches nothing in its store.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The task already fired and can no longer be cancelled.
    #[error("task {0} has already fired")]
    AlreadyFired(TaskId),

    /// A rule cascade recursed past the configured depth bound.
    #[error("rule cascade aborted after {max_depth} levels")]
    RuleCycleExceeded { max_depth: usize },
}

/// Why an attribute write was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AttributeErrorKind {
    /// The device's schema declares no attribute with this name.
    #[error("no such attribute")]
    Unknown,
    /// The value's type does not match the attribute's declared type.
    #[error("type mismatch")]
    TypeMismatch,
}
