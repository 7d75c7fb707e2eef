//! # hearth-adapter-http-axum
//!
//! HTTP adapter — serves the hub's command/query surface to the
//! (out-of-process) presentation layer.
//!
//! ## Responsibilities
//! - JSON REST endpoints for devices, commands, scheduled tasks, rules,
//!   the execution log, and diagnostics
//! - An SSE stream of live domain events
//! - Map domain errors to HTTP status codes
//!
//! ## Dependency rule
//! Depends on `hearth-app` (for the `Hub`) and `hearth-domain`. Contains
//! no domain logic — every handler is a thin translation layer.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
