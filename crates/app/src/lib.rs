//! # hearth-app
//!
//! Application layer — the components of the control core and the **port
//! definitions** (traits) adapters build on.
//!
//! ## Responsibilities
//! - `DeviceRegistry` — authoritative device state, schema-validated writes
//! - `InProcessEventBus` — broadcast channel for domain events
//! - `Scheduler` — time-triggered tasks with a Pending/Fired/Cancelled lifecycle
//! - `RuleEngine` — edge-triggered condition → action rules
//! - `ExecutionCoordinator` — the single write path, per-device serialization,
//!   execution log
//! - `Hub` — the facade the presentation layer talks to; drives scheduler
//!   ticks and depth-bounded rule cascades
//! - Define the `EventPublisher` port trait
//!
//! ## Dependency rule
//! Depends on `hearth-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the
//! reverse.

pub mod coordinator;
pub mod event_bus;
pub mod hub;
pub mod ports;
pub mod registry;
pub mod rule_engine;
pub mod scheduler;
