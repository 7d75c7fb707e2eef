//! # hearth-domain
//!
//! Pure domain model for the hearth home control core.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Devices** (named, typed state holders with attribute schemas)
//! - Define **Scheduled tasks** (time-triggered attribute writes with a lifecycle)
//! - Define **Rules** (condition → action pairs evaluated against live state)
//! - Define **Events** (state-change, schedule-fired, rule-triggered records)
//! - Define the **execution log entry** (one record per applied write)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod device;
pub mod event;
pub mod rule;
pub mod task;
