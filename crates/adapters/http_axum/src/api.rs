//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod devices;
#[allow(clippy::missing_errors_doc)]
pub mod log;
#[allow(clippy::missing_errors_doc)]
pub mod rules;
#[allow(clippy::missing_errors_doc)]
pub mod sse;
#[allow(clippy::missing_errors_doc)]
pub mod tasks;

use axum::Router;
use axum::routing::{get, post, put};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Devices & commands
        .route("/devices", get(devices::list))
        .route("/devices/{name}", get(devices::get))
        .route("/devices/{name}/command", post(devices::command))
        // Scheduled tasks
        .route("/tasks", get(tasks::list).post(tasks::create))
        .route("/tasks/{id}/cancel", post(tasks::cancel))
        .route("/tasks/purge", post(tasks::purge))
        // Rules
        .route("/rules", get(rules::list).post(rules::create))
        .route("/rules/{id}", put(rules::redefine))
        .route("/rules/{id}/enabled", put(rules::set_enabled))
        // Execution log & diagnostics
        .route("/log", get(log::list))
        .route("/diagnostics", get(log::diagnostics))
        // Live events
        .route("/events/stream", get(sse::stream))
}
