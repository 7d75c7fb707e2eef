//! JSON REST handlers for the execution log and diagnostics.

use axum::Json;
use axum::extract::{Query, State};

use hearth_app::hub::Diagnostics;
use hearth_domain::event::LogEntry;

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_LOG_LIMIT: usize = 50;

/// Query parameters for the log endpoint.
#[derive(serde::Deserialize)]
pub struct LogQuery {
    pub limit: Option<usize>,
}

/// `GET /api/log` — most recent execution-log entries, newest first.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    Ok(Json(state.hub.execution_log(limit)))
}

/// `GET /api/diagnostics` — degradation counters.
pub async fn diagnostics(State(state): State<AppState>) -> Result<Json<Diagnostics>, ApiError> {
    Ok(Json(state.hub.diagnostics()))
}
