//! JSON REST handlers for scheduled tasks.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use hearth_domain::device::AttributeValue;
use hearth_domain::error::HearthError;
use hearth_domain::id::TaskId;
use hearth_domain::task::{Recurrence, ScheduledTask};
use hearth_domain::time::TimeOfDay;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for scheduling a task.
#[derive(serde::Deserialize)]
pub struct CreateTaskRequest {
    pub device: String,
    pub attribute: String,
    pub value: AttributeValue,
    /// Trigger time as a 24-hour `HH:MM` string.
    pub at: String,
    #[serde(default = "default_recurrence")]
    pub recurrence: Recurrence,
}

fn default_recurrence() -> Recurrence {
    Recurrence::Once
}

/// Response body for the purge endpoint.
#[derive(serde::Serialize)]
pub struct PurgeResponse {
    pub purged: usize,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<ScheduledTask>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<ScheduledTask>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the cancel endpoint.
pub enum CancelResponse {
    NoContent,
}

impl IntoResponse for CancelResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/tasks`
pub async fn list(State(state): State<AppState>) -> Result<ListResponse, ApiError> {
    Ok(ListResponse::Ok(Json(state.hub.list_tasks())))
}

/// `POST /api/tasks`
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<CreateResponse, ApiError> {
    let at: TimeOfDay = req.at.parse()?;
    let id = state
        .hub
        .schedule_task(&req.device, &req.attribute, req.value, at, req.recurrence)?;
    let task = state
        .hub
        .list_tasks()
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| HearthError::NotFound {
            entity: "Task",
            id: id.to_string(),
        })?;
    Ok(CreateResponse::Created(Json(task)))
}

/// `POST /api/tasks/{id}/cancel`
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<CancelResponse, ApiError> {
    let task_id = parse_task_id(&id)?;
    state.hub.cancel_task(task_id)?;
    Ok(CancelResponse::NoContent)
}

/// `POST /api/tasks/purge`
pub async fn purge(State(state): State<AppState>) -> Result<Json<PurgeResponse>, ApiError> {
    Ok(Json(PurgeResponse {
        purged: state.hub.purge_tasks(),
    }))
}

fn parse_task_id(id: &str) -> Result<TaskId, ApiError> {
    TaskId::from_str(id).map_err(|_| {
        ApiError::from(HearthError::NotFound {
            entity: "Task",
            id: id.to_string(),
        })
    })
}
