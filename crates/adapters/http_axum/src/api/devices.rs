//! JSON REST handlers for devices and user commands.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use hearth_domain::device::{AttributeValue, Device};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for issuing a command.
#[derive(serde::Deserialize)]
pub struct CommandRequest {
    pub attribute: String,
    pub value: AttributeValue,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Device>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<Device>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/devices`
pub async fn list(State(state): State<AppState>) -> Result<ListResponse, ApiError> {
    Ok(ListResponse::Ok(Json(state.hub.list_devices())))
}

/// `GET /api/devices/{name}`
pub async fn get(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<GetResponse, ApiError> {
    let device = state.hub.get_device(&name)?;
    Ok(GetResponse::Ok(Json(device)))
}

/// `POST /api/devices/{name}/command`
///
/// Applies a user-originated attribute write and returns the device's
/// post-command snapshot (with any clamping already applied).
pub async fn command(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<CommandRequest>,
) -> Result<GetResponse, ApiError> {
    state
        .hub
        .issue_command(&name, &req.attribute, req.value)
        .await?;
    let device = state.hub.get_device(&name)?;
    Ok(GetResponse::Ok(Json(device)))
}
