//! JSON REST handlers for rules.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use hearth_domain::error::HearthError;
use hearth_domain::id::RuleId;
use hearth_domain::rule::{Action, Condition, Rule};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for defining or redefining a rule.
#[derive(serde::Deserialize)]
pub struct RuleRequest {
    pub condition: Condition,
    pub action: Action,
}

/// Request body for toggling a rule.
#[derive(serde::Deserialize)]
pub struct SetEnabledRequest {
    pub enabled: bool,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Rule>>),
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
    Created(Json<Rule>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the update endpoints.
pub enum UpdateResponse {
    NoContent,
}

impl IntoResponse for UpdateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/rules`
pub async fn list(State(state): State<AppState>) -> Result<ListResponse, ApiError> {
    Ok(ListResponse::Ok(Json(state.hub.list_rules())))
}

/// `POST /api/rules`
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<RuleRequest>,
) -> Result<CreateResponse, ApiError> {
    let id = state.hub.define_rule(req.condition, req.action)?;
    let rule = state
        .hub
        .list_rules()
        .into_iter()
        .find(|r| r.id == id)
        .ok_or_else(|| HearthError::NotFound {
            entity: "Rule",
            id: id.to_string(),
        })?;
    Ok(CreateResponse::Created(Json(rule)))
}

/// `PUT /api/rules/{id}`
pub async fn redefine(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RuleRequest>,
) -> Result<UpdateResponse, ApiError> {
    let rule_id = parse_rule_id(&id)?;
    state.hub.redefine_rule(rule_id, req.condition, req.action)?;
    Ok(UpdateResponse::NoContent)
}

/// `PUT /api/rules/{id}/enabled`
pub async fn set_enabled(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetEnabledRequest>,
) -> Result<UpdateResponse, ApiError> {
    let rule_id = parse_rule_id(&id)?;
    if req.enabled {
        state.hub.enable_rule(rule_id)?;
    } else {
        state.hub.disable_rule(rule_id)?;
    }
    Ok(UpdateResponse::NoContent)
}

fn parse_rule_id(id: &str) -> Result<RuleId, ApiError> {
    RuleId::from_str(id).map_err(|_| {
        ApiError::from(HearthError::NotFound {
            entity: "Rule",
            id: id.to_string(),
        })
    })
}
