//! HTTP handlers for the management API.

pub mod dto;

use crate::domain::{
    Action, ActionId, CheckLogEntry, NewAction, NewProject, NewSecret, ProjectDetails, ProjectId,
    SecretId, SecretSummary,
};
use crate::error::ManagementError;
use crate::schedule::TickReport;
use crate::service::ProjectService;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dto::{ActionRequest, LogsQuery, ProjectRequest, SecretRequest, SecretValueRequest};
use serde_json::json;
use tracing::error;

impl IntoResponse for ManagementError {
    fn into_response(self) -> Response {
        let status = match &self {
            ManagementError::Validation(_) => StatusCode::BAD_REQUEST,
            ManagementError::NotFound(_) => StatusCode::NOT_FOUND,
            ManagementError::Conflict(_) => StatusCode::CONFLICT,
            ManagementError::Persistence(e) => {
                error!(error = %e, "request failed on persistence");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, ManagementError>;

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn list_projects(
    State(service): State<ProjectService>,
) -> ApiResult<Json<Vec<ProjectDetails>>> {
    Ok(Json(service.list_projects().await?))
}

pub async fn create_project(
    State(service): State<ProjectService>,
    Json(req): Json<ProjectRequest>,
) -> ApiResult<impl IntoResponse> {
    let project = service.create_project(NewProject::try_from(req)?).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(service): State<ProjectService>,
    Path(id): Path<ProjectId>,
) -> ApiResult<Json<ProjectDetails>> {
    Ok(Json(service.get_project(id).await?))
}

pub async fn update_project(
    State(service): State<ProjectService>,
    Path(id): Path<ProjectId>,
    Json(req): Json<ProjectRequest>,
) -> ApiResult<Json<ProjectDetails>> {
    let new = NewProject::try_from(req)?;
    Ok(Json(service.update_project(id, new).await?))
}

pub async fn delete_project(
    State(service): State<ProjectService>,
    Path(id): Path<ProjectId>,
) -> ApiResult<StatusCode> {
    service.delete_project(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn check_project(
    State(service): State<ProjectService>,
    Path(id): Path<ProjectId>,
) -> ApiResult<Json<TickReport>> {
    Ok(Json(service.check_now(id).await?))
}

pub async fn list_logs(
    State(service): State<ProjectService>,
    Path(id): Path<ProjectId>,
    Query(query): Query<LogsQuery>,
) -> ApiResult<Json<Vec<CheckLogEntry>>> {
    Ok(Json(service.list_logs(id, query.limit).await?))
}

pub async fn list_actions(
    State(service): State<ProjectService>,
    Path(id): Path<ProjectId>,
) -> ApiResult<Json<Vec<Action>>> {
    Ok(Json(service.list_actions(id).await?))
}

pub async fn create_action(
    State(service): State<ProjectService>,
    Path(id): Path<ProjectId>,
    Json(req): Json<ActionRequest>,
) -> ApiResult<impl IntoResponse> {
    let action = service.create_action(id, NewAction::try_from(req)?).await?;
    Ok((StatusCode::CREATED, Json(action)))
}

pub async fn update_action(
    State(service): State<ProjectService>,
    Path((id, action_id)): Path<(ProjectId, ActionId)>,
    Json(req): Json<ActionRequest>,
) -> ApiResult<Json<Action>> {
    let new = NewAction::try_from(req)?;
    Ok(Json(service.update_action(id, action_id, new).await?))
}

pub async fn delete_action(
    State(service): State<ProjectService>,
    Path((id, action_id)): Path<(ProjectId, ActionId)>,
) -> ApiResult<StatusCode> {
    service.delete_action(id, action_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_secrets(
    State(service): State<ProjectService>,
    Path(action_id): Path<ActionId>,
) -> ApiResult<Json<Vec<SecretSummary>>> {
    Ok(Json(service.list_secrets(action_id).await?))
}

pub async fn create_secret(
    State(service): State<ProjectService>,
    Path(action_id): Path<ActionId>,
    Json(req): Json<SecretRequest>,
) -> ApiResult<impl IntoResponse> {
    let secret = service
        .create_secret(action_id, NewSecret::try_from(req)?)
        .await?;
    Ok((StatusCode::CREATED, Json(secret)))
}

pub async fn update_secret(
    State(service): State<ProjectService>,
    Path((action_id, secret_id)): Path<(ActionId, SecretId)>,
    Json(req): Json<SecretValueRequest>,
) -> ApiResult<StatusCode> {
    service
        .update_secret(action_id, secret_id, &req.value)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_secret(
    State(service): State<ProjectService>,
    Path((action_id, secret_id)): Path<(ActionId, SecretId)>,
) -> ApiResult<StatusCode> {
    service.delete_secret(action_id, secret_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
