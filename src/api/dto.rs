use crate::domain::{NewAction, NewProject, NewSecret};
use crate::error::ValidationError;
use serde::Deserialize;

/// Body of `POST /api/projects` and `PUT /api/projects/{id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub repo_url: String,
    #[serde(default)]
    pub branches: Vec<String>,
    pub check_interval: Option<i64>,
}

impl TryFrom<ProjectRequest> for NewProject {
    type Error = ValidationError;

    fn try_from(req: ProjectRequest) -> Result<Self, Self::Error> {
        NewProject::parse(&req.name, &req.repo_url, &req.branches, req.check_interval)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub action_type: String,
    pub webhook_url: Option<String>,
    pub script_content: Option<String>,
}

impl TryFrom<ActionRequest> for NewAction {
    type Error = ValidationError;

    fn try_from(req: ActionRequest) -> Result<Self, Self::Error> {
        NewAction::parse(
            req.name.as_deref(),
            &req.action_type,
            req.webhook_url.as_deref(),
            req.script_content.as_deref(),
        )
    }
}

#[derive(Deserialize)]
pub struct SecretRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl TryFrom<SecretRequest> for NewSecret {
    type Error = ValidationError;

    fn try_from(req: SecretRequest) -> Result<Self, Self::Error> {
        NewSecret::parse(&req.name, &req.value)
    }
}

#[derive(Deserialize)]
pub struct SecretValueRequest {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<u32>,
}
