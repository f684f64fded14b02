use crate::domain::{Action, CheckInterval, RepositoryURL};
use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ProjectId(pub i64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct BranchId(pub i64);

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub repo_url: String,
    pub check_interval: CheckInterval,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A tracked ref. `last_commit` stays `None` until the first successful check.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Branch {
    pub id: BranchId,
    pub project_id: ProjectId,
    #[sqlx(rename = "branch_name")]
    pub name: String,
    #[sqlx(rename = "last_commit_sha")]
    pub last_commit: Option<String>,
}

/// A project together with everything shown alongside it.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetails {
    #[serde(flatten)]
    pub project: Project,
    pub branches: Vec<Branch>,
    pub actions: Vec<Action>,
}

/// Validated input for creating or replacing a project.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub repo_url: RepositoryURL,
    pub branches: Vec<String>,
    pub check_interval: CheckInterval,
}

impl NewProject {
    /// Validates raw input. A missing interval falls back to the default of five minutes.
    pub fn parse(
        name: &str,
        repo_url: &str,
        branches: &[String],
        check_interval: Option<i64>,
    ) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName("project name"));
        }
        let repo_url = RepositoryURL::new(repo_url).map_err(ValidationError::RepositoryUrl)?;
        let check_interval = match check_interval {
            Some(minutes) => CheckInterval::new(minutes)?,
            None => CheckInterval::default(),
        };

        let mut names: Vec<String> = Vec::with_capacity(branches.len());
        for branch in branches {
            let branch = validate_branch_name(branch)?;
            if !names.contains(&branch) {
                names.push(branch);
            }
        }
        if names.is_empty() {
            return Err(ValidationError::NoBranches);
        }

        Ok(Self {
            name: name.to_string(),
            repo_url,
            branches: names,
            check_interval,
        })
    }
}

fn validate_branch_name(branch: &str) -> Result<String, ValidationError> {
    let branch = branch.trim();
    let invalid = branch.is_empty()
        || branch.starts_with('-')
        || branch.contains("..")
        || branch.chars().any(|c| c.is_whitespace() || c.is_control());
    if invalid {
        return Err(ValidationError::BranchName(branch.to_string()));
    }
    Ok(branch.to_string())
}
