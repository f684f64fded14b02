use crate::domain::ProjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status tag written for every detected head change.
pub const CHANGE_DETECTED: &str = "CHANGE_DETECTED";

/// Head commit metadata as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
    pub message: String,
    pub author: String,
    pub date: DateTime<Utc>,
}

/// One row of the append-only change history.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CheckLogEntry {
    pub id: i64,
    pub project_id: ProjectId,
    pub branch_name: String,
    pub commit_sha: String,
    pub commit_message: String,
    pub commit_author: String,
    pub commit_date: DateTime<Utc>,
    pub checked_at: DateTime<Utc>,
    pub status: String,
}
