use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Failures talking to the source-control provider. Always scoped to one branch check.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("malformed repository URL: {0}")]
    MalformedUrl(String),
    #[error("provider unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),
    #[error("branch `{branch}` not found in {owner}/{repo}")]
    BranchNotFound {
        owner: String,
        repo: String,
        branch: String,
    },
    #[error("rate limited by provider (reset at {reset:?})")]
    RateLimited { reset: Option<i64> },
    #[error("provider rejected credentials with status {0}")]
    Unauthorized(StatusCode),
    #[error("unexpected provider status {0}")]
    UnexpectedStatus(StatusCode),
    #[error("failed to decode provider response: {0}")]
    Decode(#[source] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl PersistenceError {
    pub fn is_unique_violation(&self) -> bool {
        match self {
            PersistenceError::Database(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        match self {
            PersistenceError::Database(sqlx::Error::Database(e)) => e.is_foreign_key_violation(),
            _ => false,
        }
    }
}

/// Failures of a single action. Never escalated past the action that produced them.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("webhook request failed: {0}")]
    WebhookRequest(#[source] reqwest::Error),
    #[error("webhook responded with status {0}")]
    WebhookStatus(StatusCode),
    #[error("script could not run: {0}")]
    ScriptIo(#[from] std::io::Error),
    #[error("script exited with {code:?}: {stderr}")]
    ScriptExit {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    #[error("script timed out after {0:?}")]
    ScriptTimeout(Duration),
    #[error("failed to load secrets: {0}")]
    Secrets(#[from] PersistenceError),
}

/// Rejected input at the management boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyName(&'static str),
    #[error("invalid repository URL: {0}")]
    RepositoryUrl(String),
    #[error("check interval must be at least 1 minute")]
    CheckInterval,
    #[error("check interval must be at most {0} minutes (one year)")]
    CheckIntervalTooLong(i64),
    #[error("at least one branch is required")]
    NoBranches,
    #[error("invalid branch name `{0}`")]
    BranchName(String),
    #[error("action type and either webhook URL or script content are required")]
    ActionTarget,
    #[error("invalid webhook URL `{0}`")]
    WebhookUrl(String),
    #[error(
        "invalid secret name `{0}`: use letters, digits and underscores, not starting with a digit"
    )]
    SecretName(String),
    #[error("secret value is required")]
    SecretValue,
}

#[derive(Debug, Error)]
pub enum ManagementError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Anything that stops the service from coming up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("invalid CORS origin `{origin}`: {reason}")]
    CorsOrigin { origin: String, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
