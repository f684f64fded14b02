use crate::domain::{ProjectId, SecretName};
use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::fmt;
use validator::ValidateUrl;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ActionId(pub i64);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct SecretId(pub i64);

/// What an action does when a change is detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action_type", rename_all = "lowercase")]
pub enum ActionKind {
    Webhook {
        #[serde(rename = "webhook_url")]
        url: String,
    },
    Script {
        #[serde(rename = "script_content")]
        content: String,
    },
}

impl ActionKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ActionKind::Webhook { .. } => "webhook",
            ActionKind::Script { .. } => "script",
        }
    }

    pub(crate) fn webhook_url(&self) -> Option<&str> {
        match self {
            ActionKind::Webhook { url } => Some(url),
            ActionKind::Script { .. } => None,
        }
    }

    pub(crate) fn script_content(&self) -> Option<&str> {
        match self {
            ActionKind::Webhook { .. } => None,
            ActionKind::Script { content } => Some(content),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Action {
    pub id: ActionId,
    pub project_id: ProjectId,
    pub name: Option<String>,
    #[serde(flatten)]
    pub kind: ActionKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Action {
    /// Name used in logs: the display name if set, otherwise the id.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("action #{}", self.id),
        }
    }
}

impl<'r> FromRow<'r, SqliteRow> for Action {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let action_type: String = row.try_get("action_type")?;
        let webhook_url: Option<String> = row.try_get("webhook_url")?;
        let script_content: Option<String> = row.try_get("script_content")?;

        let kind = match (action_type.as_str(), webhook_url, script_content) {
            ("webhook", Some(url), _) => ActionKind::Webhook { url },
            ("script", _, Some(content)) => ActionKind::Script { content },
            (other, _, _) => {
                return Err(sqlx::Error::ColumnDecode {
                    index: "action_type".to_string(),
                    source: format!("action type `{other}` has no matching target").into(),
                });
            }
        };

        Ok(Self {
            id: row.try_get("id")?,
            project_id: row.try_get("project_id")?,
            name: row.try_get("name")?,
            kind,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Validated input for creating or replacing an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAction {
    pub name: Option<String>,
    pub kind: ActionKind,
}

impl NewAction {
    /// Exactly one of `webhook_url` / `script_content` must be given, matching `action_type`.
    /// Empty strings count as absent.
    pub fn parse(
        name: Option<&str>,
        action_type: &str,
        webhook_url: Option<&str>,
        script_content: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let webhook_url = present(webhook_url);
        let script_content = present(script_content);

        let kind = match (action_type.trim(), webhook_url, script_content) {
            ("webhook", Some(url), None) => {
                let url = url.trim().to_string();
                let http = url.starts_with("http://") || url.starts_with("https://");
                if !http || !url.validate_url() {
                    return Err(ValidationError::WebhookUrl(url));
                }
                ActionKind::Webhook { url }
            }
            ("script", None, Some(content)) => ActionKind::Script {
                content: content.to_string(),
            },
            _ => return Err(ValidationError::ActionTarget),
        };

        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        Ok(Self { name, kind })
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// A secret as the dispatcher sees it. The value is only exposed when building
/// a script's environment.
#[derive(Debug)]
pub struct Secret {
    pub id: SecretId,
    pub action_id: ActionId,
    pub name: String,
    pub value: SecretString,
}

impl<'r> FromRow<'r, SqliteRow> for Secret {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let value: String = row.try_get("value")?;
        Ok(Self {
            id: row.try_get("id")?,
            action_id: row.try_get("action_id")?,
            name: row.try_get("name")?,
            value: SecretString::from(value),
        })
    }
}

/// What listings show about a secret: never its value.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SecretSummary {
    pub id: SecretId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewSecret {
    pub name: SecretName,
    pub value: SecretString,
}

impl NewSecret {
    pub fn parse(name: &str, value: &str) -> Result<Self, ValidationError> {
        let name = SecretName::new(name)?;
        if value.is_empty() {
            return Err(ValidationError::SecretValue);
        }
        Ok(Self {
            name,
            value: SecretString::from(value.to_string()),
        })
    }
}
