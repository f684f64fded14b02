use super::Store;
use crate::domain::{Action, ActionId, NewAction, ProjectId};
use crate::error::PersistenceError;
use chrono::Utc;

const ACTION_COLUMNS: &str =
    "id, project_id, name, action_type, webhook_url, script_content, created_at, updated_at";

impl Store {
    pub async fn insert_action(
        &self,
        project_id: ProjectId,
        new: &NewAction,
    ) -> Result<Action, PersistenceError> {
        let action = sqlx::query_as::<_, Action>(&format!(
            r#"
            INSERT INTO actions (project_id, name, action_type, webhook_url, script_content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {ACTION_COLUMNS}
            "#
        ))
        .bind(project_id)
        .bind(&new.name)
        .bind(new.kind.type_name())
        .bind(new.kind.webhook_url())
        .bind(new.kind.script_content())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(action)
    }

    /// Returns `None` when no action with this id belongs to the project.
    pub async fn update_action(
        &self,
        project_id: ProjectId,
        action_id: ActionId,
        new: &NewAction,
    ) -> Result<Option<Action>, PersistenceError> {
        let action = sqlx::query_as::<_, Action>(&format!(
            r#"
            UPDATE actions
            SET name = $1, action_type = $2, webhook_url = $3, script_content = $4, updated_at = $5
            WHERE id = $6 AND project_id = $7
            RETURNING {ACTION_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(new.kind.type_name())
        .bind(new.kind.webhook_url())
        .bind(new.kind.script_content())
        .bind(Utc::now())
        .bind(action_id)
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(action)
    }

    pub async fn delete_action(
        &self,
        project_id: ProjectId,
        action_id: ActionId,
    ) -> Result<bool, PersistenceError> {
        let result = sqlx::query("DELETE FROM actions WHERE id = $1 AND project_id = $2")
            .bind(action_id)
            .bind(project_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_action(&self, action_id: ActionId) -> Result<Option<Action>, PersistenceError> {
        let action = sqlx::query_as::<_, Action>(&format!(
            "SELECT {ACTION_COLUMNS} FROM actions WHERE id = $1"
        ))
        .bind(action_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(action)
    }

    /// Actions of a project in creation order, which is also dispatch order.
    pub async fn list_actions(&self, project_id: ProjectId) -> Result<Vec<Action>, PersistenceError> {
        let actions = sqlx::query_as::<_, Action>(&format!(
            "SELECT {ACTION_COLUMNS} FROM actions WHERE project_id = $1 ORDER BY id"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(actions)
    }
}
