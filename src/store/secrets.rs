use super::Store;
use crate::domain::{ActionId, NewSecret, Secret, SecretId, SecretSummary};
use crate::error::PersistenceError;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};

impl Store {
    /// Fails with a unique violation if the action already has a secret with this name.
    pub async fn insert_secret(
        &self,
        action_id: ActionId,
        new: &NewSecret,
    ) -> Result<SecretSummary, PersistenceError> {
        let summary = sqlx::query_as::<_, SecretSummary>(
            r#"
            INSERT INTO secrets (action_id, name, value, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, created_at
            "#,
        )
        .bind(action_id)
        .bind(new.name.as_str())
        .bind(new.value.expose_secret())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(summary)
    }

    pub async fn update_secret(
        &self,
        action_id: ActionId,
        secret_id: SecretId,
        value: &SecretString,
    ) -> Result<bool, PersistenceError> {
        let result = sqlx::query("UPDATE secrets SET value = $1 WHERE id = $2 AND action_id = $3")
            .bind(value.expose_secret())
            .bind(secret_id)
            .bind(action_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_secret(
        &self,
        action_id: ActionId,
        secret_id: SecretId,
    ) -> Result<bool, PersistenceError> {
        let result = sqlx::query("DELETE FROM secrets WHERE id = $1 AND action_id = $2")
            .bind(secret_id)
            .bind(action_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_secrets(
        &self,
        action_id: ActionId,
    ) -> Result<Vec<SecretSummary>, PersistenceError> {
        let secrets = sqlx::query_as::<_, SecretSummary>(
            "SELECT id, name, created_at FROM secrets WHERE action_id = $1 ORDER BY id",
        )
        .bind(action_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(secrets)
    }

    /// Secrets with their values, for building a script environment.
    pub async fn secrets_for_action(
        &self,
        action_id: ActionId,
    ) -> Result<Vec<Secret>, PersistenceError> {
        let secrets = sqlx::query_as::<_, Secret>(
            "SELECT id, action_id, name, value FROM secrets WHERE action_id = $1 ORDER BY id",
        )
        .bind(action_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(secrets)
    }
}
