use super::Store;
use crate::domain::{
    Branch, BranchId, CHANGE_DETECTED, CheckLogEntry, CommitInfo, NewProject, Project, ProjectId,
};
use crate::error::PersistenceError;
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, Transaction};

const PROJECT_COLUMNS: &str = "id, name, repo_url, check_interval, created_at, updated_at";

impl Store {
    /// Inserts the project and its branches in one transaction.
    pub async fn insert_project(&self, new: &NewProject) -> Result<Project, PersistenceError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (name, repo_url, check_interval, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(new.repo_url.url())
        .bind(new.check_interval)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        insert_branches(&mut tx, project.id, &new.branches).await?;
        tx.commit().await?;

        Ok(project)
    }

    /// Replaces name, URL and interval, and syncs the branch rows: branches no
    /// longer listed are removed, new ones are added, kept ones retain their
    /// last seen commit. Returns `None` if the project does not exist.
    pub async fn update_project(
        &self,
        id: ProjectId,
        new: &NewProject,
    ) -> Result<Option<Project>, PersistenceError> {
        let mut tx = self.pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET name = $1, repo_url = $2, check_interval = $3, updated_at = $4
            WHERE id = $5
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(new.repo_url.url())
        .bind(new.check_interval)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(project) = project else {
            return Ok(None);
        };

        let existing: Vec<(BranchId, String)> =
            sqlx::query_as("SELECT id, branch_name FROM branches WHERE project_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;
        for (branch_id, name) in existing {
            if !new.branches.contains(&name) {
                sqlx::query("DELETE FROM branches WHERE id = $1")
                    .bind(branch_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }
        insert_branches(&mut tx, id, &new.branches).await?;
        tx.commit().await?;

        Ok(Some(project))
    }

    pub async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, PersistenceError> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(project)
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, PersistenceError> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }

    /// Deletes the project; branches, actions, secrets and log rows cascade.
    pub async fn delete_project(&self, id: ProjectId) -> Result<bool, PersistenceError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Branches of a project in a stable order.
    pub async fn list_branches(&self, project_id: ProjectId) -> Result<Vec<Branch>, PersistenceError> {
        let branches = sqlx::query_as::<_, Branch>(
            r#"
            SELECT id, project_id, branch_name, last_commit_sha
            FROM branches
            WHERE project_id = $1
            ORDER BY id
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(branches)
    }

    /// Persists a detected head change: the branch's last commit, the project's
    /// `updated_at` and a `CHANGE_DETECTED` log row, atomically.
    ///
    /// The branch only moves if its stored commit still equals `branch.last_commit`.
    /// Returns `None` when another check already recorded a change or the branch is gone.
    pub async fn record_change(
        &self,
        branch: &Branch,
        commit: &CommitInfo,
        detected_at: DateTime<Utc>,
    ) -> Result<Option<CheckLogEntry>, PersistenceError> {
        let mut tx = self.pool.begin().await?;

        let moved = sqlx::query(
            "UPDATE branches SET last_commit_sha = $1 WHERE id = $2 AND last_commit_sha IS $3",
        )
        .bind(&commit.sha)
        .bind(branch.id)
        .bind(branch.last_commit.as_deref())
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if moved == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query("UPDATE projects SET updated_at = $1 WHERE id = $2")
            .bind(detected_at)
            .bind(branch.project_id)
            .execute(&mut *tx)
            .await?;

        let entry = sqlx::query_as::<_, CheckLogEntry>(
            r#"
            INSERT INTO check_logs
                (project_id, branch_name, commit_sha, commit_message, commit_author, commit_date, checked_at, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, project_id, branch_name, commit_sha, commit_message, commit_author,
                      commit_date, checked_at, status
            "#,
        )
        .bind(branch.project_id)
        .bind(&branch.name)
        .bind(&commit.sha)
        .bind(&commit.message)
        .bind(&commit.author)
        .bind(commit.date)
        .bind(detected_at)
        .bind(CHANGE_DETECTED)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(entry))
    }
}

async fn insert_branches(
    tx: &mut Transaction<'_, Sqlite>,
    project_id: ProjectId,
    branches: &[String],
) -> Result<(), PersistenceError> {
    for name in branches {
        sqlx::query(
            r#"
            INSERT INTO branches (project_id, branch_name)
            VALUES ($1, $2)
            ON CONFLICT (project_id, branch_name) DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(name)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
