use super::Store;
use crate::domain::{CheckLogEntry, ProjectId};
use crate::error::PersistenceError;

impl Store {
    /// Most recent log rows first.
    pub async fn list_logs(
        &self,
        project_id: ProjectId,
        limit: u32,
    ) -> Result<Vec<CheckLogEntry>, PersistenceError> {
        let logs = sqlx::query_as::<_, CheckLogEntry>(
            r#"
            SELECT id, project_id, branch_name, commit_sha, commit_message, commit_author,
                   commit_date, checked_at, status
            FROM check_logs
            WHERE project_id = $1
            ORDER BY checked_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(project_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommitInfo, NewProject};
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn logs_are_newest_first_and_limited() {
        let store = Store::in_memory().await.unwrap();
        let project = store
            .insert_project(
                &NewProject::parse(
                    "radar",
                    "https://github.com/owner/repo",
                    &["main".to_string()],
                    None,
                )
                .unwrap(),
            )
            .await
            .unwrap();
        let start = Utc::now();

        for i in 0..3 {
            let branch = store.list_branches(project.id).await.unwrap().remove(0);
            let commit = CommitInfo {
                sha: format!("sha{i}"),
                message: format!("commit {i}"),
                author: "Octo Cat".to_string(),
                date: start,
            };
            store
                .record_change(&branch, &commit, start + Duration::minutes(i))
                .await
                .unwrap()
                .unwrap();
        }

        let logs = store.list_logs(project.id, 2).await.unwrap();
        let shas: Vec<&str> = logs.iter().map(|l| l.commit_sha.as_str()).collect();
        assert_eq!(shas, vec!["sha2", "sha1"]);
    }
}
