//! Management operations over projects, actions, secrets and logs.
//!
//! Keeps the scheduler in step with the store: creating or updating a project
//! (re)installs its timer, deleting one cancels it before and after the rows go.
//! A timer is only kept if its project still exists once installed.

use crate::domain::{
    Action, ActionId, CheckLogEntry, NewAction, NewProject, NewSecret, Project, ProjectDetails,
    ProjectId, SecretId, SecretSummary,
};
use crate::error::{ManagementError, ValidationError};
use crate::schedule::{Scheduler, TickReport};
use crate::store::Store;
use futures::future::try_join_all;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{info, instrument};

pub const DEFAULT_LOG_LIMIT: u32 = 50;
pub const MAX_LOG_LIMIT: u32 = 500;

#[derive(Clone)]
pub struct ProjectService {
    store: Store,
    scheduler: Arc<Scheduler>,
}

impl ProjectService {
    pub fn new(store: Store, scheduler: Arc<Scheduler>) -> Self {
        Self { store, scheduler }
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    #[instrument(skip_all, fields(name = %new.name))]
    pub async fn create_project(&self, new: NewProject) -> Result<ProjectDetails, ManagementError> {
        let project = self.store.insert_project(&new).await?;
        self.install_if_present(&project).await?;
        info!(project_id = %project.id, "project created");
        self.details(project).await
    }

    #[instrument(skip(self, new))]
    pub async fn update_project(
        &self,
        id: ProjectId,
        new: NewProject,
    ) -> Result<ProjectDetails, ManagementError> {
        let project = self
            .store
            .update_project(id, &new)
            .await?
            .ok_or(ManagementError::NotFound("project"))?;
        self.install_if_present(&project).await?;
        self.details(project).await
    }

    pub async fn get_project(&self, id: ProjectId) -> Result<ProjectDetails, ManagementError> {
        let project = self.require_project(id).await?;
        self.details(project).await
    }

    pub async fn list_projects(&self) -> Result<Vec<ProjectDetails>, ManagementError> {
        let projects = self.store.list_projects().await?;
        try_join_all(projects.into_iter().map(|project| self.details(project))).await
    }

    /// Cancels the timer before the rows go away, and again after to drop a
    /// timer a concurrent update installed in between.
    #[instrument(skip(self))]
    pub async fn delete_project(&self, id: ProjectId) -> Result<(), ManagementError> {
        self.scheduler.cancel(id);
        let deleted = self.store.delete_project(id).await?;
        self.scheduler.cancel(id);
        if !deleted {
            return Err(ManagementError::NotFound("project"));
        }
        info!("project deleted");
        Ok(())
    }

    /// Installs the project's timer, then withdraws it if the project was
    /// deleted meanwhile.
    async fn install_if_present(&self, project: &Project) -> Result<(), ManagementError> {
        self.scheduler.install(project);
        if self.store.get_project(project.id).await?.is_none() {
            self.scheduler.cancel(project.id);
            return Err(ManagementError::NotFound("project"));
        }
        Ok(())
    }

    pub async fn list_actions(&self, project_id: ProjectId) -> Result<Vec<Action>, ManagementError> {
        self.require_project(project_id).await?;
        Ok(self.store.list_actions(project_id).await?)
    }

    pub async fn create_action(
        &self,
        project_id: ProjectId,
        new: NewAction,
    ) -> Result<Action, ManagementError> {
        self.require_project(project_id).await?;
        Ok(self.store.insert_action(project_id, &new).await?)
    }

    pub async fn update_action(
        &self,
        project_id: ProjectId,
        action_id: ActionId,
        new: NewAction,
    ) -> Result<Action, ManagementError> {
        self.store
            .update_action(project_id, action_id, &new)
            .await?
            .ok_or(ManagementError::NotFound("action"))
    }

    pub async fn delete_action(
        &self,
        project_id: ProjectId,
        action_id: ActionId,
    ) -> Result<(), ManagementError> {
        if !self.store.delete_action(project_id, action_id).await? {
            return Err(ManagementError::NotFound("action"));
        }
        Ok(())
    }

    pub async fn list_secrets(
        &self,
        action_id: ActionId,
    ) -> Result<Vec<SecretSummary>, ManagementError> {
        self.require_action(action_id).await?;
        Ok(self.store.list_secrets(action_id).await?)
    }

    /// A name already used by this action is a conflict; the stored value is left alone.
    pub async fn create_secret(
        &self,
        action_id: ActionId,
        new: NewSecret,
    ) -> Result<SecretSummary, ManagementError> {
        self.require_action(action_id).await?;
        match self.store.insert_secret(action_id, &new).await {
            Ok(summary) => Ok(summary),
            Err(e) if e.is_unique_violation() => Err(ManagementError::Conflict(
                "secret with this name already exists".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update_secret(
        &self,
        action_id: ActionId,
        secret_id: SecretId,
        value: &str,
    ) -> Result<(), ManagementError> {
        if value.is_empty() {
            return Err(ValidationError::SecretValue.into());
        }
        let value = SecretString::from(value.to_string());
        if !self.store.update_secret(action_id, secret_id, &value).await? {
            return Err(ManagementError::NotFound("secret"));
        }
        Ok(())
    }

    pub async fn delete_secret(
        &self,
        action_id: ActionId,
        secret_id: SecretId,
    ) -> Result<(), ManagementError> {
        if !self.store.delete_secret(action_id, secret_id).await? {
            return Err(ManagementError::NotFound("secret"));
        }
        Ok(())
    }

    /// Newest first. `limit` defaults to 50 and is capped at 500.
    pub async fn list_logs(
        &self,
        project_id: ProjectId,
        limit: Option<u32>,
    ) -> Result<Vec<CheckLogEntry>, ManagementError> {
        self.require_project(project_id).await?;
        let limit = limit
            .unwrap_or(DEFAULT_LOG_LIMIT)
            .clamp(1, MAX_LOG_LIMIT);
        Ok(self.store.list_logs(project_id, limit).await?)
    }

    /// Runs one tick for the project now and returns its report.
    #[instrument(skip(self))]
    pub async fn check_now(&self, project_id: ProjectId) -> Result<TickReport, ManagementError> {
        self.require_project(project_id).await?;
        Ok(self.scheduler.tick(project_id).await?)
    }

    async fn require_project(&self, id: ProjectId) -> Result<Project, ManagementError> {
        self.store
            .get_project(id)
            .await?
            .ok_or(ManagementError::NotFound("project"))
    }

    async fn require_action(&self, id: ActionId) -> Result<Action, ManagementError> {
        self.store
            .get_action(id)
            .await?
            .ok_or(ManagementError::NotFound("action"))
    }

    async fn details(&self, project: Project) -> Result<ProjectDetails, ManagementError> {
        let branches = self.store.list_branches(project.id).await?;
        let actions = self.store.list_actions(project.id).await?;
        Ok(ProjectDetails {
            project,
            branches,
            actions,
        })
    }
}
