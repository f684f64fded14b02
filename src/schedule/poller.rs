use super::{ProjectCheck, TickReport};
use crate::dispatch::Dispatcher;
use crate::domain::{ProjectId, RepositoryURL};
use crate::error::{PersistenceError, ProviderError};
use crate::github::{BranchCheck, ChangeDetector};
use crate::store::Store;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, instrument, warn};

/// Checks every branch of a project and reacts to the ones that moved.
#[derive(Clone)]
pub struct ProjectPoller {
    store: Store,
    detector: ChangeDetector,
    dispatcher: Dispatcher,
}

impl ProjectPoller {
    pub fn new(store: Store, detector: ChangeDetector, dispatcher: Dispatcher) -> Self {
        Self {
            store,
            detector,
            dispatcher,
        }
    }
}

#[async_trait]
impl ProjectCheck for ProjectPoller {
    #[instrument(skip(self))]
    async fn check(&self, project_id: ProjectId) -> Result<TickReport, PersistenceError> {
        let Some(project) = self.store.get_project(project_id).await? else {
            info!("project no longer exists, skipping tick");
            return Ok(TickReport::default());
        };
        let branches = self.store.list_branches(project.id).await?;

        let repo = match RepositoryURL::new(project.repo_url.as_str()) {
            Ok(repo) => repo,
            Err(reason) => {
                let err = ProviderError::MalformedUrl(reason);
                warn!(repo_url = %project.repo_url, error = %err, "cannot check project");
                return Ok(TickReport {
                    failures: branches.len(),
                    ..TickReport::default()
                });
            }
        };

        let mut report = TickReport::default();
        for branch in branches {
            report.branches_checked += 1;
            let check = self
                .detector
                .check_branch(&repo, &branch.name, branch.last_commit.as_deref())
                .await;

            let commit = match check {
                Ok(BranchCheck::Changed(commit)) => commit,
                Ok(BranchCheck::Unchanged { .. }) => continue,
                Err(e) => {
                    report.failures += 1;
                    warn!(branch = %branch.name, error = %e, "branch check failed");
                    continue;
                }
            };

            let recorded = self.store.record_change(&branch, &commit, Utc::now()).await?;
            if recorded.is_none() {
                debug!(branch = %branch.name, sha = %commit.sha, "change already recorded");
                continue;
            }
            report.changes += 1;

            let actions = self.store.list_actions(project.id).await?;
            let outcomes = self
                .dispatcher
                .dispatch(&project, &branch.name, &commit, &actions)
                .await;
            report.failed_actions += outcomes.iter().filter(|o| !o.is_success()).count();
        }

        Ok(report)
    }
}
