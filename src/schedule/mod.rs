//! One cancellable polling task per project.

mod poller;

pub use poller::ProjectPoller;

use crate::domain::{Project, ProjectId};
use crate::error::PersistenceError;
use crate::store::Store;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

/// Summary of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub branches_checked: usize,
    pub changes: usize,
    /// Branches whose provider query failed.
    pub failures: usize,
    pub failed_actions: usize,
}

/// The work done on every tick of a project's timer.
#[async_trait]
pub trait ProjectCheck: Send + Sync {
    async fn check(&self, project_id: ProjectId) -> Result<TickReport, PersistenceError>;
}

pub struct Scheduler {
    check: Arc<dyn ProjectCheck>,
    tasks: Mutex<HashMap<ProjectId, CancellationToken>>,
}

impl Scheduler {
    pub fn new(check: Arc<dyn ProjectCheck>) -> Self {
        Self {
            check,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Starts polling `project`, replacing any timer it already had.
    /// The first tick fires one full interval after this call.
    #[instrument(skip_all, fields(project_id = %project.id, interval_minutes = project.check_interval.minutes()))]
    pub fn install(&self, project: &Project) {
        let token = CancellationToken::new();
        let previous = self.tasks().insert(project.id, token.clone());
        if let Some(previous) = previous {
            previous.cancel();
            info!("replaced existing timer");
        }

        tokio::spawn(run_timer(
            self.check.clone(),
            project.id,
            project.check_interval.period(),
            token,
        ));
        info!("timer installed");
    }

    /// Stops the project's timer. Returns `false` if it had none.
    #[instrument(skip(self))]
    pub fn cancel(&self, project_id: ProjectId) -> bool {
        let token = self.tasks().remove(&project_id);
        match token {
            Some(token) => {
                token.cancel();
                info!("timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Runs one check for the project right away, outside its timer.
    pub async fn tick(&self, project_id: ProjectId) -> Result<TickReport, PersistenceError> {
        self.check.check(project_id).await
    }

    /// Installs a timer for every stored project. Returns how many were installed.
    pub async fn bootstrap(&self, store: &Store) -> Result<usize, PersistenceError> {
        let projects = store.list_projects().await?;
        for project in &projects {
            self.install(project);
        }
        info!(count = projects.len(), "scheduled stored projects");
        Ok(projects.len())
    }

    pub fn is_scheduled(&self, project_id: ProjectId) -> bool {
        self.tasks().contains_key(&project_id)
    }

    pub fn scheduled_count(&self) -> usize {
        self.tasks().len()
    }

    /// Cancels every timer.
    pub fn shutdown(&self) {
        let tokens: Vec<CancellationToken> = self.tasks().drain().map(|(_, t)| t).collect();
        for token in &tokens {
            token.cancel();
        }
        info!(count = tokens.len(), "scheduler shut down");
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<ProjectId, CancellationToken>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[instrument(skip(check, token))]
async fn run_timer(
    check: Arc<dyn ProjectCheck>,
    project_id: ProjectId,
    period: Duration,
    token: CancellationToken,
) {
    let Some(start) = Instant::now().checked_add(period) else {
        error!(?period, "timer period out of range, project will not be polled");
        return;
    };
    let mut interval = time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                info!("timer stopped");
                break;
            }
            _ = interval.tick() => {
                match check.check(project_id).await {
                    Ok(report) => info!(
                        branches = report.branches_checked,
                        changes = report.changes,
                        failures = report.failures,
                        failed_actions = report.failed_actions,
                        "tick completed"
                    ),
                    Err(e) => error!(error = %e, "tick aborted"),
                }
            }
        }
    }
}
