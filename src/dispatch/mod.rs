//! Fan-out of a detected change to a project's actions.

mod script;
mod webhook;

pub use script::{ScriptOutput, ScriptRunner};
pub use webhook::{WebhookClient, WebhookPayload};

use crate::configuration::DispatchSettings;
use crate::domain::{Action, ActionId, ActionKind, CommitInfo, Project};
use crate::error::DispatchError;
use crate::store::Store;
use tracing::{error, info, instrument};

/// What happened to one action during a dispatch.
#[derive(Debug)]
pub struct ActionOutcome {
    pub action_id: ActionId,
    pub result: Result<(), DispatchError>,
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    store: Store,
    webhooks: WebhookClient,
    scripts: ScriptRunner,
}

impl Dispatcher {
    pub fn new(store: Store, settings: &DispatchSettings) -> Result<Self, reqwest::Error> {
        Ok(Self {
            store,
            webhooks: WebhookClient::new(settings.webhook_timeout())?,
            scripts: ScriptRunner::new(settings),
        })
    }

    /// Runs every action in order. A failing action is logged and recorded in
    /// its outcome; the ones after it still run.
    #[instrument(skip_all, fields(project = %project.name, branch = branch, sha = %commit.sha))]
    pub async fn dispatch(
        &self,
        project: &Project,
        branch: &str,
        commit: &CommitInfo,
        actions: &[Action],
    ) -> Vec<ActionOutcome> {
        let mut outcomes = Vec::with_capacity(actions.len());
        for action in actions {
            let result = self.run_action(project, branch, commit, action).await;
            match &result {
                Ok(()) => info!(action = %action.label(), kind = action.kind.type_name(), "action succeeded"),
                Err(e) => error!(action = %action.label(), kind = action.kind.type_name(), error = %e, "action failed"),
            }
            outcomes.push(ActionOutcome {
                action_id: action.id,
                result,
            });
        }
        outcomes
    }

    async fn run_action(
        &self,
        project: &Project,
        branch: &str,
        commit: &CommitInfo,
        action: &Action,
    ) -> Result<(), DispatchError> {
        match &action.kind {
            ActionKind::Webhook { url } => {
                let payload = WebhookPayload {
                    project: &project.name,
                    branch,
                    commit,
                };
                self.webhooks.deliver(url, &payload).await?;
            }
            ActionKind::Script { content } => {
                let secrets = self.store.secrets_for_action(action.id).await?;
                self.scripts.run(action.id, content, &secrets).await?;
            }
        }
        Ok(())
    }
}
