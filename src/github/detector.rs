use super::CommitProvider;
use crate::domain::{CommitInfo, RepositoryURL};
use crate::error::ProviderError;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Outcome of comparing a branch head with the last commit seen for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchCheck {
    Unchanged { head: String },
    Changed(CommitInfo),
}

#[derive(Clone)]
pub struct ChangeDetector {
    provider: Arc<dyn CommitProvider>,
}

impl ChangeDetector {
    pub fn new(provider: Arc<dyn CommitProvider>) -> Self {
        Self { provider }
    }

    /// A branch with no known commit always counts as changed: its first
    /// successful check establishes the baseline.
    #[instrument(skip(self, repo), fields(repo = %repo.url()))]
    pub async fn check_branch(
        &self,
        repo: &RepositoryURL,
        branch: &str,
        known_commit: Option<&str>,
    ) -> Result<BranchCheck, ProviderError> {
        let head = self
            .provider
            .head_commit(repo.owner(), repo.name(), branch)
            .await?;

        if known_commit == Some(head.sha.as_str()) {
            debug!(sha = %head.sha, "head unchanged");
            return Ok(BranchCheck::Unchanged { head: head.sha });
        }

        info!(previous = ?known_commit, sha = %head.sha, "new head commit");
        Ok(BranchCheck::Changed(head))
    }
}
