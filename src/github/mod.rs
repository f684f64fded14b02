//! Head-commit lookups against GitHub and the comparison with what was last seen.

mod client;
mod detector;

pub use client::GitHubClient;
pub use detector::{BranchCheck, ChangeDetector};

use crate::domain::CommitInfo;
use crate::error::ProviderError;
use async_trait::async_trait;

/// Source of branch heads. Implemented by [`GitHubClient`]; mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommitProvider: Send + Sync {
    async fn head_commit(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<CommitInfo, ProviderError>;
}
