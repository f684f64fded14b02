use super::CommitProvider;
use crate::configuration::GitHubSettings;
use crate::domain::CommitInfo;
use crate::error::ProviderError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, HeaderMap};
use reqwest::{Client, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument};

const GITHUB_JSON: &str = "application/vnd.github+json";

#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    api_base_url: String,
    token: Option<SecretString>,
}

impl GitHubClient {
    pub fn new(settings: &GitHubSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.timeout())
            .build()?;

        Ok(Self {
            client,
            api_base_url: settings.api_base_url.clone(),
            token: settings.token.clone(),
        })
    }

    /// `{api_base_url}/repos/{owner}/{repo}/branches/{branch}`, each segment percent-encoded.
    fn branch_url(&self, owner: &str, repo: &str, branch: &str) -> Result<Url, ProviderError> {
        let malformed = || ProviderError::MalformedUrl(self.api_base_url.clone());
        let mut url = Url::parse(&self.api_base_url).map_err(|_| malformed())?;
        url.path_segments_mut()
            .map_err(|_| malformed())?
            .pop_if_empty()
            .extend(["repos", owner, repo, "branches", branch]);
        Ok(url)
    }
}

#[async_trait]
impl CommitProvider for GitHubClient {
    #[instrument(skip(self))]
    async fn head_commit(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<CommitInfo, ProviderError> {
        let url = self.branch_url(owner, repo, branch)?;

        let mut request = self.client.get(url).header(ACCEPT, GITHUB_JSON);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }
        let response = request.send().await.map_err(ProviderError::Unreachable)?;

        let status = response.status();
        debug!(%status, "branch lookup answered");
        if !status.is_success() {
            return Err(status_error(status, response.headers(), owner, repo, branch));
        }

        let body: BranchResponse = response.json().await.map_err(ProviderError::Decode)?;
        Ok(body.into())
    }
}

fn status_error(
    status: StatusCode,
    headers: &HeaderMap,
    owner: &str,
    repo: &str,
    branch: &str,
) -> ProviderError {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    let exhausted = header("x-ratelimit-remaining").as_deref() == Some("0");

    match status {
        StatusCode::NOT_FOUND => ProviderError::BranchNotFound {
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: branch.to_string(),
        },
        StatusCode::UNAUTHORIZED => ProviderError::Unauthorized(status),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
            reset: header("x-ratelimit-reset").and_then(|v| v.parse().ok()),
        },
        StatusCode::FORBIDDEN if exhausted => ProviderError::RateLimited {
            reset: header("x-ratelimit-reset").and_then(|v| v.parse().ok()),
        },
        StatusCode::FORBIDDEN => ProviderError::Unauthorized(status),
        other => ProviderError::UnexpectedStatus(other),
    }
}

#[derive(Debug, Deserialize)]
struct BranchResponse {
    commit: BranchCommit,
}

#[derive(Debug, Deserialize)]
struct BranchCommit {
    sha: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
    author: CommitAuthor,
}

#[derive(Debug, Deserialize)]
struct CommitAuthor {
    name: String,
    date: DateTime<Utc>,
}

impl From<BranchResponse> for CommitInfo {
    fn from(response: BranchResponse) -> Self {
        let BranchCommit { sha, commit } = response.commit;
        Self {
            sha,
            message: commit.message,
            author: commit.author.name,
            date: commit.author.date,
        }
    }
}
