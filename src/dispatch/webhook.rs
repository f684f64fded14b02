use crate::domain::CommitInfo;
use crate::error::DispatchError;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument};

/// Body of every webhook POST.
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    pub project: &'a str,
    pub branch: &'a str,
    pub commit: &'a CommitInfo,
}

#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
}

impl WebhookClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// One attempt, no retries. Anything outside 2xx is a failure.
    #[instrument(skip(self, payload))]
    pub async fn deliver(
        &self,
        url: &str,
        payload: &WebhookPayload<'_>,
    ) -> Result<StatusCode, DispatchError> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(DispatchError::WebhookRequest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::WebhookStatus(status));
        }
        info!(%status, "webhook delivered");
        Ok(status)
    }
}
