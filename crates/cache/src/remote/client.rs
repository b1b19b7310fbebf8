//! Client side of the remote protocol

use crate::errors::{CacheError, Result};
use crate::hashing::ActionId;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Talks to a cache served by [`super::serve`]
#[derive(Debug, Clone)]
pub struct RemoteClient {
    base_url: String,
    http: Client,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CacheError::remote(&base_url, e.to_string()))?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, action: &ActionId) -> String {
        format!("{}/{}", self.base_url, action.to_base64url())
    }

    /// Fetch the output of `action`; `None` on a remote miss
    pub async fn get(&self, action: &ActionId) -> Result<Option<Bytes>> {
        let url = self.url(action);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| CacheError::remote(&url, e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| CacheError::remote(&url, e.to_string()))?;
                debug!(action = %action, bytes = body.len(), "remote cache hit");
                Ok(Some(body))
            }
            StatusCode::NOT_FOUND => {
                debug!(action = %action, "remote cache miss");
                Ok(None)
            }
            status => Err(unexpected(&url, status, response).await),
        }
    }

    /// Upload `body` as the output of `action`
    pub async fn put(&self, action: &ActionId, body: impl Into<Bytes>) -> Result<()> {
        let url = self.url(action);
        let response = self
            .http
            .post(&url)
            .body(body.into())
            .send()
            .await
            .map_err(|e| CacheError::remote(&url, e.to_string()))?;

        match response.status() {
            StatusCode::CREATED => {
                debug!(action = %action, "uploaded to remote cache");
                Ok(())
            }
            StatusCode::PRECONDITION_FAILED => Err(CacheError::malformed(
                action.to_base64url(),
                "remote cache rejected an empty body",
            )),
            status => Err(unexpected(&url, status, response).await),
        }
    }
}

async fn unexpected(url: &str, status: StatusCode, response: reqwest::Response) -> CacheError {
    let text = response.text().await.unwrap_or_default();
    CacheError::remote(url, format!("unexpected status {status}: {}", text.trim()))
}
