//! Confluence REST client implementing [`WikiApi`].
//!
//! All requests use HTTP basic auth (username + API token) and a bounded timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, info};

use crate::contract::{PagePayload, PageSummary, SearchResults, WikiApi, WikiError};

/// Validated connection settings for one Confluence space.
pub struct WikiCredentials {
    pub base_url: String,
    pub username: String,
    pub api_token: SecretString,
    pub space_key: String,
}

impl std::fmt::Debug for WikiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikiCredentials")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("api_token", &"[REDACTED]")
            .field("space_key", &self.space_key)
            .finish()
    }
}

pub struct ConfluenceClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    api_token: SecretString,
}

impl ConfluenceClient {
    pub fn new(credentials: &WikiCredentials, timeout_secs: u64) -> Result<Self, WikiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| WikiError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            // avoid "//" when joining API paths
            base_url: credentials.base_url.trim_end_matches('/').to_string(),
            username: credentials.username.clone(),
            api_token: SecretString::from(credentials.api_token.expose_secret().to_owned()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth(&self.username, Some(self.api_token.expose_secret()))
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<reqwest::Response, WikiError> {
        let response = self.authed(request).send().await.map_err(|e| {
            error!(error = ?e, url = %url, "Network error connecting to Confluence");
            WikiError::Transport(e.to_string())
        })?;
        let status = response.status();
        debug!(status = %status, url = %url, "Confluence responded");
        if matches!(status, StatusCode::OK | StatusCode::CREATED) {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
        Err(WikiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl WikiApi for ConfluenceClient {
    async fn list_spaces(&self) -> Result<(), WikiError> {
        let url = self.url("/rest/api/space");
        self.execute(self.client.get(&url), &url).await.map(|_| ())
    }

    async fn get_space(&self, space_key: &str) -> Result<(), WikiError> {
        let url = self.url(&format!("/rest/api/space/{space_key}"));
        self.execute(self.client.get(&url), &url).await.map(|_| ())
    }

    async fn find_page(
        &self,
        title: &str,
        space_key: &str,
    ) -> Result<Option<PageSummary>, WikiError> {
        let url = self.url("/rest/api/content");
        info!(url = %url, space_key, title, "Searching for existing Confluence page");
        let request = self.client.get(&url).query(&[
            ("title", title),
            ("spaceKey", space_key),
            ("expand", "version"),
        ]);
        let response = self.execute(request, &url).await?;
        let results: SearchResults = response
            .json()
            .await
            .map_err(|e| WikiError::Decode(e.to_string()))?;
        Ok(results.results.into_iter().next())
    }

    async fn create_page(&self, payload: &PagePayload) -> Result<(), WikiError> {
        let url = self.url("/rest/api/content");
        self.execute(self.client.post(&url).json(payload), &url)
            .await
            .map(|_| ())
    }

    async fn update_page(&self, page_id: &str, payload: &PagePayload) -> Result<(), WikiError> {
        let url = self.url(&format!("/rest/api/content/{page_id}"));
        self.execute(self.client.put(&url).json(payload), &url)
            .await
            .map(|_| ())
    }
}
