//! Idempotent create-or-update of a documentation page.
//!
//! # Protocol
//! 1. Optional pre-flight: list spaces (reachability), fetch the target space (existence)
//! 2. Search the space for a page with the exact title, expanding its version
//! 3. Found: update it, sending `version = current + 1`
//! 4. Not found: create it
//!
//! The update relies on Confluence's optimistic concurrency. If someone else edits the page
//! between the search and the update, the update is rejected and reported as a failure;
//! there is no retry.
//!
//! Every error is logged with an actionable hint and returned as a [`PublishError`].

use secrecy::ExposeSecret;
use tracing::{error, info, warn};

use crate::config::{PreflightMode, WikiConfig};
use crate::confluence::{ConfluenceClient, WikiCredentials};
use crate::contract::{PagePayload, WikiApi, WikiError};
use crate::convert::markdown_to_storage;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Confluence configuration missing: {}", .0.join(", "))]
    MissingConfig(Vec<&'static str>),
    #[error("cannot connect to Confluence API: {0}")]
    Unreachable(WikiError),
    #[error("space '{0}' does not exist or is not accessible")]
    SpaceNotFound(String),
    #[error("failed to search Confluence: {0}")]
    Search(WikiError),
    #[error("failed to create page '{title}': {source}")]
    Create { title: String, source: WikiError },
    #[error("failed to update page '{title}' to version {version}: {source}")]
    Update {
        title: String,
        version: u64,
        source: WikiError,
    },
}

/// What the publisher did to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Created { title: String },
    Updated { title: String, page_id: String, version: u64 },
}

impl WikiConfig {
    /// All four connection values, or the names of every missing one.
    pub fn credentials(&self) -> Result<WikiCredentials, PublishError> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty())
        }
        let token = self
            .api_token
            .as_ref()
            .map(|t| t.expose_secret().trim())
            .filter(|t| !t.is_empty());

        let base_url = present(&self.base_url);
        let username = present(&self.username);
        let space_key = present(&self.space_key);

        match (base_url, username, token, space_key) {
            (Some(base_url), Some(username), Some(token), Some(space_key)) => Ok(WikiCredentials {
                base_url: base_url.to_string(),
                username: username.to_string(),
                api_token: secrecy::SecretString::from(token.to_owned()),
                space_key: space_key.to_string(),
            }),
            _ => {
                let mut missing = Vec::new();
                if base_url.is_none() {
                    missing.push("CONFLUENCE_BASE_URL");
                }
                if username.is_none() {
                    missing.push("CONFLUENCE_USERNAME");
                }
                if token.is_none() {
                    missing.push("CONFLUENCE_API_TOKEN");
                }
                if space_key.is_none() {
                    missing.push("CONFLUENCE_SPACE_KEY");
                }
                Err(PublishError::MissingConfig(missing))
            }
        }
    }
}

pub struct Publisher<A> {
    api: A,
    space_key: String,
    preflight: PreflightMode,
}

impl Publisher<ConfluenceClient> {
    /// Validate the configuration and build a Confluence-backed publisher.
    ///
    /// Fails before any HTTP client exists when a connection value is missing.
    pub fn from_config(config: &WikiConfig) -> Result<Self, PublishError> {
        let credentials = match config.credentials() {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!(error = %e, "Confluence configuration missing, cannot publish");
                return Err(e);
            }
        };
        let client = ConfluenceClient::new(&credentials, config.timeout_secs)
            .map_err(PublishError::Unreachable)?;
        info!(
            base_url = %client.base_url(),
            space_key = %credentials.space_key,
            "Initialized Confluence publisher"
        );
        Ok(Self::new(client, credentials.space_key, config.preflight))
    }
}

impl<A: WikiApi> Publisher<A> {
    pub fn new(api: A, space_key: impl Into<String>, preflight: PreflightMode) -> Self {
        Self {
            api,
            space_key: space_key.into(),
            preflight,
        }
    }

    /// Convert `markdown` to storage format and create or update the page titled `title`.
    pub async fn publish(&self, title: &str, markdown: &str) -> Result<PublishOutcome, PublishError> {
        info!(title, space_key = %self.space_key, "[PUBLISH] Publishing to Confluence");
        self.preflight().await?;

        let storage = markdown_to_storage(markdown);

        let existing = self
            .api
            .find_page(title, &self.space_key)
            .await
            .map_err(|e| {
                error!(error = %e, "[PUBLISH][ERROR] Failed to search Confluence");
                log_hint(&e);
                PublishError::Search(e)
            })?;

        match existing {
            Some(page) => {
                let payload = PagePayload::update(&page, title, &self.space_key, storage);
                let version = page.version.number + 1;
                info!(page_id = %page.id, current_version = page.version.number, "[PUBLISH] Updating existing page");
                self.api
                    .update_page(&page.id, &payload)
                    .await
                    .map_err(|e| {
                        error!(error = %e, page_id = %page.id, version, "[PUBLISH][ERROR] Failed to update page");
                        log_hint(&e);
                        PublishError::Update {
                            title: title.to_string(),
                            version,
                            source: e,
                        }
                    })?;
                info!(title, page_id = %page.id, version, "[PUBLISH] Successfully updated page");
                Ok(PublishOutcome::Updated {
                    title: title.to_string(),
                    page_id: page.id,
                    version,
                })
            }
            None => {
                let payload = PagePayload::create(title, &self.space_key, storage);
                info!(title, "[PUBLISH] Creating new page");
                self.api.create_page(&payload).await.map_err(|e| {
                    error!(error = %e, "[PUBLISH][ERROR] Failed to create page");
                    log_hint(&e);
                    PublishError::Create {
                        title: title.to_string(),
                        source: e,
                    }
                })?;
                info!(title, "[PUBLISH] Successfully created page");
                Ok(PublishOutcome::Created {
                    title: title.to_string(),
                })
            }
        }
    }

    async fn preflight(&self) -> Result<(), PublishError> {
        if self.preflight == PreflightMode::Off {
            return Ok(());
        }
        let strict = self.preflight == PreflightMode::Strict;

        info!("[PUBLISH] Testing basic Confluence connectivity");
        match self.api.list_spaces().await {
            Ok(()) => info!("[PUBLISH] Basic Confluence API connectivity successful"),
            Err(e) => {
                error!(error = %e, "[PUBLISH] Cannot connect to Confluence API");
                log_hint(&e);
                if strict {
                    return Err(PublishError::Unreachable(e));
                }
            }
        }

        info!(space_key = %self.space_key, "[PUBLISH] Testing if space exists");
        match self.api.get_space(&self.space_key).await {
            Ok(()) => info!("[PUBLISH] Space exists and is accessible"),
            Err(e) if e.status() == Some(404) => {
                error!(space_key = %self.space_key, "[PUBLISH] Space does not exist or is not accessible. Check your space key configuration");
                if strict {
                    return Err(PublishError::SpaceNotFound(self.space_key.clone()));
                }
            }
            Err(e) => warn!(error = %e, "[PUBLISH] Space test did not succeed"),
        }
        Ok(())
    }
}

fn log_hint(error: &WikiError) {
    match error.status() {
        Some(401) => error!("401: authentication failed. Check your username and API token"),
        Some(403) => error!("403: permission denied. Check that you have access to the space"),
        Some(404) => error!(
            "404: the base URL is incorrect, the space key does not exist, the REST API path is \
             wrong, or this Confluence does not support the API version. The base URL should look \
             like https://yourcompany.atlassian.net/wiki or https://confluence.yourcompany.com"
        ),
        Some(409) => error!("409: version conflict. The page was changed concurrently; run again"),
        _ => {}
    }
}
