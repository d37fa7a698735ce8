//! # contract: the two external boundaries of the pipeline
//!
//! The pipeline talks to exactly two remote services:
//! - an LLM completion provider, behind [`CompletionBackend`]
//! - the Confluence REST API, behind [`WikiApi`]
//!
//! Both traits are annotated for `mockall` so the orchestration and publish logic can be
//! tested without a network. Real implementations live in [`crate::backend`] and
//! [`crate::confluence`].
//!
//! The request and response bodies of the wiki API are plain serde types and are defined
//! here so that mocks and the real client agree on them.

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde::{Deserialize, Serialize};

/// Errors a completion backend can report. The analysis step turns all of them into fallback output.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("no LLM API key configured")]
    Unconfigured,
    #[error("invalid {backend} base URL '{url}': {reason}")]
    InvalidBaseUrl {
        backend: &'static str,
        url: String,
        reason: String,
    },
    #[error("request to {backend} failed: {message}")]
    Transport {
        backend: &'static str,
        message: String,
    },
    #[error("{backend} API error ({status}): {body}")]
    Api {
        backend: &'static str,
        status: u16,
        body: String,
    },
    #[error("{backend} returned no completion text")]
    EmptyCompletion { backend: &'static str },
}

/// Submit a prompt as a single user turn and receive the generated text.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Short provider name, for logs and reports.
    fn name(&self) -> &'static str;

    async fn complete(&self, prompt: &str) -> Result<String, BackendError>;
}

/// Errors from a single wiki API call.
#[derive(Debug, thiserror::Error)]
pub enum WikiError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("network error: {0}")]
    Transport(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl WikiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            WikiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// An existing page, as returned by a content search with `expand=version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub version: VersionRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRef {
    pub number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub results: Vec<PageSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceRef {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageValue {
    pub value: String,
    pub representation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageBody {
    pub storage: StorageValue,
}

/// Body of both the create (POST) and update (PUT) content requests.
///
/// `id` and `version` are only sent on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub space: SpaceRef,
    pub body: PageBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionRef>,
}

impl PagePayload {
    pub fn create(title: &str, space_key: &str, storage: String) -> Self {
        Self {
            id: None,
            kind: "page".to_string(),
            title: title.to_string(),
            space: SpaceRef {
                key: space_key.to_string(),
            },
            body: PageBody {
                storage: StorageValue {
                    value: storage,
                    representation: "storage".to_string(),
                },
            },
            version: None,
        }
    }

    /// Update payload replacing `existing`: same id, version bumped by one.
    pub fn update(existing: &PageSummary, title: &str, space_key: &str, storage: String) -> Self {
        Self {
            id: Some(existing.id.clone()),
            version: Some(VersionRef {
                number: existing.version.number + 1,
            }),
            ..Self::create(title, space_key, storage)
        }
    }
}

/// The subset of the Confluence REST API the publisher needs.
///
/// Every method returns `Ok` only for a 200 or 201 response.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait WikiApi: Send + Sync {
    /// `GET /rest/api/space`: basic reachability and authentication.
    async fn list_spaces(&self) -> Result<(), WikiError>;

    /// `GET /rest/api/space/{key}`.
    async fn get_space(&self, space_key: &str) -> Result<(), WikiError>;

    /// `GET /rest/api/content?title=..&spaceKey=..&expand=version`; first match, if any.
    async fn find_page(
        &self,
        title: &str,
        space_key: &str,
    ) -> Result<Option<PageSummary>, WikiError>;

    /// `POST /rest/api/content`.
    async fn create_page(&self, payload: &PagePayload) -> Result<(), WikiError>;

    /// `PUT /rest/api/content/{id}`.
    async fn update_page(&self, page_id: &str, payload: &PagePayload) -> Result<(), WikiError>;
}
