//! LLM completion backends.
//!
//! [`Backend`] is selected once from [`LlmConfig`]: Anthropic when its key is present,
//! otherwise OpenAI, otherwise [`Backend::Unconfigured`]. Each request is a single attempt
//! with a bounded timeout.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::LlmConfig;
use crate::contract::{BackendError, CompletionBackend};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [ChatMessage<'a>; 1],
}

impl<'a> CompletionRequest<'a> {
    fn user_turn(model: &'a str, max_tokens: u32, prompt: &'a str) -> Self {
        Self {
            model,
            max_tokens,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

fn http_client(timeout_secs: u64, backend: &'static str) -> Result<reqwest::Client, BackendError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| BackendError::Transport {
            backend,
            message: format!("failed to build HTTP client: {e}"),
        })
}

fn endpoint_base(base_url: &str, backend: &'static str) -> Result<String, BackendError> {
    let trimmed = base_url.trim_end_matches('/');
    reqwest::Url::parse(trimmed).map_err(|e| BackendError::InvalidBaseUrl {
        backend,
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;
    Ok(trimmed.to_string())
}

async fn send_json<T: serde::de::DeserializeOwned>(
    backend: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T, BackendError> {
    let response = request.send().await.map_err(|e| BackendError::Transport {
        backend,
        message: e.to_string(),
    })?;
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
        return Err(BackendError::Api {
            backend,
            status: status.as_u16(),
            body,
        });
    }
    response.json::<T>().await.map_err(|e| BackendError::Transport {
        backend,
        message: format!("failed to parse response: {e}"),
    })
}

/// Anthropic Messages API.
pub struct AnthropicBackend {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl std::fmt::Debug for AnthropicBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicBackend")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl AnthropicBackend {
    pub fn new(
        api_key: SecretString,
        base_url: &str,
        model: &str,
        max_tokens: u32,
        timeout_secs: u64,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            base_url: endpoint_base(base_url, "anthropic")?,
            client: http_client(timeout_secs, "anthropic")?,
            api_key,
            model: model.to_string(),
            max_tokens,
        })
    }
}

#[async_trait]
impl CompletionBackend for AnthropicBackend {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        info!(model = %self.model, "Using Anthropic Claude for analysis");
        let url = format!("{}/v1/messages", self.base_url);
        let request = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&CompletionRequest::user_turn(&self.model, self.max_tokens, prompt));

        let response: AnthropicResponse = send_json(self.name(), request).await?;
        let text: String = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();
        if text.is_empty() {
            return Err(BackendError::EmptyCompletion {
                backend: self.name(),
            });
        }
        debug!(chars = text.len(), "Received completion from Anthropic");
        Ok(text)
    }
}

/// OpenAI Chat Completions API.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl OpenAiBackend {
    pub fn new(
        api_key: SecretString,
        base_url: &str,
        model: &str,
        max_tokens: u32,
        timeout_secs: u64,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            base_url: endpoint_base(base_url, "openai")?,
            client: http_client(timeout_secs, "openai")?,
            api_key,
            model: model.to_string(),
            max_tokens,
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        info!(model = %self.model, "Using OpenAI GPT for analysis");
        let url = format!("{}/chat/completions", self.base_url);
        let request = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&CompletionRequest::user_turn(&self.model, self.max_tokens, prompt));

        let response: OpenAiResponse = send_json(self.name(), request).await?;
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.is_empty())
            .ok_or(BackendError::EmptyCompletion {
                backend: self.name(),
            })?;
        debug!(chars = text.len(), "Received completion from OpenAI");
        Ok(text)
    }
}

/// The one active backend of a run.
#[derive(Debug)]
pub enum Backend {
    Anthropic(AnthropicBackend),
    OpenAi(OpenAiBackend),
    Unconfigured,
}

impl Backend {
    /// Pick the backend from whichever key is configured; Anthropic wins when both are.
    ///
    /// A backend that cannot be built (bad base URL, client init failure) is logged and
    /// treated as absent.
    pub fn select(config: &LlmConfig) -> Self {
        if let Some(key) = &config.anthropic_api_key {
            match AnthropicBackend::new(
                SecretString::from(key.expose_secret().to_owned()),
                &config.anthropic_base_url,
                &config.anthropic_model,
                config.max_tokens,
                config.timeout_secs,
            ) {
                Ok(backend) => return Backend::Anthropic(backend),
                Err(e) => warn!(error = %e, "Failed to initialize Anthropic client"),
            }
        }
        if let Some(key) = &config.openai_api_key {
            match OpenAiBackend::new(
                SecretString::from(key.expose_secret().to_owned()),
                &config.openai_base_url,
                &config.openai_model,
                config.max_tokens,
                config.timeout_secs,
            ) {
                Ok(backend) => return Backend::OpenAi(backend),
                Err(e) => warn!(error = %e, "Failed to initialize OpenAI client"),
            }
        }
        if config.anthropic_api_key.is_none() && config.openai_api_key.is_none() {
            warn!("No LLM API key configured. Documentation generation will be limited.");
        } else {
            warn!("LLM API key configured but no backend could be initialized. Documentation generation will be limited.");
        }
        Backend::Unconfigured
    }
}

#[async_trait]
impl CompletionBackend for Backend {
    fn name(&self) -> &'static str {
        match self {
            Backend::Anthropic(b) => b.name(),
            Backend::OpenAi(b) => b.name(),
            Backend::Unconfigured => "none",
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        match self {
            Backend::Anthropic(b) => b.complete(prompt).await,
            Backend::OpenAi(b) => b.complete(prompt).await,
            Backend::Unconfigured => Err(BackendError::Unconfigured),
        }
    }
}
