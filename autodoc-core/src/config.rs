pub use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, info};

/// Everything a documentation run needs, built once by the caller and passed by reference.
#[derive(Debug)]
pub struct Config {
    pub scan: ScanConfig,
    pub prompt: PromptConfig,
    pub llm: LlmConfig,
    pub wiki: WikiConfig,
    /// Where the generated Markdown is written.
    pub output: PathBuf,
    /// Repository identifier, e.g. `owner/name`. Only the last segment is used for the page title.
    pub repository: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            prompt: PromptConfig::default(),
            llm: LlmConfig::default(),
            wiki: WikiConfig::default(),
            output: PathBuf::from(DEFAULT_OUTPUT_FILE),
            repository: None,
        }
    }
}

pub const DEFAULT_OUTPUT_FILE: &str = "generated_docs.md";

impl Config {
    pub fn trace_loaded(&self) {
        info!(
            root = %self.scan.root.display(),
            output = %self.output.display(),
            extensions = self.scan.extensions.len(),
            excluded_dirs = self.scan.excluded_dirs.len(),
            backend = self.llm.backend_name(),
            wiki_configured = self.wiki.base_url.is_some(),
            preflight = ?self.wiki.preflight,
            "Loaded Config"
        );
        debug!(?self, "Config loaded (full debug)");
    }
}

/// Which files the scanner picks up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub root: PathBuf,
    /// Recognised extensions, without the leading dot.
    pub extensions: BTreeSet<String>,
    /// Directory names that are never descended into.
    pub excluded_dirs: BTreeSet<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            extensions: ["py", "js", "ts", "go", "java", "tf", "yaml", "yml", "md", "json"]
                .into_iter()
                .map(String::from)
                .collect(),
            excluded_dirs: [
                ".git",
                "node_modules",
                "__pycache__",
                ".pytest_cache",
                "venv",
                ".venv",
                "env",
                ".env",
                "dist",
                "build",
                ".terraform",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Bounds for the codebase context embedded in the prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PromptConfig {
    /// Upper bound, in bytes, of the serialized codebase context.
    pub max_context_bytes: usize,
    /// Files of this size or larger are left out entirely.
    pub max_file_bytes: usize,
    /// Language the prose should be written in; English when unset.
    pub language: Option<String>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            max_context_bytes: 40_000,
            max_file_bytes: 15_000,
            language: None,
        }
    }
}

/// What the analysis step returns when no backend produced text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    /// Synthesize a summary of the scanned files locally.
    #[default]
    Summary,
    /// Report an `Error:` string and fail the run.
    Error,
}

#[derive(Debug)]
pub struct LlmConfig {
    pub anthropic_api_key: Option<SecretString>,
    pub openai_api_key: Option<SecretString>,
    pub anthropic_model: String,
    pub openai_model: String,
    pub anthropic_base_url: String,
    pub openai_base_url: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub fallback: FallbackMode,
}

pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            openai_api_key: None,
            anthropic_model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            anthropic_base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            max_tokens: 4000,
            timeout_secs: 120,
            fallback: FallbackMode::Summary,
        }
    }
}

impl LlmConfig {
    /// Name of the backend that will be selected, for logging.
    pub fn backend_name(&self) -> &'static str {
        if self.anthropic_api_key.is_some() {
            "anthropic"
        } else if self.openai_api_key.is_some() {
            "openai"
        } else {
            "none"
        }
    }
}

/// How much the publisher trusts its pre-flight checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreflightMode {
    /// Abort when the API is unreachable or the space does not exist.
    #[default]
    Strict,
    /// Run the checks and log the outcome, but always continue.
    Diagnostic,
    /// Skip the checks.
    Off,
}

#[derive(Debug)]
pub struct WikiConfig {
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub api_token: Option<SecretString>,
    pub space_key: Option<String>,
    pub preflight: PreflightMode,
    pub timeout_secs: u64,
    /// Turn a failed publish into a failed run.
    pub fail_on_error: bool,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            username: None,
            api_token: None,
            space_key: None,
            preflight: PreflightMode::Strict,
            timeout_secs: 30,
            fail_on_error: false,
        }
    }
}
