//! `load_config` module: builds the run [`Config`] from an optional YAML file, the environment
//! and the CLI flags.
//!
//! # Precedence
//! CLI flags > environment variables > YAML file > built-in defaults.
//!
//! Secrets (API keys, the Confluence token) are accepted from the YAML file for local use,
//! but are normally injected via the environment (`.env` is loaded by `main`).
//!
//! # Environment
//! - `ANTHROPIC_API_KEY`, `OPENAI_API_KEY`
//! - `CONFLUENCE_BASE_URL`, `CONFLUENCE_USERNAME`, `CONFLUENCE_API_TOKEN`, `CONFLUENCE_SPACE_KEY`
//! - `GITHUB_REPOSITORY`
//! - `AUTODOC_ANTHROPIC_MODEL`, `AUTODOC_OPENAI_MODEL`, `AUTODOC_LANGUAGE`
//!
//! Empty values count as unset.
//!
//! # Errors
//! All errors use `anyhow::Error` and surface at the CLI boundary.

use anyhow::{Context, Result};
use autodoc_core::config::{
    Config, FallbackMode, LlmConfig, PreflightMode, PromptConfig, ScanConfig, SecretString,
    WikiConfig,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// YAML schema. Every section and key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub scan: Option<ScanConfig>,
    pub prompt: Option<PromptConfig>,
    pub llm: LlmSection,
    pub wiki: WikiSection,
    pub output: Option<PathBuf>,
    pub repository: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmSection {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_model: Option<String>,
    pub openai_model: Option<String>,
    pub anthropic_base_url: Option<String>,
    pub openai_base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub fallback: Option<FallbackMode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WikiSection {
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub api_token: Option<String>,
    pub space_key: Option<String>,
    pub preflight: Option<PreflightMode>,
    pub timeout_secs: Option<u64>,
    pub fail_on_error: Option<bool>,
}

/// Values taken from the command line; `None` leaves lower layers in charge.
#[derive(Debug, Default)]
pub struct Overrides {
    pub path: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

/// Read and parse a YAML config file.
pub fn read_file_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = fs::read_to_string(path_ref).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
        anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e)
    })?;

    let parsed: FileConfig = serde_yaml::from_str(&content)
        .map_err(|e| {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            e
        })
        .with_context(|| format!("Failed to parse config YAML {:?}", path_ref))?;
    info!(config_path = ?path_ref, "Parsed config YAML successfully");
    Ok(parsed)
}

/// Load the configuration from `config_path` (if any) and the process environment.
pub fn load_config(config_path: Option<&Path>, overrides: Overrides) -> Result<Config> {
    load_config_with_env(config_path, overrides, |key| std::env::var(key).ok())
}

/// Same as [`load_config`], reading environment variables through `env`.
pub fn load_config_with_env<E>(
    config_path: Option<&Path>,
    overrides: Overrides,
    env: E,
) -> Result<Config>
where
    E: Fn(&str) -> Option<String>,
{
    let file = match config_path {
        Some(path) => read_file_config(path)?,
        None => FileConfig::default(),
    };
    let var = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let non_empty = |v: Option<String>| v.filter(|v| !v.trim().is_empty());

    let mut scan = file.scan.unwrap_or_default();
    if let Some(path) = overrides.path {
        scan.root = path;
    }

    let mut prompt = file.prompt.unwrap_or_default();
    if let Some(language) = var("AUTODOC_LANGUAGE") {
        prompt.language = Some(language);
    }

    let llm_defaults = LlmConfig::default();
    let llm = LlmConfig {
        anthropic_api_key: var("ANTHROPIC_API_KEY")
            .or(non_empty(file.llm.anthropic_api_key))
            .map(SecretString::from),
        openai_api_key: var("OPENAI_API_KEY")
            .or(non_empty(file.llm.openai_api_key))
            .map(SecretString::from),
        anthropic_model: var("AUTODOC_ANTHROPIC_MODEL")
            .or(file.llm.anthropic_model)
            .unwrap_or(llm_defaults.anthropic_model),
        openai_model: var("AUTODOC_OPENAI_MODEL")
            .or(file.llm.openai_model)
            .unwrap_or(llm_defaults.openai_model),
        anthropic_base_url: file
            .llm
            .anthropic_base_url
            .unwrap_or(llm_defaults.anthropic_base_url),
        openai_base_url: file
            .llm
            .openai_base_url
            .unwrap_or(llm_defaults.openai_base_url),
        max_tokens: file.llm.max_tokens.unwrap_or(llm_defaults.max_tokens),
        timeout_secs: file.llm.timeout_secs.unwrap_or(llm_defaults.timeout_secs),
        fallback: file.llm.fallback.unwrap_or(llm_defaults.fallback),
    };

    let wiki_defaults = WikiConfig::default();
    let wiki = WikiConfig {
        base_url: var("CONFLUENCE_BASE_URL").or(non_empty(file.wiki.base_url)),
        username: var("CONFLUENCE_USERNAME").or(non_empty(file.wiki.username)),
        api_token: var("CONFLUENCE_API_TOKEN")
            .or(non_empty(file.wiki.api_token))
            .map(SecretString::from),
        space_key: var("CONFLUENCE_SPACE_KEY").or(non_empty(file.wiki.space_key)),
        preflight: file.wiki.preflight.unwrap_or(wiki_defaults.preflight),
        timeout_secs: file.wiki.timeout_secs.unwrap_or(wiki_defaults.timeout_secs),
        fail_on_error: file.wiki.fail_on_error.unwrap_or(wiki_defaults.fail_on_error),
    };

    let output = overrides
        .output
        .or(file.output)
        .unwrap_or_else(|| Config::default().output);

    let config = Config {
        scan,
        prompt,
        llm,
        wiki,
        output,
        repository: var("GITHUB_REPOSITORY").or(non_empty(file.repository)),
    };
    config.trace_loaded();
    Ok(config)
}

