//! High-level pipeline: scan → analyze → save → publish.
//!
//! This module sequences one documentation run for an already loaded [`Config`]:
//!   - Scans the source tree (empty result is a failure, before any network call)
//!   - Builds the prompt and asks the backend for documentation, with local fallback
//!   - Saves the Markdown to the output path
//!   - Publishes to Confluence when a base URL is configured
//!
//! # Error Handling
//! A `Failed` analysis stops the run before anything is written. A failed publish is
//! logged and reported; it only fails the run when `wiki.fail_on_error` is set.
//!
//! # Navigation
//! - Main entrypoint: [`generate`]
//! - Supporting types: [`GenerateReport`], [`PublishStatus`], [`GenerateError`]

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::analysis::{analyze, Provenance};
use crate::config::{Config, WikiConfig};
use crate::contract::{CompletionBackend, WikiApi};
use crate::publish::{PublishError, PublishOutcome, Publisher};
use crate::scan::{scan, ScanError};

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("no files found to analyze under {0}")]
    NoFiles(PathBuf),
    #[error("failed to generate documentation: {0}")]
    Analysis(String),
    #[error("failed to save documentation to {path}: {source}")]
    Save {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to publish documentation: {0}")]
    Publish(#[from] PublishError),
}

#[derive(Debug)]
pub enum PublishStatus {
    /// No wiki base URL configured.
    Skipped,
    Published(PublishOutcome),
    Failed(String),
}

#[derive(Debug)]
pub struct GenerateReport {
    pub files_scanned: usize,
    pub files_in_context: usize,
    pub files_omitted: usize,
    pub provenance: Provenance,
    pub output: PathBuf,
    pub publish: PublishStatus,
}

/// Title of the wiki page for a repository identifier such as `owner/name`.
pub fn page_title(repository: Option<&str>) -> String {
    let name = repository
        .and_then(|r| r.rsplit('/').next())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("Unknown Repository");
    format!("Documentation - {name}")
}

/// Write the documentation to `path`, creating parent directories as needed.
pub async fn save_documentation(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await
}

/// Run the whole pipeline.
///
/// `connect` builds the publisher and is called only when `config.wiki.base_url` is set,
/// so the caller decides which [`WikiApi`] is used.
pub async fn generate<B, A, F>(
    config: &Config,
    backend: &B,
    connect: F,
) -> Result<GenerateReport, GenerateError>
where
    B: CompletionBackend + ?Sized,
    A: WikiApi,
    F: FnOnce(&WikiConfig) -> Result<Publisher<A>, PublishError>,
{
    info!("[GEN] Starting documentation generation");

    let files = scan(&config.scan)?;
    if files.is_empty() {
        warn!(root = %config.scan.root.display(), "[GEN] No files found to analyze");
        return Err(GenerateError::NoFiles(config.scan.root.clone()));
    }

    let documentation = analyze(backend, &files, &config.prompt, config.llm.fallback).await;
    if let Provenance::Failed { reason } = &documentation.provenance {
        error!(reason = %reason, "[GEN][ERROR] Failed to generate documentation");
        return Err(GenerateError::Analysis(reason.clone()));
    }

    if let Err(source) = save_documentation(&config.output, &documentation.text).await {
        error!(error = ?source, path = %config.output.display(), "[GEN][ERROR] Error saving documentation locally");
        return Err(GenerateError::Save {
            path: config.output.clone(),
            source,
        });
    }
    info!(path = %config.output.display(), "[GEN] Documentation saved locally");

    let publish = if config.wiki.base_url.is_none() {
        info!("[GEN] Confluence not configured, skipping publication");
        PublishStatus::Skipped
    } else {
        let title = page_title(config.repository.as_deref());
        let result = match connect(&config.wiki) {
            Ok(publisher) => publisher.publish(&title, &documentation.text).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(outcome) => {
                info!(?outcome, "[GEN] Documentation successfully published to Confluence");
                PublishStatus::Published(outcome)
            }
            Err(e) if config.wiki.fail_on_error => {
                error!(error = %e, "[GEN][ERROR] Failed to publish to Confluence");
                return Err(GenerateError::Publish(e));
            }
            Err(e) => {
                warn!(error = %e, "[GEN] Failed to publish to Confluence");
                PublishStatus::Failed(e.to_string())
            }
        }
    };

    info!("[GEN] Documentation generation completed successfully");
    Ok(GenerateReport {
        files_scanned: files.len(),
        files_in_context: documentation.files_in_context,
        files_omitted: documentation.files_omitted,
        provenance: documentation.provenance,
        output: config.output.clone(),
        publish,
    })
}
