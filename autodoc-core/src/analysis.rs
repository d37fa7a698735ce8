//! Turns a scanned codebase into Markdown documentation.
//!
//! The configured [`CompletionBackend`] gets one attempt. Whatever goes wrong there is
//! logged and replaced by fallback output according to [`FallbackMode`]; nothing
//! propagates past [`analyze`].

use std::collections::BTreeMap;

use tracing::{error, info, warn};

use crate::config::{FallbackMode, PromptConfig};
use crate::contract::CompletionBackend;
use crate::prompt::build_prompt;
use crate::scan::FileCollection;

/// Where a piece of documentation came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// Written by the named backend.
    Generated { backend: &'static str },
    /// Synthesized locally because the backend could not be used.
    Fallback { reason: String },
    /// No usable documentation; `text` holds the error message.
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct Documentation {
    pub text: String,
    pub provenance: Provenance,
    /// How many scanned files made it into the prompt context.
    pub files_in_context: usize,
    pub files_omitted: usize,
}

impl Documentation {
    pub fn is_failed(&self) -> bool {
        matches!(self.provenance, Provenance::Failed { .. })
    }
}

/// Build the prompt for `files`, send it to `backend` and return the result, or fallback output.
pub async fn analyze<B>(
    backend: &B,
    files: &FileCollection,
    prompt_config: &PromptConfig,
    fallback: FallbackMode,
) -> Documentation
where
    B: CompletionBackend + ?Sized,
{
    info!(backend = backend.name(), "Analyzing code with LLM");
    let prompt = build_prompt(files, prompt_config);

    let (text, provenance) = match backend.complete(&prompt.text).await {
        Ok(text) => (
            text,
            Provenance::Generated {
                backend: backend.name(),
            },
        ),
        Err(e) => {
            let reason = e.to_string();
            match fallback {
                FallbackMode::Summary => {
                    warn!(error = %e, "LLM analysis unavailable, falling back to basic documentation");
                    (basic_documentation(files), Provenance::Fallback { reason })
                }
                FallbackMode::Error => {
                    error!(error = %e, "Error generating documentation");
                    (format!("Error: {reason}"), Provenance::Failed { reason })
                }
            }
        }
    };

    Documentation {
        text,
        provenance,
        files_in_context: prompt.included.len(),
        files_omitted: prompt.omitted.len(),
    }
}

const CONFIG_MARKERS: [&str; 5] = ["config", "settings", ".env", "makefile", "requirements"];

/// Summary of the codebase that needs no LLM: file counts, files per extension,
/// configuration files, scripts and generic setup steps.
pub fn basic_documentation(files: &FileCollection) -> String {
    let mut doc = String::from("# Project Documentation\n\n");
    doc.push_str(
        "*Note: This documentation was generated without LLM analysis due to API configuration issues.*\n\n",
    );

    doc.push_str("## Overview\n\n");
    doc.push_str(&format!(
        "This project contains {} files across various technologies.\n\n",
        files.len()
    ));

    doc.push_str("## File Structure\n\n");
    let mut by_extension: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for record in files.values() {
        by_extension
            .entry(record.extension.as_str())
            .or_default()
            .push(record.path.as_str());
    }
    for (extension, mut paths) in by_extension {
        paths.sort_unstable();
        let label = if extension.is_empty() {
            "OTHER".to_string()
        } else {
            extension.to_uppercase()
        };
        doc.push_str(&format!("### {label} Files\n"));
        for path in paths {
            doc.push_str(&format!("- `{path}`\n"));
        }
        doc.push('\n');
    }

    let mut paths: Vec<&str> = files.keys().map(String::as_str).collect();
    paths.sort_unstable();

    let config_files: Vec<&str> = paths
        .iter()
        .copied()
        .filter(|p| {
            let lower = p.to_lowercase();
            CONFIG_MARKERS.iter().any(|m| lower.contains(m))
        })
        .collect();
    if !config_files.is_empty() {
        doc.push_str("## Configuration Files\n\n");
        for path in config_files {
            doc.push_str(&format!("- `{path}`\n"));
        }
        doc.push('\n');
    }

    let scripts: Vec<&str> = paths
        .iter()
        .copied()
        .filter(|p| p.starts_with("scripts/"))
        .collect();
    if !scripts.is_empty() {
        doc.push_str("## Scripts\n\n");
        for path in scripts {
            doc.push_str(&format!("- `{path}`\n"));
        }
        doc.push('\n');
    }

    doc.push_str("## Setup Instructions\n\n");
    doc.push_str("1. Clone the repository\n");
    doc.push_str("2. Install dependencies as specified in configuration files\n");
    doc.push_str("3. Configure environment variables as needed\n");
    doc.push_str("4. Run the application or scripts as appropriate\n\n");

    doc.push_str("---\n");
    doc.push_str("*For more detailed documentation, please configure API keys for LLM analysis.*\n");
    doc
}
