//! CLI glue for autodoc: argument parsing, config loading and the async entrypoint.
//!
//! All pipeline logic lives in [`autodoc_core`]; this module only wires the loaded config,
//! the selected backend and the Confluence publisher together.
//!
//! - For command-line users: run the `autodoc` binary with `--help`.
//! - For programmatic and integration use: call [`run`] with a constructed [`Cli`].
use crate::load_config::{load_config, Overrides};
use anyhow::Result;
use autodoc_core::backend::Backend;
use autodoc_core::generate::{generate, GenerateReport, PublishStatus};
use autodoc_core::publish::Publisher;
use clap::Parser;
use std::path::PathBuf;

/// Generate documentation from a codebase using an LLM and publish it to Confluence.
#[derive(Debug, Parser)]
#[clap(name = "autodoc", version, about = "Generate documentation from codebase using LLM")]
pub struct Cli {
    /// Path to scan (default: current directory)
    #[clap(long)]
    pub path: Option<PathBuf>,

    /// Output filename (default: generated_docs.md)
    #[clap(long)]
    pub output: Option<PathBuf>,

    /// Enable verbose logging
    #[clap(short, long)]
    pub verbose: bool,

    /// Optional YAML config file; environment variables take precedence over it
    #[clap(long)]
    pub config: Option<PathBuf>,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<GenerateReport> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let config = load_config(
        cli.config.as_deref(),
        Overrides {
            path: cli.path,
            output: cli.output,
        },
    )?;

    let backend = Backend::select(&config.llm);
    match generate(&config, &backend, Publisher::from_config).await {
        Ok(report) => {
            tracing::info!(
                files = report.files_scanned,
                in_context = report.files_in_context,
                omitted = report.files_omitted,
                provenance = ?report.provenance,
                output = %report.output.display(),
                "Documentation generation complete"
            );
            if let PublishStatus::Failed(reason) = &report.publish {
                tracing::warn!(reason = %reason, "Documentation was saved but not published");
            }
            Ok(report)
        }
        Err(e) => {
            tracing::error!(error = %e, "Documentation generation failed");
            Err(anyhow::Error::new(e))
        }
    }
}
