//! Builds the analysis prompt from a scanned [`FileCollection`].
//!
//! Files are taken smallest first, sorted by `(size, extension, path)`, and appended until
//! the next one would push the serialized context past its byte budget. Accumulation stops
//! at that file. Large files are the first to go; [`Prompt::omitted`] lists everything
//! left out.

use std::fmt::Write as _;

use tracing::{debug, info};

use crate::config::PromptConfig;
use crate::scan::{FileCollection, FileRecord};

const CONTEXT_HEADING: &str = "# Codebase Analysis\n\n";

/// A fully rendered prompt, consumed once by the analysis step.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub text: String,
    /// Paths embedded in the context, in the order they appear.
    pub included: Vec<String>,
    /// Paths left out because of the per-file ceiling or the total budget.
    pub omitted: Vec<String>,
    /// Length in bytes of the codebase context section.
    pub context_bytes: usize,
}

/// Render the codebase context and embed it in the instruction template.
pub fn build_prompt(files: &FileCollection, config: &PromptConfig) -> Prompt {
    let (context, included, omitted) = render_context(files, config);
    let context_bytes = context.len();

    info!(
        included = included.len(),
        omitted = omitted.len(),
        context_bytes,
        budget = config.max_context_bytes,
        "Built analysis prompt"
    );
    if !omitted.is_empty() {
        debug!(?omitted, "Files left out of the prompt context");
    }

    Prompt {
        text: instructions(&context, config.language.as_deref()),
        included,
        omitted,
        context_bytes,
    }
}

fn render_context(
    files: &FileCollection,
    config: &PromptConfig,
) -> (String, Vec<String>, Vec<String>) {
    let mut omitted = Vec::new();
    let mut eligible: Vec<&FileRecord> = Vec::with_capacity(files.len());
    for record in files.values() {
        if record.size < config.max_file_bytes {
            eligible.push(record);
        } else {
            omitted.push(record.path.clone());
        }
    }
    eligible.sort_by(|a, b| {
        (a.size, &a.extension, &a.path).cmp(&(b.size, &b.extension, &b.path))
    });

    let mut context = String::from(CONTEXT_HEADING);
    let mut included = Vec::new();
    let mut remaining = eligible.into_iter();
    for record in remaining.by_ref() {
        let block = render_file(record);
        if context.len() + block.len() > config.max_context_bytes {
            omitted.push(record.path.clone());
            break;
        }
        context.push_str(&block);
        included.push(record.path.clone());
    }
    omitted.extend(remaining.map(|r| r.path.clone()));
    omitted.sort();

    // A budget smaller than the heading yields an empty context rather than an oversized one.
    if included.is_empty() && context.len() > config.max_context_bytes {
        context.clear();
    }
    (context, included, omitted)
}

fn render_file(record: &FileRecord) -> String {
    let label = if record.extension.is_empty() {
        "text"
    } else {
        record.extension.as_str()
    };
    format!(
        "## {}\n```{}\n{}\n```\n\n",
        record.path, label, record.content
    )
}

fn instructions(context: &str, language: Option<&str>) -> String {
    let mut prompt = String::from(
        "Analyze this codebase and generate comprehensive documentation. Focus on:\n\
         \n\
         1. **Architecture Overview**: High-level system architecture and design patterns\n\
         2. **Component Analysis**: Individual components, their responsibilities and interactions\n\
         3. **API Documentation**: Endpoints, functions and their parameters\n\
         4. **Configuration**: Environment variables, config files and deployment settings\n\
         5. **Dependencies**: External libraries and their purposes\n\
         6. **Usage Examples**: How to use the system and its components\n\
         7. **Development Guide**: How to contribute, build, test and deploy\n\
         \n\
         Generate the documentation in Markdown format with clear sections and subsections.\n\
         Make it comprehensive but accessible to developers of all levels.\n",
    );
    if let Some(language) = language {
        let _ = writeln!(
            prompt,
            "Use {language} for all text except code comments and technical terms."
        );
    }
    let _ = write!(
        prompt,
        "\nCodebase to analyze:\n{context}\n\
         Please provide well-structured documentation that would help new developers \
         understand and contribute to this project.\n"
    );
    prompt
}
