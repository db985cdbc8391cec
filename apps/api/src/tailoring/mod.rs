// Resume tailoring: job analysis, whole-resume and per-section rewriting, diffing.
// All LLM calls go through llm_client.

pub mod diff;
pub mod handlers;
pub mod job_analyzer;
pub mod prompts;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::codec::{self, ResumeDocument};
use crate::errors::AppError;
use crate::llm_client::prompts::NO_FABRICATION_INSTRUCTION;
use crate::llm_client::{strip_reasoning, TextGenerator};
use crate::tailoring::prompts::{TAILOR_RESUME_PROMPT, TAILOR_SECTION_PROMPT};

/// Output of one tailoring run, kept in the session for diffing.
#[derive(Debug, Clone, Serialize)]
pub struct TailoringResult {
    pub model: String,
    pub original_resume: String,
    pub tailored_resume: String,
    pub created_at: DateTime<Utc>,
}

/// Substitutes `{key}` placeholders in a single pass, so inserted values are
/// never themselves scanned for placeholders. Unknown `{...}` is kept as is.
pub(crate) fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let hit = values
            .iter()
            .find(|(key, _)| tail.starts_with(key) && tail[key.len()..].starts_with('}'));
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Picks the model for a request. A requested model must be installed on the
/// server; `name` matches both `name` and `name:<tag>`.
pub async fn resolve_model(
    generator: &dyn TextGenerator,
    requested: Option<&str>,
    default_model: &str,
) -> Result<String, AppError> {
    let requested = match requested.map(str::trim).filter(|m| !m.is_empty()) {
        Some(model) => model,
        None => return Ok(default_model.to_string()),
    };

    let available = generator.list_models().await?;
    let installed = available.iter().any(|name| {
        name == requested || name.split_once(':').map(|(base, _)| base) == Some(requested)
    });
    if !installed {
        return Err(AppError::Validation(format!(
            "Model {requested} not found. Available models: {}",
            available.join(", ")
        )));
    }
    Ok(requested.to_string())
}

async fn generate_text(
    generator: &dyn TextGenerator,
    model: &str,
    prompt: &str,
) -> Result<String, AppError> {
    let output = generator.generate(model, prompt).await?;
    let text = strip_reasoning(&output);
    if text.is_empty() {
        return Err(AppError::Llm("Model returned an empty response".to_string()));
    }
    Ok(text.to_string())
}

/// Tailors the whole resume. Sections are flattened with `encode_flat` before
/// being handed to the model.
pub async fn tailor_resume(
    generator: &dyn TextGenerator,
    model: &str,
    document: &ResumeDocument,
    job_description: &str,
) -> Result<TailoringResult, AppError> {
    if document.is_empty() {
        return Err(AppError::Validation("Resume has no content to tailor".to_string()));
    }

    let resume_text = codec::encode_flat(document);
    let prompt = fill_template(
        TAILOR_RESUME_PROMPT,
        &[
            ("resume_text", &resume_text),
            ("job_description", job_description),
            ("no_fabrication", NO_FABRICATION_INSTRUCTION),
        ],
    );

    let tailored = generate_text(generator, model, &prompt).await?;
    info!(
        model,
        original_len = resume_text.len(),
        tailored_len = tailored.len(),
        "Resume tailored"
    );

    Ok(TailoringResult {
        model: model.to_string(),
        original_resume: resume_text,
        tailored_resume: tailored,
        created_at: Utc::now(),
    })
}

/// Rewrites the body of one section for the job.
pub async fn tailor_section(
    generator: &dyn TextGenerator,
    model: &str,
    section_name: &str,
    section_body: &str,
    job_description: &str,
) -> Result<String, AppError> {
    if section_body.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "Section '{section_name}' is empty"
        )));
    }

    let prompt = fill_template(
        TAILOR_SECTION_PROMPT,
        &[
            ("section_name", section_name),
            ("section_body", section_body),
            ("job_description", job_description),
            ("no_fabrication", NO_FABRICATION_INSTRUCTION),
        ],
    );
    generate_text(generator, model, &prompt).await
}
