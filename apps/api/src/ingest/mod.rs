//! Document ingestion: turns uploaded or pasted resumes and job descriptions
//! into text, and resume text into sections.

mod docx;
pub mod prompts;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::codec::{self, ResumeDocument};
use crate::editor::recommendation::map_section_name;
use crate::errors::AppError;
use crate::ingest::prompts::SECTION_IDENTIFICATION_PROMPT;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{generate_json, LlmError, TextGenerator};
use crate::tailoring::fill_template;

/// Section name used when a resume has no delimiter lines and the model could
/// not split it.
pub const FALLBACK_SECTION: &str = "Resume";

/// Characters shown in upload previews.
pub const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),

    #[error("file is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("failed to extract text from PDF: {0}")]
    Pdf(String),

    #[error("failed to extract text from DOCX: {0}")]
    Docx(String),

    #[error("text file is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("no text could be extracted")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Docx,
    Text,
    Markdown,
}

impl FileKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(FileKind::Pdf),
            "docx" => Some(FileKind::Docx),
            "txt" => Some(FileKind::Text),
            "md" | "markdown" => Some(FileKind::Markdown),
            _ => None,
        }
    }

    pub fn from_filename(filename: &str) -> Result<Self, ExtractError> {
        filename
            .rsplit_once('.')
            .and_then(|(_, ext)| Self::from_extension(ext))
            .ok_or_else(|| ExtractError::Unsupported(filename.to_string()))
    }
}

pub fn check_size(size: usize, limit: usize) -> Result<(), ExtractError> {
    if size > limit {
        return Err(ExtractError::TooLarge { size, limit });
    }
    Ok(())
}

/// Extracts trimmed text from file bytes. CPU-bound; run off the async runtime.
pub fn extract_text(kind: FileKind, bytes: &[u8]) -> Result<String, ExtractError> {
    let text = match kind {
        FileKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?,
        FileKind::Docx => docx::extract_text(bytes)?,
        FileKind::Text | FileKind::Markdown => {
            let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
            String::from_utf8(bytes.to_vec())?
        }
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(text.to_string())
}

/// Where the sections of an ingested resume came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionSource {
    /// `=== Name ===` lines in the text.
    Delimiters,
    /// The model split an undelimited resume.
    Model,
    /// Everything kept as one [`FALLBACK_SECTION`] section.
    Fallback,
}

/// A resume split into sections.
#[derive(Debug, Clone)]
pub struct IngestedResume {
    pub document: ResumeDocument,
    pub source: SectionSource,
}

/// Decodes resume text without any model call. When no delimiter is present
/// the whole text becomes a single [`FALLBACK_SECTION`] section.
pub fn ingest_resume_text(text: &str) -> IngestedResume {
    let document = codec::decode(text);
    if !document.is_empty() {
        return IngestedResume {
            document,
            source: SectionSource::Delimiters,
        };
    }
    fallback(text)
}

fn fallback(text: &str) -> IngestedResume {
    let mut document = ResumeDocument::new();
    let body = text.trim();
    if !body.is_empty() {
        // FALLBACK_SECTION is a valid name.
        let _ = document.set_section(FALLBACK_SECTION, body);
    }
    IngestedResume {
        document,
        source: SectionSource::Fallback,
    }
}

/// Splits resume text into sections. Delimited text is decoded directly;
/// otherwise the model is asked to identify the sections. Unusable model
/// output degrades to the single-section fallback; transport failures are
/// returned as errors.
pub async fn identify_resume_sections(
    generator: &dyn TextGenerator,
    model: &str,
    text: &str,
) -> Result<IngestedResume, AppError> {
    let ingested = ingest_resume_text(text);
    if ingested.source == SectionSource::Delimiters || ingested.document.is_empty() {
        return Ok(ingested);
    }

    let prompt = fill_template(
        SECTION_IDENTIFICATION_PROMPT,
        &[("resume_text", text.trim()), ("json_only", JSON_ONLY_INSTRUCTION)],
    );

    match generate_json::<IndexMap<String, Value>>(generator, model, &prompt).await {
        Ok(raw) => {
            let document = sections_from_model(raw);
            if document.is_empty() {
                warn!(model, "Section identification returned no sections, keeping text as one section");
                return Ok(ingested);
            }
            Ok(IngestedResume {
                document,
                source: SectionSource::Model,
            })
        }
        Err(err @ (LlmError::Parse(_) | LlmError::EmptyContent)) => {
            warn!("Section identification output was not usable, keeping text as one section: {err}");
            Ok(ingested)
        }
        Err(err) => Err(AppError::Llm(format!("Section identification failed: {err}"))),
    }
}

/// Canonicalizes model-produced `key -> text` pairs. String values are used as
/// is, string lists are joined one item per line, anything else is skipped.
/// Keys that map to the same section are appended in order.
fn sections_from_model(raw: IndexMap<String, Value>) -> ResumeDocument {
    let mut document = ResumeDocument::new();
    for (key, value) in raw {
        let body = match value {
            Value::String(text) => text,
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("\n"),
            _ => continue,
        };
        let body = body.trim();
        let name = map_section_name(&key);
        if body.is_empty() || codec::validate_section_name(&name).is_err() {
            continue;
        }
        document.append_section(&name, body);
    }
    document
}

/// First `max_chars` characters, with `...` appended when truncated.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
