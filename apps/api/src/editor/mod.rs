//! Editable resume: per-section content with change tracking.
//!
//! Built from a decoded [`ResumeDocument`] or from form entry, mutated one
//! section at a time, and flattened back through the section codec.

pub mod recommendation;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{self, validate_section_name, ResumeDocument, SectionNameError};

pub use recommendation::{Recommendation, RecommendationOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("section '{0}' not found")]
    SectionNotFound(String),

    #[error("version {version} out of range ({available} versions recorded)")]
    VersionOutOfRange { version: usize, available: usize },
}

/// One recorded change to a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditRecord {
    pub timestamp: DateTime<Utc>,
    pub previous: String,
    pub current: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditableSection {
    pub content: String,
    pub original_content: String,
    pub last_edited: DateTime<Utc>,
    pub edit_history: Vec<EditRecord>,
}

impl EditableSection {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            original_content: content.clone(),
            content,
            last_edited: Utc::now(),
            edit_history: Vec::new(),
        }
    }

    /// Replaces the content and records the change. Returns `false` when the
    /// new content is identical and nothing was recorded.
    pub fn apply_change(&mut self, new_content: impl Into<String>) -> bool {
        let new_content = new_content.into();
        if self.content == new_content {
            return false;
        }
        let now = Utc::now();
        self.edit_history.push(EditRecord {
            timestamp: now,
            previous: std::mem::replace(&mut self.content, new_content.clone()),
            current: new_content,
        });
        self.last_edited = now;
        true
    }

    /// Restores the content produced by edit number `version` (0-based).
    pub fn revert_to(&mut self, version: usize) -> Result<&str, EditError> {
        let record = self
            .edit_history
            .get(version)
            .ok_or(EditError::VersionOutOfRange {
                version,
                available: self.edit_history.len(),
            })?;
        self.content = record.current.clone();
        self.last_edited = record.timestamp;
        Ok(&self.content)
    }

    /// Trimmed non-blank lines, each rendered as a bullet.
    /// Lines already starting with `-` or `•` are kept as they are.
    pub fn format_for_display(&self) -> String {
        self.content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                if line.starts_with('-') || line.starts_with('•') {
                    line.to_string()
                } else {
                    format!("- {line}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EditSummaryEntry {
    pub timestamp: DateTime<Utc>,
    pub change: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditableResume {
    pub raw_text: String,
    pub sections: IndexMap<String, EditableSection>,
}

impl EditableResume {
    pub fn from_document(raw_text: impl Into<String>, doc: &ResumeDocument) -> Self {
        let sections = doc
            .iter()
            .map(|(name, body)| (name.to_string(), EditableSection::new(body)))
            .collect();
        Self {
            raw_text: raw_text.into(),
            sections,
        }
    }

    /// Current content of every section as a document.
    pub fn to_document(&self) -> ResumeDocument {
        let mut doc = ResumeDocument::new();
        for (name, section) in &self.sections {
            // Names are validated on the way in.
            let _ = doc.set_section(name.as_str(), section.content.as_str());
        }
        doc
    }

    /// Adds a section; an existing section of the same name is left untouched.
    pub fn add_section(&mut self, name: &str, content: &str) -> Result<bool, SectionNameError> {
        validate_section_name(name)?;
        if self.sections.contains_key(name) {
            return Ok(false);
        }
        self.sections
            .insert(name.to_string(), EditableSection::new(content));
        Ok(true)
    }

    pub fn remove_section(&mut self, name: &str) -> Result<String, EditError> {
        self.sections
            .shift_remove(name)
            .map(|section| section.content)
            .ok_or_else(|| EditError::SectionNotFound(name.to_string()))
    }

    pub fn section_mut(&mut self, name: &str) -> Result<&mut EditableSection, EditError> {
        self.sections
            .get_mut(name)
            .ok_or_else(|| EditError::SectionNotFound(name.to_string()))
    }

    pub fn section(&self, name: &str) -> Result<&EditableSection, EditError> {
        self.sections
            .get(name)
            .ok_or_else(|| EditError::SectionNotFound(name.to_string()))
    }

    /// Final resume text: display-formatted, non-empty sections re-encoded with
    /// delimiter lines so the export can be uploaded again.
    pub fn export_text(&self) -> String {
        let mut doc = ResumeDocument::new();
        for (name, section) in &self.sections {
            let formatted = section.format_for_display();
            if !formatted.is_empty() {
                let _ = doc.set_section(name.as_str(), formatted);
            }
        }
        codec::encode_delimited(&doc)
    }

    /// Changes per section, omitting sections that were never edited.
    pub fn edit_summary(&self) -> IndexMap<String, Vec<EditSummaryEntry>> {
        self.sections
            .iter()
            .filter(|(_, section)| !section.edit_history.is_empty())
            .map(|(name, section)| {
                let entries = section
                    .edit_history
                    .iter()
                    .map(|record| EditSummaryEntry {
                        timestamp: record.timestamp,
                        change: format!("{} → {}", record.previous, record.current),
                    })
                    .collect();
                (name.clone(), entries)
            })
            .collect()
    }
}
