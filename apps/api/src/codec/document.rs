//! In-memory resume document: an ordered mapping of section name to body.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected section name when a document is built directly (form entry, API).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SectionNameError {
    #[error("section name cannot be empty")]
    Empty,

    #[error("section name '{0}' contains a line break")]
    LineBreak(String),
}

/// Checks that `name` can be written as a single delimiter line and read back.
pub fn validate_section_name(name: &str) -> Result<(), SectionNameError> {
    if name.is_empty() {
        return Err(SectionNameError::Empty);
    }
    if name.contains(['\n', '\r']) {
        return Err(SectionNameError::LineBreak(name.to_string()));
    }
    Ok(())
}

/// A resume split into named sections.
///
/// Sections keep insertion order and names are unique. Serializes as a JSON
/// object whose key order is the section order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "IndexMap<String, String>",
    into = "IndexMap<String, String>"
)]
pub struct ResumeDocument {
    sections: IndexMap<String, String>,
}

impl ResumeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document from `(name, body)` pairs in order.
    /// A repeated name replaces the earlier body but keeps its position.
    pub fn from_pairs<I, N, B>(pairs: I) -> Result<Self, SectionNameError>
    where
        I: IntoIterator<Item = (N, B)>,
        N: Into<String>,
        B: Into<String>,
    {
        let mut doc = Self::new();
        for (name, body) in pairs {
            doc.set_section(name, body)?;
        }
        Ok(doc)
    }

    /// Sets the body of `name`, creating the section at the end if it is new.
    pub fn set_section(
        &mut self,
        name: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<(), SectionNameError> {
        let name = name.into();
        validate_section_name(&name)?;
        self.sections.insert(name, body.into());
        Ok(())
    }

    /// Appends `body` to an existing section (newline-separated) or creates it.
    /// Used by the decoder for repeated delimiter names.
    pub(crate) fn append_section(&mut self, name: &str, body: &str) {
        match self.sections.get_mut(name) {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(body);
            }
            None => {
                self.sections.insert(name.to_string(), body.to_string());
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.sections.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sections
            .iter()
            .map(|(name, body)| (name.as_str(), body.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn bodies(&self) -> impl Iterator<Item = &str> {
        self.sections.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl TryFrom<IndexMap<String, String>> for ResumeDocument {
    type Error = SectionNameError;

    fn try_from(sections: IndexMap<String, String>) -> Result<Self, Self::Error> {
        for name in sections.keys() {
            validate_section_name(name)?;
        }
        Ok(Self { sections })
    }
}

impl From<ResumeDocument> for IndexMap<String, String> {
    fn from(doc: ResumeDocument) -> Self {
        doc.sections
    }
}
