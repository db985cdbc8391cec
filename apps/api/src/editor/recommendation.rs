//! Applying LLM-suggested recommendations to an editable resume.

use serde::{Deserialize, Serialize};

use super::EditableResume;
use crate::codec::SectionNameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Add,
    Modify,
    Emphasize,
    Remove,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub section: String,
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub content: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecommendationOutcome {
    CreatedSection { section: String },
    Applied { section: String },
    Unchanged { section: String },
    Rejected { section: String, reason: String },
}

/// Canonical section name: known aliases first, then `_` to space and title case.
pub fn map_section_name(raw: &str) -> String {
    let canonical = match raw.trim().to_lowercase().as_str() {
        "contact" | "contact_info" | "contact info" => "Contact Information",
        "work experience" | "work_experience" | "work history" => "Experience",
        "objective" | "profile" => "Summary",
        _ => raw.trim(),
    };
    title_case(&canonical.replace('_', " "))
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn bullet(content: &str) -> String {
    format!("- {content}")
}

/// Rewrites `current` according to one recommendation.
fn rewrite(current: &str, rec: &Recommendation) -> String {
    let item = bullet(&rec.content);
    match rec.kind {
        RecommendationKind::Add => {
            if current.lines().any(|line| line.trim() == item) {
                current.to_string()
            } else if current.is_empty() {
                item
            } else {
                format!("{current}\n{item}")
            }
        }
        RecommendationKind::Modify | RecommendationKind::Emphasize => {
            let mut lines: Vec<String> = current.lines().map(String::from).collect();
            match lines.first_mut() {
                Some(first) if first.starts_with('-') => {
                    let rest = first
                        .strip_prefix("- ")
                        .or_else(|| first.strip_prefix('-'))
                        .unwrap_or(first.as_str())
                        .to_string();
                    *first = format!("{item} ({rest})");
                }
                _ => lines.insert(0, item),
            }
            lines.join("\n")
        }
        RecommendationKind::Remove => current
            .lines()
            .filter(|line| line.trim() != item)
            .collect::<Vec<_>>()
            .join("\n"),
        RecommendationKind::Other => current.to_string(),
    }
}

impl EditableResume {
    /// Applies one recommendation. A missing target section is created with the
    /// recommendation as its only bullet.
    pub fn apply_recommendation(
        &mut self,
        rec: &Recommendation,
    ) -> Result<RecommendationOutcome, SectionNameError> {
        let section = map_section_name(&rec.section);

        match self.sections.get_mut(&section) {
            Some(target) => {
                let updated = rewrite(&target.content, rec);
                if target.apply_change(updated) {
                    Ok(RecommendationOutcome::Applied { section })
                } else {
                    Ok(RecommendationOutcome::Unchanged { section })
                }
            }
            None => {
                self.add_section(&section, &bullet(&rec.content))?;
                Ok(RecommendationOutcome::CreatedSection { section })
            }
        }
    }

    /// Applies recommendations in order; a rejected one does not stop the rest.
    pub fn apply_recommendations(&mut self, recs: &[Recommendation]) -> Vec<RecommendationOutcome> {
        recs.iter()
            .map(|rec| {
                self.apply_recommendation(rec)
                    .unwrap_or_else(|err| RecommendationOutcome::Rejected {
                        section: rec.section.clone(),
                        reason: err.to_string(),
                    })
            })
            .collect()
    }
}
