//! Job analyzer: extracts requirements and keywords from a job description.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{generate_json, LlmError, TextGenerator};
use crate::tailoring::fill_template;
use crate::tailoring::prompts::JOB_ANALYSIS_PROMPT;

/// Structured requirements of a job posting. Missing keys default to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRequirements {
    pub required_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    pub required_experience: Vec<String>,
    pub required_education: Vec<String>,
    pub responsibilities: Vec<String>,
    pub keywords: Vec<String>,
}

impl JobRequirements {
    pub fn is_empty(&self) -> bool {
        self.required_skills.is_empty()
            && self.preferred_skills.is_empty()
            && self.required_experience.is_empty()
            && self.required_education.is_empty()
            && self.responsibilities.is_empty()
            && self.keywords.is_empty()
    }
}

/// Runs the analysis prompt. Unparsable model output degrades to an empty
/// analysis; transport failures are returned as errors.
pub async fn analyze_job_description(
    generator: &dyn TextGenerator,
    model: &str,
    job_description: &str,
) -> Result<JobRequirements, AppError> {
    let prompt = fill_template(
        JOB_ANALYSIS_PROMPT,
        &[
            ("job_description", job_description),
            ("json_only", JSON_ONLY_INSTRUCTION),
        ],
    );

    match generate_json::<JobRequirements>(generator, model, &prompt).await {
        Ok(requirements) => {
            if requirements.is_empty() {
                warn!(model, "Job analysis found no requirements");
            }
            Ok(requirements)
        }
        Err(err @ (LlmError::Parse(_) | LlmError::EmptyContent)) => {
            warn!("Job analysis output was not usable, returning empty analysis: {err}");
            Ok(JobRequirements::default())
        }
        Err(err) => Err(AppError::Llm(format!("Job analysis failed: {err}"))),
    }
}
