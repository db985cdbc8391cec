//! Axum route handlers for job analysis and tailoring.
//!
//! Session state is copied out before each model call and written back after
//! it, so the session lock is never held across an LLM round trip. Tailoring
//! write-backs are refused with 409 when their inputs changed in the meantime.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::session::Session;
use crate::state::AppState;
use crate::tailoring::diff::{line_diff, DiffReport};
use crate::tailoring::job_analyzer::{analyze_job_description, JobRequirements};
use crate::tailoring::{resolve_model, tailor_resume, tailor_section, TailoringResult};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ModelRequest {
    #[serde(default)]
    pub model_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TailorSectionRequest {
    #[serde(default)]
    pub model_name: Option<String>,
    /// Write the rewritten body into the section as a tracked edit.
    #[serde(default)]
    pub apply: bool,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
    pub default_model: String,
}

#[derive(Debug, Serialize)]
pub struct JobAnalysisResponse {
    pub model: String,
    pub analysis: JobRequirements,
}

#[derive(Debug, Serialize)]
pub struct TailorSectionResponse {
    pub model: String,
    pub section: String,
    pub original: String,
    pub tailored: String,
    pub applied: bool,
}

fn job_unchanged(session: &Session, job: &str) -> bool {
    session.job_description.as_deref() == Some(job)
}

fn stale(what: &str) -> AppError {
    AppError::Conflict(format!(
        "{what} changed while the model was running; request tailoring again"
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/models
pub async fn handle_list_models(
    State(state): State<AppState>,
) -> Result<Json<ModelsResponse>, AppError> {
    let models = state.llm.list_models().await?;
    Ok(Json(ModelsResponse {
        models,
        default_model: state.config.default_model.clone(),
    }))
}

/// POST /api/v1/sessions/:id/job/analyze
///
/// The analysis is stored only if the job description did not change while
/// the model was running.
pub async fn handle_analyze_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<ModelRequest>>,
) -> Result<Json<JobAnalysisResponse>, AppError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let job = state
        .sessions
        .update(id, |session| session.job_description().map(str::to_string))
        .await?;

    let model = resolve_model(
        state.llm.as_ref(),
        request.model_name.as_deref(),
        &state.config.default_model,
    )
    .await?;
    let analysis = analyze_job_description(state.llm.as_ref(), &model, &job).await?;

    state
        .sessions
        .update(id, |session| {
            if job_unchanged(session, &job) {
                session.job_analysis = Some(analysis.clone());
            }
            Ok(())
        })
        .await?;

    Ok(Json(JobAnalysisResponse { model, analysis }))
}

/// POST /api/v1/sessions/:id/tailor
///
/// The result is stored only if the resume and job description it was built
/// from are still current.
pub async fn handle_tailor_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<ModelRequest>>,
) -> Result<Json<TailoringResult>, AppError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let (document, job) = state
        .sessions
        .update(id, |session| {
            let document = session.resume()?.to_document();
            let job = session.job_description()?.to_string();
            Ok((document, job))
        })
        .await?;

    let model = resolve_model(
        state.llm.as_ref(),
        request.model_name.as_deref(),
        &state.config.default_model,
    )
    .await?;
    let result = tailor_resume(state.llm.as_ref(), &model, &document, &job).await?;

    state
        .sessions
        .update(id, |session| {
            let current = session.resume.as_ref().map(|resume| resume.to_document());
            if current.as_ref() != Some(&document) || !job_unchanged(session, &job) {
                return Err(stale("Resume or job description"));
            }
            session.tailoring = Some(result.clone());
            Ok(())
        })
        .await?;

    info!(session_id = %id, model = %result.model, "Tailored resume stored");
    Ok(Json(result))
}

/// POST /api/v1/sessions/:id/tailor/section/:name
///
/// With `apply`, the rewrite lands only if the section and job description
/// are unchanged since the model was asked.
pub async fn handle_tailor_section(
    State(state): State<AppState>,
    Path((id, name)): Path<(Uuid, String)>,
    body: Option<Json<TailorSectionRequest>>,
) -> Result<Json<TailorSectionResponse>, AppError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let (original, job) = state
        .sessions
        .update(id, |session| {
            let original = session.resume()?.section(&name)?.content.clone();
            let job = session.job_description()?.to_string();
            Ok((original, job))
        })
        .await?;

    let model = resolve_model(
        state.llm.as_ref(),
        request.model_name.as_deref(),
        &state.config.default_model,
    )
    .await?;
    let tailored = tailor_section(state.llm.as_ref(), &model, &name, &original, &job).await?;

    let applied = if request.apply {
        state
            .sessions
            .update(id, |session| {
                if !job_unchanged(session, &job) {
                    return Err(stale("Job description"));
                }
                let section = session.resume_mut()?.section_mut(&name)?;
                if section.content != original {
                    return Err(stale(&format!("Section '{name}'")));
                }
                Ok(section.apply_change(tailored.clone()))
            })
            .await?
    } else {
        false
    };

    Ok(Json(TailorSectionResponse {
        model,
        section: name,
        original,
        tailored,
        applied,
    }))
}

/// POST /api/v1/sessions/:id/tailor/diff
pub async fn handle_tailor_diff(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DiffReport>, AppError> {
    let report = state
        .sessions
        .update(id, |session| {
            let tailoring = session.tailoring.as_ref().ok_or_else(|| {
                AppError::Validation("No tailored resume in this session yet".into())
            })?;
            Ok(line_diff(&tailoring.original_resume, &tailoring.tailored_resume))
        })
        .await?;
    Ok(Json(report))
}
