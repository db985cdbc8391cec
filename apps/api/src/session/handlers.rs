use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::codec::{self, ResumeDocument};
use crate::editor::{EditSummaryEntry, EditableResume, Recommendation, RecommendationOutcome};
use crate::errors::AppError;
use crate::ingest::{self, FileKind, IngestedResume, SectionSource, PREVIEW_CHARS};
use crate::session::{Session, SessionSummary};
use crate::state::AppState;

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionSummary>) {
    (StatusCode::CREATED, Json(state.sessions.create().await))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(state.sessions.read(id, Session::summary).await?))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.sessions.remove(id).await {
        return Err(AppError::NotFound(format!("Session {id} not found or expired")));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Uploads
// ────────────────────────────────────────────────────────────────────────────

struct UploadedFile {
    filename: String,
    bytes: Bytes,
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::Validation(format!("Invalid multipart body: {}", err.body_text()))
    }
}

/// Reads the multipart field named `file`; other fields are skipped.
async fn read_file_field(mut multipart: Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("Uploaded file has no filename".into()))?;
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(UploadedFile { filename, bytes });
    }
    Err(AppError::Validation("Missing multipart field 'file'".into()))
}

/// Checks type and size, then extracts text on the blocking pool.
async fn extract_upload(
    state: &AppState,
    upload: UploadedFile,
) -> Result<(FileKind, String), AppError> {
    let kind = FileKind::from_filename(&upload.filename)?;
    ingest::check_size(upload.bytes.len(), state.config.max_upload_bytes())?;

    let bytes = upload.bytes;
    let text = tokio::task::spawn_blocking(move || ingest::extract_text(kind, &bytes))
        .await
        .map_err(|e| AppError::Extraction(format!("Text extraction aborted: {e}")))??;

    info!(
        filename = %upload.filename,
        kind = ?kind,
        chars = text.chars().count(),
        "Extracted text from upload"
    );
    Ok((kind, text))
}

#[derive(Serialize)]
pub struct ResumeIngestResponse {
    pub filename: Option<String>,
    pub file_kind: Option<FileKind>,
    /// How the sections were found: `delimiters`, `model` or `fallback`.
    pub section_source: SectionSource,
    pub section_names: Vec<String>,
    pub preview: String,
}

#[derive(Serialize)]
pub struct JobIngestResponse {
    pub filename: Option<String>,
    pub file_kind: Option<FileKind>,
    pub preview: String,
}

/// Splits `text` into sections, asking the model when it has no delimiters.
/// Runs outside the session lock; a missing session fails before any model
/// call.
async fn identify_sections(
    state: &AppState,
    id: Uuid,
    text: &str,
) -> Result<IngestedResume, AppError> {
    state.sessions.read(id, |_| ()).await?;
    ingest::identify_resume_sections(state.llm.as_ref(), &state.config.default_model, text).await
}

/// Replaces the session resume with `text` split as `ingested`. Tailoring for
/// the old resume is dropped. Returns the section names.
fn store_resume(session: &mut Session, text: &str, ingested: &IngestedResume) -> Vec<String> {
    let names = ingested.document.names().map(String::from).collect();
    session.resume = Some(EditableResume::from_document(text, &ingested.document));
    session.tailoring = None;
    names
}

/// POST /api/v1/sessions/:id/resume/upload
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ResumeIngestResponse>, AppError> {
    let upload = read_file_field(multipart).await?;
    let filename = upload.filename.clone();
    let (kind, text) = extract_upload(&state, upload).await?;
    let ingested = identify_sections(&state, id, &text).await?;

    let section_names = state
        .sessions
        .update(id, |session| Ok(store_resume(session, &text, &ingested)))
        .await?;

    Ok(Json(ResumeIngestResponse {
        filename: Some(filename),
        file_kind: Some(kind),
        section_source: ingested.source,
        section_names,
        preview: ingest::preview(&text, PREVIEW_CHARS),
    }))
}

/// POST /api/v1/sessions/:id/job/upload
pub async fn handle_upload_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<JobIngestResponse>, AppError> {
    let upload = read_file_field(multipart).await?;
    let filename = upload.filename.clone();
    let (kind, text) = extract_upload(&state, upload).await?;
    let preview = ingest::preview(&text, PREVIEW_CHARS);

    state
        .sessions
        .update(id, |session| {
            session.set_job_description(text);
            Ok(())
        })
        .await?;

    Ok(Json(JobIngestResponse {
        filename: Some(filename),
        file_kind: Some(kind),
        preview,
    }))
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualContentType {
    Resume,
    JobDescription,
}

#[derive(Deserialize)]
pub struct ManualTextRequest {
    pub content_type: ManualContentType,
    pub text: String,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum ManualTextResponse {
    Resume(ResumeIngestResponse),
    Job(JobIngestResponse),
}

/// POST /api/v1/sessions/:id/manual-text
pub async fn handle_manual_text(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ManualTextRequest>,
) -> Result<Json<ManualTextResponse>, AppError> {
    let text = req.text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::Validation("Text must not be empty".into()));
    }
    let preview = ingest::preview(&text, PREVIEW_CHARS);

    let response = match req.content_type {
        ManualContentType::Resume => {
            let ingested = identify_sections(&state, id, &text).await?;
            let section_names = state
                .sessions
                .update(id, |session| Ok(store_resume(session, &text, &ingested)))
                .await?;
            ManualTextResponse::Resume(ResumeIngestResponse {
                filename: None,
                file_kind: None,
                section_source: ingested.source,
                section_names,
                preview,
            })
        }
        ManualContentType::JobDescription => {
            state
                .sessions
                .update(id, |session| {
                    session.set_job_description(text);
                    Ok(())
                })
                .await?;
            ManualTextResponse::Job(JobIngestResponse {
                filename: None,
                file_kind: None,
                preview,
            })
        }
    };
    Ok(Json(response))
}

// ────────────────────────────────────────────────────────────────────────────
// Editing
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SectionEntry {
    pub name: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Deserialize)]
pub struct ResumeFormRequest {
    pub sections: Vec<SectionEntry>,
}

/// PUT /api/v1/sessions/:id/resume
///
/// Structured form entry. Names are trimmed; entries with a blank body are
/// skipped the same way the decoder skips empty sections.
pub async fn handle_put_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ResumeFormRequest>,
) -> Result<Json<EditableResume>, AppError> {
    let doc = ResumeDocument::from_pairs(
        req.sections
            .iter()
            .filter(|entry| !entry.body.trim().is_empty())
            .map(|entry| (entry.name.trim(), entry.body.trim())),
    )?;
    if doc.is_empty() {
        return Err(AppError::Validation("At least one non-empty section is required".into()));
    }

    let resume = EditableResume::from_document(codec::encode_delimited(&doc), &doc);
    state
        .sessions
        .update(id, |session| {
            session.resume = Some(resume.clone());
            session.tailoring = None;
            Ok(())
        })
        .await?;
    Ok(Json(resume))
}

/// GET /api/v1/sessions/:id/resume
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EditableResume>, AppError> {
    let resume = state
        .sessions
        .update(id, |session| session.resume().cloned())
        .await?;
    Ok(Json(resume))
}

#[derive(Deserialize)]
pub struct SectionEditRequest {
    pub content: String,
}

#[derive(Serialize)]
pub struct SectionEditResponse {
    pub section: String,
    pub changed: bool,
    pub content: String,
    pub versions: usize,
}

/// PUT /api/v1/sessions/:id/resume/sections/:name
pub async fn handle_edit_section(
    State(state): State<AppState>,
    Path((id, name)): Path<(Uuid, String)>,
    Json(req): Json<SectionEditRequest>,
) -> Result<Json<SectionEditResponse>, AppError> {
    let response = state
        .sessions
        .update(id, |session| {
            let section = session.resume_mut()?.section_mut(&name)?;
            let changed = section.apply_change(req.content);
            Ok(SectionEditResponse {
                section: name.clone(),
                changed,
                content: section.content.clone(),
                versions: section.edit_history.len(),
            })
        })
        .await?;
    Ok(Json(response))
}

#[derive(Serialize)]
pub struct SectionRemovedResponse {
    pub section: String,
    pub removed_content: String,
}

/// DELETE /api/v1/sessions/:id/resume/sections/:name
pub async fn handle_remove_section(
    State(state): State<AppState>,
    Path((id, name)): Path<(Uuid, String)>,
) -> Result<Json<SectionRemovedResponse>, AppError> {
    let removed_content = state
        .sessions
        .update(id, |session| Ok(session.resume_mut()?.remove_section(&name)?))
        .await?;
    Ok(Json(SectionRemovedResponse {
        section: name,
        removed_content,
    }))
}

#[derive(Deserialize)]
pub struct RevertRequest {
    pub version: usize,
}

/// POST /api/v1/sessions/:id/resume/sections/:name/revert
pub async fn handle_revert_section(
    State(state): State<AppState>,
    Path((id, name)): Path<(Uuid, String)>,
    Json(req): Json<RevertRequest>,
) -> Result<Json<SectionEditResponse>, AppError> {
    let response = state
        .sessions
        .update(id, |session| {
            let section = session.resume_mut()?.section_mut(&name)?;
            let content = section.revert_to(req.version)?.to_string();
            Ok(SectionEditResponse {
                section: name.clone(),
                changed: true,
                content,
                versions: section.edit_history.len(),
            })
        })
        .await?;
    Ok(Json(response))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportMode {
    /// Section bodies only, for plain-text consumers.
    Flat,
    /// Bodies under delimiter lines, exactly as edited.
    Delimited,
    /// Bullet-formatted bodies under delimiter lines.
    #[default]
    Final,
}

#[derive(Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub mode: ExportMode,
}

#[derive(Serialize)]
pub struct ExportResponse {
    pub mode: ExportMode,
    pub text: String,
}

/// GET /api/v1/sessions/:id/resume/export?mode=flat|delimited|final
pub async fn handle_export_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<Json<ExportResponse>, AppError> {
    let text = state
        .sessions
        .update(id, |session| {
            let resume = session.resume()?;
            Ok(match query.mode {
                ExportMode::Flat => codec::encode_flat(&resume.to_document()),
                ExportMode::Delimited => codec::encode_delimited(&resume.to_document()),
                ExportMode::Final => resume.export_text(),
            })
        })
        .await?;
    Ok(Json(ExportResponse {
        mode: query.mode,
        text,
    }))
}

/// GET /api/v1/sessions/:id/resume/history
pub async fn handle_edit_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<IndexMap<String, Vec<EditSummaryEntry>>>, AppError> {
    let summary = state
        .sessions
        .update(id, |session| Ok(session.resume()?.edit_summary()))
        .await?;
    Ok(Json(summary))
}

#[derive(Deserialize)]
pub struct ApplyRecommendationsRequest {
    pub recommendations: Vec<Recommendation>,
}

#[derive(Serialize)]
pub struct ApplyRecommendationsResponse {
    pub outcomes: Vec<RecommendationOutcome>,
    pub section_names: Vec<String>,
}

/// POST /api/v1/sessions/:id/recommendations/apply
pub async fn handle_apply_recommendations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ApplyRecommendationsRequest>,
) -> Result<Json<ApplyRecommendationsResponse>, AppError> {
    let response = state
        .sessions
        .update(id, |session| {
            let resume = session.resume_mut()?;
            let outcomes = resume.apply_recommendations(&req.recommendations);
            Ok(ApplyRecommendationsResponse {
                outcomes,
                section_names: resume.sections.keys().cloned().collect(),
            })
        })
        .await?;
    Ok(Json(response))
}
