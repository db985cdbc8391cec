//! Per-user working state: the resume being edited, the target job, and the
//! last tailoring result. Held in memory only and dropped after an idle TTL.

pub mod handlers;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::editor::EditableResume;
use crate::errors::AppError;
use crate::tailoring::job_analyzer::JobRequirements;
use crate::tailoring::TailoringResult;

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub resume: Option<EditableResume>,
    pub job_description: Option<String>,
    pub job_analysis: Option<JobRequirements>,
    pub tailoring: Option<TailoringResult>,
}

impl Session {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            last_seen: now,
            resume: None,
            job_description: None,
            job_analysis: None,
            tailoring: None,
        }
    }

    pub fn resume(&self) -> Result<&EditableResume, AppError> {
        self.resume
            .as_ref()
            .ok_or_else(|| AppError::Validation("No resume has been submitted in this session".into()))
    }

    pub fn resume_mut(&mut self) -> Result<&mut EditableResume, AppError> {
        self.resume
            .as_mut()
            .ok_or_else(|| AppError::Validation("No resume has been submitted in this session".into()))
    }

    pub fn job_description(&self) -> Result<&str, AppError> {
        self.job_description
            .as_deref()
            .ok_or_else(|| AppError::Validation("No job description has been submitted in this session".into()))
    }

    /// Replaces the job description; analysis and tailoring for the old one are stale.
    pub fn set_job_description(&mut self, text: String) {
        self.job_description = Some(text);
        self.job_analysis = None;
        self.tailoring = None;
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            created_at: self.created_at,
            last_seen: self.last_seen,
            section_names: self
                .resume
                .as_ref()
                .map(|r| r.sections.keys().cloned().collect())
                .unwrap_or_default(),
            has_resume: self.resume.is_some(),
            has_job_description: self.job_description.is_some(),
            has_job_analysis: self.job_analysis.is_some(),
            has_tailored_resume: self.tailoring.is_some(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub section_names: Vec<String>,
    pub has_resume: bool,
    pub has_job_description: bool,
    pub has_job_analysis: bool,
    pub has_tailored_resume: bool,
}

/// Shared in-memory session map. Cloning shares the same map.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    ttl: chrono::Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::max_value()),
        }
    }

    fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now - session.last_seen > self.ttl
    }

    pub async fn create(&self) -> SessionSummary {
        let session = Session::new();
        let summary = session.summary();
        self.sessions.write().await.insert(session.id, session);
        debug!(session_id = %summary.session_id, "Session created");
        summary
    }

    /// Runs `f` against a live session, refreshing its idle timer.
    pub async fn read<R>(&self, id: Uuid, f: impl FnOnce(&Session) -> R) -> Result<R, AppError> {
        self.update(id, |session| Ok(f(&*session))).await
    }

    /// Runs `f` against a live session under the write lock, refreshing its
    /// idle timer. Expired sessions are removed and reported as not found.
    /// `f` must not await; LLM calls happen outside the lock.
    pub async fn update<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Session) -> Result<R, AppError>,
    ) -> Result<R, AppError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        let expired = match sessions.get(&id) {
            Some(session) => self.is_expired(session, now),
            None => return Err(session_not_found(id)),
        };
        if expired {
            sessions.remove(&id);
            return Err(session_not_found(id));
        }

        let session = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
        session.last_seen = now;
        f(session)
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    /// Drops every expired session and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !self.is_expired(session, now));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Periodically purges expired sessions for the lifetime of the process.
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let purged = store.purge_expired().await;
                if purged > 0 {
                    info!(purged, "Expired sessions removed");
                }
            }
        })
    }
}

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found or expired"))
}
