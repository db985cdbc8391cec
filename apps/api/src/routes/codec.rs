//! Stateless section codec endpoints.

use axum::Json;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::codec::{self, EncodeMode, ResumeDocument};
use crate::errors::AppError;

#[derive(Debug, Deserialize)]
pub struct DecodeRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct DecodeResponse {
    pub sections: ResumeDocument,
    pub section_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct EncodeRequest {
    /// Ordered `name -> body` map; JSON object order is kept.
    pub sections: IndexMap<String, String>,
    #[serde(default)]
    pub mode: EncodeMode,
}

#[derive(Debug, Serialize)]
pub struct EncodeResponse {
    pub text: String,
}

/// POST /api/v1/codec/decode
pub async fn handle_decode(Json(req): Json<DecodeRequest>) -> Json<DecodeResponse> {
    let sections = codec::decode(&req.text);
    Json(DecodeResponse {
        section_count: sections.len(),
        sections,
    })
}

/// POST /api/v1/codec/encode
pub async fn handle_encode(Json(req): Json<EncodeRequest>) -> Result<Json<EncodeResponse>, AppError> {
    let doc = ResumeDocument::try_from(req.sections)?;
    Ok(Json(EncodeResponse {
        text: codec::encode(&doc, req.mode),
    }))
}
