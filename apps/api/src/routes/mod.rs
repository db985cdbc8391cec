pub mod codec;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::session::handlers as sessions;
use crate::state::AppState;
use crate::tailoring::handlers as tailoring;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state
        .config
        .max_upload_bytes()
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/", get(health::service_info_handler))
        .route("/health", get(health::health_handler))
        .route("/api/v1/models", get(tailoring::handle_list_models))
        // Stateless codec
        .route("/api/v1/codec/decode", post(codec::handle_decode))
        .route("/api/v1/codec/encode", post(codec::handle_encode))
        // Sessions
        .route("/api/v1/sessions", post(sessions::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(sessions::handle_get_session).delete(sessions::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/resume/upload",
            post(sessions::handle_upload_resume),
        )
        .route(
            "/api/v1/sessions/:id/job/upload",
            post(sessions::handle_upload_job),
        )
        .route(
            "/api/v1/sessions/:id/manual-text",
            post(sessions::handle_manual_text),
        )
        // Editing
        .route(
            "/api/v1/sessions/:id/resume",
            get(sessions::handle_get_resume).put(sessions::handle_put_resume),
        )
        .route(
            "/api/v1/sessions/:id/resume/sections/:name",
            put(sessions::handle_edit_section).delete(sessions::handle_remove_section),
        )
        .route(
            "/api/v1/sessions/:id/resume/sections/:name/revert",
            post(sessions::handle_revert_section),
        )
        .route(
            "/api/v1/sessions/:id/resume/export",
            get(sessions::handle_export_resume),
        )
        .route(
            "/api/v1/sessions/:id/resume/history",
            get(sessions::handle_edit_history),
        )
        .route(
            "/api/v1/sessions/:id/recommendations/apply",
            post(sessions::handle_apply_recommendations),
        )
        // Tailoring
        .route(
            "/api/v1/sessions/:id/job/analyze",
            post(tailoring::handle_analyze_job),
        )
        .route("/api/v1/sessions/:id/tailor", post(tailoring::handle_tailor_resume))
        .route(
            "/api/v1/sessions/:id/tailor/section/:name",
            post(tailoring::handle_tailor_section),
        )
        .route(
            "/api/v1/sessions/:id/tailor/diff",
            post(tailoring::handle_tailor_diff),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::llm_client::scripted::ScriptedGenerator;
    use crate::session::SessionStore;

    const RESUME: &str = "Jane Doe\n=== Summary ===\nBackend engineer\n=== Skills ===\nPython\nSQL";

    fn app(responses: Vec<&str>) -> Router {
        build_router(AppState {
            llm: Arc::new(ScriptedGenerator::new(responses)),
            sessions: SessionStore::new(Duration::from_secs(3600)),
            config: Config::default(),
        })
    }

    async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn send_raw(app: &Router, method: Method, uri: &str, body: Option<String>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(text) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(text)
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        read_json(response).await
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        send_raw(app, method, uri, body.map(|value| value.to_string())).await
    }

    async fn upload(app: &Router, uri: &str, filename: &str, content: &str) -> (StatusCode, Value) {
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             {content}\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        read_json(app.clone().oneshot(request).await.unwrap()).await
    }

    async fn new_session(app: &Router) -> String {
        let (status, body) = send(app, Method::POST, "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    async fn submit(app: &Router, id: &str, content_type: &str, text: &str) {
        let (status, _) = send(
            app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/manual-text"),
            Some(json!({ "content_type": content_type, "text": text })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_reports_sessions() {
        let app = app(vec![]);
        new_session(&app).await;
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["active_sessions"], 1);
    }

    #[tokio::test]
    async fn test_huge_upload_limit_still_serves_uploads() {
        let app = build_router(AppState {
            llm: Arc::new(ScriptedGenerator::new(vec![])),
            sessions: SessionStore::new(Duration::from_secs(3600)),
            config: Config {
                max_file_size_mb: usize::MAX,
                ..Config::default()
            },
        });
        let id = new_session(&app).await;
        let (status, body) = upload(
            &app,
            &format!("/api/v1/sessions/{id}/resume/upload"),
            "resume.txt",
            RESUME,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["section_source"], "delimiters");
    }

    #[tokio::test]
    async fn test_codec_endpoints() {
        let app = app(vec![]);
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/codec/decode",
            Some(json!({ "text": RESUME })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["section_count"], 2);
        assert_eq!(body["sections"]["Skills"], "Python\nSQL");

        // Raw body so the object key order reaches the server as written.
        let (status, body) = send_raw(
            &app,
            Method::POST,
            "/api/v1/codec/encode",
            Some(r#"{"sections": {"B": "two", "A": "one"}, "mode": "delimited"}"#.to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "=== B ===\ntwo\n=== A ===\none");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/codec/encode",
            Some(json!({ "sections": { "": "body" } })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let app = app(vec![]);
        let uri = format!("/api/v1/sessions/{}", uuid::Uuid::new_v4());
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_upload_text_resume() {
        let app = app(vec![]);
        let id = new_session(&app).await;

        let (status, body) = upload(
            &app,
            &format!("/api/v1/sessions/{id}/resume/upload"),
            "resume.txt",
            RESUME,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["section_source"], "delimiters");
        assert_eq!(body["file_kind"], "text");
        assert_eq!(body["section_names"], json!(["Summary", "Skills"]));

        let (status, body) = upload(
            &app,
            &format!("/api/v1/sessions/{id}/resume/upload"),
            "resume.rtf",
            RESUME,
        )
        .await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["error"]["code"], "UNSUPPORTED_MEDIA_TYPE");
    }

    #[tokio::test]
    async fn test_plain_resume_sections_identified_by_model() {
        let app = app(vec![
            r#"{"contact_information": "Jane Doe", "skills": ["Python", "SQL"]}"#,
        ]);
        let id = new_session(&app).await;
        let (status, body) = upload(
            &app,
            &format!("/api/v1/sessions/{id}/resume/upload"),
            "resume.txt",
            "Jane Doe\nPython\nSQL",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["section_source"], "model");
        assert_eq!(body["section_names"], json!(["Contact Information", "Skills"]));

        let (_, body) = send(&app, Method::GET, &format!("/api/v1/sessions/{id}/resume"), None).await;
        assert_eq!(body["sections"]["Skills"]["content"], "Python\nSQL");
    }

    #[tokio::test]
    async fn test_plain_resume_falls_back_to_single_section() {
        let app = app(vec!["I am not sure where the sections are."]);
        let id = new_session(&app).await;
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/manual-text"),
            Some(json!({ "content_type": "resume", "text": "Jane Doe\nPython developer" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["section_source"], "fallback");
        assert_eq!(body["section_names"], json!(["Resume"]));
    }

    #[tokio::test]
    async fn test_plain_resume_with_model_down_is_502() {
        let app = app(vec![]);
        let id = new_session(&app).await;
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/manual-text"),
            Some(json!({ "content_type": "resume", "text": "Jane Doe\nPython developer" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "LLM_ERROR");

        let (_, body) = send(&app, Method::GET, &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(body["has_resume"], false);
    }

    #[tokio::test]
    async fn test_edit_revert_and_export() {
        let app = app(vec![]);
        let id = new_session(&app).await;
        submit(&app, &id, "resume", RESUME).await;

        let section = format!("/api/v1/sessions/{id}/resume/sections/Skills");
        let (status, body) = send(
            &app,
            Method::PUT,
            &section,
            Some(json!({ "content": "Python\nSQL\nRust" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["changed"], true);
        assert_eq!(body["versions"], 1);

        send(&app, Method::PUT, &section, Some(json!({ "content": "Go" }))).await;
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("{section}/revert"),
            Some(json!({ "version": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content"], "Python\nSQL\nRust");

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("{section}/revert"),
            Some(json!({ "version": 9 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(
            &app,
            Method::GET,
            &format!("/api/v1/sessions/{id}/resume/history"),
            None,
        )
        .await;
        assert_eq!(body["Skills"].as_array().unwrap().len(), 2);
        assert!(body.get("Summary").is_none());

        let (_, body) = send(
            &app,
            Method::GET,
            &format!("/api/v1/sessions/{id}/resume/export?mode=flat"),
            None,
        )
        .await;
        assert_eq!(body["text"], "Backend engineer\n\nPython\nSQL\nRust");

        let (_, body) = send(
            &app,
            Method::GET,
            &format!("/api/v1/sessions/{id}/resume/export"),
            None,
        )
        .await;
        assert_eq!(body["mode"], "final");
        assert_eq!(
            body["text"],
            "=== Summary ===\n- Backend engineer\n=== Skills ===\n- Python\n- SQL\n- Rust"
        );
    }

    #[tokio::test]
    async fn test_missing_section_is_404() {
        let app = app(vec![]);
        let id = new_session(&app).await;
        submit(&app, &id, "resume", RESUME).await;
        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/api/v1/sessions/{id}/resume/sections/Awards"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_form_entry_and_recommendations() {
        let app = app(vec![]);
        let id = new_session(&app).await;
        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/sessions/{id}/resume"),
            Some(json!({ "sections": [
                { "name": "Skills", "body": "- Python" },
                { "name": "Awards", "body": "   " }
            ] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["raw_text"], "=== Skills ===\n- Python");

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/recommendations/apply"),
            Some(json!({ "recommendations": [
                { "section": "skills", "type": "add", "content": "Rust" },
                { "section": "certifications", "type": "add", "content": "AWS SAA" }
            ] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcomes"][0]["status"], "applied");
        assert_eq!(body["outcomes"][1]["status"], "created_section");
        assert_eq!(body["section_names"], json!(["Skills", "Certifications"]));
    }

    #[tokio::test]
    async fn test_tailor_flow_and_diff() {
        let app = app(vec![
            r#"{"required_skills": ["Python", "AWS"], "keywords": ["Django"]}"#,
            "Backend engineer\n\nPython\nSQL\nAWS",
        ]);
        let id = new_session(&app).await;

        let (status, _) = send(&app, Method::POST, &format!("/api/v1/sessions/{id}/tailor"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        submit(&app, &id, "resume", RESUME).await;
        submit(&app, &id, "job_description", "Python developer with AWS").await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/job/analyze"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"]["required_skills"], json!(["Python", "AWS"]));

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/tailor"),
            Some(json!({ "model_name": "llama3.1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["original_resume"], "Backend engineer\n\nPython\nSQL");

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/tailor/diff"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_changes"], 1);
        assert_eq!(body["diff"][0]["type"], "added");
        assert_eq!(body["estimated_impact_score"], 5);

        let (_, body) = send(&app, Method::GET, &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(body["has_job_analysis"], true);
        assert_eq!(body["has_tailored_resume"], true);
    }

    #[tokio::test]
    async fn test_tailor_section_apply() {
        let app = app(vec!["Python\nSQL\nAWS"]);
        let id = new_session(&app).await;
        submit(&app, &id, "resume", RESUME).await;
        submit(&app, &id, "job_description", "Cloud role").await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/tailor/section/Skills"),
            Some(json!({ "apply": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["applied"], true);
        assert_eq!(body["original"], "Python\nSQL");

        let (_, body) = send(&app, Method::GET, &format!("/api/v1/sessions/{id}/resume"), None).await;
        assert_eq!(body["sections"]["Skills"]["content"], "Python\nSQL\nAWS");
    }

    #[tokio::test]
    async fn test_unknown_model_is_rejected() {
        let app = app(vec![]);
        let id = new_session(&app).await;
        submit(&app, &id, "resume", RESUME).await;
        submit(&app, &id, "job_description", "Role").await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/tailor"),
            Some(json!({ "model_name": "mistral" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"].as_str().unwrap().contains("llama3.1"));
    }

    #[tokio::test]
    async fn test_delete_session() {
        let app = app(vec![]);
        let id = new_session(&app).await;
        let uri = format!("/api/v1/sessions/{id}");
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
