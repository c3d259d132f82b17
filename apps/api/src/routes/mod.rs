pub mod health;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::interview::handlers;
use crate::profile::handlers::handle_analyze;
use crate::state::AppState;

/// Success envelope shared by every API route. Errors use the `AppError` body instead.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/profile/analyze", post(handle_analyze))
        // Interview lifecycle
        .route(
            "/api/interview/create-session",
            post(handlers::handle_create_session),
        )
        .route("/api/interview/start", post(handlers::handle_start))
        .route(
            "/api/interview/submit-answer",
            post(handlers::handle_submit_answer),
        )
        .route(
            "/api/interview/next-question",
            post(handlers::handle_next_question),
        )
        .route("/api/interview/finish", post(handlers::handle_finish))
        .route("/api/interview/cancel", post(handlers::handle_cancel))
        .route("/api/interview/plan-next", post(handlers::handle_plan_next))
        .route(
            "/api/interview/session/:session_id",
            get(handlers::handle_get_session),
        )
        .route("/api/interview/ws/:session_id", get(handlers::handle_ws))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::Config;
    use crate::llm_client::mock::ScriptedGateway;

    fn app(gateway: ScriptedGateway) -> Router {
        build_router(AppState::new(Config::for_tests(), Arc::new(gateway)))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(ScriptedGateway::unavailable()), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "interview-api");
    }

    #[tokio::test]
    async fn test_interview_round_trip_over_http() {
        let app = app(ScriptedGateway::unavailable());

        let (status, body) = send(
            &app,
            "POST",
            "/api/interview/create-session",
            Some(json!({
                "resume_analysis": {"name": "Ada", "skills": ["Rust"]},
                "job_analysis": {"position": "Backend Engineer"},
                "question_count": 1
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["total_questions"], 1);
        assert_eq!(body["data"]["status"], "pending");
        let session_id = body["data"]["session_id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "POST",
            "/api/interview/start",
            Some(json!({ "session_id": session_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["session"]["status"], "in_progress");

        let (status, body) = send(
            &app,
            "POST",
            "/api/interview/submit-answer",
            Some(json!({
                "session_id": session_id,
                "answer_text": "I have five years of backend work.",
                "duration": 45
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["score"], 5.0);

        let (status, body) = send(
            &app,
            "POST",
            "/api/interview/next-question",
            Some(json!({ "session_id": session_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["outcome"], "finished");
        assert_eq!(body["data"]["overall_score"], 5.0);

        let (status, body) = send(
            &app,
            "GET",
            &format!("/api/interview/session/{session_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "completed");
        assert_eq!(body["data"]["answers"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_session_accepts_structured_profile_entries() {
        let app = app(ScriptedGateway::unavailable());
        let (status, body) = send(
            &app,
            "POST",
            "/api/interview/create-session",
            Some(json!({
                "candidate_profile": {
                    "name": "Ada",
                    "experience": [{"company": "Acme", "years": 3}],
                    "education": [{"level": "MSc"}]
                },
                "job_profile": {"position": "SRE", "requirements": "Linux"},
                "question_count": 1
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let session_id = body["data"]["session_id"].as_str().unwrap().to_string();

        let (_, body) = send(
            &app,
            "GET",
            &format!("/api/interview/session/{session_id}"),
            None,
        )
        .await;
        let candidate = &body["data"]["candidate_profile"];
        assert_eq!(candidate["experience"][0]["company"], "Acme");
        assert_eq!(candidate["education"][0]["level"], "MSc");
        assert_eq!(body["data"]["job_profile"]["required_skills"][0], "Linux");
    }

    #[tokio::test]
    async fn test_unknown_session_returns_404_envelope() {
        let app = app(ScriptedGateway::unavailable());
        let (status, body) = send(
            &app,
            "GET",
            &format!("/api/interview/session/{}", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "SESSION_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_empty_answer_is_rejected() {
        let app = app(ScriptedGateway::unavailable());
        let (status, body) = send(
            &app,
            "POST",
            "/api/interview/submit-answer",
            Some(json!({ "session_id": Uuid::new_v4(), "answer_text": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_submit_before_start_is_conflict() {
        let app = app(ScriptedGateway::unavailable());
        let (_, body) = send(
            &app,
            "POST",
            "/api/interview/create-session",
            Some(json!({ "question_count": 2 })),
        )
        .await;
        let session_id = body["data"]["session_id"].clone();

        let (status, body) = send(
            &app,
            "POST",
            "/api/interview/submit-answer",
            Some(json!({ "session_id": session_id, "answer_text": "hello" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "NO_CURRENT_QUESTION");
    }

    #[tokio::test]
    async fn test_profile_analysis_falls_back_when_model_is_down() {
        let app = app(ScriptedGateway::unavailable());
        let (status, body) = send(
            &app,
            "POST",
            "/api/profile/analyze",
            Some(json!({
                "resume_text": "Ada Lovelace, analytical engines",
                "job_description": "Backend engineer, Rust"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["job_profile"]["position"], "Software Engineer");
        assert_eq!(body["data"]["candidate_profile"]["name"], "Candidate");
    }

    #[tokio::test]
    async fn test_profile_analysis_requires_job_description() {
        let app = app(ScriptedGateway::unavailable());
        let (status, _) = send(
            &app,
            "POST",
            "/api/profile/analyze",
            Some(json!({ "job_description": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
