use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::interview::InterviewStatus;

/// Session-protocol failures. Surfaced verbatim, never retried, and always raised
/// before the session is mutated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterviewError {
    #[error("Session {0} not found")]
    SessionNotFound(Uuid),

    #[error("Session has no questions")]
    NoQuestions,

    #[error("No current question to answer")]
    NoCurrentQuestion,

    #[error("Question {0} has already been answered")]
    QuestionAlreadyAnswered(Uuid),

    #[error("Question generation failed")]
    GenerationFailed,

    #[error("Cannot {action} a session that is {from}")]
    InvalidTransition {
        from: InterviewStatus,
        action: &'static str,
    },
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Interview(#[from] InterviewError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Interview(e) => {
                let (status, code) = match e {
                    InterviewError::SessionNotFound(_) => {
                        (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND")
                    }
                    InterviewError::NoQuestions => (StatusCode::BAD_REQUEST, "NO_QUESTIONS"),
                    InterviewError::NoCurrentQuestion => {
                        (StatusCode::CONFLICT, "NO_CURRENT_QUESTION")
                    }
                    InterviewError::QuestionAlreadyAnswered(_) => {
                        (StatusCode::CONFLICT, "QUESTION_ALREADY_ANSWERED")
                    }
                    InterviewError::InvalidTransition { .. } => {
                        (StatusCode::CONFLICT, "INVALID_TRANSITION")
                    }
                    InterviewError::GenerationFailed => {
                        tracing::error!("Question generation failed with no fallback");
                        (StatusCode::INTERNAL_SERVER_ERROR, "GENERATION_FAILED")
                    }
                };
                (status, code, e.to_string())
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
