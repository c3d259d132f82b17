use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::profile::{CandidateProfile, JobProfile};
use crate::routes::{ok, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub resume_text: Option<String>,
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_profile: Option<CandidateProfile>,
    pub job_profile: JobProfile,
}

/// POST /api/profile/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<ApiResponse<AnalyzeResponse>>, AppError> {
    if req.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description must not be empty".to_string(),
        ));
    }
    let resume_text = req.resume_text.as_deref().filter(|t| !t.trim().is_empty());

    let (candidate_profile, job_profile) = state
        .analyzer
        .analyze(resume_text, &req.job_description)
        .await;
    Ok(ok(AnalyzeResponse {
        candidate_profile,
        job_profile,
    }))
}
