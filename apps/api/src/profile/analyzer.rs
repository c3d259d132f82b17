//! Profile analysis — condenses raw resume / job description text into the structured
//! profiles an interview session is created from.
//!
//! Never fails: an undecodable reply keeps the raw text under `analysis`, and a gateway
//! failure yields a generic profile so session creation can still go ahead.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::llm_client::prompts::{system_prompt_with, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{strip_json_fences, truncate_chars, ModelGateway};
use crate::models::profile::{CandidateProfile, JobProfile};
use crate::profile::prompts::{
    ANALYST_ROLE, JOB_ANALYSIS_PROMPT_TEMPLATE, JOB_ANALYSIS_TASK,
    RESUME_ANALYSIS_PROMPT_TEMPLATE, RESUME_ANALYSIS_TASK,
};

const ANALYSIS_TEMPERATURE: f32 = 0.3;
pub const MAX_RESUME_CHARS: usize = 4000;
pub const MAX_JOB_DESCRIPTION_CHARS: usize = 3000;

/// Key under which an undecodable model reply is kept verbatim.
pub const RAW_ANALYSIS_KEY: &str = "analysis";

#[derive(Clone)]
pub struct ProfileAnalyzer {
    gateway: Arc<dyn ModelGateway>,
}

impl ProfileAnalyzer {
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self { gateway }
    }

    pub async fn analyze_resume(&self, resume_text: &str) -> CandidateProfile {
        let user = RESUME_ANALYSIS_PROMPT_TEMPLATE
            .replace("{resume_text}", &bounded(resume_text, MAX_RESUME_CHARS));
        let system = system_prompt_with(ANALYST_ROLE, RESUME_ANALYSIS_TASK, JSON_ONLY_INSTRUCTION);

        match self.gateway.complete(&system, &user, ANALYSIS_TEMPERATURE).await {
            Ok(raw) => decode_or_raw(&raw, |extra| CandidateProfile {
                extra,
                ..Default::default()
            }),
            Err(e) => {
                warn!("Resume analysis failed, using generic profile: {e}");
                fallback_candidate()
            }
        }
    }

    pub async fn analyze_job_description(&self, job_description: &str) -> JobProfile {
        let user = JOB_ANALYSIS_PROMPT_TEMPLATE.replace(
            "{job_description}",
            &bounded(job_description, MAX_JOB_DESCRIPTION_CHARS),
        );
        let system = system_prompt_with(ANALYST_ROLE, JOB_ANALYSIS_TASK, JSON_ONLY_INSTRUCTION);

        match self.gateway.complete(&system, &user, ANALYSIS_TEMPERATURE).await {
            Ok(raw) => decode_or_raw(&raw, |extra| JobProfile {
                extra,
                ..Default::default()
            }),
            Err(e) => {
                warn!("Job description analysis failed, using generic profile: {e}");
                fallback_job()
            }
        }
    }

    /// Runs both analyses concurrently. The resume is optional.
    pub async fn analyze(
        &self,
        resume_text: Option<&str>,
        job_description: &str,
    ) -> (Option<CandidateProfile>, JobProfile) {
        let resume = async {
            match resume_text {
                Some(text) => Some(self.analyze_resume(text).await),
                None => None,
            }
        };
        let (candidate, job) = tokio::join!(resume, self.analyze_job_description(job_description));
        info!(
            "Profile analysis done: candidate={}, position={}",
            candidate.is_some(),
            job.position.as_deref().unwrap_or("unknown")
        );
        (candidate, job)
    }
}

fn bounded(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() > max_chars {
        format!("{}...", truncate_chars(text, max_chars))
    } else {
        text.to_string()
    }
}

fn decode_or_raw<T: DeserializeOwned>(raw: &str, from_extra: impl FnOnce(Map<String, Value>) -> T) -> T {
    match serde_json::from_str::<T>(strip_json_fences(raw)) {
        Ok(profile) => profile,
        Err(e) => {
            warn!("Profile reply was not valid JSON, keeping raw text: {e}");
            let mut extra = Map::new();
            extra.insert(RAW_ANALYSIS_KEY.to_string(), Value::String(raw.trim().to_string()));
            from_extra(extra)
        }
    }
}

pub fn fallback_candidate() -> CandidateProfile {
    CandidateProfile {
        name: Some("Candidate".to_string()),
        skills: vec![json!("Technical skills")],
        experience: vec![json!("Work experience")],
        education: Some(json!("Not specified")),
        ..Default::default()
    }
}

pub fn fallback_job() -> JobProfile {
    JobProfile {
        position: Some("Software Engineer".to_string()),
        required_skills: vec![json!("Programming skills"), json!("Work experience")],
        experience_requirements: Some(json!("1-3 years")),
        ..Default::default()
    }
}
