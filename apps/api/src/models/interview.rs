use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::profile::{CandidateProfile, JobProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl std::fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InterviewStatus::Pending => "pending",
            InterviewStatus::InProgress => "in_progress",
            InterviewStatus::Completed => "completed",
            InterviewStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    #[default]
    Technical,
    Behavioral,
    #[serde(alias = "situation")]
    Situational,
    Experience,
}

impl QuestionType {
    /// Case-insensitive match against the fixed set. `None` for anything unknown.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "technical" => Some(QuestionType::Technical),
            "behavioral" | "behavioural" => Some(QuestionType::Behavioral),
            "situational" | "situation" => Some(QuestionType::Situational),
            "experience" => Some(QuestionType::Experience),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Technical => "technical",
            QuestionType::Behavioral => "behavioral",
            QuestionType::Situational => "situational",
            QuestionType::Experience => "experience",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Seconds, always positive when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_duration: Option<u32>,
    #[serde(default)]
    pub follow_ups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Opaque reference to an audio payload (base64 or storage key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub question_id: Uuid,
    /// Always within [0, 10].
    pub score: f64,
    pub feedback: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub areas_for_improvement: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub status: InterviewStatus,
    pub candidate_profile: CandidateProfile,
    pub job_profile: JobProfile,
    pub questions: Vec<Question>,
    pub answers: Vec<Answer>,
    pub evaluations: Vec<Evaluation>,
    pub current_question_index: usize,
    pub overall_score: Option<f64>,
    pub final_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(
        candidate_profile: CandidateProfile,
        job_profile: JobProfile,
        questions: Vec<Question>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: InterviewStatus::Pending,
            candidate_profile,
            job_profile,
            questions,
            answers: Vec::new(),
            evaluations: Vec::new(),
            current_question_index: 0,
            overall_score: None,
            final_feedback: None,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    pub fn latest_answer(&self) -> Option<&Answer> {
        self.answers.last()
    }

    /// `len(evaluations) == len(answers) <= len(questions)`.
    pub fn records_consistent(&self) -> bool {
        self.evaluations.len() == self.answers.len() && self.answers.len() <= self.questions.len()
    }
}

/// Mean of all scores rounded to one decimal, clamped to [0, 10]; 0.0 when empty.
pub fn overall_score(evaluations: &[Evaluation]) -> f64 {
    if evaluations.is_empty() {
        return 0.0;
    }
    let total: f64 = evaluations.iter().map(|e| e.score).sum();
    let mean = total / evaluations.len() as f64;
    ((mean * 10.0).round() / 10.0).clamp(0.0, 10.0)
}
