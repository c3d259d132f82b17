//! Answer Evaluator — scores one answer and synthesizes the end-of-interview report.
//!
//! Parsing is two-stage: strict JSON decode first, then a line-scanning heuristic that
//! pulls a score out of free text. Gateway failures produce a degraded evaluation
//! instead of an error, so every submitted answer gets exactly one evaluation.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::interview::prompts::{
    EVALUATION_PROMPT_TEMPLATE, EVALUATION_TASK, EVALUATOR_ROLE, FINAL_REPORT_PROMPT_TEMPLATE,
    FINAL_REPORT_TASK,
};
use crate::llm_client::prompts::{system_prompt, system_prompt_with, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{strip_json_fences, truncate_chars, LlmError, ModelGateway};
use crate::models::interview::{overall_score, Answer, Evaluation, Question};
use crate::models::profile::{CandidateProfile, JobProfile};

const EVALUATION_TEMPERATURE: f32 = 0.3;
const REPORT_TEMPERATURE: f32 = 0.5;
/// Score used when the model answered but no score could be recovered.
const DEFAULT_SCORE: f64 = 7.0;
/// Score used when the model could not be reached at all.
const DEGRADED_SCORE: f64 = 5.0;
const REPORT_FEEDBACK_CHARS: usize = 200;

static SCORE_AFTER_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:score|rating|分)\D{0,20}?(\d+(?:\.\d+)?)").expect("valid score regex")
});
static SCORE_OUT_OF_TEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*/\s*10\b").expect("valid out-of-ten regex"));

/// Structured shape the evaluation prompt asks for. Every field is optional so partial
/// objects still decode.
#[derive(Debug, Default, Deserialize)]
struct EvaluationPayload {
    score: Option<Value>,
    feedback: Option<String>,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    areas_for_improvement: Vec<String>,
    #[serde(default)]
    suggestions: Vec<String>,
}

#[derive(Clone)]
pub struct AnswerEvaluator {
    gateway: Arc<dyn ModelGateway>,
}

impl AnswerEvaluator {
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self { gateway }
    }

    /// Scores `answer` against `question`. Never fails.
    pub async fn evaluate(
        &self,
        question: &Question,
        answer: &Answer,
        candidate: Option<&CandidateProfile>,
        job: Option<&JobProfile>,
    ) -> Evaluation {
        let system = system_prompt_with(EVALUATOR_ROLE, EVALUATION_TASK, JSON_ONLY_INSTRUCTION);
        let user = build_evaluation_prompt(question, answer, candidate, job);

        let response = match self
            .gateway
            .complete(&system, &user, EVALUATION_TEMPERATURE)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!("Evaluation call failed for question {}: {e}", question.id);
                return degraded_evaluation(question.id, &e);
            }
        };

        let evaluation = parse_evaluation(question.id, &response);
        info!(
            "Evaluated answer for question {}: score={}",
            question.id, evaluation.score
        );
        evaluation
    }

    /// Produces the end-of-interview narrative. Falls back to a one-line score summary.
    pub async fn synthesize_final_report(
        &self,
        evaluations: &[Evaluation],
        candidate: Option<&CandidateProfile>,
        job: Option<&JobProfile>,
    ) -> String {
        let mean = overall_score(evaluations);
        let system = system_prompt(EVALUATOR_ROLE, FINAL_REPORT_TASK);
        let user = build_report_prompt(evaluations, mean, candidate, job);

        match self.gateway.complete(&system, &user, REPORT_TEMPERATURE).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!("Final report call returned empty text, using score summary");
                fallback_report(mean)
            }
            Err(e) => {
                warn!("Final report call failed, using score summary: {e}");
                fallback_report(mean)
            }
        }
    }
}

pub fn fallback_report(mean: f64) -> String {
    format!("Interview completed. Average score: {mean:.1}/10")
}

fn degraded_evaluation(question_id: Uuid, err: &LlmError) -> Evaluation {
    Evaluation {
        question_id,
        score: DEGRADED_SCORE,
        feedback: format!("The answer could not be evaluated automatically: {err}"),
        strengths: Vec::new(),
        areas_for_improvement: vec!["Provide a more detailed answer".to_string()],
        suggestions: vec!["Try to answer the question more specifically".to_string()],
    }
}

/// Strict decode, falling back to the text heuristic when the response is not an object.
fn parse_evaluation(question_id: Uuid, response: &str) -> Evaluation {
    match serde_json::from_str::<EvaluationPayload>(strip_json_fences(response)) {
        Ok(payload) => Evaluation {
            question_id,
            score: payload
                .score
                .as_ref()
                .and_then(score_from_value)
                .unwrap_or(DEFAULT_SCORE),
            feedback: payload
                .feedback
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| response.trim().to_string()),
            strengths: payload.strengths,
            areas_for_improvement: payload.areas_for_improvement,
            suggestions: payload.suggestions,
        },
        Err(_) => {
            warn!("Evaluation for question {question_id} is not structured, scanning text");
            Evaluation {
                question_id,
                score: extract_score_from_text(response).unwrap_or(DEFAULT_SCORE),
                feedback: response.trim().to_string(),
                strengths: Vec::new(),
                areas_for_improvement: Vec::new(),
                suggestions: Vec::new(),
            }
        }
    }
}

fn score_from_value(value: &Value) -> Option<f64> {
    let score = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    score.is_finite().then(|| score.clamp(0.0, 10.0))
}

/// First number in [1, 10] that follows a score label (or reads as "N/10") on any line.
fn extract_score_from_text(text: &str) -> Option<f64> {
    text.lines().find_map(|line| {
        [&*SCORE_AFTER_LABEL, &*SCORE_OUT_OF_TEN]
            .iter()
            .filter_map(|re| re.captures(line))
            .filter_map(|caps| caps.get(1)?.as_str().parse::<f64>().ok())
            .find(|score| (1.0..=10.0).contains(score))
    })
}

fn context_block(candidate: Option<&CandidateProfile>, job: Option<&JobProfile>) -> String {
    let mut block = String::new();
    if let Some(candidate) = candidate.filter(|c| !c.is_empty()) {
        block.push_str(&format!(
            "\nCANDIDATE BACKGROUND:\n{}\n",
            serde_json::to_string_pretty(candidate).unwrap_or_default()
        ));
    }
    if let Some(job) = job.filter(|j| !j.is_empty()) {
        block.push_str(&format!(
            "\nTARGET ROLE:\n{}\n",
            serde_json::to_string_pretty(job).unwrap_or_default()
        ));
    }
    block
}

fn build_evaluation_prompt(
    question: &Question,
    answer: &Answer,
    candidate: Option<&CandidateProfile>,
    job: Option<&JobProfile>,
) -> String {
    EVALUATION_PROMPT_TEMPLATE
        .replace("{question_type}", question.question_type.as_str())
        .replace("{question}", &question.text)
        .replace("{question_context}", question.context.as_deref().unwrap_or(""))
        .replace(
            "{answer_text}",
            answer.text.as_deref().unwrap_or("(no text answer)"),
        )
        .replace("{duration}", &answer.duration_secs.unwrap_or(0).to_string())
        .replace("{context_block}", &context_block(candidate, job))
}

fn build_report_prompt(
    evaluations: &[Evaluation],
    mean: f64,
    candidate: Option<&CandidateProfile>,
    job: Option<&JobProfile>,
) -> String {
    let summary: Vec<Value> = evaluations
        .iter()
        .map(|e| {
            json!({
                "question_id": e.question_id,
                "score": e.score,
                "feedback": truncate_chars(&e.feedback, REPORT_FEEDBACK_CHARS),
                "strengths": e.strengths,
                "areas_for_improvement": e.areas_for_improvement,
            })
        })
        .collect();

    FINAL_REPORT_PROMPT_TEMPLATE
        .replace(
            "{evaluations_json}",
            &serde_json::to_string_pretty(&summary).unwrap_or_default(),
        )
        .replace("{mean_score}", &format!("{mean:.1}"))
        .replace("{context_block}", &context_block(candidate, job))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::mock::ScriptedGateway;
    use crate::models::interview::QuestionType;
    use chrono::Utc;

    fn question() -> Question {
        Question {
            id: Uuid::new_v4(),
            text: "How does a hash map handle collisions?".to_string(),
            question_type: QuestionType::Technical,
            context: None,
            expected_duration: Some(180),
            follow_ups: vec![],
        }
    }

    fn answer_for(q: &Question) -> Answer {
        Answer {
            question_id: q.id,
            text: Some("Open addressing or chaining, depending on the design.".to_string()),
            audio: None,
            duration_secs: Some(45),
            created_at: Utc::now(),
        }
    }

    fn evaluation_with(score: f64, feedback: &str) -> Evaluation {
        Evaluation {
            question_id: Uuid::new_v4(),
            score,
            feedback: feedback.to_string(),
            strengths: vec![],
            areas_for_improvement: vec![],
            suggestions: vec![],
        }
    }

    fn evaluator(gateway: ScriptedGateway) -> (AnswerEvaluator, Arc<ScriptedGateway>) {
        let gateway = Arc::new(gateway);
        (AnswerEvaluator::new(gateway.clone()), gateway)
    }

    #[tokio::test]
    async fn test_structured_response_is_decoded() {
        let response = r#"{
            "score": 8.5,
            "feedback": "Accurate and concise.",
            "strengths": ["Knows both strategies"],
            "areas_for_improvement": ["Mention load factor"],
            "suggestions": ["Discuss resizing"]
        }"#;
        let (eval, gateway) = evaluator(ScriptedGateway::default().with_response(response));
        let q = question();
        let result = eval.evaluate(&q, &answer_for(&q), None, None).await;

        assert_eq!(result.question_id, q.id);
        assert_eq!(result.score, 8.5);
        assert_eq!(result.feedback, "Accurate and concise.");
        assert_eq!(result.strengths, vec!["Knows both strategies"]);
        assert_eq!(result.suggestions.len(), 1);

        let calls = gateway.calls();
        assert!(calls[0].user.contains("hash map"));
        assert!(calls[0].user.contains("45 seconds"));
    }

    #[tokio::test]
    async fn test_gateway_failure_yields_degraded_evaluation() {
        let (eval, _) = evaluator(ScriptedGateway::unavailable());
        let q = question();
        let result = eval.evaluate(&q, &answer_for(&q), None, None).await;

        assert_eq!(result.score, 5.0);
        assert!(result.feedback.contains("connection refused"));
        assert_eq!(result.areas_for_improvement.len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_reported_in_feedback() {
        let (eval, _) = evaluator(
            ScriptedGateway::default().with_error(LlmError::Timeout { secs: 30 }),
        );
        let q = question();
        let result = eval.evaluate(&q, &answer_for(&q), None, None).await;
        assert_eq!(result.score, 5.0);
        assert!(result.feedback.contains("timed out"));
    }

    #[tokio::test]
    async fn test_free_text_response_uses_heuristic_score() {
        let response = "Solid answer overall.\nScore: 9 out of 10\nCould mention resizing.";
        let (eval, _) = evaluator(ScriptedGateway::default().with_response(response));
        let q = question();
        let result = eval.evaluate(&q, &answer_for(&q), None, None).await;

        assert_eq!(result.score, 9.0);
        assert_eq!(result.feedback, response);
        assert!(result.strengths.is_empty());
    }

    #[tokio::test]
    async fn test_free_text_without_score_defaults_to_seven() {
        let response = "The candidate explained chaining well.";
        let (eval, _) = evaluator(ScriptedGateway::default().with_response(response));
        let q = question();
        let result = eval.evaluate(&q, &answer_for(&q), None, None).await;
        assert_eq!(result.score, DEFAULT_SCORE);
    }

    #[tokio::test]
    async fn test_object_without_score_or_feedback_uses_defaults() {
        let response = r#"{"strengths": ["clear"]}"#;
        let (eval, _) = evaluator(ScriptedGateway::default().with_response(response));
        let q = question();
        let result = eval.evaluate(&q, &answer_for(&q), None, None).await;
        assert_eq!(result.score, DEFAULT_SCORE);
        assert_eq!(result.feedback, response);
        assert_eq!(result.strengths, vec!["clear"]);
    }

    #[test]
    fn test_structured_score_is_clamped_and_accepts_strings() {
        let e = parse_evaluation(Uuid::new_v4(), r#"{"score": 14, "feedback": "x"}"#);
        assert_eq!(e.score, 10.0);
        let e = parse_evaluation(Uuid::new_v4(), r#"{"score": "6.5", "feedback": "x"}"#);
        assert_eq!(e.score, 6.5);
        let e = parse_evaluation(Uuid::new_v4(), r#"{"score": -3, "feedback": "x"}"#);
        assert_eq!(e.score, 0.0);
    }

    #[test]
    fn test_extract_score_skips_out_of_range_values() {
        let text = "Score breakdown for 2024 review\nRating: 85 points\nOverall score 7.5";
        assert_eq!(extract_score_from_text(text), Some(7.5));
    }

    #[test]
    fn test_extract_score_reads_out_of_ten_form() {
        assert_eq!(extract_score_from_text("I'd give this 6/10."), Some(6.0));
        assert_eq!(extract_score_from_text("评分：8分"), Some(8.0));
        assert_eq!(extract_score_from_text("No numbers here"), None);
    }

    #[tokio::test]
    async fn test_final_report_truncates_feedback() {
        let long_feedback = "x".repeat(500);
        let evaluations = vec![evaluation_with(6.0, &long_feedback), evaluation_with(8.0, "ok")];
        let (eval, gateway) =
            evaluator(ScriptedGateway::default().with_response("  Strong candidate.  "));

        let report = eval.synthesize_final_report(&evaluations, None, None).await;
        assert_eq!(report, "Strong candidate.");

        let calls = gateway.calls();
        assert!(!calls[0].user.contains(&"x".repeat(201)));
        assert!(calls[0].user.contains(&"x".repeat(200)));
        assert!(calls[0].user.contains("7.0/10"));
    }

    #[tokio::test]
    async fn test_final_report_falls_back_to_score_summary() {
        let evaluations = vec![evaluation_with(5.0, "a"), evaluation_with(6.0, "b")];
        let (eval, _) = evaluator(ScriptedGateway::unavailable());
        let report = eval.synthesize_final_report(&evaluations, None, None).await;
        assert_eq!(report, "Interview completed. Average score: 5.5/10");
    }

    #[test]
    fn test_context_block_omits_empty_profiles() {
        assert!(context_block(Some(&CandidateProfile::default()), None).is_empty());
        let job = JobProfile {
            position: Some("SRE".to_string()),
            ..Default::default()
        };
        assert!(context_block(None, Some(&job)).contains("SRE"));
    }
}
