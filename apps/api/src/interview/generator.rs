//! Question Generator — builds the ordered question list for a new session.
//!
//! One model call per session. Any failure (gateway error, malformed output, zero usable
//! items) falls back to the built-in canonical set, so `generate` never comes back empty
//! for `count >= 1`.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::interview::prompts::{
    GENERATOR_ROLE, QUESTION_GENERATION_PROMPT_TEMPLATE, QUESTION_GENERATION_TASK,
};
use crate::llm_client::prompts::{system_prompt_with, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{strip_json_fences, truncate_chars, ModelGateway};
use crate::models::interview::{Question, QuestionType};
use crate::models::profile::{CandidateProfile, JobProfile};

const GENERATION_TEMPERATURE: f32 = 0.8;
/// Upper bound on serialized profile text sent with the prompt.
const PROFILE_CONTEXT_CHARS: usize = 1500;
const DEFAULT_EXPECTED_DURATION: u32 = 180;

struct FallbackQuestion {
    text: &'static str,
    question_type: QuestionType,
    context: &'static str,
    expected_duration: u32,
}

const FALLBACK_QUESTIONS: [FallbackQuestion; 5] = [
    FallbackQuestion {
        text: "Please briefly introduce yourself and your technical background.",
        question_type: QuestionType::Experience,
        context: "Opening question to understand the candidate's background",
        expected_duration: 120,
    },
    FallbackQuestion {
        text: "Describe the most challenging project you have worked on and how you solved the problems you ran into.",
        question_type: QuestionType::Situational,
        context: "Assesses problem solving and project experience",
        expected_duration: 300,
    },
    FallbackQuestion {
        text: "How do you keep your technical skills up to date? Share some concrete learning habits.",
        question_type: QuestionType::Behavioral,
        context: "Assesses continuous learning",
        expected_duration: 180,
    },
    FallbackQuestion {
        text: "If you had to learn an entirely new tech stack to deliver a project, what strategy would you use?",
        question_type: QuestionType::Situational,
        context: "Assesses adaptability to new technology",
        expected_duration: 180,
    },
    FallbackQuestion {
        text: "Why do you want to join us, and what do you know about the company?",
        question_type: QuestionType::Behavioral,
        context: "Assesses motivation and interest in the company",
        expected_duration: 120,
    },
];

/// Built-in question set, sized down to `count`. Fresh ids on every call.
pub fn fallback_questions(count: usize) -> Vec<Question> {
    FALLBACK_QUESTIONS
        .iter()
        .take(count)
        .map(|q| Question {
            id: Uuid::new_v4(),
            text: q.text.to_string(),
            question_type: q.question_type,
            context: Some(q.context.to_string()),
            expected_duration: Some(q.expected_duration),
            follow_ups: Vec::new(),
        })
        .collect()
}

#[derive(Clone)]
pub struct QuestionGenerator {
    gateway: Arc<dyn ModelGateway>,
}

impl QuestionGenerator {
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self { gateway }
    }

    pub async fn generate(
        &self,
        candidate: &CandidateProfile,
        job: &JobProfile,
        count: usize,
    ) -> Vec<Question> {
        let system =
            system_prompt_with(GENERATOR_ROLE, QUESTION_GENERATION_TASK, JSON_ONLY_INSTRUCTION)
                .replace("{count}", &count.to_string());
        let user = build_generation_prompt(candidate, job, count);

        let response = match self
            .gateway
            .complete(&system, &user, GENERATION_TEMPERATURE)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!("Question generation call failed, using fallback set: {e}");
                return fallback_questions(count);
            }
        };

        let questions = parse_questions(&response, count);
        if questions.is_empty() {
            warn!("Question generation produced no usable items, using fallback set");
            return fallback_questions(count);
        }

        info!("Generated {} interview questions", questions.len());
        questions
    }
}

fn build_generation_prompt(candidate: &CandidateProfile, job: &JobProfile, count: usize) -> String {
    let candidate_json = serde_json::to_string_pretty(candidate).unwrap_or_default();
    let job_json = serde_json::to_string_pretty(job).unwrap_or_default();

    QUESTION_GENERATION_PROMPT_TEMPLATE
        .replace("{count}", &count.to_string())
        .replace(
            "{candidate_json}",
            &truncate_chars(&candidate_json, PROFILE_CONTEXT_CHARS),
        )
        .replace("{job_json}", &truncate_chars(&job_json, PROFILE_CONTEXT_CHARS))
}

/// Strict decode of the model output into at most `count` questions.
///
/// Items without question text are skipped. Unknown or missing `type` becomes `Technical`.
fn parse_questions(response: &str, count: usize) -> Vec<Question> {
    let items = match serde_json::from_str::<Value>(strip_json_fences(response)) {
        Ok(Value::Array(items)) => items,
        Ok(_) => return Vec::new(),
        Err(e) => {
            warn!("Question list is not valid JSON: {e}");
            return Vec::new();
        }
    };

    items
        .iter()
        .filter_map(parse_question_item)
        .take(count)
        .collect()
}

fn parse_question_item(item: &Value) -> Option<Question> {
    let obj = item.as_object()?;
    let text = obj
        .get("question")
        .or_else(|| obj.get("text"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())?;

    let question_type = obj
        .get("type")
        .and_then(Value::as_str)
        .and_then(QuestionType::parse)
        .unwrap_or(QuestionType::Technical);

    let context = obj
        .get("context")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from);

    let expected_duration = obj
        .get("expected_duration")
        .and_then(Value::as_u64)
        .filter(|d| *d > 0)
        .and_then(|d| u32::try_from(d).ok())
        .unwrap_or(DEFAULT_EXPECTED_DURATION);

    let follow_ups = obj
        .get("follow_up_questions")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    Some(Question {
        id: Uuid::new_v4(),
        text: text.to_string(),
        question_type,
        context,
        expected_duration: Some(expected_duration),
        follow_ups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::mock::ScriptedGateway;
    use crate::llm_client::LlmError;

    fn generator(gateway: ScriptedGateway) -> (QuestionGenerator, Arc<ScriptedGateway>) {
        let gateway = Arc::new(gateway);
        (QuestionGenerator::new(gateway.clone()), gateway)
    }

    #[tokio::test]
    async fn test_unavailable_gateway_returns_full_fallback_set() {
        let (gen, _) = generator(ScriptedGateway::unavailable());
        let questions = gen
            .generate(&CandidateProfile::default(), &JobProfile::default(), 5)
            .await;

        assert_eq!(questions.len(), 5);
        for (q, canonical) in questions.iter().zip(FALLBACK_QUESTIONS.iter()) {
            assert_eq!(q.text, canonical.text);
            assert_eq!(q.question_type, canonical.question_type);
        }
    }

    #[tokio::test]
    async fn test_fallback_is_prefix_when_count_below_five() {
        let (gen, _) = generator(ScriptedGateway::unavailable().with_error(LlmError::Timeout {
            secs: 30,
        }));
        let questions = gen
            .generate(&CandidateProfile::default(), &JobProfile::default(), 3)
            .await;

        assert_eq!(questions.len(), 3);
        let texts: Vec<_> = questions.iter().map(|q| q.text.as_str()).collect();
        let canonical: Vec<_> = FALLBACK_QUESTIONS.iter().take(3).map(|q| q.text).collect();
        assert_eq!(texts, canonical);
    }

    #[tokio::test]
    async fn test_fallback_capped_at_five_for_larger_counts() {
        let (gen, _) = generator(ScriptedGateway::unavailable());
        let questions = gen
            .generate(&CandidateProfile::default(), &JobProfile::default(), 8)
            .await;
        assert_eq!(questions.len(), 5);
    }

    #[tokio::test]
    async fn test_parses_model_questions_and_caps_to_count() {
        let response = r#"```json
        [
          {"question": "Explain Rust ownership.", "type": "technical", "expected_duration": 240},
          {"question": "Tell me about a conflict on your team.", "type": "behavioral"},
          {"question": "How would you scale a chat service?", "type": "situational"}
        ]
        ```"#;
        let (gen, gateway) = generator(ScriptedGateway::default().with_response(response));
        let questions = gen
            .generate(&CandidateProfile::default(), &JobProfile::default(), 2)
            .await;

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].text, "Explain Rust ownership.");
        assert_eq!(questions[0].expected_duration, Some(240));
        assert_eq!(questions[1].question_type, QuestionType::Behavioral);
        assert_eq!(questions[1].expected_duration, Some(DEFAULT_EXPECTED_DURATION));

        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].system.contains("exactly 2"));
        assert!((calls[0].temperature - GENERATION_TEMPERATURE).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_invalid_type_becomes_technical() {
        let response = r#"[{"question": "What is a B-tree?", "type": "trivia"}, {"question": "Why us?"}]"#;
        let (gen, _) = generator(ScriptedGateway::default().with_response(response));
        let questions = gen
            .generate(&CandidateProfile::default(), &JobProfile::default(), 5)
            .await;

        assert_eq!(questions.len(), 2);
        assert!(questions
            .iter()
            .all(|q| q.question_type == QuestionType::Technical));
    }

    #[tokio::test]
    async fn test_malformed_output_falls_back() {
        let (gen, _) = generator(
            ScriptedGateway::default().with_response("Here are some questions: 1. Why Rust?"),
        );
        let questions = gen
            .generate(&CandidateProfile::default(), &JobProfile::default(), 2)
            .await;
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].text, FALLBACK_QUESTIONS[0].text);
    }

    #[tokio::test]
    async fn test_items_without_text_are_not_usable() {
        let response = r#"[{"type": "technical"}, {"question": "   "}, "just a string"]"#;
        let (gen, _) = generator(ScriptedGateway::default().with_response(response));
        let questions = gen
            .generate(&CandidateProfile::default(), &JobProfile::default(), 3)
            .await;
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0].text, FALLBACK_QUESTIONS[0].text);
    }

    #[test]
    fn test_fallback_ids_are_unique() {
        let questions = fallback_questions(5);
        let mut ids: Vec<_> = questions.iter().map(|q| q.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_generation_prompt_includes_profiles() {
        let candidate = CandidateProfile {
            name: Some("Grace".to_string()),
            skills: vec![serde_json::json!("COBOL")],
            ..Default::default()
        };
        let job = JobProfile {
            position: Some("Compiler Engineer".to_string()),
            ..Default::default()
        };
        let prompt = build_generation_prompt(&candidate, &job, 4);
        assert!(prompt.contains("Grace"));
        assert!(prompt.contains("COBOL"));
        assert!(prompt.contains("Compiler Engineer"));
        assert!(prompt.contains("Generate 4"));
    }
}
