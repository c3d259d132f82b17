//! Topic Controller — decides whether to move on, follow up, or probe deeper.
//!
//! One controller per session. `current_depth` counts consecutive deep dives on the
//! current topic and resets on a topic switch. Every model failure here fails closed:
//! the interview moves on rather than stalling.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::interview::prompts::{
    DEEP_DIVE_PROMPT_TEMPLATE, DEEP_DIVE_TASK, FOLLOW_UP_JUDGMENT_TASK, FOLLOW_UP_PROMPT_TEMPLATE,
    FOLLOW_UP_TASK, TOPIC_ROLE,
};
use crate::llm_client::prompts::{system_prompt, system_prompt_with, PLAIN_QUESTION_INSTRUCTION};
use crate::llm_client::ModelGateway;
use crate::models::interview::{Answer, Question};

pub const MAX_DEPTH: u32 = 3;

const JUDGMENT_TEMPERATURE: f32 = 0.1;
const QUESTION_TEMPERATURE: f32 = 0.7;

const FALLBACK_FOLLOW_UP: &str = "Could you explain that part in more detail?";
const FALLBACK_DEEP_DIVE: &str =
    "What if the scenario were more complex? How would you approach it then?";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicAction {
    #[default]
    NextQuestion,
    FollowUp,
    DeepDive,
    TopicSwitch,
}

/// What the controller sees when making a decision.
#[derive(Debug, Clone, Copy)]
pub struct TopicContext<'a> {
    pub current_index: usize,
    pub questions: &'a [Question],
    pub current_question: Option<&'a Question>,
    pub answer: Option<&'a Answer>,
    pub topic: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TopicDecision {
    InterviewComplete,
    NextQuestion {
        next_question_index: usize,
        next_question: Question,
    },
    FollowUp {
        follow_up_question: String,
    },
    DeepDive {
        deep_dive_question: String,
        current_depth: u32,
    },
}

pub struct TopicController {
    gateway: Arc<dyn ModelGateway>,
    current_depth: u32,
    max_depth: u32,
}

impl TopicController {
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self {
            gateway,
            current_depth: 0,
            max_depth: MAX_DEPTH,
        }
    }

    pub fn current_depth(&self) -> u32 {
        self.current_depth
    }

    /// Dispatches on `action`; `None` means `NextQuestion`.
    pub async fn decide(
        &mut self,
        action: Option<TopicAction>,
        ctx: &TopicContext<'_>,
    ) -> TopicDecision {
        match action.unwrap_or_default() {
            TopicAction::NextQuestion => {
                next_question(ctx.current_index, ctx.questions.len(), ctx.questions)
            }
            TopicAction::FollowUp => self.follow_up(ctx).await,
            TopicAction::DeepDive => self.deep_dive(ctx).await,
            TopicAction::TopicSwitch => self.topic_switch(ctx),
        }
    }

    pub async fn follow_up(&self, ctx: &TopicContext<'_>) -> TopicDecision {
        let (Some(question), Some(answer)) = (ctx.current_question, ctx.answer) else {
            return next_question(ctx.current_index, ctx.questions.len(), ctx.questions);
        };

        if !self.should_follow_up(question, answer).await {
            return next_question(ctx.current_index, ctx.questions.len(), ctx.questions);
        }

        let system = system_prompt_with(TOPIC_ROLE, FOLLOW_UP_TASK, PLAIN_QUESTION_INSTRUCTION);
        let follow_up_question = self
            .generate_question(&system, &answer_prompt(question, answer), FALLBACK_FOLLOW_UP)
            .await;

        TopicDecision::FollowUp { follow_up_question }
    }

    pub async fn deep_dive(&mut self, ctx: &TopicContext<'_>) -> TopicDecision {
        if self.current_depth >= self.max_depth {
            debug!("Max topic depth {} reached, moving on", self.max_depth);
            return next_question(ctx.current_index, ctx.questions.len(), ctx.questions);
        }

        let topic = ctx
            .topic
            .or_else(|| ctx.current_question.map(|q| q.text.as_str()))
            .unwrap_or("the current topic");
        let answer_text = ctx.answer.and_then(|a| a.text.as_deref()).unwrap_or("");
        let user = DEEP_DIVE_PROMPT_TEMPLATE
            .replace("{topic}", topic)
            .replace("{answer_text}", answer_text);
        let system = system_prompt_with(TOPIC_ROLE, DEEP_DIVE_TASK, PLAIN_QUESTION_INSTRUCTION);

        let deep_dive_question = self
            .generate_question(&system, &user, FALLBACK_DEEP_DIVE)
            .await;
        self.current_depth += 1;

        TopicDecision::DeepDive {
            deep_dive_question,
            current_depth: self.current_depth,
        }
    }

    pub fn topic_switch(&mut self, ctx: &TopicContext<'_>) -> TopicDecision {
        self.current_depth = 0;
        next_question(ctx.current_index, ctx.questions.len(), ctx.questions)
    }

    async fn should_follow_up(&self, question: &Question, answer: &Answer) -> bool {
        let system = system_prompt(TOPIC_ROLE, FOLLOW_UP_JUDGMENT_TASK);
        match self
            .gateway
            .complete(&system, &answer_prompt(question, answer), JUDGMENT_TEMPERATURE)
            .await
        {
            Ok(response) => is_affirmative(&response),
            Err(e) => {
                warn!("Follow-up judgment failed, moving on: {e}");
                false
            }
        }
    }

    async fn generate_question(&self, system: &str, user: &str, fallback: &str) -> String {
        match self
            .gateway
            .complete(system, user, QUESTION_TEMPERATURE)
            .await
        {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => fallback.to_string(),
            Err(e) => {
                warn!("Probing question generation failed: {e}");
                fallback.to_string()
            }
        }
    }
}

/// Complete when `current_index` is the last question, else the next one.
pub fn next_question(current_index: usize, total: usize, questions: &[Question]) -> TopicDecision {
    if current_index + 1 >= total {
        return TopicDecision::InterviewComplete;
    }
    let next_index = current_index + 1;
    match questions.get(next_index) {
        Some(question) => TopicDecision::NextQuestion {
            next_question_index: next_index,
            next_question: question.clone(),
        },
        None => TopicDecision::InterviewComplete,
    }
}

fn answer_prompt(question: &Question, answer: &Answer) -> String {
    FOLLOW_UP_PROMPT_TEMPLATE
        .replace("{question}", &question.text)
        .replace("{answer_text}", answer.text.as_deref().unwrap_or(""))
        .replace("{duration}", &answer.duration_secs.unwrap_or(0).to_string())
}

/// Whole-word "yes", or a bare 是 that is not part of 不是.
fn is_affirmative(response: &str) -> bool {
    let english = response
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| word == "yes");
    english || response.replace("不是", "").contains('是')
}
