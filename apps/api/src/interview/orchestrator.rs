//! Session Orchestrator — owns the interview lifecycle.
//!
//! State machine:
//!   Pending --start--> InProgress --advance past last question / finish--> Completed
//!   Pending | InProgress --cancel--> Cancelled
//!
//! Every operation locks the session entry for its full duration (model calls included),
//! so concurrent requests against one session run one at a time. Protocol errors are
//! returned before any mutation.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::InterviewError;
use crate::interview::evaluator::AnswerEvaluator;
use crate::interview::generator::QuestionGenerator;
use crate::interview::store::{SessionEntry, SessionStore, SharedEntry};
use crate::interview::topic::{TopicAction, TopicContext, TopicController, TopicDecision};
use crate::llm_client::ModelGateway;
use crate::models::interview::{
    overall_score, Answer, Evaluation, InterviewStatus, Question, Session,
};
use crate::models::profile::{CandidateProfile, JobProfile};

pub const MIN_QUESTION_COUNT: usize = 1;
pub const MAX_QUESTION_COUNT: usize = 10;

/// Client-supplied answer payload.
#[derive(Debug, Clone, Default)]
pub struct SubmitAnswerInput {
    /// Informational only; the answer is always recorded against the current question.
    pub question_id: Option<Uuid>,
    pub text: Option<String>,
    pub audio: Option<String>,
    pub duration_secs: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartedInterview {
    pub session: Session,
    pub current_question: Question,
}

#[derive(Debug, Clone, Serialize)]
pub struct NextQuestion {
    pub current_question: Question,
    pub question_index: usize,
    pub total_questions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinishedInterview {
    pub session: Session,
    pub overall_score: f64,
    pub final_feedback: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Advance {
    Next(NextQuestion),
    Finished(FinishedInterview),
}

pub struct InterviewOrchestrator {
    store: Arc<SessionStore>,
    gateway: Arc<dyn ModelGateway>,
    generator: QuestionGenerator,
    evaluator: AnswerEvaluator,
}

impl InterviewOrchestrator {
    pub fn new(store: Arc<SessionStore>, gateway: Arc<dyn ModelGateway>) -> Self {
        Self {
            store,
            generator: QuestionGenerator::new(gateway.clone()),
            evaluator: AnswerEvaluator::new(gateway.clone()),
            gateway,
        }
    }

    pub async fn create_session(
        &self,
        candidate: CandidateProfile,
        job: JobProfile,
        question_count: usize,
    ) -> Result<Session, InterviewError> {
        let count = question_count.clamp(MIN_QUESTION_COUNT, MAX_QUESTION_COUNT);
        let questions = self.generator.generate(&candidate, &job, count).await;
        if questions.is_empty() {
            return Err(InterviewError::GenerationFailed);
        }

        let session = Session::new(candidate, job, questions);
        info!(
            "Created interview session {} with {} questions",
            session.id,
            session.questions.len()
        );

        let snapshot = session.clone();
        self.store
            .insert(SessionEntry {
                session,
                topic: TopicController::new(self.gateway.clone()),
            })
            .await;
        debug!("{} sessions in store", self.store.len().await);
        Ok(snapshot)
    }

    pub async fn start_interview(&self, id: Uuid) -> Result<StartedInterview, InterviewError> {
        let entry = self.entry(id).await?;
        let mut guard = entry.lock().await;
        let session = &mut guard.session;

        match session.status {
            InterviewStatus::Pending | InterviewStatus::InProgress => {}
            from => {
                return Err(InterviewError::InvalidTransition {
                    from,
                    action: "start",
                })
            }
        }
        let current_question = session
            .current_question()
            .cloned()
            .ok_or(InterviewError::NoQuestions)?;

        if session.status == InterviewStatus::Pending {
            session.status = InterviewStatus::InProgress;
            session.started_at = Some(Utc::now());
            info!("Started interview {id}");
        }

        Ok(StartedInterview {
            session: session.clone(),
            current_question,
        })
    }

    pub async fn submit_answer(
        &self,
        id: Uuid,
        input: SubmitAnswerInput,
    ) -> Result<Evaluation, InterviewError> {
        let entry = self.entry(id).await?;
        let mut guard = entry.lock().await;
        let session = &mut guard.session;

        if session.status != InterviewStatus::InProgress {
            return Err(InterviewError::NoCurrentQuestion);
        }
        let question = session
            .current_question()
            .cloned()
            .ok_or(InterviewError::NoCurrentQuestion)?;
        if session.answers.iter().any(|a| a.question_id == question.id) {
            return Err(InterviewError::QuestionAlreadyAnswered(question.id));
        }
        if let Some(claimed) = input.question_id.filter(|q| *q != question.id) {
            warn!(
                "Answer for session {id} names question {claimed}, recording against current question {}",
                question.id
            );
        }

        let answer = Answer {
            question_id: question.id,
            text: input.text,
            audio: input.audio,
            duration_secs: input.duration_secs,
            created_at: Utc::now(),
        };
        let evaluation = self
            .evaluator
            .evaluate(
                &question,
                &answer,
                Some(&session.candidate_profile),
                Some(&session.job_profile),
            )
            .await;

        // Answer and evaluation are appended together.
        session.answers.push(answer);
        session.evaluations.push(evaluation.clone());
        debug_assert!(session.records_consistent());
        info!(
            "Recorded evaluation for session {id} question {}: score={}",
            session.current_question_index, evaluation.score
        );

        Ok(evaluation)
    }

    pub async fn advance_question(&self, id: Uuid) -> Result<Advance, InterviewError> {
        let entry = self.entry(id).await?;
        let mut guard = entry.lock().await;

        let status = guard.session.status;
        match status {
            InterviewStatus::InProgress => {}
            InterviewStatus::Completed => {
                return Ok(Advance::Finished(self.finish_locked(&mut guard).await))
            }
            from => {
                return Err(InterviewError::InvalidTransition {
                    from,
                    action: "advance",
                })
            }
        }

        let session = &mut guard.session;
        let total_questions = session.questions.len();
        let next_index = session.current_question_index + 1;
        session.current_question_index = next_index.min(total_questions);
        let next_question = session.questions.get(next_index).cloned();

        match next_question {
            Some(current_question) => {
                info!("Session {id} advanced to question {next_index}");
                Ok(Advance::Next(NextQuestion {
                    current_question,
                    question_index: next_index,
                    total_questions,
                }))
            }
            None => Ok(Advance::Finished(self.finish_locked(&mut guard).await)),
        }
    }

    /// Re-finishing a completed session recomputes the score and keeps the stored report.
    pub async fn finish_interview(&self, id: Uuid) -> Result<FinishedInterview, InterviewError> {
        let entry = self.entry(id).await?;
        let mut guard = entry.lock().await;

        if guard.session.status == InterviewStatus::Cancelled {
            return Err(InterviewError::InvalidTransition {
                from: InterviewStatus::Cancelled,
                action: "finish",
            });
        }
        Ok(self.finish_locked(&mut guard).await)
    }

    pub async fn cancel_interview(&self, id: Uuid) -> Result<Session, InterviewError> {
        let entry = self.entry(id).await?;
        let mut guard = entry.lock().await;
        let session = &mut guard.session;

        match session.status {
            InterviewStatus::Pending | InterviewStatus::InProgress => {
                session.status = InterviewStatus::Cancelled;
                session.ended_at = Some(Utc::now());
                info!("Cancelled interview {id}");
                Ok(session.clone())
            }
            from => Err(InterviewError::InvalidTransition {
                from,
                action: "cancel",
            }),
        }
    }

    /// Asks the session's topic controller what should happen next. Does not move the cursor.
    pub async fn plan_next(
        &self,
        id: Uuid,
        action: Option<TopicAction>,
        topic: Option<&str>,
    ) -> Result<TopicDecision, InterviewError> {
        let entry = self.entry(id).await?;
        let mut guard = entry.lock().await;
        let SessionEntry {
            session,
            topic: controller,
        } = &mut *guard;

        if session.status != InterviewStatus::InProgress {
            return Err(InterviewError::InvalidTransition {
                from: session.status,
                action: "plan",
            });
        }

        let current_question = session.current_question();
        let answer = session
            .latest_answer()
            .filter(|a| current_question.is_some_and(|q| q.id == a.question_id));
        let ctx = TopicContext {
            current_index: session.current_question_index,
            questions: &session.questions,
            current_question,
            answer,
            topic,
        };

        let decision = controller.decide(action, &ctx).await;
        debug!(
            "Planned next step for session {id}: {decision:?} (topic depth {})",
            controller.current_depth()
        );
        Ok(decision)
    }

    pub async fn get_session(&self, id: Uuid) -> Result<Session, InterviewError> {
        let entry = self.entry(id).await?;
        let guard = entry.lock().await;
        Ok(guard.session.clone())
    }

    async fn entry(&self, id: Uuid) -> Result<SharedEntry, InterviewError> {
        self.store
            .get(id)
            .await
            .ok_or(InterviewError::SessionNotFound(id))
    }

    async fn finish_locked(&self, entry: &mut SessionEntry) -> FinishedInterview {
        let session = &mut entry.session;
        let score = overall_score(&session.evaluations);

        let feedback = match (&session.status, &session.final_feedback) {
            (InterviewStatus::Completed, Some(existing)) => existing.clone(),
            _ => {
                self.evaluator
                    .synthesize_final_report(
                        &session.evaluations,
                        Some(&session.candidate_profile),
                        Some(&session.job_profile),
                    )
                    .await
            }
        };

        session.status = InterviewStatus::Completed;
        session.overall_score = Some(score);
        session.final_feedback = Some(feedback.clone());
        session.ended_at.get_or_insert_with(Utc::now);
        info!(
            "Interview {} completed: overall_score={score}",
            session.id
        );

        FinishedInterview {
            session: session.clone(),
            overall_score: score,
            final_feedback: feedback,
        }
    }
}
