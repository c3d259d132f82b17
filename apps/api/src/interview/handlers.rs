use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
    Json,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::events::{EventKind, InterviewEvent};
use crate::interview::orchestrator::{
    Advance, FinishedInterview, NextQuestion, StartedInterview, SubmitAnswerInput,
};
use crate::interview::topic::{TopicAction, TopicDecision};
use crate::models::interview::{Evaluation, InterviewStatus, Question, Session};
use crate::models::profile::{CandidateProfile, JobProfile};
use crate::routes::{ok, ApiResponse};
use crate::state::AppState;

type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default, alias = "resume_analysis")]
    pub candidate_profile: CandidateProfile,
    #[serde(default, alias = "job_analysis")]
    pub job_profile: JobProfile,
    pub question_count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CreatedSession {
    pub session_id: Uuid,
    pub status: InterviewStatus,
    pub total_questions: usize,
    pub questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub session_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub session_id: Uuid,
    pub question_id: Option<Uuid>,
    pub answer_text: Option<String>,
    pub answer_audio: Option<String>,
    /// Seconds spent answering.
    pub duration: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PlanNextRequest {
    pub session_id: Uuid,
    pub action: Option<TopicAction>,
    pub topic: Option<String>,
}

/// POST /api/interview/create-session
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> ApiResult<CreatedSession> {
    let count = req
        .question_count
        .unwrap_or(state.config.default_question_count);
    let session = state
        .orchestrator
        .create_session(req.candidate_profile, req.job_profile, count)
        .await?;

    Ok(ok(CreatedSession {
        session_id: session.id,
        status: session.status,
        total_questions: session.questions.len(),
        questions: session.questions,
    }))
}

/// POST /api/interview/start
pub async fn handle_start(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> ApiResult<StartedInterview> {
    let started = state.orchestrator.start_interview(req.session_id).await?;
    state
        .events
        .publish(
            req.session_id,
            EventKind::InterviewStarted,
            json!({ "current_question": started.current_question }),
        )
        .await;
    Ok(ok(started))
}

/// POST /api/interview/submit-answer
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Json(req): Json<SubmitAnswerRequest>,
) -> ApiResult<Evaluation> {
    let text = req.answer_text.filter(|t| !t.trim().is_empty());
    let audio = req.answer_audio.filter(|a| !a.is_empty());
    if text.is_none() && audio.is_none() {
        return Err(AppError::Validation(
            "answer_text or answer_audio is required".to_string(),
        ));
    }

    let evaluation = state
        .orchestrator
        .submit_answer(
            req.session_id,
            SubmitAnswerInput {
                question_id: req.question_id,
                text,
                audio,
                duration_secs: req.duration,
            },
        )
        .await?;
    state
        .events
        .publish(req.session_id, EventKind::Evaluation, &evaluation)
        .await;
    Ok(ok(evaluation))
}

/// POST /api/interview/next-question
pub async fn handle_next_question(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> ApiResult<Advance> {
    let advance = state.orchestrator.advance_question(req.session_id).await?;
    match &advance {
        Advance::Next(NextQuestion {
            current_question,
            question_index,
            total_questions,
        }) => {
            state
                .events
                .publish(
                    req.session_id,
                    EventKind::NextQuestion,
                    json!({
                        "current_question": current_question,
                        "question_index": question_index,
                        "total_questions": total_questions,
                    }),
                )
                .await;
        }
        Advance::Finished(finished) => {
            publish_finished(&state, EventKind::InterviewComplete, finished).await;
        }
    }
    Ok(ok(advance))
}

/// POST /api/interview/finish
pub async fn handle_finish(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> ApiResult<FinishedInterview> {
    let finished = state.orchestrator.finish_interview(req.session_id).await?;
    publish_finished(&state, EventKind::InterviewFinished, &finished).await;
    Ok(ok(finished))
}

/// POST /api/interview/cancel
pub async fn handle_cancel(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> ApiResult<Session> {
    let session = state.orchestrator.cancel_interview(req.session_id).await?;
    state
        .events
        .publish(
            req.session_id,
            EventKind::InterviewCancelled,
            json!({ "status": session.status }),
        )
        .await;
    Ok(ok(session))
}

/// POST /api/interview/plan-next
pub async fn handle_plan_next(
    State(state): State<AppState>,
    Json(req): Json<PlanNextRequest>,
) -> ApiResult<TopicDecision> {
    let decision = state
        .orchestrator
        .plan_next(req.session_id, req.action, req.topic.as_deref())
        .await?;
    Ok(ok(decision))
}

/// GET /api/interview/session/:session_id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Session> {
    let session = state.orchestrator.get_session(session_id).await?;
    Ok(ok(session))
}

/// GET /api/interview/ws/:session_id
pub async fn handle_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Response, AppError> {
    // Reject unknown sessions before upgrading.
    state.orchestrator.get_session(session_id).await?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, session_id, state)))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Ping,
}

async fn handle_socket(socket: WebSocket, session_id: Uuid, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.events.subscribe(session_id).await;
    debug!(
        "Subscriber connected to session {session_id} ({} listening)",
        state.events.subscriber_count(session_id).await
    );

    // Replies to client pings share the socket sink with forwarded events.
    let (pong_tx, mut pong_rx) = tokio::sync::mpsc::channel::<()>(8);

    let mut send_task = tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => event_frame(&event),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Subscriber for session {session_id} lagged by {skipped} events");
                        continue;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                },
                pong = pong_rx.recv() => match pong {
                    Some(()) => Some(json!({ "type": "pong" }).to_string()),
                    None => break,
                },
            };
            let Some(frame) = frame else { continue };
            if let Err(e) = sender.send(Message::Text(frame)).await {
                debug!("Send error on session {session_id} socket: {e}");
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Ping) => {
                        trace!("Received ping on session {session_id}");
                        if pong_tx.send(()).await.is_err() {
                            break;
                        }
                    }
                    Err(_) => trace!("Ignoring unrecognised client message"),
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("Receive error on session {session_id} socket: {e}");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => {
            send_task.abort();
            // The receiver must be dropped before the channel can be released.
            let _ = send_task.await;
        }
    }

    state.events.release(session_id).await;
    debug!("Subscriber disconnected from session {session_id}");
}

fn event_frame(event: &InterviewEvent) -> Option<String> {
    serde_json::to_string(event).ok()
}

async fn publish_finished(state: &AppState, kind: EventKind, finished: &FinishedInterview) {
    state
        .events
        .publish(
            finished.session.id,
            kind,
            json!({
                "overall_score": finished.overall_score,
                "final_feedback": finished.final_feedback,
            }),
        )
        .await;
}
