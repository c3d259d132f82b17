//! Per-session push notifications.
//!
//! Each session gets a broadcast channel the first time someone subscribes to it.
//! Publishing never fails the caller: with no subscribers the event is simply dropped,
//! and slow receivers lose the oldest events once the channel is full.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    InterviewStarted,
    Evaluation,
    NextQuestion,
    InterviewComplete,
    InterviewFinished,
    InterviewCancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterviewEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub session_id: Uuid,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

pub struct EventBus {
    channels: RwLock<HashMap<Uuid, broadcast::Sender<InterviewEvent>>>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub async fn subscribe(&self, session_id: Uuid) -> broadcast::Receiver<InterviewEvent> {
        let mut channels = self.channels.write().await;
        channels
            .entry(session_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Drops the session's channel once its last subscriber has gone.
    pub async fn release(&self, session_id: Uuid) {
        let mut channels = self.channels.write().await;
        if channels
            .get(&session_id)
            .is_some_and(|tx| tx.receiver_count() == 0)
        {
            channels.remove(&session_id);
            debug!("Released event channel for session {session_id}");
        }
    }

    /// Returns the number of subscribers that received the event.
    pub async fn publish(&self, session_id: Uuid, kind: EventKind, data: impl Serialize) -> usize {
        let data = match serde_json::to_value(data) {
            Ok(v) => v,
            Err(e) => {
                warn!("Dropping {kind:?} event for session {session_id}: {e}");
                return 0;
            }
        };

        let channels = self.channels.read().await;
        let Some(tx) = channels.get(&session_id) else {
            return 0;
        };
        let event = InterviewEvent {
            kind,
            session_id,
            data,
            timestamp: Utc::now(),
        };
        tx.send(event).unwrap_or(0)
    }

    pub async fn subscriber_count(&self, session_id: Uuid) -> usize {
        self.channels
            .read()
            .await
            .get(&session_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}
