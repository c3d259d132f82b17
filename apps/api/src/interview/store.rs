//! In-memory session store. Sessions live for the lifetime of the process.
//!
//! The map lock is held only long enough to look up or insert an entry. Each entry has
//! its own mutex, which callers hold for the full duration of an operation so that
//! operations on one session are serialized.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::interview::topic::TopicController;
use crate::models::interview::Session;

pub struct SessionEntry {
    pub session: Session,
    pub topic: TopicController,
}

pub type SharedEntry = Arc<Mutex<SessionEntry>>;

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SharedEntry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, entry: SessionEntry) -> SharedEntry {
        let id = entry.session.id;
        let shared = Arc::new(Mutex::new(entry));
        self.sessions.write().await.insert(id, shared.clone());
        shared
    }

    pub async fn get(&self, id: Uuid) -> Option<SharedEntry> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
