//! Scripted Model Gateway for tests.
//!
//! Responses are consumed in order. Once the script runs dry every call fails with a
//! transport error, so an empty script behaves like an unreachable provider.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{LlmError, ModelGateway};

/// One recorded call, for verification.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

#[derive(Debug, Default)]
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGateway {
    /// A gateway that fails every call.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.responses
            .lock()
            .expect("script lock poisoned")
            .push_back(Ok(text.into()));
        self
    }

    pub fn with_error(self, err: LlmError) -> Self {
        self.responses
            .lock()
            .expect("script lock poisoned")
            .push_back(Err(err));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock poisoned").len()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, LlmError> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(RecordedCall {
                system: system.to_string(),
                user: user.to_string(),
                temperature,
            });

        self.responses
            .lock()
            .expect("script lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Transport("connection refused".to_string())))
    }
}
