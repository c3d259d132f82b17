use std::sync::Arc;

use crate::config::Config;
use crate::interview::events::EventBus;
use crate::interview::orchestrator::InterviewOrchestrator;
use crate::interview::store::SessionStore;
use crate::llm_client::ModelGateway;
use crate::profile::analyzer::ProfileAnalyzer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<InterviewOrchestrator>,
    pub analyzer: ProfileAnalyzer,
    /// Per-session push channels fed by the interview handlers.
    pub events: Arc<EventBus>,
    pub config: Config,
}

impl AppState {
    /// Wires every component to the same model gateway and a fresh in-memory store.
    pub fn new(config: Config, gateway: Arc<dyn ModelGateway>) -> Self {
        let store = Arc::new(SessionStore::new());
        Self {
            orchestrator: Arc::new(InterviewOrchestrator::new(store, gateway.clone())),
            analyzer: ProfileAnalyzer::new(gateway),
            events: Arc::new(EventBus::new(config.event_channel_capacity)),
            config,
        }
    }
}
