// src/state.rs
use std::sync::Arc;

use crate::config::Config;
use crate::services::metrics_manager::MetricsManager;
use crate::services::relay::ConversationRelay;
use crate::services::session_manager::SessionManager;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub relay: ConversationRelay,
    pub sessions: SessionManager,
    pub metrics: MetricsManager,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let relay = ConversationRelay::new(&config)?;
        let sessions = SessionManager::new(config.session_ttl);
        Ok(Self {
            config,
            relay,
            sessions,
            metrics: MetricsManager::new(),
        })
    }
}
