//! Application State

use std::sync::Arc;

use agent_core::{Agent, MemorySessionStore, SessionStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The trip planner agent; `None` when no provider could be configured
    pub agent: Option<Arc<Agent>>,

    /// Conversations for the lifetime of the process
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(agent: Option<Agent>) -> Self {
        Self {
            agent: agent.map(Arc::new),
            sessions: Arc::new(MemorySessionStore::new()),
        }
    }

    /// Name of the configured provider, if any
    pub fn provider_name(&self) -> Option<&str> {
        self.agent.as_ref().map(|agent| agent.provider().name())
    }
}
