use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::ChatBackend;
use crate::session::manager::SessionManager;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Registry of live sessions. Constructed at startup and injected; never
    /// reached through a global.
    pub sessions: SessionManager,
    /// Pluggable upstream backend. Production: GreenPtClient. Tests: a
    /// scripted fake.
    pub backend: Arc<dyn ChatBackend>,
    pub config: Config,
}
