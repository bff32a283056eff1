use crate::companion::CompanionStore;
use crate::history::{InMemoryHistory, SessionHistory};
use crate::provider::ProviderKind;
use crate::session::SessionController;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Companion catalog
    pub companions: CompanionStore,

    /// Session history recorder shared with every controller
    pub history: Arc<dyn SessionHistory>,

    /// Live session controllers (companion_id → controller)
    pub sessions: Arc<RwLock<HashMap<Uuid, Arc<SessionController>>>>,

    /// Voice backend wired into newly launched sessions
    pub provider_kind: ProviderKind,
}

impl AppState {
    pub fn new(provider_kind: ProviderKind) -> Self {
        Self {
            companions: CompanionStore::new(),
            history: Arc::new(InMemoryHistory::new()),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            provider_kind,
        }
    }
}
