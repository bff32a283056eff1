pub mod companion;
pub mod config;
pub mod history;
pub mod http;
pub mod provider;
pub mod session;

pub use companion::{Companion, CompanionQuery, CompanionStore, NewCompanion};
pub use config::Config;
pub use history::{HistoryEntry, InMemoryHistory, SessionHistory};
pub use http::{create_router, AppState};
pub use provider::{
    CallRequest, ProviderError, ProviderEvent, ProviderFactory, ProviderKind, ScriptedProvider,
    VoiceProvider,
};
pub use session::{
    CallStatus, SessionController, SessionDescriptor, SessionError, SessionSnapshot, Speaker,
    Utterance,
};
