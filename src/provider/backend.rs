use super::call::CallRequest;
use super::events::ProviderEvent;
use super::scripted::ScriptedProvider;
use anyhow::Result;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Real-time voice backend driven by the session controller.
///
/// Implementations wrap a concrete voice SDK or transport. The controller
/// issues commands through this trait and consumes the event stream
/// returned by [`VoiceProvider::events`]; it never talks to an SDK object
/// directly.
#[async_trait::async_trait]
pub trait VoiceProvider: Send + Sync {
    /// Establish a call configured from `request`.
    ///
    /// Resolves once the transport accepted the request; the call itself is
    /// only live after the backend emits [`ProviderEvent::CallStart`].
    async fn start_call(&self, request: CallRequest) -> Result<(), ProviderError>;

    /// Tear the active call down.
    async fn stop_call(&self) -> Result<(), ProviderError>;

    /// Apply local microphone mute state.
    fn set_muted(&self, muted: bool);

    /// Current microphone mute state; false when the backend cannot tell.
    fn is_muted(&self) -> bool;

    /// Subscribe to the call lifecycle/transcript event stream.
    ///
    /// Subscriptions outlive individual calls; one receiver sees the events
    /// of every call made through this backend.
    fn events(&self) -> broadcast::Receiver<ProviderEvent>;

    /// Get backend name for logging.
    fn name(&self) -> &str;
}

/// Failure reported by a voice backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// The realtime transport could not come up at all, typically an
    /// insecure origin or missing microphone permission.
    #[error("transport unavailable: {0}")]
    Transport(String),

    /// Any other failure reported by the backend.
    #[error("{0}")]
    Call(String),
}

impl ProviderError {
    /// Raw SDK error messages matching one of these markers are treated as
    /// transport failures.
    const TRANSPORT_MARKERS: [&'static str; 3] = ["webrtc", "permission", "secure context"];

    /// Classify a raw backend error message into the transport/other split.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if Self::TRANSPORT_MARKERS.iter().any(|m| lower.contains(m)) {
            ProviderError::Transport(message)
        } else {
            ProviderError::Call(message)
        }
    }
}

/// Which voice backend to wire into new sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Deterministic in-process backend replaying a canned lesson.
    Scripted,
}

/// Voice backend factory
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a backend instance for one session.
    pub fn create(kind: ProviderKind) -> Result<Arc<dyn VoiceProvider>> {
        match kind {
            ProviderKind::Scripted => Ok(Arc::new(ScriptedProvider::with_default_script())),
        }
    }
}
