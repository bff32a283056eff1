//! Voice Session Provider abstraction
//!
//! The session controller never talks to a voice SDK directly; it drives a
//! [`VoiceProvider`] trait object injected at construction. This module
//! holds the trait, the call parameter types, the event stream types, and
//! the bundled scripted backend.

pub mod backend;
pub mod call;
pub mod events;
pub mod scripted;

pub use backend::{ProviderError, ProviderFactory, ProviderKind, VoiceProvider};
pub use call::{CallRequest, CallVariables, CallVoice, ClientMessageKind};
pub use events::{CallMessage, MessageKind, MessageRole, ProviderEvent, TranscriptKind};
pub use scripted::{ScriptedLine, ScriptedProvider};
