//! Voice-lesson session core
//!
//! This module provides the `SessionController` abstraction that manages:
//! - Session lifecycle (idle → connecting → active → ended)
//! - Ingestion of the voice backend's lifecycle/transcript event stream
//! - The rolling transcript of finalized utterances
//! - Microphone mute state during an active call
//! - History notification on session end

mod controller;
mod snapshot;
mod transcript;

pub use controller::{CallStatus, SessionController, SessionDescriptor, SessionError};
pub use snapshot::SessionSnapshot;
pub use transcript::{Speaker, Utterance};
