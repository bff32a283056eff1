use crate::companion::Companion;
use serde::Serialize;

/// Everything a voice backend needs to establish one lesson call.
///
/// Built from a companion descriptor; the descriptor itself never crosses
/// the provider boundary.
#[derive(Debug, Clone, Serialize)]
pub struct CallRequest {
    /// Display name the assistant introduces itself with.
    pub companion_name: String,

    /// Voice configuration for the synthesized side of the call.
    pub voice: CallVoice,

    /// Variable bindings substituted into the assistant's instructions.
    pub variables: CallVariables,

    /// Message kinds the backend should push to this client.
    pub client_messages: Vec<ClientMessageKind>,

    /// Message kinds replicated server-side. Always empty: transcripts are
    /// collected client-side only.
    pub server_messages: Vec<String>,

    /// Suppress interim transcript fragments; only finalized transcripts
    /// are delivered.
    pub final_transcripts_only: bool,
}

/// Voice parameters of the companion persona.
#[derive(Debug, Clone, Serialize)]
pub struct CallVoice {
    pub voice: String,
    pub style: String,
}

/// Lesson variables bound into the call.
#[derive(Debug, Clone, Serialize)]
pub struct CallVariables {
    pub subject: String,
    pub topic: String,
    pub style: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientMessageKind {
    Transcript,
}

impl CallRequest {
    /// Assemble the call parameters for a lesson with `companion`.
    pub fn for_companion(companion: &Companion) -> Self {
        Self {
            companion_name: companion.name.clone(),
            voice: CallVoice {
                voice: companion.voice.clone(),
                style: companion.style.clone(),
            },
            variables: CallVariables {
                subject: companion.subject.clone(),
                topic: companion.topic.clone(),
                style: companion.style.clone(),
            },
            client_messages: vec![ClientMessageKind::Transcript],
            server_messages: Vec::new(),
            final_transcripts_only: true,
        }
    }

    /// True when the request asks for client-side finalized transcripts and
    /// nothing else.
    pub fn transcripts_only(&self) -> bool {
        self.client_messages == [ClientMessageKind::Transcript]
            && self.server_messages.is_empty()
            && self.final_transcripts_only
    }
}
