use serde::{Deserialize, Serialize};

/// Event pushed by the voice backend over its event stream.
///
/// The wire shape mirrors what browser voice SDKs emit: a kebab-case event
/// tag, with message payload fields inlined next to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ProviderEvent {
    /// The call is established and audio is flowing.
    CallStart,
    /// The call terminated, whether locally or remotely initiated.
    CallEnd,
    /// An in-call message; only finalized transcripts are meaningful here.
    Message(CallMessage),
    /// Fatal runtime error for the current call.
    Error { message: String },
    /// The remote party started vocalizing.
    SpeechStart,
    /// The remote party stopped vocalizing.
    SpeechEnd,
}

/// Payload of a [`ProviderEvent::Message`] event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub transcript_type: TranscriptKind,
    pub role: MessageRole,
    pub transcript: String,
}

impl CallMessage {
    pub fn final_transcript(role: MessageRole, transcript: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Transcript,
            transcript_type: TranscriptKind::Final,
            role,
            transcript: transcript.into(),
        }
    }

    pub fn partial_transcript(role: MessageRole, transcript: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Transcript,
            transcript_type: TranscriptKind::Partial,
            role,
            transcript: transcript.into(),
        }
    }

    /// True for the one shape the session core stores: a transcript message
    /// the backend has marked complete.
    pub fn is_final_transcript(&self) -> bool {
        self.kind == MessageKind::Transcript && self.transcript_type == TranscriptKind::Final
    }
}

/// Message kind discriminator. Backends emit kinds beyond transcripts
/// (status updates, function calls); everything unknown folds into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Transcript,
    #[serde(other)]
    Other,
}

/// Whether a transcript fragment is still subject to revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptKind {
    Partial,
    Final,
}

/// Which side of the call produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}
