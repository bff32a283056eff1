use crate::provider::MessageRole;
use serde::{Deserialize, Serialize};

/// Which party spoke an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Companion,
}

impl From<MessageRole> for Speaker {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::User => Speaker::User,
            MessageRole::Assistant => Speaker::Companion,
        }
    }
}

/// One finalized spoken turn.
///
/// Interim fragments never become utterances; the transcript holds only
/// turns the backend marked complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker: Speaker,
    pub text: String,
}

impl Utterance {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}
