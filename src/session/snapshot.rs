use super::controller::CallStatus;
use super::transcript::Utterance;
use serde::Serialize;

/// Point-in-time copy of a session's observable state.
///
/// The visual flags are derived, not stored: renderers read them instead of
/// re-encoding status comparisons.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub status: CallStatus,

    /// True while the companion is vocalizing.
    pub speaking: bool,

    /// Local microphone mute state; meaningful only while active.
    pub muted: bool,

    /// User-facing notice from the most recent failure, if any.
    pub notice: Option<String>,

    /// Finalized utterances, newest first.
    pub transcript: Vec<Utterance>,
}

impl SessionSnapshot {
    /// The still avatar is shown outside of an active call.
    pub fn avatar_resting(&self) -> bool {
        matches!(
            self.status,
            CallStatus::Idle | CallStatus::Connecting | CallStatus::Ended
        )
    }

    /// The animated avatar is shown only during an active call.
    pub fn avatar_live(&self) -> bool {
        self.status == CallStatus::Active
    }

    /// Pulse animation while the call is being established.
    pub fn connecting_pulse(&self) -> bool {
        self.status == CallStatus::Connecting
    }

    /// The microphone control responds only during an active call.
    pub fn mic_interactive(&self) -> bool {
        self.status == CallStatus::Active
    }
}
