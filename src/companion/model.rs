use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A configured AI tutor persona.
///
/// Immutable input to the session core: the controller reads it to
/// parameterize calls and render labels, never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Companion {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    pub topic: String,
    pub voice: String,
    pub style: String,

    /// Intended lesson length shown in the catalog.
    pub duration_minutes: u32,

    /// User id of the creator.
    pub author: String,

    pub bookmarked: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a companion.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCompanion {
    pub name: String,
    pub subject: String,
    pub topic: String,
    pub voice: String,
    pub style: String,
    pub duration_minutes: u32,
    pub author: String,
}

impl Companion {
    pub fn create(new: NewCompanion) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: new.name,
            subject: new.subject,
            topic: new.topic,
            voice: new.voice,
            style: new.style,
            duration_minutes: new.duration_minutes,
            author: new.author,
            bookmarked: false,
            created_at: Utc::now(),
        }
    }
}
