//! Session history
//!
//! Records which companion a user had a session with. The session
//! controller calls [`SessionHistory::record_usage`] fire-and-forget on
//! every session end; the HTTP layer serves the listings.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// One recorded companion usage.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub companion_id: Uuid,
    pub user_id: String,
    pub recorded_at: DateTime<Utc>,
}

/// History recording collaborator.
#[async_trait::async_trait]
pub trait SessionHistory: Send + Sync {
    /// Record that `user_id` completed a session with `companion_id`.
    async fn record_usage(&self, companion_id: Uuid, user_id: &str) -> Result<()>;

    /// Most recent sessions across all users, newest first.
    async fn recent(&self, limit: usize) -> Vec<HistoryEntry>;

    /// Most recent sessions of one user, newest first.
    async fn for_user(&self, user_id: &str, limit: usize) -> Vec<HistoryEntry>;
}

/// In-memory history recorder
pub struct InMemoryHistory {
    entries: Arc<RwLock<Vec<HistoryEntry>>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SessionHistory for InMemoryHistory {
    async fn record_usage(&self, companion_id: Uuid, user_id: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.push(HistoryEntry {
            companion_id,
            user_id: user_id.to_string(),
            recorded_at: Utc::now(),
        });
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Vec<HistoryEntry> {
        let entries = self.entries.read().await;
        entries.iter().rev().take(limit).cloned().collect()
    }

    async fn for_user(&self, user_id: &str, limit: usize) -> Vec<HistoryEntry> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .take(limit)
            .cloned()
            .collect()
    }
}
