use super::model::{Companion, NewCompanion};
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Catalog listing filters.
///
/// `subject` filters on the subject field; `topic` matches against topic OR
/// name. Both are case-insensitive substring matches. Results are paginated
/// with 1-based pages.
#[derive(Debug, Clone)]
pub struct CompanionQuery {
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub limit: usize,
    pub page: usize,
}

impl Default for CompanionQuery {
    fn default() -> Self {
        Self {
            subject: None,
            topic: None,
            limit: 10,
            page: 1,
        }
    }
}

/// In-memory companion catalog
#[derive(Clone)]
pub struct CompanionStore {
    companions: Arc<RwLock<Vec<Companion>>>,
}

impl CompanionStore {
    pub fn new() -> Self {
        Self {
            companions: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create a companion and return the stored descriptor.
    pub async fn create(&self, new: NewCompanion) -> Companion {
        let companion = Companion::create(new);
        info!(
            "Created companion {} ({} / {})",
            companion.id, companion.subject, companion.topic
        );

        let mut companions = self.companions.write().await;
        companions.push(companion.clone());
        companion
    }

    pub async fn get(&self, id: Uuid) -> Option<Companion> {
        let companions = self.companions.read().await;
        companions.iter().find(|c| c.id == id).cloned()
    }

    /// List companions matching `query`, newest first.
    pub async fn list(&self, query: &CompanionQuery) -> Vec<Companion> {
        let companions = self.companions.read().await;

        let mut matches: Vec<Companion> = companions
            .iter()
            .filter(|c| Self::matches(c, query))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let start = query.page.saturating_sub(1) * query.limit;
        matches.into_iter().skip(start).take(query.limit).collect()
    }

    /// Companions created by `author`, non-bookmarked first, then newest
    /// first, matching the "my companions" page ordering.
    pub async fn for_author(&self, author: &str) -> Vec<Companion> {
        let companions = self.companions.read().await;

        let mut owned: Vec<Companion> = companions
            .iter()
            .filter(|c| c.author == author)
            .cloned()
            .collect();
        owned.sort_by(|a, b| {
            a.bookmarked
                .cmp(&b.bookmarked)
                .then(b.created_at.cmp(&a.created_at))
        });
        owned
    }

    pub async fn set_bookmarked(&self, id: Uuid, bookmarked: bool) -> Result<Companion> {
        let mut companions = self.companions.write().await;

        let companion = companions
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| anyhow!("companion {} not found", id))?;
        companion.bookmarked = bookmarked;
        Ok(companion.clone())
    }

    fn matches(companion: &Companion, query: &CompanionQuery) -> bool {
        let subject_ok = query.subject.as_deref().map_or(true, |s| {
            companion.subject.to_lowercase().contains(&s.to_lowercase())
        });

        // topic searches match the topic or the companion's name
        let topic_ok = query.topic.as_deref().map_or(true, |t| {
            let needle = t.to_lowercase();
            companion.topic.to_lowercase().contains(&needle)
                || companion.name.to_lowercase().contains(&needle)
        });

        subject_ok && topic_ok
    }
}

impl Default for CompanionStore {
    fn default() -> Self {
        Self::new()
    }
}
