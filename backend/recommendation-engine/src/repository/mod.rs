// ============================================
// Collaborator interfaces
// ============================================
//
// The engine never persists anything. Content and viewer interests come from
// these two traits; production deployments back them with the content service
// and the graph/interest store, tests and the CLI use the in-memory stores.

use crate::models::{CandidateItem, InterestProfile};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CandidateOrder {
    /// Newest first
    #[default]
    Recent,
    MostViewed,
}

/// Query over published items
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateFilter {
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub tag: Option<String>,
    pub exclude_ids: HashSet<Uuid>,
    pub published_after: Option<DateTime<Utc>>,
    pub featured_only: bool,
    pub order: CandidateOrder,
    pub limit: usize,
}

impl CandidateFilter {
    pub fn recent(limit: usize) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }

    pub fn most_viewed(limit: usize) -> Self {
        Self {
            order: CandidateOrder::MostViewed,
            limit,
            ..Default::default()
        }
    }

    pub fn in_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn by_author(mut self, author_id: Uuid) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn published_after(mut self, since: DateTime<Utc>) -> Self {
        self.published_after = Some(since);
        self
    }

    pub fn featured(mut self) -> Self {
        self.featured_only = true;
        self
    }

    pub fn excluding<I: IntoIterator<Item = Uuid>>(mut self, ids: I) -> Self {
        self.exclude_ids.extend(ids);
        self
    }

    pub fn matches(&self, item: &CandidateItem) -> bool {
        if self.exclude_ids.contains(&item.id) {
            return false;
        }
        if self.featured_only && !item.featured {
            return false;
        }
        if let Some(category_id) = self.category_id {
            if item.category_id() != Some(category_id) {
                return false;
            }
        }
        if let Some(author_id) = self.author_id {
            if item.author.id != author_id {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !item.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                return false;
            }
        }
        if let Some(since) = self.published_after {
            if item.published_at < since {
                return false;
            }
        }
        true
    }
}

#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Published items matching `filter`, ordered and capped as requested.
    async fn fetch_candidates(&self, filter: &CandidateFilter) -> Result<Vec<CandidateItem>>;

    async fn fetch_item(&self, id: Uuid) -> Result<Option<CandidateItem>>;
}

#[async_trait]
pub trait InterestStore: Send + Sync {
    /// `None` when the viewer has no profile yet.
    async fn get_interest_profile(&self, viewer_id: Uuid) -> Result<Option<InterestProfile>>;
}

/// In-process content store over a materialized batch
#[derive(Debug, Clone, Default)]
pub struct InMemoryContentStore {
    items: Vec<CandidateItem>,
}

impl InMemoryContentStore {
    pub fn new(items: Vec<CandidateItem>) -> Self {
        Self { items }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read candidates from {}", path.display()))?;
        let items: Vec<CandidateItem> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse candidates in {}", path.display()))?;
        Ok(Self::new(items))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentStore {
    async fn fetch_candidates(&self, filter: &CandidateFilter) -> Result<Vec<CandidateItem>> {
        let mut matched: Vec<CandidateItem> = self
            .items
            .iter()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();

        match filter.order {
            CandidateOrder::Recent => {
                matched.sort_by_key(|item| (Reverse(item.published_at), item.id))
            }
            CandidateOrder::MostViewed => {
                matched.sort_by_key(|item| (Reverse(item.view_count), item.id))
            }
        }

        matched.truncate(filter.limit);
        Ok(matched)
    }

    async fn fetch_item(&self, id: Uuid) -> Result<Option<CandidateItem>> {
        Ok(self.items.iter().find(|item| item.id == id).cloned())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryInterestStore {
    profiles: HashMap<Uuid, InterestProfile>,
}

impl InMemoryInterestStore {
    pub fn new(profiles: HashMap<Uuid, InterestProfile>) -> Self {
        Self { profiles }
    }

    /// Reads a JSON object keyed by viewer id.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profiles from {}", path.display()))?;
        let profiles: HashMap<Uuid, InterestProfile> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse profiles in {}", path.display()))?;
        Ok(Self::new(profiles))
    }

    pub fn insert(&mut self, viewer_id: Uuid, profile: InterestProfile) {
        self.profiles.insert(viewer_id, profile);
    }
}

#[async_trait]
impl InterestStore for InMemoryInterestStore {
    async fn get_interest_profile(&self, viewer_id: Uuid) -> Result<Option<InterestProfile>> {
        Ok(self.profiles.get(&viewer_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::scoring::test_support::{candidate, fixed_now};
    use chrono::Duration;

    fn store() -> (InMemoryContentStore, Vec<CandidateItem>) {
        let cat = Uuid::new_v4();
        let mut items = vec![
            candidate(Uuid::new_v4(), Some(cat), &["Rust"], 2, 10),
            candidate(Uuid::new_v4(), None, &["go"], 30, 500),
            candidate(Uuid::new_v4(), Some(cat), &["rust", "wasm"], 200, 50),
        ];
        items[1].featured = true;
        (InMemoryContentStore::new(items.clone()), items)
    }

    #[tokio::test]
    async fn test_recent_order_and_limit() {
        let (store, items) = store();

        let result = store
            .fetch_candidates(&CandidateFilter::recent(2))
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, items[0].id);
        assert_eq!(result[1].id, items[1].id);
    }

    #[tokio::test]
    async fn test_most_viewed_order() {
        let (store, items) = store();

        let result = store
            .fetch_candidates(&CandidateFilter::most_viewed(10))
            .await
            .unwrap();

        let ids: Vec<Uuid> = result.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![items[1].id, items[2].id, items[0].id]);
    }

    #[tokio::test]
    async fn test_filters() {
        let (store, items) = store();
        let cat = items[0].category_id().unwrap();

        let in_category = store
            .fetch_candidates(&CandidateFilter::recent(10).in_category(cat).excluding([items[0].id]))
            .await
            .unwrap();
        assert_eq!(in_category.len(), 1);
        assert_eq!(in_category[0].id, items[2].id);

        let tagged = store
            .fetch_candidates(&CandidateFilter::recent(10).tagged("RUST"))
            .await
            .unwrap();
        assert_eq!(tagged.len(), 2);

        let featured = store
            .fetch_candidates(&CandidateFilter::recent(10).featured())
            .await
            .unwrap();
        assert_eq!(featured.len(), 1);

        let window = store
            .fetch_candidates(
                &CandidateFilter::recent(10).published_after(fixed_now() - Duration::days(7)),
            )
            .await
            .unwrap();
        assert_eq!(window.len(), 2);

        let by_author = store
            .fetch_candidates(&CandidateFilter::recent(10).by_author(items[1].author.id))
            .await
            .unwrap();
        assert_eq!(by_author.len(), 1);
    }

    #[test]
    fn test_fetch_item() {
        let (store, items) = store();

        let found = tokio_test::block_on(store.fetch_item(items[2].id)).unwrap();
        assert_eq!(found.map(|c| c.id), Some(items[2].id));

        let missing = tokio_test::block_on(store.fetch_item(Uuid::new_v4())).unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_interest_store_missing_viewer() {
        let viewer = Uuid::new_v4();
        let mut store = InMemoryInterestStore::default();
        store.insert(viewer, InterestProfile::default());

        assert!(store.get_interest_profile(viewer).await.unwrap().is_some());
        assert!(store
            .get_interest_profile(Uuid::new_v4())
            .await
            .unwrap()
            .is_none());
    }
}
