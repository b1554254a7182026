use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::{EngineError, Result};

pub const DEFAULT_RESULT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Read-only projection of a published post, as handed over by the content
/// repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub reaction_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub tags: HashSet<String>,
    pub author: AuthorRef,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub reading_time_minutes: u32,
    /// Editorially featured
    #[serde(default)]
    pub featured: bool,
}

impl CandidateItem {
    pub fn category_id(&self) -> Option<Uuid> {
        self.category.as_ref().map(|c| c.id)
    }
}

/// Why an item landed where it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationReason {
    SimilarContent,
    SameAuthor,
    SameCategory,
    SameTags,
    Trending,
    Popular,
    FollowedAuthor,
    FollowedCategory,
    FollowedTag,
    ReadingHistory,
    Collaborative,
    EditorialPick,
}

impl RecommendationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationReason::SimilarContent => "similar_content",
            RecommendationReason::SameAuthor => "same_author",
            RecommendationReason::SameCategory => "same_category",
            RecommendationReason::SameTags => "same_tags",
            RecommendationReason::Trending => "trending",
            RecommendationReason::Popular => "popular",
            RecommendationReason::FollowedAuthor => "followed_author",
            RecommendationReason::FollowedCategory => "followed_category",
            RecommendationReason::FollowedTag => "followed_tag",
            RecommendationReason::ReadingHistory => "reading_history",
            RecommendationReason::Collaborative => "collaborative",
            RecommendationReason::EditorialPick => "editorial_pick",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    #[serde(flatten)]
    pub item: CandidateItem,
    pub score: f64,
    pub reason: RecommendationReason,
}

impl ScoredItem {
    pub fn new(item: CandidateItem, score: f64, reason: RecommendationReason) -> Self {
        Self {
            item,
            score,
            reason,
        }
    }

    pub fn id(&self) -> Uuid {
        self.item.id
    }

    /// Same identity and reason, new score.
    pub fn rescored(&self, score: f64) -> Self {
        Self {
            item: self.item.clone(),
            score,
            reason: self.reason,
        }
    }
}

/// Request-scoped input of the mixed feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationContext {
    #[serde(default)]
    pub seed_item_id: Option<Uuid>,
    #[serde(default)]
    pub viewer_id: Option<Uuid>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub exclude_ids: HashSet<Uuid>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_RESULT_LIMIT
}

impl Default for RecommendationContext {
    fn default() -> Self {
        Self {
            seed_item_id: None,
            viewer_id: None,
            category_id: None,
            exclude_ids: HashSet::new(),
            limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

impl RecommendationContext {
    pub fn with_seed(mut self, seed_item_id: Uuid) -> Self {
        self.seed_item_id = Some(seed_item_id);
        self
    }

    pub fn with_viewer(mut self, viewer_id: Uuid) -> Self {
        self.viewer_id = Some(viewer_id);
        self
    }

    pub fn with_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn excluding<I: IntoIterator<Item = Uuid>>(mut self, ids: I) -> Self {
        self.exclude_ids.extend(ids);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.limit < 1 {
            return Err(EngineError::InvalidContext(
                "limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Viewer interests materialized by the interest store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterestProfile {
    #[serde(default)]
    pub consumed_item_ids: HashSet<Uuid>,
    #[serde(default)]
    pub followed_author_ids: HashSet<Uuid>,
    #[serde(default)]
    pub followed_category_ids: HashSet<Uuid>,
    #[serde(default)]
    pub followed_tags: HashSet<String>,
    /// Tags of the consumed items
    #[serde(default)]
    pub history_tags: HashSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_serializes_snake_case() {
        for reason in [
            RecommendationReason::SimilarContent,
            RecommendationReason::FollowedCategory,
            RecommendationReason::EditorialPick,
        ] {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{}\"", reason.as_str()));
        }
    }

    #[test]
    fn test_context_defaults_and_validation() {
        let ctx: RecommendationContext = serde_json::from_str("{}").unwrap();
        assert_eq!(ctx.limit, DEFAULT_RESULT_LIMIT);
        assert!(ctx.validate().is_ok());

        let ctx = RecommendationContext::default().with_limit(0);
        assert!(matches!(
            ctx.validate(),
            Err(EngineError::InvalidContext(_))
        ));
    }

    #[test]
    fn test_scored_item_flattens_candidate_fields() {
        let item = CandidateItem {
            id: Uuid::new_v4(),
            title: "Rust ownership".to_string(),
            slug: "rust-ownership".to_string(),
            excerpt: String::new(),
            published_at: Utc::now(),
            view_count: 10,
            reaction_count: 1,
            comment_count: 0,
            tags: HashSet::new(),
            author: AuthorRef {
                id: Uuid::new_v4(),
                name: "ferris".to_string(),
                avatar_url: None,
            },
            category: None,
            reading_time_minutes: 4,
            featured: false,
        };

        let scored = ScoredItem::new(item, 0.42, RecommendationReason::Popular);
        let value = serde_json::to_value(&scored).unwrap();

        assert_eq!(value["slug"], "rust-ownership");
        assert_eq!(value["reason"], "popular");
        assert_eq!(value["score"], 0.42);
    }
}
