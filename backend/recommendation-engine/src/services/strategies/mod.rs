mod category;
mod editorial;
mod personalized;
mod popular;
mod similar;
mod trending;

use crate::config::RecommendationConfig;
use crate::models::{CandidateItem, InterestProfile, RecommendationContext, ScoredItem};
use crate::utils::sort_by_score_desc;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub use category::{category_recommendations, CategoryStrategy};
pub use editorial::{editorial_picks, EditorialStrategy, EDITORIAL_RANK_POSITIONS};
pub use personalized::{personalized, PersonalizedStrategy};
pub use popular::{popular, PopularStrategy};
pub use similar::{similar_content, SimilarContentStrategy};
pub use trending::{trending, TrendingStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    SimilarContent,
    Personalized,
    Trending,
    Popular,
    Editorial,
    Category,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::SimilarContent => "similar_content",
            StrategyKind::Personalized => "personalized",
            StrategyKind::Trending => "trending",
            StrategyKind::Popular => "popular",
            StrategyKind::Editorial => "editorial",
            StrategyKind::Category => "category",
        }
    }
}

/// Everything a strategy needs for one invocation. `now` is captured once by
/// the caller so every score in a response shares the same clock.
#[derive(Debug, Clone, Copy)]
pub struct StrategyRequest<'a> {
    pub context: &'a RecommendationContext,
    pub profile: Option<&'a InterestProfile>,
    pub config: &'a RecommendationConfig,
    pub limit: usize,
    pub now: DateTime<Utc>,
}

/// Candidates selected for one strategy run
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    /// Reference item for similarity strategies
    pub seed: Option<CandidateItem>,
    pub items: Vec<CandidateItem>,
}

impl CandidatePool {
    pub fn new(items: Vec<CandidateItem>) -> Self {
        Self { seed: None, items }
    }

    pub fn with_seed(seed: CandidateItem, items: Vec<CandidateItem>) -> Self {
        Self {
            seed: Some(seed),
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One retrieval policy: pick a candidate pool, then score it.
#[async_trait]
pub trait RecommendationStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Whether the context carries what this strategy needs (seed, viewer, ...).
    fn is_applicable(&self, _context: &RecommendationContext) -> bool {
        true
    }

    async fn select(&self, request: &StrategyRequest<'_>) -> Result<CandidatePool>;

    fn rank(&self, pool: CandidatePool, request: &StrategyRequest<'_>) -> Vec<ScoredItem>;

    async fn recommend(&self, request: &StrategyRequest<'_>) -> Result<Vec<ScoredItem>> {
        let pool = self.select(request).await?;
        if pool.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.rank(pool, request))
    }
}

/// Drop items under the relevance floor, sort, cap.
pub(crate) fn finalize(mut scored: Vec<ScoredItem>, min_score: f64, limit: usize) -> Vec<ScoredItem> {
    scored.retain(|item| item.score >= min_score);
    sort_by_score_desc(&mut scored);
    scored.truncate(limit);
    scored
}
