use super::{finalize, CandidatePool, RecommendationStrategy, StrategyKind, StrategyRequest};
use crate::config::RecommendationConfig;
use crate::models::{CandidateItem, RecommendationReason, ScoredItem};
use crate::repository::{CandidateFilter, ContentRepository};
use crate::services::scoring::max_view_count;
use crate::services::signals::popularity_score;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Popular strategy - all-time most viewed items
pub struct PopularStrategy {
    repository: Arc<dyn ContentRepository>,
    pool_size: usize,
}

impl PopularStrategy {
    pub fn new(repository: Arc<dyn ContentRepository>, pool_size: usize) -> Self {
        Self {
            repository,
            pool_size,
        }
    }
}

#[async_trait]
impl RecommendationStrategy for PopularStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Popular
    }

    async fn select(&self, _request: &StrategyRequest<'_>) -> Result<CandidatePool> {
        let filter = CandidateFilter::most_viewed(self.pool_size);
        let items = self.repository.fetch_candidates(&filter).await?;
        Ok(CandidatePool::new(items))
    }

    fn rank(&self, pool: CandidatePool, request: &StrategyRequest<'_>) -> Vec<ScoredItem> {
        popular(&pool.items, request.config, request.limit)
    }
}

pub fn popular(
    candidates: &[CandidateItem],
    config: &RecommendationConfig,
    limit: usize,
) -> Vec<ScoredItem> {
    let max_views = max_view_count(candidates);

    let scored = candidates
        .iter()
        .map(|c| {
            ScoredItem::new(
                c.clone(),
                popularity_score(c.view_count, max_views),
                RecommendationReason::Popular,
            )
        })
        .collect();

    finalize(scored, config.min_score, limit)
}
