use super::{finalize, CandidatePool, RecommendationStrategy, StrategyKind, StrategyRequest};
use crate::config::RecommendationConfig;
use crate::models::{CandidateItem, RecommendationReason, ScoredItem};
use crate::repository::{CandidateFilter, ContentRepository};
use anyhow::Result;
use async_trait::async_trait;
use std::cmp::Reverse;
use std::sync::Arc;

/// Rank positions that score above zero; each position loses one tenth
pub const EDITORIAL_RANK_POSITIONS: f64 = 10.0;

/// Editorial strategy - featured items in curator order (newest first)
pub struct EditorialStrategy {
    repository: Arc<dyn ContentRepository>,
    pool_size: usize,
}

impl EditorialStrategy {
    pub fn new(repository: Arc<dyn ContentRepository>, pool_size: usize) -> Self {
        Self {
            repository,
            pool_size,
        }
    }
}

#[async_trait]
impl RecommendationStrategy for EditorialStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Editorial
    }

    async fn select(&self, _request: &StrategyRequest<'_>) -> Result<CandidatePool> {
        let filter = CandidateFilter::recent(self.pool_size).featured();
        let items = self.repository.fetch_candidates(&filter).await?;
        Ok(CandidatePool::new(items))
    }

    fn rank(&self, pool: CandidatePool, request: &StrategyRequest<'_>) -> Vec<ScoredItem> {
        editorial_picks(&pool.items, request.config, request.limit)
    }
}

/// Position-based score `1 - index * 0.1`; no computed signal is involved.
pub fn editorial_picks(
    candidates: &[CandidateItem],
    config: &RecommendationConfig,
    limit: usize,
) -> Vec<ScoredItem> {
    let mut featured: Vec<&CandidateItem> = candidates.iter().filter(|c| c.featured).collect();
    featured.sort_by_key(|c| (Reverse(c.published_at), c.id));

    let scored = featured
        .into_iter()
        .enumerate()
        .map(|(index, c)| {
            ScoredItem::new(
                c.clone(),
                (EDITORIAL_RANK_POSITIONS - index as f64) / EDITORIAL_RANK_POSITIONS,
                RecommendationReason::EditorialPick,
            )
        })
        .collect();

    finalize(scored, config.min_score, limit)
}
