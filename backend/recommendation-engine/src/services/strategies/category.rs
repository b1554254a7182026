use super::{finalize, CandidatePool, RecommendationStrategy, StrategyKind, StrategyRequest};
use crate::config::RecommendationConfig;
use crate::models::{CandidateItem, RecommendationContext, RecommendationReason, ScoredItem};
use crate::repository::{CandidateFilter, ContentRepository};
use crate::services::scoring::CandidateScorer;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

const CATEGORY_RECENCY_WEIGHT: f64 = 0.5;
const CATEGORY_POPULARITY_WEIGHT: f64 = 0.5;

/// Category strategy - fresh and popular items of one category
pub struct CategoryStrategy {
    repository: Arc<dyn ContentRepository>,
    pool_size: usize,
}

impl CategoryStrategy {
    pub fn new(repository: Arc<dyn ContentRepository>, pool_size: usize) -> Self {
        Self {
            repository,
            pool_size,
        }
    }
}

#[async_trait]
impl RecommendationStrategy for CategoryStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Category
    }

    fn is_applicable(&self, context: &RecommendationContext) -> bool {
        context.category_id.is_some()
    }

    async fn select(&self, request: &StrategyRequest<'_>) -> Result<CandidatePool> {
        let Some(category_id) = request.context.category_id else {
            return Ok(CandidatePool::default());
        };

        let filter = CandidateFilter::recent(self.pool_size)
            .in_category(category_id)
            .excluding(request.context.exclude_ids.iter().copied());
        let items = self.repository.fetch_candidates(&filter).await?;

        Ok(CandidatePool::new(items))
    }

    fn rank(&self, pool: CandidatePool, request: &StrategyRequest<'_>) -> Vec<ScoredItem> {
        match request.context.category_id {
            Some(category_id) => category_recommendations(
                &pool.items,
                category_id,
                &request.context.exclude_ids,
                request.config,
                request.now,
                request.limit,
            ),
            None => Vec::new(),
        }
    }
}

/// Score = 0.5 * recency + 0.5 * popularity over the category's items.
pub fn category_recommendations(
    candidates: &[CandidateItem],
    category_id: Uuid,
    exclude_ids: &HashSet<Uuid>,
    config: &RecommendationConfig,
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<ScoredItem> {
    let in_category: Vec<CandidateItem> = candidates
        .iter()
        .filter(|c| c.category_id() == Some(category_id) && !exclude_ids.contains(&c.id))
        .cloned()
        .collect();

    let scorer = CandidateScorer::for_batch(config, &in_category, now);

    let scored = in_category
        .iter()
        .map(|c| {
            let score = CATEGORY_RECENCY_WEIGHT * scorer.recency(c)
                + CATEGORY_POPULARITY_WEIGHT * scorer.popularity(c);
            ScoredItem::new(c.clone(), score, RecommendationReason::SameCategory)
        })
        .collect();

    finalize(scored, config.min_score, limit)
}
