use super::{finalize, CandidatePool, RecommendationStrategy, StrategyKind, StrategyRequest};
use crate::config::RecommendationConfig;
use crate::models::{CandidateItem, RecommendationContext, ScoredItem};
use crate::repository::{CandidateFilter, ContentRepository};
use crate::services::scoring::CandidateScorer;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// Similar-content strategy - items related to a seed item
pub struct SimilarContentStrategy {
    repository: Arc<dyn ContentRepository>,
    pool_size: usize,
}

impl SimilarContentStrategy {
    pub fn new(repository: Arc<dyn ContentRepository>, pool_size: usize) -> Self {
        Self {
            repository,
            pool_size,
        }
    }
}

#[async_trait]
impl RecommendationStrategy for SimilarContentStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SimilarContent
    }

    fn is_applicable(&self, context: &RecommendationContext) -> bool {
        context.seed_item_id.is_some()
    }

    async fn select(&self, request: &StrategyRequest<'_>) -> Result<CandidatePool> {
        let Some(seed_id) = request.context.seed_item_id else {
            return Ok(CandidatePool::default());
        };

        let Some(seed) = self.repository.fetch_item(seed_id).await? else {
            debug!(seed_id = %seed_id, "Seed item not found, similar-content returns empty");
            return Ok(CandidatePool::default());
        };

        let filter = CandidateFilter::recent(self.pool_size).excluding([seed_id]);
        let items = self.repository.fetch_candidates(&filter).await?;

        Ok(CandidatePool::with_seed(seed, items))
    }

    fn rank(&self, pool: CandidatePool, request: &StrategyRequest<'_>) -> Vec<ScoredItem> {
        match pool.seed {
            Some(seed) => similar_content(
                &seed,
                &pool.items,
                request.config,
                request.now,
                request.limit,
            ),
            None => Vec::new(),
        }
    }
}

/// Rank `candidates` by relevance to `seed`. The seed itself never appears.
pub fn similar_content(
    seed: &CandidateItem,
    candidates: &[CandidateItem],
    config: &RecommendationConfig,
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<ScoredItem> {
    let scorer = CandidateScorer::for_batch(config, candidates, now);

    let scored = candidates
        .iter()
        .filter(|c| c.id != seed.id)
        .map(|c| scorer.score_similar(c, seed))
        .collect();

    finalize(scored, config.min_score, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecommendationReason;
    use crate::repository::InMemoryContentStore;
    use crate::services::scoring::test_support::{candidate, fixed_now};
    use uuid::Uuid;

    #[test]
    fn test_similar_ranks_tag_match_first() {
        let config = RecommendationConfig::default();
        let tech = Uuid::new_v4();
        let seed = candidate(Uuid::new_v4(), Some(tech), &["ai", "ml"], 1, 100);
        let c1 = candidate(Uuid::new_v4(), Some(tech), &["hardware"], 12, 80);
        let mut c2 = candidate(Uuid::new_v4(), Some(tech), &["ai", "ml", "data"], 12, 80);
        c2.reaction_count = c1.reaction_count;
        c2.comment_count = c1.comment_count;
        let unrelated = candidate(Uuid::new_v4(), None, &["cooking"], 400, 0);

        let result = similar_content(
            &seed,
            &[c1.clone(), seed.clone(), unrelated, c2.clone()],
            &config,
            fixed_now(),
            10,
        );

        assert_eq!(result[0].id(), c2.id);
        assert_eq!(result[0].reason, RecommendationReason::SameTags);
        assert_eq!(result[1].id(), c1.id);
        assert_eq!(result[1].reason, RecommendationReason::SameCategory);
        assert!(result.iter().all(|i| i.id() != seed.id));
        assert!(result.iter().all(|i| i.score >= config.min_score));
    }

    #[test]
    fn test_similar_respects_limit() {
        let config = RecommendationConfig::default();
        let seed = candidate(Uuid::new_v4(), None, &["rust"], 1, 10);
        let candidates: Vec<CandidateItem> = (0..8)
            .map(|i| candidate(Uuid::new_v4(), None, &["rust"], i, 10))
            .collect();

        let result = similar_content(&seed, &candidates, &config, fixed_now(), 3);

        assert_eq!(result.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_seed_yields_empty_pool() {
        let config = RecommendationConfig::default();
        let store = InMemoryContentStore::new(vec![candidate(Uuid::new_v4(), None, &[], 1, 5)]);
        let strategy = SimilarContentStrategy::new(Arc::new(store), 100);
        let context = RecommendationContext::default().with_seed(Uuid::new_v4());
        let request = StrategyRequest {
            context: &context,
            profile: None,
            config: &config,
            limit: 5,
            now: fixed_now(),
        };

        let result = strategy.recommend(&request).await.unwrap();

        assert!(result.is_empty());
        assert!(!strategy.is_applicable(&RecommendationContext::default()));
    }
}
