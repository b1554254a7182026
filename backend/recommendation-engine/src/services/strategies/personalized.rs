use super::{finalize, CandidatePool, RecommendationStrategy, StrategyKind, StrategyRequest};
use crate::config::RecommendationConfig;
use crate::models::{CandidateItem, InterestProfile, RecommendationContext, ScoredItem};
use crate::repository::{CandidateFilter, ContentRepository};
use crate::services::diversity::DiversityLayer;
use crate::services::scoring::CandidateScorer;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// Personalized strategy - recent items scored against the viewer's follows
/// and reading history, then diversified
pub struct PersonalizedStrategy {
    repository: Arc<dyn ContentRepository>,
    pool_size: usize,
}

impl PersonalizedStrategy {
    pub fn new(repository: Arc<dyn ContentRepository>, pool_size: usize) -> Self {
        Self {
            repository,
            pool_size,
        }
    }
}

#[async_trait]
impl RecommendationStrategy for PersonalizedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Personalized
    }

    fn is_applicable(&self, context: &RecommendationContext) -> bool {
        context.viewer_id.is_some()
    }

    async fn select(&self, request: &StrategyRequest<'_>) -> Result<CandidatePool> {
        let Some(profile) = request.profile else {
            debug!(
                viewer_id = ?request.context.viewer_id,
                "No interest profile, personalized returns empty"
            );
            return Ok(CandidatePool::default());
        };

        let filter = CandidateFilter::recent(self.pool_size)
            .excluding(profile.consumed_item_ids.iter().copied());
        let items = self.repository.fetch_candidates(&filter).await?;

        Ok(CandidatePool::new(items))
    }

    fn rank(&self, pool: CandidatePool, request: &StrategyRequest<'_>) -> Vec<ScoredItem> {
        match request.profile {
            Some(profile) => personalized(
                &pool.items,
                profile,
                request.config,
                request.now,
                request.limit,
            ),
            None => Vec::new(),
        }
    }
}

/// Score `candidates` for a viewer. Items the viewer already consumed are
/// removed before scoring.
pub fn personalized(
    candidates: &[CandidateItem],
    profile: &InterestProfile,
    config: &RecommendationConfig,
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<ScoredItem> {
    let unseen: Vec<CandidateItem> = candidates
        .iter()
        .filter(|c| !profile.consumed_item_ids.contains(&c.id))
        .cloned()
        .collect();

    let scorer = CandidateScorer::for_batch(config, &unseen, now);

    let scored: Vec<ScoredItem> = unseen
        .iter()
        .map(|c| scorer.score_personalized(c, Some(profile)))
        .filter(|item| scorer.admits(item))
        .collect();

    let diversified = DiversityLayer::new(config.diversity_factor).diversify(scored);

    finalize(diversified, config.min_score, limit)
}
