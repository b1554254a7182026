//! Recommendation Engine
//!
//! Entry point of the crate. Owns the collaborators and the validated config,
//! exposes one method per strategy plus the mixed feed.
//!
//! # Workflow
//! 1. Validate the request (limit, context)
//! 2. Capture a single `now` for the whole response
//! 3. Fetch the interest profile once when a viewer is present
//! 4. Run the strategy (or fan out through the mixed composer)
//!
//! Every method has an `_at` variant taking `now` explicitly so results are
//! reproducible.

use crate::config::{PoolConfig, RecommendationConfig};
use crate::error::{EngineError, Result};
use crate::models::{InterestProfile, RecommendationContext, ScoredItem};
use crate::repository::{ContentRepository, InterestStore};
use crate::services::mixed::MixedComposer;
use crate::services::strategies::{
    CategoryStrategy, EditorialStrategy, PersonalizedStrategy, PopularStrategy,
    RecommendationStrategy, SimilarContentStrategy, StrategyRequest, TrendingStrategy,
};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct RecommendationEngine {
    repository: Arc<dyn ContentRepository>,
    interests: Arc<dyn InterestStore>,
    config: RecommendationConfig,
    pools: PoolConfig,
    composer: MixedComposer,
}

impl RecommendationEngine {
    /// Fails fast on an invalid config; nothing is scored with bad weights.
    pub fn new(
        repository: Arc<dyn ContentRepository>,
        interests: Arc<dyn InterestStore>,
        config: RecommendationConfig,
        pools: PoolConfig,
    ) -> Result<Self> {
        config.validate()?;
        if pools.trending_window_days < 1 {
            return Err(EngineError::InvalidConfig(format!(
                "trending window must be at least one day, got {}",
                pools.trending_window_days
            )));
        }

        let composer = MixedComposer::with_default_slots(repository.clone(), &pools);

        Ok(Self {
            repository,
            interests,
            config,
            pools,
            composer,
        })
    }

    /// Replace the default slot list of the mixed feed.
    pub fn with_composer(mut self, composer: MixedComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn config(&self) -> &RecommendationConfig {
        &self.config
    }

    pub async fn similar_content(&self, seed_item_id: Uuid, limit: usize) -> Result<Vec<ScoredItem>> {
        self.similar_content_at(seed_item_id, limit, Utc::now()).await
    }

    pub async fn similar_content_at(
        &self,
        seed_item_id: Uuid,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScoredItem>> {
        let strategy =
            SimilarContentStrategy::new(self.repository.clone(), self.pools.recent_pool_size);
        let context = RecommendationContext::default()
            .with_seed(seed_item_id)
            .with_limit(limit);
        self.run_strategy(&strategy, &context, None, now).await
    }

    pub async fn personalized(&self, viewer_id: Uuid, limit: usize) -> Result<Vec<ScoredItem>> {
        self.personalized_at(viewer_id, limit, Utc::now()).await
    }

    pub async fn personalized_at(
        &self,
        viewer_id: Uuid,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScoredItem>> {
        validate_limit(limit)?;
        let profile = self.interests.get_interest_profile(viewer_id).await?;
        let strategy =
            PersonalizedStrategy::new(self.repository.clone(), self.pools.recent_pool_size);
        let context = RecommendationContext::default()
            .with_viewer(viewer_id)
            .with_limit(limit);
        self.run_strategy(&strategy, &context, profile.as_ref(), now)
            .await
    }

    pub async fn trending(&self, limit: usize) -> Result<Vec<ScoredItem>> {
        self.trending_at(limit, self.pools.trending_window_days, Utc::now())
            .await
    }

    pub async fn trending_at(
        &self,
        limit: usize,
        window_days: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScoredItem>> {
        let strategy = TrendingStrategy::new(self.repository.clone(), self.pools.trending_pool_size)
            .with_window_days(window_days);
        let context = RecommendationContext::default().with_limit(limit);
        self.run_strategy(&strategy, &context, None, now).await
    }

    pub async fn popular(&self, limit: usize) -> Result<Vec<ScoredItem>> {
        self.popular_at(limit, Utc::now()).await
    }

    pub async fn popular_at(&self, limit: usize, now: DateTime<Utc>) -> Result<Vec<ScoredItem>> {
        let strategy = PopularStrategy::new(self.repository.clone(), self.pools.popular_pool_size);
        let context = RecommendationContext::default().with_limit(limit);
        self.run_strategy(&strategy, &context, None, now).await
    }

    pub async fn editorial(&self, limit: usize) -> Result<Vec<ScoredItem>> {
        self.editorial_at(limit, Utc::now()).await
    }

    pub async fn editorial_at(&self, limit: usize, now: DateTime<Utc>) -> Result<Vec<ScoredItem>> {
        let strategy =
            EditorialStrategy::new(self.repository.clone(), self.pools.editorial_pool_size);
        let context = RecommendationContext::default().with_limit(limit);
        self.run_strategy(&strategy, &context, None, now).await
    }

    pub async fn category_recommendations(
        &self,
        category_id: Uuid,
        limit: usize,
        exclude_ids: &HashSet<Uuid>,
    ) -> Result<Vec<ScoredItem>> {
        self.category_recommendations_at(category_id, limit, exclude_ids, Utc::now())
            .await
    }

    pub async fn category_recommendations_at(
        &self,
        category_id: Uuid,
        limit: usize,
        exclude_ids: &HashSet<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScoredItem>> {
        let strategy =
            CategoryStrategy::new(self.repository.clone(), self.pools.category_pool_size);
        let context = RecommendationContext::default()
            .with_category(category_id)
            .with_limit(limit)
            .excluding(exclude_ids.iter().copied());
        self.run_strategy(&strategy, &context, None, now).await
    }

    pub async fn compose_mixed(&self, context: &RecommendationContext) -> Result<Vec<ScoredItem>> {
        self.compose_mixed_at(context, Utc::now()).await
    }

    /// Mixed feed. Only an invalid context is an error; collaborator failures
    /// shrink the result instead.
    pub async fn compose_mixed_at(
        &self,
        context: &RecommendationContext,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScoredItem>> {
        context.validate()?;

        let profile = match context.viewer_id {
            Some(viewer_id) => self.load_profile(viewer_id).await,
            None => None,
        };

        let (items, stats) = self
            .composer
            .compose(context, profile.as_ref(), &self.config, now)
            .await;

        info!(
            seed_item_id = ?context.seed_item_id,
            viewer_id = ?context.viewer_id,
            slots = ?stats.slots,
            merged_count = stats.merged_count,
            final_count = stats.final_count,
            "Mixed recommendations composed"
        );

        Ok(items)
    }

    async fn load_profile(&self, viewer_id: Uuid) -> Option<InterestProfile> {
        match self.interests.get_interest_profile(viewer_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(
                    viewer_id = %viewer_id,
                    error = %e,
                    "Interest profile unavailable, personalization disabled"
                );
                None
            }
        }
    }

    async fn run_strategy(
        &self,
        strategy: &dyn RecommendationStrategy,
        context: &RecommendationContext,
        profile: Option<&InterestProfile>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScoredItem>> {
        validate_limit(context.limit)?;

        let request = StrategyRequest {
            context,
            profile,
            config: &self.config,
            limit: context.limit,
            now,
        };

        let items = strategy.recommend(&request).await?;

        debug!(
            strategy = strategy.kind().as_str(),
            count = items.len(),
            top_score = items.first().map(|i| i.score),
            "Recommendations computed"
        );

        Ok(items)
    }
}

fn validate_limit(limit: usize) -> Result<()> {
    if limit < 1 {
        return Err(EngineError::InvalidContext(
            "limit must be at least 1".to_string(),
        ));
    }
    Ok(())
}
