use super::{finalize, CandidatePool, RecommendationStrategy, StrategyKind, StrategyRequest};
use crate::config::RecommendationConfig;
use crate::models::{CandidateItem, RecommendationReason, ScoredItem};
use crate::repository::{CandidateFilter, ContentRepository};
use crate::services::signals::view_velocity;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

pub const DEFAULT_TRENDING_WINDOW_DAYS: i64 = 7;

/// Trending strategy - raw view velocity inside a publication window
pub struct TrendingStrategy {
    repository: Arc<dyn ContentRepository>,
    pool_size: usize,
    window_days: i64,
}

impl TrendingStrategy {
    pub fn new(repository: Arc<dyn ContentRepository>, pool_size: usize) -> Self {
        Self {
            repository,
            pool_size,
            window_days: DEFAULT_TRENDING_WINDOW_DAYS,
        }
    }

    pub fn with_window_days(mut self, window_days: i64) -> Self {
        self.window_days = window_days.max(1);
        self
    }
}

#[async_trait]
impl RecommendationStrategy for TrendingStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Trending
    }

    async fn select(&self, request: &StrategyRequest<'_>) -> Result<CandidatePool> {
        let mut filter = CandidateFilter::recent(self.pool_size);
        if let Some(since) = window_start(request.now, self.window_days) {
            filter = filter.published_after(since);
        }
        let items = self.repository.fetch_candidates(&filter).await?;
        Ok(CandidatePool::new(items))
    }

    fn rank(&self, pool: CandidatePool, request: &StrategyRequest<'_>) -> Vec<ScoredItem> {
        trending(
            &pool.items,
            request.config,
            request.now,
            self.window_days,
            request.limit,
        )
    }
}

/// Score = views / max(1, age_hours) for items published in the last
/// `window_days`.
pub fn trending(
    candidates: &[CandidateItem],
    config: &RecommendationConfig,
    now: DateTime<Utc>,
    window_days: i64,
    limit: usize,
) -> Vec<ScoredItem> {
    let since = window_start(now, window_days);

    let scored = candidates
        .iter()
        .filter(|c| since.map_or(true, |since| c.published_at >= since))
        .map(|c| {
            ScoredItem::new(
                c.clone(),
                view_velocity(c.view_count, c.published_at, now),
                RecommendationReason::Trending,
            )
        })
        .collect();

    finalize(scored, config.min_score, limit)
}

/// Oldest publish time inside the window. `None` when the window reaches
/// past the representable range, which leaves the pool unbounded.
pub fn window_start(now: DateTime<Utc>, window_days: i64) -> Option<DateTime<Utc>> {
    Duration::try_days(window_days).and_then(|window| now.checked_sub_signed(window))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::scoring::test_support::{candidate, fixed_now};
    use uuid::Uuid;

    #[test]
    fn test_trending_orders_by_velocity_at_equal_age() {
        let config = RecommendationConfig::default();
        let candidates: Vec<CandidateItem> = [1, 100, 5, 50, 10]
            .iter()
            .map(|&views| candidate(Uuid::new_v4(), None, &[], 24, views))
            .collect();

        let result = trending(&candidates, &config, fixed_now(), 7, 3);

        assert_eq!(result.len(), 3);
        let views: Vec<u64> = result.iter().map(|i| i.item.view_count).collect();
        assert_eq!(views, vec![100, 50, 10]);
        assert!(result
            .iter()
            .all(|i| i.reason == RecommendationReason::Trending));
        assert!((result[0].score - 100.0 / 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_trending_velocity_beats_raw_views() {
        let config = RecommendationConfig::default();
        let fresh = candidate(Uuid::new_v4(), None, &[], 2, 100);
        let older = candidate(Uuid::new_v4(), None, &[], 100, 1000);

        let result = trending(&[older.clone(), fresh.clone()], &config, fixed_now(), 7, 10);

        assert_eq!(result[0].id(), fresh.id);
        assert_eq!(result[1].id(), older.id);
    }

    #[test]
    fn test_trending_ignores_items_outside_window() {
        let config = RecommendationConfig::default();
        let stale = candidate(Uuid::new_v4(), None, &[], 24 * 8, 1_000_000);
        let recent = candidate(Uuid::new_v4(), None, &[], 24, 100);

        let result = trending(&[stale, recent.clone()], &config, fixed_now(), 7, 10);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id(), recent.id);
    }

    #[test]
    fn test_huge_window_keeps_every_item() {
        let config = RecommendationConfig::default();
        let ancient = candidate(Uuid::new_v4(), None, &[], 24 * 365 * 50, 1_000_000);
        let recent = candidate(Uuid::new_v4(), None, &[], 24, 100);

        assert!(window_start(fixed_now(), 100_000_000).is_none());
        assert!(window_start(fixed_now(), i64::MAX).is_none());

        let result = trending(
            &[ancient.clone(), recent.clone()],
            &config,
            fixed_now(),
            100_000_000,
            3,
        );

        // 1_000_000 views over 50 years still beats the floor
        let ids: Vec<Uuid> = result.iter().map(|i| i.id()).collect();
        assert_eq!(ids, vec![recent.id, ancient.id]);
    }

    #[test]
    fn test_window_start_for_regular_window() {
        assert_eq!(
            window_start(fixed_now(), 7),
            Some(fixed_now() - Duration::days(7))
        );
    }
}
