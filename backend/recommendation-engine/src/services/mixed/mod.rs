// ============================================
// Mixed Composer
// ============================================
//
// Fans out to a configurable list of strategy slots, joins every result, then
// merges in slot priority order:
//   1. drop caller-excluded ids
//   2. first occurrence of an id wins, whatever its score
//   3. sort by score, cap at the context limit
//
// A failing slot contributes nothing; composition never aborts.

use crate::config::{PoolConfig, RecommendationConfig};
use crate::models::{InterestProfile, RecommendationContext, ScoredItem};
use crate::repository::ContentRepository;
use crate::services::strategies::{
    CategoryStrategy, EditorialStrategy, PersonalizedStrategy, RecommendationStrategy,
    SimilarContentStrategy, StrategyKind, StrategyRequest, TrendingStrategy,
};
use crate::utils::sort_by_score_desc;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const EDITORIAL_SLOT_LIMIT: usize = 3;
pub const PERSONALIZED_SLOT_LIMIT: usize = 5;
pub const SIMILAR_SLOT_LIMIT: usize = 5;
pub const CATEGORY_SLOT_LIMIT: usize = 5;
pub const TRENDING_SLOT_LIMIT: usize = 5;

/// A strategy and how many items it may contribute
#[derive(Clone)]
pub struct MixedSlot {
    pub strategy: Arc<dyn RecommendationStrategy>,
    pub limit: usize,
}

impl MixedSlot {
    pub fn new(strategy: Arc<dyn RecommendationStrategy>, limit: usize) -> Self {
        Self { strategy, limit }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOutcome {
    Skipped,
    Returned(usize),
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct CompositionStats {
    pub slots: Vec<(StrategyKind, SlotOutcome)>,
    pub merged_count: usize,
    pub final_count: usize,
}

impl CompositionStats {
    pub fn outcome(&self, kind: StrategyKind) -> Option<SlotOutcome> {
        self.slots
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, outcome)| *outcome)
    }
}

pub struct MixedComposer {
    slots: Vec<MixedSlot>, // priority order
}

impl MixedComposer {
    pub fn new(slots: Vec<MixedSlot>) -> Self {
        Self { slots }
    }

    /// Editorial, personalized, similar, category, trending.
    pub fn with_default_slots(repository: Arc<dyn ContentRepository>, pools: &PoolConfig) -> Self {
        Self::new(vec![
            MixedSlot::new(
                Arc::new(EditorialStrategy::new(
                    repository.clone(),
                    pools.editorial_pool_size,
                )),
                EDITORIAL_SLOT_LIMIT,
            ),
            MixedSlot::new(
                Arc::new(PersonalizedStrategy::new(
                    repository.clone(),
                    pools.recent_pool_size,
                )),
                PERSONALIZED_SLOT_LIMIT,
            ),
            MixedSlot::new(
                Arc::new(SimilarContentStrategy::new(
                    repository.clone(),
                    pools.recent_pool_size,
                )),
                SIMILAR_SLOT_LIMIT,
            ),
            MixedSlot::new(
                Arc::new(CategoryStrategy::new(
                    repository.clone(),
                    pools.category_pool_size,
                )),
                CATEGORY_SLOT_LIMIT,
            ),
            MixedSlot::new(
                Arc::new(
                    TrendingStrategy::new(repository, pools.trending_pool_size)
                        .with_window_days(pools.trending_window_days),
                ),
                TRENDING_SLOT_LIMIT,
            ),
        ])
    }

    pub async fn compose(
        &self,
        context: &RecommendationContext,
        profile: Option<&InterestProfile>,
        config: &RecommendationConfig,
        now: DateTime<Utc>,
    ) -> (Vec<ScoredItem>, CompositionStats) {
        let runs = self
            .slots
            .iter()
            .map(|slot| Self::run_slot(slot, context, profile, config, now));

        // join_all keeps slot order, which is the merge priority
        let results = join_all(runs).await;

        let mut stats = CompositionStats::default();
        let mut sources = Vec::with_capacity(results.len());
        for (kind, outcome, items) in results {
            stats.slots.push((kind, outcome));
            sources.push(items);
        }
        stats.merged_count = sources.iter().map(Vec::len).sum();

        let merged = merge_by_priority(sources, &context.exclude_ids, context.limit);
        stats.final_count = merged.len();

        (merged, stats)
    }

    async fn run_slot(
        slot: &MixedSlot,
        context: &RecommendationContext,
        profile: Option<&InterestProfile>,
        config: &RecommendationConfig,
        now: DateTime<Utc>,
    ) -> (StrategyKind, SlotOutcome, Vec<ScoredItem>) {
        let kind = slot.strategy.kind();

        if !slot.strategy.is_applicable(context) {
            debug!(strategy = kind.as_str(), "Strategy not applicable, skipped");
            return (kind, SlotOutcome::Skipped, Vec::new());
        }

        let request = StrategyRequest {
            context,
            profile,
            config,
            limit: slot.limit,
            now,
        };

        match slot.strategy.recommend(&request).await {
            Ok(items) => {
                debug!(
                    strategy = kind.as_str(),
                    count = items.len(),
                    "Strategy completed"
                );
                let count = items.len();
                (kind, SlotOutcome::Returned(count), items)
            }
            Err(e) => {
                warn!(
                    strategy = kind.as_str(),
                    error = %e,
                    "Strategy failed, contributing no items"
                );
                (kind, SlotOutcome::Failed, Vec::new())
            }
        }
    }
}

/// Merge per-source lists given in priority order. Excluded ids and ids seen
/// in an earlier source are dropped before the final sort.
pub fn merge_by_priority(
    sources: Vec<Vec<ScoredItem>>,
    exclude_ids: &HashSet<Uuid>,
    limit: usize,
) -> Vec<ScoredItem> {
    let mut seen: HashSet<Uuid> = HashSet::new();
    let mut merged: Vec<ScoredItem> = Vec::new();

    for item in sources.into_iter().flatten() {
        if exclude_ids.contains(&item.id()) {
            continue;
        }
        if seen.insert(item.id()) {
            merged.push(item);
        }
    }

    sort_by_score_desc(&mut merged);
    merged.truncate(limit);

    info!(
        merged_count = merged.len(),
        limit = limit,
        "Mixed feed merged"
    );

    merged
}
