use crate::models::ScoredItem;
use crate::utils::sort_by_score_desc;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Adjusted scores at or under this floor are dropped
pub const DIVERSITY_ADMISSION_FLOOR: f64 = 0.1;
/// Penalty added per already admitted item sharing author or category
pub const REPEAT_PENALTY_STEP: f64 = 0.2;

/// Diversity Layer - penalizes repeated authors and categories
///
/// Walks the list in score order. Every admitted item makes the next item
/// from the same author (and, separately, the same category) more expensive:
/// `adjusted = score * (1 - (author_count + category_count) * factor * 0.2)`.
#[derive(Debug, Clone, Copy)]
pub struct DiversityLayer {
    diversity_factor: f64, // 0 disables re-ranking
}

impl DiversityLayer {
    pub fn new(diversity_factor: f64) -> Self {
        Self {
            diversity_factor: diversity_factor.clamp(0.0, 1.0),
        }
    }

    /// Re-rank `items`. The result does not depend on input order.
    pub fn diversify(&self, items: Vec<ScoredItem>) -> Vec<ScoredItem> {
        let mut ranked = items;
        sort_by_score_desc(&mut ranked);

        if self.diversity_factor == 0.0 || ranked.is_empty() {
            return ranked;
        }

        let input_count = ranked.len();
        let mut author_counts: HashMap<Uuid, usize> = HashMap::new();
        let mut category_counts: HashMap<Uuid, usize> = HashMap::new();
        let mut admitted: Vec<ScoredItem> = Vec::with_capacity(ranked.len());

        for item in &ranked {
            let author_id = item.item.author.id;
            let category_id = item.item.category_id();

            let author_count = author_counts.get(&author_id).copied().unwrap_or(0);
            let category_count = category_id
                .and_then(|id| category_counts.get(&id).copied())
                .unwrap_or(0);

            let penalty = self.penalty(author_count, category_count);
            let adjusted = item.score * (1.0 - penalty);

            if adjusted <= DIVERSITY_ADMISSION_FLOOR {
                continue;
            }

            *author_counts.entry(author_id).or_insert(0) += 1;
            if let Some(id) = category_id {
                *category_counts.entry(id).or_insert(0) += 1;
            }
            admitted.push(item.rescored(adjusted));
        }

        sort_by_score_desc(&mut admitted);

        debug!(
            input_count = input_count,
            output_count = admitted.len(),
            diversity_factor = self.diversity_factor,
            "Diversity re-rank completed"
        );

        admitted
    }

    fn penalty(&self, author_count: usize, category_count: usize) -> f64 {
        (author_count + category_count) as f64 * self.diversity_factor * REPEAT_PENALTY_STEP
    }
}

/// Free-function form of [`DiversityLayer::diversify`].
pub fn diversify(items: Vec<ScoredItem>, diversity_factor: f64) -> Vec<ScoredItem> {
    DiversityLayer::new(diversity_factor).diversify(items)
}
