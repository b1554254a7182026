// ============================================
// Candidate Scorer
// ============================================
//
// Composite score = rule bonuses + weighted signal baseline.
//
// Reasons resolve through an explicit precedence list: the first rule whose
// predicate holds wins, otherwise the strategy's default reason applies.
// The composite score is an unclamped sum and is only meaningful relative to
// other items of the same batch.

use crate::config::RecommendationConfig;
use crate::models::{CandidateItem, InterestProfile, RecommendationReason, ScoredItem};
use crate::services::signals::{
    engagement_score_calibrated, popularity_score, recency_score, tag_overlap_fraction,
    tag_similarity,
};
use chrono::{DateTime, Utc};
use tracing::trace;

pub const SAME_CATEGORY_BONUS: f64 = 0.3;
pub const TAG_SIMILARITY_WEIGHT: f64 = 0.4;
pub const SAME_TAGS_THRESHOLD: f64 = 0.3;
pub const SAME_AUTHOR_BONUS: f64 = 0.15;

pub const FOLLOWED_AUTHOR_BONUS: f64 = 0.4;
pub const FOLLOWED_CATEGORY_BONUS: f64 = 0.3;
pub const FOLLOWED_TAG_WEIGHT: f64 = 0.25;
pub const READING_HISTORY_THRESHOLD: f64 = 0.3;

/// One entry of a reason precedence list
#[derive(Debug, Clone, Copy)]
pub struct ReasonRule {
    pub matched: bool,
    pub reason: RecommendationReason,
}

impl ReasonRule {
    pub fn new(matched: bool, reason: RecommendationReason) -> Self {
        Self { matched, reason }
    }
}

/// `rules` is ordered highest priority first.
pub fn resolve_reason(rules: &[ReasonRule], default: RecommendationReason) -> RecommendationReason {
    rules
        .iter()
        .find(|rule| rule.matched)
        .map(|rule| rule.reason)
        .unwrap_or(default)
}

pub fn max_view_count(items: &[CandidateItem]) -> u64 {
    items.iter().map(|c| c.view_count).max().unwrap_or(0)
}

/// Scores the candidates of one batch against a shared config and clock.
#[derive(Debug, Clone, Copy)]
pub struct CandidateScorer<'a> {
    config: &'a RecommendationConfig,
    batch_max_views: u64,
    now: DateTime<Utc>,
}

impl<'a> CandidateScorer<'a> {
    pub fn new(config: &'a RecommendationConfig, batch_max_views: u64, now: DateTime<Utc>) -> Self {
        Self {
            config,
            batch_max_views,
            now,
        }
    }

    pub fn for_batch(
        config: &'a RecommendationConfig,
        batch: &[CandidateItem],
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(config, max_view_count(batch), now)
    }

    pub fn recency(&self, candidate: &CandidateItem) -> f64 {
        recency_score(
            candidate.published_at,
            self.now,
            self.config.recency_half_life_days,
        )
    }

    pub fn popularity(&self, candidate: &CandidateItem) -> f64 {
        popularity_score(candidate.view_count, self.batch_max_views)
    }

    pub fn engagement(&self, candidate: &CandidateItem) -> f64 {
        engagement_score_calibrated(
            candidate.reaction_count,
            candidate.comment_count,
            candidate.view_count,
            self.config.engagement_comment_weight,
            self.config.engagement_scale,
        )
    }

    /// Weighted recency, popularity and engagement. Never changes the reason.
    pub fn baseline(&self, candidate: &CandidateItem) -> f64 {
        let weights = &self.config.weights;
        weights.recency * self.recency(candidate)
            + weights.popularity * self.popularity(candidate)
            + weights.engagement * self.engagement(candidate)
    }

    /// Relevance of `candidate` to the `seed` item.
    pub fn score_similar(&self, candidate: &CandidateItem, seed: &CandidateItem) -> ScoredItem {
        let same_category = match (candidate.category_id(), seed.category_id()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
        let similarity = tag_similarity(&candidate.tags, &seed.tags);
        let same_author = candidate.author.id == seed.author.id;

        let mut score = 0.0;
        if same_category {
            score += SAME_CATEGORY_BONUS;
        }
        score += similarity * TAG_SIMILARITY_WEIGHT;
        if same_author {
            score += SAME_AUTHOR_BONUS;
        }
        score += self.baseline(candidate);

        let reason = resolve_reason(
            &[
                ReasonRule::new(same_author, RecommendationReason::SameAuthor),
                ReasonRule::new(
                    similarity > SAME_TAGS_THRESHOLD,
                    RecommendationReason::SameTags,
                ),
                ReasonRule::new(same_category, RecommendationReason::SameCategory),
            ],
            RecommendationReason::SimilarContent,
        );

        trace!(
            item_id = %candidate.id,
            seed_id = %seed.id,
            similarity = similarity,
            score = score,
            reason = reason.as_str(),
            "Similar-content score computed"
        );

        ScoredItem::new(candidate.clone(), score, reason)
    }

    /// Baseline plus interest-profile bonuses. Without a profile every
    /// personalization signal contributes zero.
    pub fn score_personalized(
        &self,
        candidate: &CandidateItem,
        profile: Option<&InterestProfile>,
    ) -> ScoredItem {
        let mut score = self.baseline(candidate);

        let Some(profile) = profile else {
            return ScoredItem::new(candidate.clone(), score, RecommendationReason::Popular);
        };

        let weights = &self.config.weights;

        let followed_author = profile.followed_author_ids.contains(&candidate.author.id);
        let followed_category = candidate
            .category_id()
            .map(|id| profile.followed_category_ids.contains(&id))
            .unwrap_or(false);
        let tag_overlap = tag_overlap_fraction(&candidate.tags, &profile.followed_tags);
        let history_affinity = tag_similarity(&candidate.tags, &profile.history_tags);

        if followed_author {
            score += FOLLOWED_AUTHOR_BONUS * weights.personalization;
        }
        if followed_category {
            score += FOLLOWED_CATEGORY_BONUS * weights.personalization;
        }
        score += tag_overlap * FOLLOWED_TAG_WEIGHT * weights.personalization;
        score += history_affinity * weights.relevance;

        let reason = resolve_reason(
            &[
                ReasonRule::new(tag_overlap > 0.0, RecommendationReason::FollowedTag),
                ReasonRule::new(followed_category, RecommendationReason::FollowedCategory),
                ReasonRule::new(followed_author, RecommendationReason::FollowedAuthor),
                ReasonRule::new(
                    history_affinity > READING_HISTORY_THRESHOLD,
                    RecommendationReason::ReadingHistory,
                ),
            ],
            RecommendationReason::Popular,
        );

        trace!(
            item_id = %candidate.id,
            tag_overlap = tag_overlap,
            history_affinity = history_affinity,
            score = score,
            reason = reason.as_str(),
            "Personalized score computed"
        );

        ScoredItem::new(candidate.clone(), score, reason)
    }

    /// Relevance floor shared by every strategy.
    pub fn admits(&self, item: &ScoredItem) -> bool {
        item.score >= self.config.min_score
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{AuthorRef, CandidateItem, CategoryRef};
    use chrono::{DateTime, Duration, Utc};
    use std::collections::HashSet;
    use uuid::Uuid;

    pub fn fixed_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    pub fn author(id: Uuid) -> AuthorRef {
        AuthorRef {
            id,
            name: format!("author-{}", &id.to_string()[..8]),
            avatar_url: None,
        }
    }

    pub fn category(id: Uuid) -> CategoryRef {
        CategoryRef {
            id,
            name: "Category".to_string(),
            slug: format!("category-{}", &id.to_string()[..8]),
        }
    }

    pub fn candidate(
        author_id: Uuid,
        category_id: Option<Uuid>,
        tags: &[&str],
        age_hours: i64,
        views: u64,
    ) -> CandidateItem {
        let id = Uuid::new_v4();
        CandidateItem {
            id,
            title: format!("Post {}", id),
            slug: format!("post-{}", id),
            excerpt: String::new(),
            published_at: fixed_now() - Duration::hours(age_hours),
            view_count: views,
            reaction_count: views / 20,
            comment_count: views / 50,
            tags: tags.iter().map(|t| t.to_string()).collect::<HashSet<_>>(),
            author: author(author_id),
            category: category_id.map(category),
            reading_time_minutes: 5,
            featured: false,
        }
    }
}
