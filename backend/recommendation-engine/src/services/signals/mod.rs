// ============================================
// Signal Functions
// ============================================
//
// Bounded [0, 1] components of the composite score. All functions are pure;
// the caller captures `now` once per request and threads it through.

use crate::utils::{age_days, age_hours};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

pub const DEFAULT_COMMENT_WEIGHT: f64 = 2.0;
pub const DEFAULT_ENGAGEMENT_SCALE: f64 = 10.0;

/// Exponential decay: 1.0 at publish time, 0.5 after one half-life.
pub fn recency_score(published_at: DateTime<Utc>, now: DateTime<Utc>, half_life_days: f64) -> f64 {
    0.5_f64.powf(age_days(published_at, now) / half_life_days)
}

/// Log-scaled views relative to the most viewed item of the batch.
pub fn popularity_score(view_count: u64, max_view_count: u64) -> f64 {
    if max_view_count == 0 {
        return 0.0;
    }
    let score = ((view_count as f64) + 1.0).log10() / ((max_view_count as f64) + 1.0).log10();
    score.clamp(0.0, 1.0)
}

pub fn engagement_score(reactions: u64, comments: u64, views: u64) -> f64 {
    engagement_score_calibrated(
        reactions,
        comments,
        views,
        DEFAULT_COMMENT_WEIGHT,
        DEFAULT_ENGAGEMENT_SCALE,
    )
}

/// Interaction rate per view, scaled and capped at 1.0.
pub fn engagement_score_calibrated(
    reactions: u64,
    comments: u64,
    views: u64,
    comment_weight: f64,
    scale: f64,
) -> f64 {
    if views == 0 {
        return 0.0;
    }
    let interactions = reactions as f64 + comment_weight * comments as f64;
    ((interactions / views as f64) * scale).min(1.0)
}

fn lowercase_set(tags: &HashSet<String>) -> HashSet<String> {
    tags.iter().map(|t| t.to_lowercase()).collect()
}

/// Case-insensitive Jaccard index. Empty on either side scores 0, so two
/// untagged items never match perfectly.
pub fn tag_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a = lowercase_set(a);
    let b = lowercase_set(b);

    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Share of the candidate's tags the viewer follows.
pub fn tag_overlap_fraction(candidate_tags: &HashSet<String>, followed: &HashSet<String>) -> f64 {
    if candidate_tags.is_empty() || followed.is_empty() {
        return 0.0;
    }

    let candidate = lowercase_set(candidate_tags);
    let followed = lowercase_set(followed);

    candidate.intersection(&followed).count() as f64 / candidate.len() as f64
}

/// Views per hour since publication, with the age floored at one hour.
pub fn view_velocity(view_count: u64, published_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    view_count as f64 / age_hours(published_at, now).max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn tags(values: &[&str]) -> HashSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_recency_half_life() {
        let now = Utc::now();
        assert!((recency_score(now, now, 7.0) - 1.0).abs() < 1e-9);
        assert!((recency_score(now - Duration::days(7), now, 7.0) - 0.5).abs() < 1e-6);
        assert!((recency_score(now - Duration::days(14), now, 7.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_recency_future_publish_is_fresh() {
        let now = Utc::now();
        assert!((recency_score(now + Duration::days(1), now, 7.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_recency_monotonic() {
        let now = Utc::now();
        let newer = recency_score(now - Duration::hours(5), now, 7.0);
        let older = recency_score(now - Duration::hours(50), now, 7.0);
        assert!(newer > older);
    }

    #[test]
    fn test_popularity_bounds() {
        assert_eq!(popularity_score(0, 0), 0.0);
        assert_eq!(popularity_score(10, 0), 0.0);
        assert!((popularity_score(1000, 1000) - 1.0).abs() < 1e-9);
        assert_eq!(popularity_score(0, 1000), 0.0);
    }

    #[test]
    fn test_popularity_compresses_outliers() {
        // Linear normalization would give 0.001; log keeps the small item visible
        let score = popularity_score(100, 100_000);
        assert!(score > 0.35 && score < 0.45, "got {}", score);
    }

    #[test]
    fn test_engagement() {
        assert_eq!(engagement_score(5, 5, 0), 0.0);
        // (2 + 2*1) / 100 * 10 = 0.4
        assert!((engagement_score(2, 1, 100) - 0.4).abs() < 1e-9);
        assert_eq!(engagement_score(50, 50, 100), 1.0);
    }

    #[test]
    fn test_engagement_calibration() {
        // (2 + 3*1) / 100 * 5 = 0.25
        let score = engagement_score_calibrated(2, 1, 100, 3.0, 5.0);
        assert!((score - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_tag_similarity() {
        let a = tags(&["AI", "ml"]);
        let b = tags(&["ai", "ML", "data"]);
        assert!((tag_similarity(&a, &b) - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(tag_similarity(&a, &b), tag_similarity(&b, &a));
    }

    #[test]
    fn test_tag_similarity_empty_sets() {
        let empty = HashSet::new();
        assert_eq!(tag_similarity(&empty, &empty), 0.0);
        assert_eq!(tag_similarity(&empty, &tags(&["rust"])), 0.0);
        assert_eq!(tag_similarity(&tags(&["rust"]), &empty), 0.0);
    }

    #[test]
    fn test_tag_overlap_fraction() {
        let candidate = tags(&["rust", "async", "tokio", "web"]);
        let followed = tags(&["Rust", "Tokio", "python"]);
        assert!((tag_overlap_fraction(&candidate, &followed) - 0.5).abs() < 1e-9);
        assert_eq!(tag_overlap_fraction(&candidate, &HashSet::new()), 0.0);
    }

    #[test]
    fn test_view_velocity_floors_age() {
        let now = Utc::now();
        assert_eq!(view_velocity(30, now - Duration::minutes(10), now), 30.0);
        assert!((view_velocity(100, now - Duration::hours(4), now) - 25.0).abs() < 1e-9);
    }
}
