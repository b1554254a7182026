// Utility functions for recommendation-engine

use crate::models::ScoredItem;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

const SECONDS_PER_HOUR: f64 = 3600.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Age in fractional hours. Timestamps after `now` count as age 0.
pub fn age_hours(published_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let seconds = (now - published_at).num_seconds().max(0) as f64;
    seconds / SECONDS_PER_HOUR
}

pub fn age_days(published_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    age_hours(published_at, now) / HOURS_PER_DAY
}

/// Score descending, item id ascending on ties so equal scores keep a stable,
/// input-independent order.
pub fn compare_by_score_desc(a: &ScoredItem, b: &ScoredItem) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.item.id.cmp(&b.item.id))
}

pub fn sort_by_score_desc(items: &mut [ScoredItem]) {
    items.sort_by(compare_by_score_desc);
}
