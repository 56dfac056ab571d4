use crate::constants::OTHER_CATEGORY;
use crate::models::{DayBucket, DomainRecord};
use std::collections::BTreeMap;

/// Productivity weight per category tag, in the closed interval [-0.7, 1.0].
/// Productive categories boost the focus score, distracting ones penalize.
pub const CATEGORY_PRODUCTIVITY: &[(&str, f64)] = &[
    ("development", 1.0),
    ("ai_tools", 0.9),
    ("productivity", 1.0),
    ("education", 0.8),
    ("email", 0.5),
    ("search", 0.3),
    ("finance", 0.3),
    ("news", 0.0),
    ("other", 0.0),
    ("shopping", -0.3),
    ("entertainment", -0.5),
    ("social", -0.7),
];

/// Weight for a tag; unknown or dangling tags weigh like `other`.
pub fn productivity_weight(tag: &str) -> f64 {
    CATEGORY_PRODUCTIVITY
        .iter()
        .find(|(t, _)| *t == tag)
        .map_or(0.0, |(_, w)| *w)
}

/// Focus score in [0, 100] for one bucket of records.
///
/// `raw = Σ(time·weight) / Σ(time)` lies in [-0.7, 1.0]; the additive and
/// divisive normalization maps that full range onto [0, 100]. Clamping
/// guards floating-point overshoot at the edges. An empty bucket scores 0.
pub fn focus_score(bucket: &DayBucket) -> u32 {
    let mut total_time = 0i64;
    let mut weighted = 0.0f64;

    for record in bucket.values() {
        total_time += record.time;
        weighted += record.time as f64 * productivity_weight(&record.category);
    }

    if total_time == 0 {
        return 0;
    }

    let raw = weighted / total_time as f64;
    let normalized = (((raw + 0.7) / 1.7) * 100.0).round();
    normalized.clamp(0.0, 100.0) as u32
}

/// Total tracked seconds in a bucket.
pub fn total_time(bucket: &DayBucket) -> i64 {
    bucket.values().map(|r| r.time).sum()
}

/// Tracked seconds per category tag.
pub fn category_totals(bucket: &DayBucket) -> BTreeMap<String, i64> {
    let mut totals = BTreeMap::new();
    for record in bucket.values() {
        let tag = if record.category.is_empty() {
            OTHER_CATEGORY
        } else {
            record.category.as_str()
        };
        *totals.entry(tag.to_string()).or_insert(0) += record.time;
    }
    totals
}

/// Domains sorted by accumulated time, descending, at most `limit` rows.
pub fn top_domains(bucket: &DayBucket, limit: usize) -> Vec<(String, DomainRecord)> {
    let mut rows: Vec<(String, DomainRecord)> = bucket
        .iter()
        .map(|(domain, record)| (domain.clone(), record.clone()))
        .collect();
    rows.sort_by(|a, b| b.1.time.cmp(&a.1.time));
    rows.truncate(limit);
    rows
}
