use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Accumulated attention for one domain within one day bucket.
///
/// `time` and `visits` only ever grow while the bucket lives; the janitor
/// deletes whole buckets, never individual fields. `category` is seeded from
/// the classifier when the record is first created; an empty string marks a
/// record stored before a category was known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRecord {
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub visits: i64,
    #[serde(default)]
    pub category: String,
}

impl DomainRecord {
    pub fn new(category: &str) -> Self {
        Self {
            time: 0,
            visits: 0,
            category: category.to_string(),
        }
    }
}

/// One calendar day's records, keyed by domain.
pub type DayBucket = BTreeMap<String, DomainRecord>;
