use crate::constants::DAY_KEY_PREFIX;
use crate::db;
use crate::error::AppError;
use crate::models::{DayBucket, DomainRecord};
use chrono::{Days, Local};
use rusqlite::Connection;

/// Local-time day key (`YYYY-MM-DD`) for a unix timestamp.
pub fn date_key(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "1970-01-01".to_string())
}

/// Storage key for a day bucket.
pub fn storage_key(date: &str) -> String {
    format!("{DAY_KEY_PREFIX}{date}")
}

/// Day keys for the local date of `now` and the preceding `days - 1`
/// calendar days, newest first.
pub fn recent_dates(now: i64, days: u32) -> Vec<String> {
    let Some(today) = chrono::DateTime::from_timestamp(now, 0)
        .map(|utc| utc.with_timezone(&Local).date_naive())
    else {
        return Vec::new();
    };

    (0..days)
        .filter_map(|i| today.checked_sub_days(Days::new(u64::from(i))))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect()
}

/// The bucket for one day, empty when none was ever written.
pub fn bucket(conn: &Connection, date: &str) -> Result<DayBucket, AppError> {
    Ok(db::get(conn, &storage_key(date))?.unwrap_or_default())
}

/// Add accrued seconds to a domain's record, creating it with the supplied
/// category seed on first use. Non-positive amounts are ignored: bucket
/// totals never decrease outside retention pruning.
pub fn add_time(
    conn: &Connection,
    date: &str,
    domain: &str,
    secs: i64,
    category: &str,
) -> Result<(), AppError> {
    if secs <= 0 {
        return Ok(());
    }

    let key = storage_key(date);
    let mut bucket: DayBucket = db::get(conn, &key)?.unwrap_or_default();
    let record = bucket
        .entry(domain.to_string())
        .or_insert_with(|| DomainRecord::new(category));
    record.time += secs;
    db::set(conn, &key, &bucket)
}

/// Count one visit to a domain, creating the record on first use.
/// Independent of whether time is currently accruing.
pub fn add_visit(conn: &Connection, date: &str, domain: &str, category: &str) -> Result<(), AppError> {
    let key = storage_key(date);
    let mut bucket: DayBucket = db::get(conn, &key)?.unwrap_or_default();
    let record = bucket
        .entry(domain.to_string())
        .or_insert_with(|| DomainRecord::new(category));
    record.visits += 1;
    db::set(conn, &key, &bucket)
}

/// Sum time and visits per domain across the given days. When the same
/// domain carries different categories across days, the last requested day
/// seen wins.
pub fn merge_buckets(conn: &Connection, dates: &[String]) -> Result<DayBucket, AppError> {
    let mut merged = DayBucket::new();
    for date in dates {
        for (domain, record) in bucket(conn, date)? {
            let entry = merged
                .entry(domain)
                .or_insert_with(|| DomainRecord::new(&record.category));
            entry.time += record.time;
            entry.visits += record.visits;
            entry.category = record.category;
        }
    }
    Ok(merged)
}

/// Delete every day bucket whose date orders before `cutoff_date`.
/// `YYYY-MM-DD` compares lexicographically in date order, so a string
/// comparison on the key suffix is exact. Returns the number removed.
pub fn prune_before(conn: &Connection, cutoff_date: &str) -> Result<usize, AppError> {
    let keys = db::keys_with_prefix(conn, DAY_KEY_PREFIX)?;
    let stale: Vec<String> = keys
        .into_iter()
        .filter(|key| {
            key.strip_prefix(DAY_KEY_PREFIX)
                .is_some_and(|date| is_date_key(date) && date < cutoff_date)
        })
        .collect();

    db::delete_many(conn, &stale)?;
    Ok(stale.len())
}

fn is_date_key(s: &str) -> bool {
    s.len() == 10
        && s.chars().enumerate().all(|(i, c)| {
            if i == 4 || i == 7 {
                c == '-'
            } else {
                c.is_ascii_digit()
            }
        })
}
