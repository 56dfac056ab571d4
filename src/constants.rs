// src/constants.rs

/// Seconds between periodic flushes of accrued time. Worst-case unsynced
/// time lost on abrupt process death is one interval.
pub const FLUSH_INTERVAL_SECS: u64 = 6;

/// Seconds between retention sweeps (once per day)
pub const CLEANUP_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Maximum age in seconds of a persisted session snapshot that is still
/// eligible for resume rather than abandonment
pub const STALE_SESSION_SECS: i64 = 30 * 60;

/// Days of day-bucket history kept before the janitor deletes them
pub const RETENTION_DAYS: u32 = 90;

/// Storage key prefix for day buckets (`day:YYYY-MM-DD`)
pub const DAY_KEY_PREFIX: &str = "day:";

/// Storage key for the live-session snapshot
pub const SESSION_KEY: &str = "session";

/// Storage key for the category registry
pub const CATEGORIES_KEY: &str = "categories";

/// Storage key for user classification overrides
pub const CLASSIFICATION_OVERRIDES_KEY: &str = "classification_overrides";

/// The always-present fallback category tag
pub const OTHER_CATEGORY: &str = "other";
