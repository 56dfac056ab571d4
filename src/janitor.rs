use crate::error::AppError;
use crate::ledger;
use chrono::{Days, Local};
use log::info;
use rusqlite::Connection;

/// Delete day buckets older than the retention window.
///
/// The cutoff is `retention_days` before the local date of `now`; the
/// bucket on the cutoff date itself is kept. Returns the number removed.
pub fn sweep(conn: &Connection, now: i64, retention_days: u32) -> Result<usize, AppError> {
    let cutoff = cutoff_date(now, retention_days);
    let removed = ledger::prune_before(conn, &cutoff)?;
    if removed > 0 {
        info!("retention sweep removed {removed} day buckets older than {cutoff}");
    }
    Ok(removed)
}

fn cutoff_date(now: i64, retention_days: u32) -> String {
    chrono::DateTime::from_timestamp(now, 0)
        .map(|utc| utc.with_timezone(&Local).date_naive())
        .and_then(|today| today.checked_sub_days(Days::new(u64::from(retention_days))))
        .map(|cutoff| cutoff.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "1970-01-01".to_string())
}
