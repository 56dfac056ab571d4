//! Shared test utilities for Airtime.

#![cfg(test)]

use crate::db::{migrations, Database};
use tempfile::{tempdir, TempDir};

/// Open a migrated database in a fresh temp directory.
///
/// Keep the returned TempDir alive for the whole test; dropping it deletes
/// the database file.
pub fn setup_test_db() -> (Database, TempDir) {
    let dir = tempdir().expect("temp directory for test DB");
    let db_path = dir.path().join("test.db");
    let db = Database::open(&db_path).expect("open test database");
    migrations::run(db.connection()).expect("migrate test database");
    (db, dir)
}
