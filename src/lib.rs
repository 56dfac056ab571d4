pub mod classifier;
pub mod constants;
pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod janitor;
pub mod ledger;
pub mod models;
pub mod stats;
pub mod tracker;

mod test_utils;

use directories::ProjectDirs;
use error::AppError;
use std::path::PathBuf;

/// Default location of the airtime database, creating the data directory
/// on demand.
pub fn default_db_path() -> Result<PathBuf, AppError> {
    let proj_dirs = ProjectDirs::from("com", "airtime", "Airtime")
        .ok_or_else(|| AppError::Internal("could not determine project directories".to_string()))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .map_err(|e| AppError::Internal(format!("could not create data directory: {e}")))?;
    Ok(data_dir.join("airtime.db"))
}
