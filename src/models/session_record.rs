use crate::constants::SESSION_KEY;
use crate::db;
use crate::error::AppError;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// At-most-one-instance snapshot of the live tracking state.
///
/// Written on every state transition, read once at process start to seed
/// recovery. Missing fields deserialize to their safe values: not idle,
/// window focused, not audible, no timestamp (no resume).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub tracking_start: Option<i64>,
    #[serde(default)]
    pub is_idle: bool,
    #[serde(default = "focused_default")]
    pub is_window_focused: bool,
    #[serde(default)]
    pub is_audible: bool,
    #[serde(default)]
    pub last_updated: i64,
}

fn focused_default() -> bool {
    true
}

impl SessionRecord {
    pub fn load(conn: &Connection) -> Result<Option<Self>, AppError> {
        db::get(conn, SESSION_KEY)
    }

    pub fn save(&self, conn: &Connection) -> Result<(), AppError> {
        db::set(conn, SESSION_KEY, self)
    }

    pub fn clear(conn: &Connection) -> Result<(), AppError> {
        db::delete(conn, SESSION_KEY)
    }
}
