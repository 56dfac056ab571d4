use crate::constants::CLASSIFICATION_OVERRIDES_KEY;
use crate::db;
use crate::error::AppError;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// User-facing tri-state sorting of a domain, independent of its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Focus,
    Neutral,
    Distract,
}

impl Classification {
    /// Classification for a domain the user never sorted explicitly,
    /// derived from its category's productivity weight.
    pub fn from_weight(weight: f64) -> Self {
        if weight >= 0.5 {
            Self::Focus
        } else if weight <= -0.3 {
            Self::Distract
        } else {
            Self::Neutral
        }
    }
}

/// Explicit per-domain overrides, stored under `classification_overrides`.
/// An override always takes precedence over the category-derived default.
pub type ClassificationOverrides = BTreeMap<String, Classification>;

pub fn load_overrides(conn: &Connection) -> Result<ClassificationOverrides, AppError> {
    Ok(db::get(conn, CLASSIFICATION_OVERRIDES_KEY)?.unwrap_or_default())
}

pub fn save_overrides(conn: &Connection, overrides: &ClassificationOverrides) -> Result<(), AppError> {
    db::set(conn, CLASSIFICATION_OVERRIDES_KEY, overrides)
}

pub fn set_override(
    conn: &Connection,
    domain: &str,
    classification: Classification,
) -> Result<(), AppError> {
    let mut overrides = load_overrides(conn)?;
    overrides.insert(domain.to_string(), classification);
    save_overrides(conn, &overrides)
}
