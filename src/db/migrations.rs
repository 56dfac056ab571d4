use super::schema::SCHEMA;
use crate::constants::CATEGORIES_KEY;
use crate::error::AppError;
use crate::models::CategoryRegistry;
use rusqlite::Connection;

pub fn run(conn: &Connection) -> Result<(), AppError> {
    conn.execute_batch(SCHEMA)?;
    seed_category_registry(conn)?;
    Ok(())
}

fn seed_category_registry(conn: &Connection) -> Result<(), AppError> {
    let existing: Option<serde_json::Value> = super::get(conn, CATEGORIES_KEY)?;
    if existing.is_none() {
        CategoryRegistry::defaults().save(conn)?;
    }
    Ok(())
}
