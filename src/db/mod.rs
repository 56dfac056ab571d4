pub mod schema;
pub mod migrations;

use crate::error::AppError;
use rusqlite::{params, Connection, OptionalExtension, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &PathBuf) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Read a stored record by key, `None` when the key is absent.
pub fn get<T: DeserializeOwned>(conn: &Connection, key: &str) -> Result<Option<T>, AppError> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()?;

    match raw {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Write a record under a key, replacing any previous value.
pub fn set<T: Serialize>(conn: &Connection, key: &str, value: &T) -> Result<(), AppError> {
    let raw = serde_json::to_string(value)?;
    conn.execute(
        "INSERT INTO kv (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, raw],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, key: &str) -> Result<(), AppError> {
    conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
    Ok(())
}

pub fn delete_many(conn: &Connection, keys: &[String]) -> Result<(), AppError> {
    let mut stmt = conn.prepare("DELETE FROM kv WHERE key = ?1")?;
    for key in keys {
        stmt.execute(params![key])?;
    }
    Ok(())
}

/// All keys starting with `prefix`, in lexicographic order.
pub fn keys_with_prefix(conn: &Connection, prefix: &str) -> Result<Vec<String>, AppError> {
    let mut stmt = conn.prepare("SELECT key FROM kv WHERE key LIKE ?1 || '%' ORDER BY key")?;
    let rows = stmt.query_map(params![prefix], |row| row.get(0))?;
    let mut keys = Vec::new();
    for key in rows {
        keys.push(key?);
    }
    Ok(keys)
}
