// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed durable local store.
//!
//! The [`Database`] struct is the only durable state in the sync subsystem.
//! It holds the draft entity and operation queue partitions (see
//! [`crate::drafts`] and [`crate::queue`]) plus generic read-cache partitions
//! for data fetched from the server.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::clock::{ClockSource, SystemClock};
use crate::error::{Error, Result};

/// SQL schema for the local store.
pub const SCHEMA: &str = r#"
-- Client-created entities awaiting server confirmation
CREATE TABLE IF NOT EXISTS drafts (
    id TEXT PRIMARY KEY,
    sync_status TEXT NOT NULL DEFAULT 'pending',
    sync_error TEXT,
    created_at TEXT NOT NULL,
    payload TEXT NOT NULL,
    finalize_intent INTEGER NOT NULL DEFAULT 0,
    server_id TEXT
);

-- Ordered binary items belonging to a draft
CREATE TABLE IF NOT EXISTS draft_attachments (
    draft_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    name TEXT,
    content_type TEXT NOT NULL,
    data BLOB NOT NULL,
    PRIMARY KEY (draft_id, position),
    FOREIGN KEY (draft_id) REFERENCES drafts(id) ON DELETE CASCADE
);

-- FIFO queue of pending remote operations
CREATE TABLE IF NOT EXISTS sync_ops (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    type TEXT NOT NULL,
    draft_id TEXT NOT NULL,
    payload TEXT NOT NULL,
    data BLOB,
    created_at TEXT NOT NULL,
    attempts INTEGER NOT NULL DEFAULT 0,
    last_error TEXT
);

-- Read-through cache of server data, one row per (partition, key)
CREATE TABLE IF NOT EXISTS read_cache (
    partition TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    cached_at TEXT NOT NULL,
    PRIMARY KEY (partition, key)
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_drafts_sync_status ON drafts(sync_status);
CREATE INDEX IF NOT EXISTS idx_sync_ops_draft ON sync_ops(draft_id);
"#;

/// Parse a string value from the database, returning a rusqlite error on parse failure.
pub(crate) fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid value '{value}' in column '{column}'"
            ))),
        )
    })
}

/// Parse an RFC3339 timestamp from the database.
pub(crate) fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(Error::CorruptedData(format!(
                    "invalid timestamp '{value}' in column '{column}'"
                ))),
            )
        })
}

/// Parse a JSON text column from the database.
pub(crate) fn parse_json(
    value: &str,
    column: &str,
) -> std::result::Result<serde_json::Value, rusqlite::Error> {
    serde_json::from_str(value).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid JSON in column '{column}'"
            ))),
        )
    })
}

/// Run schema creation and all migrations on a database connection.
///
/// Applies the canonical schema and runs idempotent migrations to upgrade
/// older stores that may be missing columns.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    migrate_add_server_id(conn)?;
    Ok(())
}

/// Migration: Add the durable server id column to drafts.
///
/// Stores created before server ids were recorded lose nothing: their
/// drafts simply have no server id until creation succeeds.
fn migrate_add_server_id(conn: &Connection) -> Result<()> {
    let has_column: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM pragma_table_info('drafts') WHERE name = 'server_id'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(false);

    if !has_column {
        conn.execute("ALTER TABLE drafts ADD COLUMN server_id TEXT", [])?;
    }
    Ok(())
}

/// SQLite database connection with draft, queue and cache operations.
pub struct Database {
    /// The underlying SQLite connection.
    pub conn: Connection,
    clock: Arc<dyn ClockSource>,
}

impl Database {
    /// Open a database connection at the given path, creating and migrating if needed.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Database {
            conn,
            clock: Arc::new(SystemClock),
        };
        run_migrations(&db.conn)?;
        Ok(db)
    }

    /// Replaces the clock used for store-assigned timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn ClockSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Get a cached value.
    pub fn cache_get(&self, partition: &str, key: &str) -> Result<Option<serde_json::Value>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM read_cache WHERE partition = ?1 AND key = ?2",
                params![partition, key],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Insert or replace a cached value.
    pub fn cache_put(&self, partition: &str, key: &str, value: &serde_json::Value) -> Result<()> {
        self.conn.execute(
            "INSERT INTO read_cache (partition, key, value, cached_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(partition, key) DO UPDATE SET
                 value = excluded.value,
                 cached_at = excluded.cached_at",
            params![
                partition,
                key,
                serde_json::to_string(value)?,
                self.now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// When a cached value was last written.
    pub fn cache_cached_at(&self, partition: &str, key: &str) -> Result<Option<DateTime<Utc>>> {
        let cached_at = self
            .conn
            .query_row(
                "SELECT cached_at FROM read_cache WHERE partition = ?1 AND key = ?2",
                params![partition, key],
                |row| {
                    let text: String = row.get(0)?;
                    parse_timestamp(&text, "cached_at")
                },
            )
            .optional()?;
        Ok(cached_at)
    }

    /// Remove a cached value. Returns whether it existed.
    pub fn cache_delete(&self, partition: &str, key: &str) -> Result<bool> {
        let affected = self.conn.execute(
            "DELETE FROM read_cache WHERE partition = ?1 AND key = ?2",
            params![partition, key],
        )?;
        Ok(affected > 0)
    }

    /// Remove every value in a partition.
    pub fn cache_clear(&self, partition: &str) -> Result<usize> {
        let affected = self.conn.execute(
            "DELETE FROM read_cache WHERE partition = ?1",
            params![partition],
        )?;
        Ok(affected)
    }

    /// Number of values in a partition.
    pub fn cache_count(&self, partition: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM read_cache WHERE partition = ?1",
            params![partition],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
