// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for ds-core operations.

use thiserror::Error;

/// All possible errors that can occur in ds-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("draft not found: {0}")]
    DraftNotFound(String),

    #[error("draft already exists: {0}")]
    DraftExists(String),

    #[error("operation not found: {0}")]
    OpNotFound(i64),

    #[error("invalid sync status: '{0}'\n  hint: valid statuses are: pending, syncing, synced, error")]
    InvalidSyncStatus(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for ds-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
