// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::sync::SyncError;

/// All possible errors that can occur in the draftsync CLI.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: run 'draftsync init' first")]
    NotInitialized,

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("draft not found: {0}")]
    DraftNotFound(String),

    #[error("invalid prefix: must be 2+ lowercase alphanumeric characters with at least one letter")]
    InvalidPrefix,

    #[error("invalid payload: {0}\n  hint: the payload must be a JSON object, e.g. '{{\"name\": \"ring\"}}'")]
    InvalidPayload(String),

    #[error("cannot read attachment {path}: {reason}")]
    AttachmentUnreadable { path: String, reason: String },

    #[error("no remote configured\n  hint: set [remote] url in .draftsync/config.toml or DRAFTSYNC_REMOTE_URL")]
    NoRemote,

    #[error("another sync runner is active (lock held on {0})")]
    RunnerActive(String),

    #[error("failed to generate unique draft ID after multiple retries")]
    IdGenerationFailed,

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] ds_core::Error),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
