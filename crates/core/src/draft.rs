// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Draft entities: records created on the client that the server has not
//! yet confirmed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Where a draft is in its journey to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Queued, no operation attempted yet. Initial state for new drafts.
    Pending,
    /// At least one of its operations has been attempted.
    Syncing,
    /// Every operation completed; awaiting purge after the grace period.
    Synced,
    /// An operation exhausted its retry budget. Terminal for the chain.
    Error,
}

impl SyncStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::Error => "error",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(SyncStatus::Pending),
            "syncing" => Ok(SyncStatus::Syncing),
            "synced" => Ok(SyncStatus::Synced),
            "error" => Ok(SyncStatus::Error),
            _ => Err(Error::InvalidSyncStatus(s.to_string())),
        }
    }
}

/// A binary item uploaded after the entity is created (e.g. a photo).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Original file name, if known.
    pub name: Option<String>,
    /// MIME type sent with the upload.
    pub content_type: String,
    /// Raw bytes.
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl Attachment {
    /// Creates an attachment from raw bytes.
    pub fn new(content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Attachment {
            name: None,
            content_type: content_type.into(),
            data,
        }
    }

    /// Sets the original file name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A client-originated entity pending confirmation by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    /// Client-generated identifier, stable for the draft's local lifetime.
    pub id: String,
    pub sync_status: SyncStatus,
    /// Last failure description; only present when `sync_status` is `error`.
    pub sync_error: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Domain fields used to construct the entity remotely. Opaque here.
    pub payload: serde_json::Value,
    /// Uploaded in order after creation.
    pub attachments: Vec<Attachment>,
    /// Whether a finalize call must run after creation and uploads.
    pub finalize_intent: bool,
    /// Server-assigned id, recorded once creation succeeds.
    pub server_id: Option<String>,
}

impl Draft {
    /// Creates a new pending draft.
    pub fn new(id: String, payload: serde_json::Value, created_at: DateTime<Utc>) -> Self {
        Draft {
            id,
            sync_status: SyncStatus::Pending,
            sync_error: None,
            created_at,
            payload,
            attachments: Vec::new(),
            finalize_intent: false,
            server_id: None,
        }
    }

    /// Appends an attachment.
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Sets whether the entity is finalized after upload.
    pub fn with_finalize(mut self, finalize: bool) -> Self {
        self.finalize_intent = finalize;
        self
    }

    /// Number of remote operations this draft needs.
    pub fn chain_len(&self) -> usize {
        1 + self.attachments.len() + usize::from(self.finalize_intent)
    }
}

#[cfg(test)]
#[path = "draft_tests.rs"]
mod tests;
