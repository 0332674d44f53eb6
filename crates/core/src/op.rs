// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync operations: one remote call each.
//!
//! A draft is realized on the server by a short chain of operations created
//! together at enqueue time:
//!
//! ```text
//! create-entity → upload-attachment(0) → … → upload-attachment(n-1) → finalize-entity?
//! ```
//!
//! The queue key (`id`) is assigned by the store and increases monotonically,
//! so ordering by id is both FIFO and the required execution order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// The kind of remote call an operation performs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpKind {
    CreateEntity,
    UploadAttachment,
    FinalizeEntity,
    /// A type written by a newer client. Discarded by the engine.
    Unknown(String),
}

impl OpKind {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &str {
        match self {
            OpKind::CreateEntity => "create-entity",
            OpKind::UploadAttachment => "upload-attachment",
            OpKind::FinalizeEntity => "finalize-entity",
            OpKind::Unknown(s) => s,
        }
    }

    /// Parses a stored type string. Never fails: unrecognized types are kept
    /// as [`OpKind::Unknown`].
    pub fn parse(s: &str) -> Self {
        match s {
            "create-entity" => OpKind::CreateEntity,
            "upload-attachment" => OpKind::UploadAttachment,
            "finalize-entity" => OpKind::FinalizeEntity,
            other => OpKind::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A queued remote operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOp {
    /// Queue position. Assigned by the store; 0 before insertion.
    pub id: i64,
    pub kind: OpKind,
    /// Client id of the owning draft.
    pub draft_id: String,
    /// Type-specific JSON: entity fields for create, index and content
    /// type for uploads, `null` for finalize.
    pub payload: serde_json::Value,
    /// Attachment bytes, for uploads only.
    pub data: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
    /// Failed attempts so far.
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl SyncOp {
    fn unsaved(
        kind: OpKind,
        draft_id: &str,
        payload: serde_json::Value,
        data: Option<Vec<u8>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        SyncOp {
            id: 0,
            kind,
            draft_id: draft_id.to_string(),
            payload,
            data,
            created_at,
            attempts: 0,
            last_error: None,
        }
    }

    /// Builds a create-entity op carrying the entity fields.
    pub fn create_entity(
        draft_id: &str,
        fields: serde_json::Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::unsaved(OpKind::CreateEntity, draft_id, fields, None, created_at)
    }

    /// Builds an upload-attachment op for the attachment at `index`.
    pub fn upload_attachment(
        draft_id: &str,
        index: usize,
        content_type: &str,
        name: Option<&str>,
        data: Vec<u8>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let payload = json!({
            "index": index,
            "content_type": content_type,
            "name": name,
        });
        Self::unsaved(
            OpKind::UploadAttachment,
            draft_id,
            payload,
            Some(data),
            created_at,
        )
    }

    /// Builds a finalize-entity op.
    pub fn finalize_entity(draft_id: &str, created_at: DateTime<Utc>) -> Self {
        Self::unsaved(
            OpKind::FinalizeEntity,
            draft_id,
            serde_json::Value::Null,
            None,
            created_at,
        )
    }

    /// Attachment position for upload ops.
    pub fn attachment_index(&self) -> Option<usize> {
        self.payload
            .get("index")
            .and_then(serde_json::Value::as_u64)
            .and_then(|i| usize::try_from(i).ok())
    }

    /// Attachment MIME type for upload ops, defaulting to octet-stream.
    pub fn attachment_content_type(&self) -> &str {
        self.payload
            .get("content_type")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("application/octet-stream")
    }

    /// Attachment file name for upload ops, if one was recorded.
    pub fn attachment_name(&self) -> Option<&str> {
        self.payload.get("name").and_then(serde_json::Value::as_str)
    }
}

#[cfg(test)]
#[path = "op_tests.rs"]
mod tests;
