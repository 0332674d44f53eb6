// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Operation queue.
//!
//! A single global FIFO of [`SyncOp`]s keyed by an auto-incrementing id.
//! Operations are only ever created by [`Database::enqueue_creation_chain`],
//! which writes a draft and its complete, ordered chain in one transaction,
//! so per-draft causal order is fixed at enqueue time.

use rusqlite::{params, Connection, Row};
use tracing::{debug, warn};

use crate::db::{parse_json, parse_timestamp, Database};
use crate::draft::{Draft, SyncStatus};
use crate::drafts::insert_draft;
use crate::error::Result;
use crate::op::{OpKind, SyncOp};

/// Attempts allowed before an operation's draft is abandoned.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// What [`Database::fail_op`] did with a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOutcome {
    /// Kept in the queue for a later attempt.
    Retry,
    /// Retry budget exhausted: draft marked `error`, its ops purged.
    Abandoned,
}

const OP_COLUMNS: &str = "id, type, draft_id, payload, data, created_at, attempts, last_error";

fn op_from_row(row: &Row<'_>) -> std::result::Result<SyncOp, rusqlite::Error> {
    let kind_str: String = row.get(1)?;
    let payload_str: String = row.get(3)?;
    let created_str: String = row.get(5)?;
    Ok(SyncOp {
        id: row.get(0)?,
        kind: OpKind::parse(&kind_str),
        draft_id: row.get(2)?,
        payload: parse_json(&payload_str, "payload")?,
        data: row.get(4)?,
        created_at: parse_timestamp(&created_str, "created_at")?,
        attempts: row.get(6)?,
        last_error: row.get(7)?,
    })
}

fn insert_op(conn: &Connection, op: &SyncOp) -> Result<i64> {
    conn.execute(
        "INSERT INTO sync_ops (type, draft_id, payload, data, created_at, attempts, last_error)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            op.kind.as_str(),
            op.draft_id,
            serde_json::to_string(&op.payload)?,
            op.data,
            op.created_at.to_rfc3339(),
            op.attempts,
            op.last_error,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Build the ordered operation chain for a draft.
pub fn creation_chain(draft: &Draft, at: chrono::DateTime<chrono::Utc>) -> Vec<SyncOp> {
    let mut ops = Vec::with_capacity(draft.chain_len());
    ops.push(SyncOp::create_entity(&draft.id, draft.payload.clone(), at));
    for (index, attachment) in draft.attachments.iter().enumerate() {
        ops.push(SyncOp::upload_attachment(
            &draft.id,
            index,
            &attachment.content_type,
            attachment.name.as_deref(),
            attachment.data.clone(),
            at,
        ));
    }
    if draft.finalize_intent {
        ops.push(SyncOp::finalize_entity(&draft.id, at));
    }
    ops
}

impl Database {
    /// Persist a draft and append its full operation chain.
    ///
    /// Either the draft, its attachments and every operation are written, or
    /// nothing is. Returns the queued operations with their assigned ids.
    pub fn enqueue_creation_chain(&mut self, draft: &Draft) -> Result<Vec<SyncOp>> {
        let at = self.now();
        let mut ops = creation_chain(draft, at);

        let tx = self.conn.transaction()?;
        insert_draft(&tx, draft)?;
        for op in &mut ops {
            op.id = insert_op(&tx, op)?;
        }
        tx.commit()?;

        debug!(draft_id = %draft.id, ops = ops.len(), "enqueued creation chain");
        Ok(ops)
    }

    /// All queued operations in FIFO order, across every draft.
    pub fn list_pending(&self) -> Result<Vec<SyncOp>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {OP_COLUMNS} FROM sync_ops ORDER BY id"))?;
        let ops = stmt
            .query_map([], op_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ops)
    }

    /// Queued operations for one draft, in order.
    pub fn pending_for_draft(&self, draft_id: &str) -> Result<Vec<SyncOp>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {OP_COLUMNS} FROM sync_ops WHERE draft_id = ?1 ORDER BY id"
        ))?;
        let ops = stmt
            .query_map(params![draft_id], op_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ops)
    }

    /// Number of queued operations.
    pub fn pending_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sync_ops", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Remove a completed operation from the queue.
    pub fn complete_op(&self, op: &SyncOp) -> Result<()> {
        self.conn
            .execute("DELETE FROM sync_ops WHERE id = ?1", params![op.id])?;
        Ok(())
    }

    /// Complete a create-entity operation and record the server id on its
    /// draft in the same transaction.
    pub fn complete_create(&mut self, op: &SyncOp, server_id: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "UPDATE drafts SET server_id = ?1 WHERE id = ?2",
            params![server_id, op.draft_id],
        )?;
        tx.execute("DELETE FROM sync_ops WHERE id = ?1", params![op.id])?;
        tx.commit()?;
        Ok(())
    }

    /// Record a failed attempt.
    ///
    /// Below `max_retries` the incremented attempt count and error are
    /// persisted and the op stays queued. At the ceiling the owning draft is
    /// marked `error` and every remaining op for it is deleted.
    pub fn fail_op(&mut self, op: &SyncOp, error: &str, max_retries: u32) -> Result<FailOutcome> {
        let attempts = op.attempts.saturating_add(1);

        if attempts < max_retries {
            self.conn.execute(
                "UPDATE sync_ops SET attempts = ?1, last_error = ?2 WHERE id = ?3",
                params![attempts, error, op.id],
            )?;
            debug!(op_id = op.id, attempts, "operation will be retried");
            return Ok(FailOutcome::Retry);
        }

        let purged = self.abandon_draft(&op.draft_id, error)?;
        warn!(
            draft_id = %op.draft_id,
            attempts,
            purged,
            "retry budget exhausted, draft abandoned"
        );
        Ok(FailOutcome::Abandoned)
    }

    /// Mark a draft `error` with `error` and delete every op still queued
    /// for it, in one transaction. Returns the number of ops removed.
    pub fn abandon_draft(&mut self, draft_id: &str, error: &str) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "UPDATE drafts SET sync_status = ?1, sync_error = ?2 WHERE id = ?3",
            params![SyncStatus::Error.as_str(), error, draft_id],
        )?;
        let purged = tx.execute("DELETE FROM sync_ops WHERE draft_id = ?1", params![draft_id])?;
        tx.commit()?;
        Ok(purged)
    }

    /// Mark a draft as fully synced.
    ///
    /// Deletion after the grace period is scheduled by the caller.
    pub fn finalize_draft(&self, draft_id: &str) -> Result<()> {
        self.update_sync_status(draft_id, SyncStatus::Synced, None)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
