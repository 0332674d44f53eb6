// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Draft entity repository.
//!
//! Drafts are mutated only here and by the sync engine. No payload
//! validation happens locally; that is the server's job.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{parse_db, parse_json, parse_timestamp, Database};
use crate::draft::{Attachment, Draft, SyncStatus};
use crate::error::{Error, Result};

const DRAFT_COLUMNS: &str =
    "id, sync_status, sync_error, created_at, payload, finalize_intent, server_id";

fn draft_from_row(row: &Row<'_>) -> std::result::Result<Draft, rusqlite::Error> {
    let status_str: String = row.get(1)?;
    let created_str: String = row.get(3)?;
    let payload_str: String = row.get(4)?;
    Ok(Draft {
        id: row.get(0)?,
        sync_status: parse_db(&status_str, "sync_status")?,
        sync_error: row.get(2)?,
        created_at: parse_timestamp(&created_str, "created_at")?,
        payload: parse_json(&payload_str, "payload")?,
        attachments: Vec::new(),
        finalize_intent: row.get(5)?,
        server_id: row.get(6)?,
    })
}

/// Insert a draft and its attachments on an open connection or transaction.
pub(crate) fn insert_draft(conn: &Connection, draft: &Draft) -> Result<()> {
    let inserted = conn.execute(
        "INSERT INTO drafts (id, sync_status, sync_error, created_at, payload,
         finalize_intent, server_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            draft.id,
            draft.sync_status.as_str(),
            draft.sync_error,
            draft.created_at.to_rfc3339(),
            serde_json::to_string(&draft.payload)?,
            draft.finalize_intent,
            draft.server_id,
        ],
    );

    match inserted {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(Error::DraftExists(draft.id.clone()));
        }
        Err(e) => return Err(e.into()),
    }

    for (position, attachment) in draft.attachments.iter().enumerate() {
        conn.execute(
            "INSERT INTO draft_attachments (draft_id, position, name, content_type, data)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                draft.id,
                i64::try_from(position).unwrap_or(i64::MAX),
                attachment.name,
                attachment.content_type,
                attachment.data,
            ],
        )?;
    }
    Ok(())
}

impl Database {
    /// Persist a new draft together with its attachments.
    pub fn save_draft(&mut self, draft: &Draft) -> Result<()> {
        let tx = self.conn.transaction()?;
        insert_draft(&tx, draft)?;
        tx.commit()?;
        Ok(())
    }

    /// Get a draft by id, with attachments.
    pub fn get_draft(&self, id: &str) -> Result<Option<Draft>> {
        let draft = self
            .conn
            .query_row(
                &format!("SELECT {DRAFT_COLUMNS} FROM drafts WHERE id = ?1"),
                params![id],
                draft_from_row,
            )
            .optional()?;

        match draft {
            Some(mut draft) => {
                draft.attachments = self.get_attachments(&draft.id)?;
                Ok(Some(draft))
            }
            None => Ok(None),
        }
    }

    /// Check if a draft exists.
    pub fn draft_exists(&self, id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM drafts WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// All drafts, newest first.
    pub fn list_drafts(&self) -> Result<Vec<Draft>> {
        self.query_drafts(
            &format!("SELECT {DRAFT_COLUMNS} FROM drafts ORDER BY created_at DESC, id"),
            &[],
        )
    }

    /// Drafts with the given sync status, newest first.
    pub fn list_drafts_by_status(&self, status: SyncStatus) -> Result<Vec<Draft>> {
        self.query_drafts(
            &format!(
                "SELECT {DRAFT_COLUMNS} FROM drafts WHERE sync_status = ?1
                 ORDER BY created_at DESC, id"
            ),
            &[&status.as_str()],
        )
    }

    fn query_drafts(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<Draft>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(args, draft_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut drafts = Vec::with_capacity(rows.len());
        for mut draft in rows {
            draft.attachments = self.get_attachments(&draft.id)?;
            drafts.push(draft);
        }
        Ok(drafts)
    }

    fn get_attachments(&self, draft_id: &str) -> Result<Vec<Attachment>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, content_type, data FROM draft_attachments
             WHERE draft_id = ?1 ORDER BY position",
        )?;
        let attachments = stmt
            .query_map(params![draft_id], |row| {
                Ok(Attachment {
                    name: row.get(0)?,
                    content_type: row.get(1)?,
                    data: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(attachments)
    }

    /// Set a draft's sync status.
    ///
    /// `error` is stored only when the status is [`SyncStatus::Error`] and is
    /// cleared otherwise. Unknown ids are ignored: the draft may have been
    /// deleted concurrently.
    pub fn update_sync_status(
        &self,
        id: &str,
        status: SyncStatus,
        error: Option<&str>,
    ) -> Result<()> {
        let error = match status {
            SyncStatus::Error => error,
            _ => None,
        };
        self.conn.execute(
            "UPDATE drafts SET sync_status = ?1, sync_error = ?2 WHERE id = ?3",
            params![status.as_str(), error, id],
        )?;
        Ok(())
    }

    /// The server-assigned id recorded for a draft, if any.
    pub fn server_id(&self, id: &str) -> Result<Option<String>> {
        let server_id: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT server_id FROM drafts WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(server_id.flatten())
    }

    /// Delete a draft and its attachments. Returns whether it existed.
    pub fn delete_draft(&self, id: &str) -> Result<bool> {
        self.conn.execute(
            "DELETE FROM draft_attachments WHERE draft_id = ?1",
            params![id],
        )?;
        let affected = self
            .conn
            .execute("DELETE FROM drafts WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    /// Delete a draft and every queued operation for it in one transaction.
    ///
    /// Returns the number of operations removed.
    pub fn discard_draft(&mut self, id: &str) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let ops = tx.execute("DELETE FROM sync_ops WHERE draft_id = ?1", params![id])?;
        tx.execute(
            "DELETE FROM draft_attachments WHERE draft_id = ?1",
            params![id],
        )?;
        let affected = tx.execute("DELETE FROM drafts WHERE id = ?1", params![id])?;
        tx.commit()?;

        if affected == 0 {
            return Err(Error::DraftNotFound(id.to_string()));
        }
        Ok(ops)
    }

    /// Delete every `synced` draft that no longer has queued operations.
    ///
    /// Finishes grace-period purges that were cut short by a shutdown.
    pub fn purge_synced(&mut self) -> Result<Vec<String>> {
        let tx = self.conn.transaction()?;
        let ids = {
            let mut stmt = tx.prepare(
                "SELECT id FROM drafts WHERE sync_status = 'synced'
                 AND NOT EXISTS (SELECT 1 FROM sync_ops WHERE sync_ops.draft_id = drafts.id)",
            )?;
            let ids = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            ids
        };
        for id in &ids {
            tx.execute(
                "DELETE FROM draft_attachments WHERE draft_id = ?1",
                params![id],
            )?;
            tx.execute("DELETE FROM drafts WHERE id = ?1", params![id])?;
        }
        tx.commit()?;
        Ok(ids)
    }
}

#[cfg(test)]
#[path = "drafts_tests.rs"]
mod tests;
