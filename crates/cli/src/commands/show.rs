// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ds_core::{Database, Draft, SyncOp};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::display::format_draft_details;
use crate::error::{Error, Result};

use super::{open_db, print_json};

/// JSON view of a queued operation. Attachment bytes are omitted.
#[derive(Serialize)]
pub(crate) struct OpJson {
    pub id: i64,
    pub kind: String,
    pub draft_id: String,
    pub payload: serde_json::Value,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl From<&SyncOp> for OpJson {
    fn from(op: &SyncOp) -> Self {
        OpJson {
            id: op.id,
            kind: op.kind.to_string(),
            draft_id: op.draft_id.clone(),
            payload: op.payload.clone(),
            attempts: op.attempts,
            last_error: op.last_error.clone(),
        }
    }
}

#[derive(Serialize)]
struct DraftDetails {
    #[serde(flatten)]
    draft: Draft,
    operations: Vec<OpJson>,
}

pub fn run(id: &str, output: OutputFormat) -> Result<()> {
    let (db, _, _) = open_db()?;
    let (draft, ops) = run_impl(&db, id)?;

    match output {
        OutputFormat::Text => println!("{}", format_draft_details(&draft, &ops)),
        OutputFormat::Id => println!("{}", draft.id),
        OutputFormat::Json => print_json(&DraftDetails {
            operations: ops.iter().map(OpJson::from).collect(),
            draft,
        })?,
    }
    Ok(())
}

/// Load a draft and the operations still queued for it.
pub(crate) fn run_impl(db: &Database, id: &str) -> Result<(Draft, Vec<SyncOp>)> {
    let draft = db
        .get_draft(id)?
        .ok_or_else(|| Error::DraftNotFound(id.to_string()))?;
    let ops = db.pending_for_draft(id)?;
    Ok((draft, ops))
}

#[cfg(test)]
#[path = "show_tests.rs"]
mod tests;
