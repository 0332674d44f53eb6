// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::str::FromStr;

use ds_core::{Database, Draft, SyncStatus};

use crate::cli::OutputFormat;
use crate::display::format_draft_line;
use crate::error::Result;

use super::{open_db, print_json};

pub fn run(status: Option<String>, output: OutputFormat) -> Result<()> {
    let (db, _, _) = open_db()?;
    let drafts = run_impl(&db, status.as_deref())?;

    match output {
        OutputFormat::Text => {
            for draft in &drafts {
                println!("{}", format_draft_line(draft));
            }
        }
        OutputFormat::Id => {
            for draft in &drafts {
                println!("{}", draft.id);
            }
        }
        OutputFormat::Json => print_json(&drafts)?,
    }
    Ok(())
}

/// Drafts newest first, optionally restricted to one sync status.
pub(crate) fn run_impl(db: &Database, status: Option<&str>) -> Result<Vec<Draft>> {
    let drafts = match status {
        Some(s) => db.list_drafts_by_status(SyncStatus::from_str(s)?)?,
        None => db.list_drafts()?,
    };
    Ok(drafts)
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
