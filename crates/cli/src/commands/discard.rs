// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ds_core::Database;

use crate::error::{Error, Result};

use super::open_db;

pub fn run(id: &str) -> Result<()> {
    let (mut db, _, _) = open_db()?;
    let removed = run_impl(&mut db, id)?;
    println!(
        "Discarded draft {} ({} queued operations removed)",
        id, removed
    );
    Ok(())
}

/// Delete the draft and its remaining operations. Returns the number of
/// operations removed.
pub(crate) fn run_impl(db: &mut Database, id: &str) -> Result<usize> {
    if !db.draft_exists(id)? {
        return Err(Error::DraftNotFound(id.to_string()));
    }
    Ok(db.discard_draft(id)?)
}

#[cfg(test)]
#[path = "discard_tests.rs"]
mod tests;
