// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ds_core::{Database, SyncStatus};
use serde::Serialize;

use crate::banner::render;
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::sync::{HttpRemote, RemoteApi, SyncError, SyncState, SyncStateChanged};

use super::{open_db, print_json};

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub(crate) struct DraftCounts {
    pub pending: usize,
    pub syncing: usize,
    pub synced: usize,
    pub error: usize,
}

/// Snapshot of local sync state.
#[derive(Debug, Serialize)]
pub(crate) struct StatusReport {
    /// Queued operations.
    pub pending: usize,
    pub drafts: DraftCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    pub online: bool,
    pub state: SyncState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
}

pub fn run(output: OutputFormat) -> Result<()> {
    let (db, config, _) = open_db()?;
    let remote = config.effective_remote();
    let online = match &remote {
        Some(remote_config) => {
            let remote = HttpRemote::new(remote_config).map_err(SyncError::from)?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(remote.probe()).is_ok()
        }
        None => false,
    };

    let report = run_impl(&db, remote.map(|r| r.url), online)?;

    match output {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text | OutputFormat::Id => {
            for line in text_lines(&report) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

pub(crate) fn run_impl(
    db: &Database,
    remote: Option<String>,
    online: bool,
) -> Result<StatusReport> {
    let pending = db.pending_count()?;
    let mut drafts = DraftCounts::default();
    for draft in db.list_drafts()? {
        match draft.sync_status {
            SyncStatus::Pending => drafts.pending += 1,
            SyncStatus::Syncing => drafts.syncing += 1,
            SyncStatus::Synced => drafts.synced += 1,
            SyncStatus::Error => drafts.error += 1,
        }
    }

    let state = if !online {
        SyncState::Offline
    } else if drafts.error > 0 {
        SyncState::Error
    } else {
        SyncState::Online
    };
    let banner = render(&SyncStateChanged {
        state,
        pending: Some(pending),
    });

    Ok(StatusReport {
        pending,
        drafts,
        remote,
        online,
        state,
        banner,
    })
}

pub(crate) fn text_lines(report: &StatusReport) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(banner) = &report.banner {
        lines.push(banner.clone());
        lines.push(String::new());
    }
    match &report.remote {
        Some(url) => lines.push(format!(
            "Remote: {} ({})",
            url,
            if report.online { "reachable" } else { "unreachable" }
        )),
        None => lines.push("Remote: not configured".to_string()),
    }
    lines.push(format!("Pending operations: {}", report.pending));
    let d = &report.drafts;
    lines.push(format!(
        "Drafts: {} pending, {} syncing, {} synced, {} error",
        d.pending, d.syncing, d.synced, d.error
    ));
    lines
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
