// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! User-visible banner text for sync state.

use crate::sync::{SyncState, SyncStateChanged};

pub const OFFLINE_BANNER: &str = "Offline - changes will sync when reconnected";

/// Renders the persistent banner for a state change.
///
/// Returns `None` when nothing should be shown: online with no pending work.
pub fn render(event: &SyncStateChanged) -> Option<String> {
    let pending = event.pending.unwrap_or(0);
    match event.state {
        SyncState::Offline => Some(OFFLINE_BANNER.to_string()),
        SyncState::Syncing if pending == 0 => Some("Syncing...".to_string()),
        SyncState::Syncing => Some(format!("Syncing {}...", changes(pending))),
        SyncState::Error if pending == 0 => {
            Some("Sync error - a draft failed to sync".to_string())
        }
        SyncState::Error => Some(format!(
            "Sync error - a draft failed to sync, {} waiting",
            changes(pending)
        )),
        SyncState::Online if pending == 0 => None,
        SyncState::Online => Some(format!("{} waiting to sync", changes(pending))),
    }
}

fn changes(n: usize) -> String {
    if n == 1 {
        "1 change".to_string()
    } else {
        format!("{} changes", n)
    }
}

#[cfg(test)]
#[path = "banner_tests.rs"]
mod tests;
