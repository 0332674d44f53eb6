// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync state notifications.

use std::fmt;

use serde::Serialize;
use tokio::sync::broadcast;

/// Buffered events per subscriber before the oldest are dropped.
const CHANNEL_CAPACITY: usize = 64;

/// Engine state as seen by observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Online,
    Offline,
    Syncing,
    Error,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Online => "online",
            SyncState::Offline => "offline",
            SyncState::Syncing => "syncing",
            SyncState::Error => "error",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The `sync-state-changed` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStateChanged {
    pub state: SyncState,
    pub pending: Option<usize>,
}

/// Fan-out of [`SyncStateChanged`] events to any number of subscribers.
#[derive(Debug, Clone)]
pub struct StatusBroadcaster {
    tx: broadcast::Sender<SyncStateChanged>,
}

impl StatusBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        StatusBroadcaster { tx }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn emit(&self, state: SyncState, pending: Option<usize>) {
        let _ = self.tx.send(SyncStateChanged { state, pending });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncStateChanged> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for StatusBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
