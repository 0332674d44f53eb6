// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ds_core::{Attachment, Database, Draft};
use serde_json::json;
use tokio::sync::broadcast;

use super::connectivity::Connectivity;
use super::engine::{shared, EngineConfig, SharedDb, SyncEngine};
use super::remote_tests::MockRemote;
use super::status::{StatusBroadcaster, SyncStateChanged};

/// Grace period used by engine tests.
pub const GRACE: Duration = Duration::from_secs(3);

/// A draft with `attachments` small JPEG attachments.
pub fn make_draft(id: &str, attachments: usize, finalize: bool) -> Draft {
    let mut draft = Draft::new(id.to_string(), json!({"sku": id}), Utc::now()).with_finalize(finalize);
    for i in 0..attachments {
        draft = draft.with_attachment(
            Attachment::new("image/jpeg", vec![i as u8; 3]).with_name(format!("{id}-{i}.jpg")),
        );
    }
    draft
}

pub fn memory_db() -> SharedDb {
    shared(Database::open_in_memory().unwrap())
}

pub struct Harness {
    pub engine: Arc<SyncEngine<MockRemote>>,
    pub remote: Arc<MockRemote>,
    pub events: broadcast::Receiver<SyncStateChanged>,
}

impl Harness {
    /// Engine over a fresh in-memory store.
    pub fn new(online: bool) -> Self {
        Self::with_db(memory_db(), Arc::new(MockRemote::new()), online)
    }

    /// Engine over an existing store and remote, as after a restart.
    pub fn with_db(db: SharedDb, remote: Arc<MockRemote>, online: bool) -> Self {
        let status = StatusBroadcaster::new();
        let events = status.subscribe();
        let config = EngineConfig {
            grace_period: GRACE,
            ..EngineConfig::default()
        };
        let engine = SyncEngine::new(
            db,
            Arc::clone(&remote),
            Connectivity::new(online),
            status,
            config,
        );
        Harness {
            engine: Arc::new(engine),
            remote,
            events,
        }
    }

    pub fn db(&self) -> SharedDb {
        Arc::clone(self.engine.db())
    }

    pub async fn enqueue(&self, draft: &Draft) {
        self.db().lock().await.enqueue_creation_chain(draft).unwrap();
    }

    /// Events broadcast since the last call.
    pub fn take_events(&mut self) -> Vec<SyncStateChanged> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}
