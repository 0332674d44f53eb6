// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The drain loop.
//!
//! [`SyncEngine`] replays the durable operation queue against a
//! [`RemoteApi`] strictly in FIFO order. One pass runs at a time; a trigger
//! that arrives while a pass is running is ignored rather than queued.
//!
//! Failure handling follows [`FailureKind`]:
//! - connectivity failures halt the pass and leave the queue untouched
//! - rejections consume the retry budget of the failed operation, and an
//!   exhausted budget abandons the whole draft
//! - a malformed operation abandons its draft; an operation with no draft
//!   or an unknown type is discarded

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ds_core::{Database, Draft, FailOutcome, OpKind, SyncOp, SyncStatus};
use tracing::{debug, info, warn};

use super::connectivity::Connectivity;
use super::deferred::DeferredTasks;
use super::remote::{AttachmentUpload, FailureKind, HttpRemote, RemoteApi, RemoteError};
use super::status::{StatusBroadcaster, SyncState};
use crate::config::SyncSettings;

/// The store shared between the engine, its deferred tasks and readers.
pub type SharedDb = Arc<tokio::sync::Mutex<Database>>;

/// Wrap a database for sharing with an engine.
pub fn shared(db: Database) -> SharedDb {
    Arc::new(tokio::sync::Mutex::new(db))
}

/// Error type for sync engine operations.
///
/// Remote failures are not errors at this level; they are absorbed by the
/// drain and reported through [`DrainReport`] and the status channel.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("local store error: {0}")]
    Store(#[from] ds_core::Error),

    #[error("remote client error: {0}")]
    Client(String),
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Client(err.to_string())
    }
}

/// Engine tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Failed attempts before a draft is abandoned.
    pub max_retries: u32,
    /// Delay between a draft reaching `synced` and its removal.
    pub grace_period: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_retries: ds_core::DEFAULT_MAX_RETRIES,
            grace_period: Duration::from_secs(3),
        }
    }
}

impl From<&SyncSettings> for EngineConfig {
    fn from(settings: &SyncSettings) -> Self {
        EngineConfig {
            max_retries: settings.max_retries,
            grace_period: settings.grace_period(),
        }
    }
}

/// How a drain pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Not started: offline.
    SkippedOffline,
    /// Not started: another pass is running.
    SkippedInFlight,
    /// The queue was empty.
    Empty,
    /// Every operation in the snapshot was handled.
    Completed,
    /// Connectivity was lost mid-pass.
    HaltedOffline,
    /// An operation was rejected and will be retried on the next pass.
    HaltedRetry,
    /// A dependent operation had no server id to target.
    HaltedUnresolved,
}

/// Summary of one drain pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainReport {
    pub outcome: DrainOutcome,
    /// Operations that succeeded remotely.
    pub completed: usize,
    /// Operations dropped without a remote call.
    pub discarded: usize,
    /// Drafts moved to `error` with their remaining work dropped.
    pub abandoned: usize,
    /// Drafts that reached `synced`.
    pub finalized: usize,
    /// Operations still queued when the pass ended.
    pub pending: usize,
}

impl DrainReport {
    fn new(outcome: DrainOutcome) -> Self {
        DrainReport {
            outcome,
            completed: 0,
            discarded: 0,
            abandoned: 0,
            finalized: 0,
            pending: 0,
        }
    }
}

/// Result of handling a single operation.
enum Step {
    Completed,
    Discarded,
    Abandoned,
    Halt(DrainOutcome),
}

/// Clears the in-flight flag when the pass ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Single-flight replayer of the operation queue.
pub struct SyncEngine<R: RemoteApi = HttpRemote> {
    db: SharedDb,
    remote: Arc<R>,
    connectivity: Connectivity,
    status: StatusBroadcaster,
    config: EngineConfig,
    in_flight: AtomicBool,
    /// Draft id to server id, for drafts with work still queued.
    server_ids: Mutex<HashMap<String, String>>,
    deferred: DeferredTasks,
}

impl<R: RemoteApi> SyncEngine<R> {
    pub fn new(
        db: SharedDb,
        remote: Arc<R>,
        connectivity: Connectivity,
        status: StatusBroadcaster,
        config: EngineConfig,
    ) -> Self {
        SyncEngine {
            db,
            remote,
            connectivity,
            status,
            config,
            in_flight: AtomicBool::new(false),
            server_ids: Mutex::new(HashMap::new()),
            deferred: DeferredTasks::new(),
        }
    }

    pub fn db(&self) -> &SharedDb {
        &self.db
    }

    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    pub fn status(&self) -> &StatusBroadcaster {
        &self.status
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// The server id currently mapped for a draft, if any.
    pub fn mapped_server_id(&self, draft_id: &str) -> Option<String> {
        self.server_ids().get(draft_id).cloned()
    }

    /// Finish interrupted purges, then drain.
    pub async fn start(&self) -> Result<DrainReport, SyncError> {
        let purged = self.db.lock().await.purge_synced()?;
        if !purged.is_empty() {
            info!(count = purged.len(), "purged drafts left synced by a previous run");
        }
        self.drain().await
    }

    /// Queue a draft's creation chain and drain right away when online.
    pub async fn submit(&self, draft: &Draft) -> Result<DrainReport, SyncError> {
        self.db.lock().await.enqueue_creation_chain(draft)?;
        self.drain().await
    }

    /// Abort deferred purges. Synced drafts they would have removed are
    /// picked up by the next [`start`](Self::start).
    pub fn shutdown(&self) {
        self.deferred.shutdown();
    }

    /// Run one drain pass.
    pub async fn drain(&self) -> Result<DrainReport, SyncError> {
        if !self.connectivity.is_online() {
            debug!("offline, drain skipped");
            return Ok(DrainReport::new(DrainOutcome::SkippedOffline));
        }
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            debug!("drain already in flight");
            return Ok(DrainReport::new(DrainOutcome::SkippedInFlight));
        };

        let ops = self.db.lock().await.list_pending()?;
        if ops.is_empty() {
            self.status.emit(SyncState::Online, Some(0));
            return Ok(DrainReport::new(DrainOutcome::Empty));
        }

        info!(pending = ops.len(), "drain started");
        self.status.emit(SyncState::Syncing, Some(ops.len()));

        let mut report = DrainReport::new(DrainOutcome::Completed);
        let mut abandoned: HashSet<&str> = HashSet::new();

        for (pos, op) in ops.iter().enumerate() {
            // The queue no longer holds ops of an abandoned draft.
            if abandoned.contains(op.draft_id.as_str()) {
                continue;
            }

            match self.process(op).await? {
                Step::Completed => report.completed += 1,
                Step::Discarded => report.discarded += 1,
                Step::Abandoned => {
                    abandoned.insert(&op.draft_id);
                    report.abandoned += 1;
                    continue;
                }
                Step::Halt(outcome) => {
                    report.outcome = outcome;
                    report.pending = self.db.lock().await.pending_count()?;
                    info!(outcome = ?outcome, pending = report.pending, "drain halted");
                    return Ok(report);
                }
            }

            let chain_done = !ops[pos + 1..].iter().any(|o| o.draft_id == op.draft_id);
            if chain_done && self.finish_draft(&op.draft_id).await? {
                report.finalized += 1;
            }
        }

        report.pending = self.db.lock().await.pending_count()?;
        if report.abandoned > 0 {
            self.status.emit(SyncState::Error, Some(report.pending));
        } else {
            self.status.emit(SyncState::Online, Some(report.pending));
        }
        info!(
            completed = report.completed,
            discarded = report.discarded,
            abandoned = report.abandoned,
            finalized = report.finalized,
            "drain finished"
        );
        Ok(report)
    }

    async fn process(&self, op: &SyncOp) -> Result<Step, SyncError> {
        debug!(op_id = op.id, kind = %op.kind, draft_id = %op.draft_id, "processing operation");

        let server_id = {
            let db = self.db.lock().await;
            if !db.draft_exists(&op.draft_id)? {
                warn!(op_id = op.id, draft_id = %op.draft_id, "operation has no draft, discarding");
                db.complete_op(op)?;
                return Ok(Step::Discarded);
            }
            db.update_sync_status(&op.draft_id, SyncStatus::Syncing, None)?;
            self.resolve_server_id(&db, &op.draft_id)?
        };

        let result = match &op.kind {
            OpKind::CreateEntity => {
                if let Some(server_id) = server_id {
                    debug!(draft_id = %op.draft_id, %server_id, "entity already created");
                    self.db.lock().await.complete_op(op)?;
                    return Ok(Step::Completed);
                }
                match self.remote.create(&op.payload).await {
                    Ok(server_id) => {
                        self.db.lock().await.complete_create(op, &server_id)?;
                        debug!(draft_id = %op.draft_id, %server_id, "entity created");
                        self.server_ids().insert(op.draft_id.clone(), server_id);
                        return Ok(Step::Completed);
                    }
                    Err(e) => Err(e),
                }
            }
            OpKind::UploadAttachment => {
                let Some(server_id) = server_id else {
                    return self.unresolved(op).await;
                };
                match upload_from_op(op) {
                    Some(upload) => self.remote.attach(&server_id, upload).await,
                    None => Err(RemoteError::Malformed(format!(
                        "upload op {} has no attachment index or data",
                        op.id
                    ))),
                }
            }
            OpKind::FinalizeEntity => {
                let Some(server_id) = server_id else {
                    return self.unresolved(op).await;
                };
                self.remote.finalize(&server_id).await
            }
            OpKind::Unknown(kind) => {
                debug!(op_id = op.id, %kind, "unknown operation type, discarding");
                self.db.lock().await.complete_op(op)?;
                return Ok(Step::Discarded);
            }
        };

        match result {
            Ok(()) => {
                self.db.lock().await.complete_op(op)?;
                Ok(Step::Completed)
            }
            Err(err) => self.handle_failure(op, err).await,
        }
    }

    async fn handle_failure(&self, op: &SyncOp, err: RemoteError) -> Result<Step, SyncError> {
        match err.kind() {
            FailureKind::Connectivity => {
                warn!(op_id = op.id, error = %err, "connectivity lost, halting drain");
                self.connectivity.set_online(false);
                let pending = self.db.lock().await.pending_count()?;
                self.status.emit(SyncState::Offline, Some(pending));
                Ok(Step::Halt(DrainOutcome::HaltedOffline))
            }
            FailureKind::RemoteRejection => {
                warn!(op_id = op.id, draft_id = %op.draft_id, error = %err, "operation rejected");
                let mut db = self.db.lock().await;
                let outcome = db.fail_op(op, &err.to_string(), self.config.max_retries)?;
                let pending = db.pending_count()?;
                drop(db);
                match outcome {
                    FailOutcome::Retry => {
                        self.status.emit(SyncState::Error, Some(pending));
                        Ok(Step::Halt(DrainOutcome::HaltedRetry))
                    }
                    FailOutcome::Abandoned => {
                        self.server_ids().remove(&op.draft_id);
                        Ok(Step::Abandoned)
                    }
                }
            }
            FailureKind::MalformedState => {
                let mut db = self.db.lock().await;
                if !db.draft_exists(&op.draft_id)? {
                    warn!(op_id = op.id, error = %err, "malformed operation, discarding");
                    db.complete_op(op)?;
                    return Ok(Step::Discarded);
                }
                warn!(op_id = op.id, draft_id = %op.draft_id, error = %err, "malformed operation, abandoning draft");
                db.abandon_draft(&op.draft_id, &err.to_string())?;
                drop(db);
                self.server_ids().remove(&op.draft_id);
                Ok(Step::Abandoned)
            }
        }
    }

    /// A dependent op with no server id to target: leave it queued.
    async fn unresolved(&self, op: &SyncOp) -> Result<Step, SyncError> {
        warn!(op_id = op.id, draft_id = %op.draft_id, kind = %op.kind, "no server id for draft, halting drain");
        let pending = self.db.lock().await.pending_count()?;
        self.status.emit(SyncState::Error, Some(pending));
        Ok(Step::Halt(DrainOutcome::HaltedUnresolved))
    }

    /// Look up the server id in memory, falling back to the draft row.
    fn resolve_server_id(&self, db: &Database, draft_id: &str) -> Result<Option<String>, SyncError> {
        if let Some(id) = self.mapped_server_id(draft_id) {
            return Ok(Some(id));
        }
        let stored = db.server_id(draft_id)?;
        if let Some(id) = &stored {
            debug!(%draft_id, server_id = %id, "server id restored from store");
            self.server_ids().insert(draft_id.to_string(), id.clone());
        }
        Ok(stored)
    }

    /// Mark a draft synced and schedule its removal.
    ///
    /// Returns false if the draft no longer exists.
    async fn finish_draft(&self, draft_id: &str) -> Result<bool, SyncError> {
        self.server_ids().remove(draft_id);
        {
            let db = self.db.lock().await;
            if !db.draft_exists(draft_id)? {
                return Ok(false);
            }
            db.finalize_draft(draft_id)?;
        }
        info!(%draft_id, "draft synced");

        let db = Arc::clone(&self.db);
        let id = draft_id.to_string();
        self.deferred.schedule(self.config.grace_period, purge_if_synced(db, id));
        Ok(true)
    }

    fn server_ids(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.server_ids.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Delete a draft if it is still `synced` with nothing queued.
async fn purge_if_synced(db: SharedDb, draft_id: String) {
    let db = db.lock().await;
    let result = db.get_draft(&draft_id).and_then(|draft| match draft {
        Some(draft) if draft.sync_status == SyncStatus::Synced => {
            if db.pending_for_draft(&draft_id)?.is_empty() {
                db.delete_draft(&draft_id)
            } else {
                Ok(false)
            }
        }
        _ => Ok(false),
    });
    match result {
        Ok(true) => debug!(%draft_id, "synced draft purged"),
        Ok(false) => {}
        Err(e) => warn!(%draft_id, error = %e, "failed to purge synced draft"),
    }
}

fn upload_from_op(op: &SyncOp) -> Option<AttachmentUpload> {
    Some(AttachmentUpload {
        index: op.attachment_index()?,
        content_type: op.attachment_content_type().to_string(),
        name: op.attachment_name().map(str::to_string),
        data: op.data.clone()?,
    })
}
