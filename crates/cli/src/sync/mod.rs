// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline-first sync of locally created drafts.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Runner    │────►│   Engine    │────►│  RemoteApi  │────► server
//! │ (triggers)  │     │ (drain loop)│◄────│   (trait)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        ▲                   │
//!        │                   ▼
//! ┌─────────────┐     ┌─────────────┐
//! │Connectivity │     │  Database   │  (drafts + op queue, ds-core)
//! │  (watch)    │     └─────────────┘
//! └─────────────┘
//! ```
//!
//! # Features
//!
//! - Single global FIFO replay with one pass in flight at a time
//! - Bounded retry of rejected operations, then abandonment of the draft
//! - Server ids kept in memory and on the draft row, so dependent
//!   operations survive a restart without re-creating the entity
//! - State changes published on a broadcast channel
//! - Injectable remote trait for testing

mod connectivity;
mod deferred;
mod engine;
mod remote;
mod runner;
mod status;

pub use connectivity::{probe_connectivity, Connectivity};
pub use deferred::DeferredTasks;
pub use engine::{
    shared, DrainOutcome, DrainReport, EngineConfig, SharedDb, SyncEngine, SyncError,
};
pub use remote::{
    AttachmentUpload, FailureKind, HttpRemote, RemoteApi, RemoteError, RemoteFuture,
    RemoteResult,
};
pub use runner::{RetryHandle, RunnerConfig, ShutdownHandle, SyncRunner};
pub use status::{StatusBroadcaster, SyncState, SyncStateChanged};

#[cfg(test)]
mod test_helpers;
