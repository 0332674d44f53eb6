// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! ds-core: Durable local state for the draftsync engine
//!
//! This crate owns everything that must survive a process restart: draft
//! entities created while offline, the ordered queue of remote operations
//! that realize them, and read-through cache partitions. It is synchronous
//! and runtime-free; the async sync engine lives in the `draftsync` crate.

pub mod clock;
pub mod db;
pub mod draft;
pub mod drafts;
pub mod error;
pub mod op;
pub mod queue;

pub use clock::{ClockSource, ManualClock, SystemClock};
pub use db::Database;
pub use draft::{Attachment, Draft, SyncStatus};
pub use error::{Error, Result};
pub use op::{OpKind, SyncOp};
pub use queue::{FailOutcome, DEFAULT_MAX_RETRIES};
