// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use ds_core::Database;
use tokio::sync::broadcast;

use crate::banner::{render, OFFLINE_BANNER};
use crate::error::{Error, Result};
use crate::sync::{
    shared, Connectivity, DrainOutcome, DrainReport, EngineConfig, HttpRemote, RemoteApi,
    StatusBroadcaster, SyncEngine, SyncError, SyncStateChanged,
};

use super::{acquire_runner_lock, open_db};

/// Result of a one-shot sync.
#[derive(Debug)]
pub(crate) struct SyncSummary {
    pub report: DrainReport,
    /// Last state broadcast during the pass.
    pub last_event: Option<SyncStateChanged>,
}

pub fn run() -> Result<()> {
    let (db, config, data_dir) = open_db()?;
    let remote_config = config.effective_remote().ok_or(Error::NoRemote)?;
    let _lock = acquire_runner_lock(&data_dir)?;
    let remote = HttpRemote::new(&remote_config).map_err(SyncError::from)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let summary = runtime.block_on(run_impl(
        db,
        Arc::new(remote),
        EngineConfig::from(&config.sync),
    ))?;

    for line in summary_lines(&summary) {
        println!("{}", line);
    }
    Ok(())
}

/// Probe the remote, then run a single drain pass.
///
/// Grace-period purges scheduled by the pass are cancelled on return and
/// completed by the next start.
pub(crate) async fn run_impl<R: RemoteApi + 'static>(
    db: Database,
    remote: Arc<R>,
    config: EngineConfig,
) -> Result<SyncSummary> {
    let engine = connect(db, remote, config).await;
    let mut events = engine.status().subscribe();
    let report = engine.start().await;
    finish(&engine, &mut events, report)
}

/// Build an engine whose connectivity is the result of one probe.
pub(crate) async fn connect<R: RemoteApi + 'static>(
    db: Database,
    remote: Arc<R>,
    config: EngineConfig,
) -> SyncEngine<R> {
    let online = remote.probe().await.is_ok();
    SyncEngine::new(
        shared(db),
        remote,
        Connectivity::new(online),
        StatusBroadcaster::new(),
        config,
    )
}

/// Cancel deferred purges and pair the pass with its last broadcast state.
pub(crate) fn finish<R: RemoteApi>(
    engine: &SyncEngine<R>,
    events: &mut broadcast::Receiver<SyncStateChanged>,
    report: std::result::Result<DrainReport, SyncError>,
) -> Result<SyncSummary> {
    engine.shutdown();
    let report = report?;

    let mut last_event = None;
    while let Ok(event) = events.try_recv() {
        last_event = Some(event);
    }
    Ok(SyncSummary { report, last_event })
}

/// Human-readable outcome of a pass.
pub(crate) fn summary_lines(summary: &SyncSummary) -> Vec<String> {
    let report = &summary.report;
    let mut lines = Vec::new();

    match report.outcome {
        DrainOutcome::SkippedOffline => {
            lines.push(OFFLINE_BANNER.to_string());
            return lines;
        }
        DrainOutcome::SkippedInFlight => {
            lines.push("A sync pass is already running".to_string());
            return lines;
        }
        DrainOutcome::Empty => {
            lines.push("Nothing to sync".to_string());
            return lines;
        }
        _ => {}
    }

    lines.push(format!(
        "Completed {} operations, {} drafts synced",
        report.completed, report.finalized
    ));
    if report.discarded > 0 {
        lines.push(format!("Discarded {} stale operations", report.discarded));
    }
    if report.abandoned > 0 {
        lines.push(format!(
            "{} drafts failed to sync (see 'draftsync list --status error')",
            report.abandoned
        ));
    }
    match report.outcome {
        DrainOutcome::HaltedRetry => {
            lines.push("Stopped at a rejected operation; it will be retried".to_string())
        }
        DrainOutcome::HaltedUnresolved => {
            lines.push("Stopped at an operation whose entity was never created".to_string())
        }
        _ => {}
    }
    if let Some(banner) = summary.last_event.as_ref().and_then(render) {
        lines.push(banner);
    }
    lines
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
