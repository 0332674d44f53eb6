// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::{BufRead, Write};
use std::sync::Arc;

use ds_core::Database;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::banner::render;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::sync::{
    shared, Connectivity, EngineConfig, HttpRemote, RemoteApi, RetryHandle, RunnerConfig,
    StatusBroadcaster, SyncEngine, SyncError, SyncRunner, SyncStateChanged,
};

use super::{acquire_runner_lock, open_db};

const ALL_SYNCED: &str = "All changes synced";

pub fn run() -> Result<()> {
    let (db, config, data_dir) = open_db()?;
    let remote_config = config.effective_remote().ok_or(Error::NoRemote)?;
    let _lock = acquire_runner_lock(&data_dir)?;
    let remote = HttpRemote::new(&remote_config).map_err(SyncError::from)?;

    println!(
        "Syncing with {} (press Enter to retry now, Ctrl-C to stop)",
        remote.base_url()
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(db, Arc::new(remote), &config))
}

/// Run the engine until Ctrl-C, printing banner changes as they happen.
async fn serve<R: RemoteApi + 'static>(db: Database, remote: Arc<R>, config: &Config) -> Result<()> {
    let online = remote.probe().await.is_ok();
    let engine = Arc::new(SyncEngine::new(
        shared(db),
        remote,
        Connectivity::new(online),
        StatusBroadcaster::new(),
        EngineConfig::from(&config.sync),
    ));

    let banners = tokio::spawn(print_banners(engine.status().subscribe(), std::io::stdout()));
    let runner = SyncRunner::new(Arc::clone(&engine), RunnerConfig::from(&config.sync));
    spawn_stdin_retry(runner.retry_handle());

    let shutdown = runner.shutdown_handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, stopping");
                shutdown.shutdown();
            }
            Err(e) => warn!(error = %e, "cannot listen for Ctrl-C"),
        }
    });

    let result = runner.run().await;
    banners.abort();
    result.map_err(Error::from)
}

/// Each line on stdin requests a drain. Stops when stdin closes or the
/// runner is gone.
fn spawn_stdin_retry(retry: RetryHandle) {
    std::thread::spawn(move || forward_retries(std::io::stdin().lock(), &retry));
}

/// Turn input lines into retry requests. Returns how many were accepted.
fn forward_retries<B: BufRead>(input: B, retry: &RetryHandle) -> usize {
    let mut accepted = 0;
    for line in input.lines() {
        if line.is_err() || !retry.retry() {
            break;
        }
        accepted += 1;
    }
    accepted
}

/// Tracks which banner is up so clearing it can be announced once.
#[derive(Debug, Default)]
struct BannerLines {
    shown: bool,
}

impl BannerLines {
    /// The line to print for a state change, if any.
    fn next(&mut self, event: &SyncStateChanged) -> Option<String> {
        match render(event) {
            Some(banner) => {
                self.shown = true;
                Some(banner)
            }
            None if self.shown => {
                self.shown = false;
                Some(ALL_SYNCED.to_string())
            }
            None => None,
        }
    }
}

/// Writes banner lines until the status channel closes, then hands the
/// writer back.
async fn print_banners<W: Write>(
    mut events: broadcast::Receiver<SyncStateChanged>,
    mut out: W,
) -> W {
    let mut lines = BannerLines::default();
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(line) = lines.next(&event) {
                    if let Err(e) = writeln!(out, "{}", line) {
                        warn!(error = %e, "cannot print banner");
                    }
                }
            }
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    out
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
