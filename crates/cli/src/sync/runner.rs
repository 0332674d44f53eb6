// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger loop around a [`SyncEngine`].
//!
//! A drain pass is started by:
//! - runner startup
//! - connectivity returning, after a settle delay
//! - a manual retry through [`RetryHandle`]
//! - a periodic check that finds queued work

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Sleep};
use tracing::{debug, error, info};

use super::connectivity::probe_connectivity;
use super::engine::{SyncEngine, SyncError};
use super::remote::RemoteApi;
use crate::config::SyncSettings;

/// Runner timings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Wait after connectivity returns before draining.
    pub settle_delay: Duration,
    /// Period of the pending-work check.
    pub poll_interval: Duration,
    /// Period of the reachability probe. `None` leaves connectivity to the caller.
    pub probe_interval: Option<Duration>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig::from(&SyncSettings::default())
    }
}

impl From<&SyncSettings> for RunnerConfig {
    fn from(settings: &SyncSettings) -> Self {
        RunnerConfig {
            settle_delay: settings.settle_delay(),
            poll_interval: settings.poll_interval(),
            probe_interval: Some(settings.probe_interval()),
        }
    }
}

/// Requests a drain pass from a running [`SyncRunner`].
#[derive(Debug, Clone)]
pub struct RetryHandle {
    tx: mpsc::Sender<()>,
}

impl RetryHandle {
    /// Ask for a drain. Returns false once the runner has stopped.
    ///
    /// Requests made while one is already waiting are coalesced.
    pub fn retry(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => true,
            Err(mpsc::error::TrySendError::Closed(())) => false,
        }
    }
}

/// Stops a running [`SyncRunner`].
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }
}

/// Drives a [`SyncEngine`] from its triggers until shut down.
pub struct SyncRunner<R: RemoteApi + 'static> {
    engine: Arc<SyncEngine<R>>,
    config: RunnerConfig,
    retry_tx: mpsc::Sender<()>,
    retry_rx: mpsc::Receiver<()>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<R: RemoteApi + 'static> SyncRunner<R> {
    pub fn new(engine: Arc<SyncEngine<R>>, config: RunnerConfig) -> Self {
        let (retry_tx, retry_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        SyncRunner {
            engine,
            config,
            retry_tx,
            retry_rx,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        }
    }

    pub fn retry_handle(&self) -> RetryHandle {
        RetryHandle {
            tx: self.retry_tx.clone(),
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: Arc::clone(&self.shutdown_tx),
        }
    }

    /// Run until shutdown. Deferred engine tasks are aborted on exit, and
    /// the probe is stopped even when the startup drain fails.
    pub async fn run(mut self) -> Result<(), SyncError> {
        let online_rx = self.engine.connectivity().subscribe();

        let probe = self.config.probe_interval.map(|interval| {
            tokio::spawn(probe_connectivity(
                Arc::clone(self.engine.remote()),
                self.engine.connectivity().clone(),
                interval,
                self.shutdown_rx.clone(),
            ))
        });

        info!("sync runner started");
        let result = match self.engine.start().await {
            Ok(report) => {
                debug!(outcome = ?report.outcome, "startup drain finished");
                self.wait_for_triggers(online_rx).await;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "startup drain failed");
                Err(e)
            }
        };

        self.shutdown_tx.send_replace(true);
        if let Some(probe) = probe {
            let _ = probe.await;
        }
        self.engine.shutdown();
        info!("sync runner stopped");
        result
    }

    async fn wait_for_triggers(&mut self, mut online_rx: watch::Receiver<bool>) {
        let poll_interval = self.config.poll_interval;
        let mut poll = tokio::time::interval_at(Instant::now() + poll_interval, poll_interval);
        poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut settle: Option<Pin<Box<Sleep>>> = None;

        loop {
            tokio::select! {
                biased;

                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        break;
                    }
                }
                Ok(()) = online_rx.changed() => {
                    if *online_rx.borrow_and_update() {
                        debug!(delay_ms = self.config.settle_delay.as_millis() as u64, "connectivity restored, settling");
                        settle = Some(Box::pin(tokio::time::sleep(self.config.settle_delay)));
                    } else {
                        settle = None;
                    }
                }
                () = wait_settle(&mut settle) => {
                    settle = None;
                    self.trigger("reconnect").await;
                }
                Some(()) = self.retry_rx.recv() => {
                    self.trigger("manual retry").await;
                }
                _ = poll.tick() => {
                    let pending = self.engine.db().lock().await.pending_count();
                    match pending {
                        Ok(0) => {}
                        Ok(_) => self.trigger("poll").await,
                        Err(e) => error!(error = %e, "failed to read pending count"),
                    }
                }
            }
        }
    }

    async fn trigger(&self, reason: &str) {
        match self.engine.drain().await {
            Ok(report) => debug!(reason, outcome = ?report.outcome, "drain triggered"),
            Err(e) => error!(reason, error = %e, "drain failed"),
        }
    }
}

/// Resolves when the pending settle delay elapses; never if there is none.
fn wait_settle(settle: &mut Option<Pin<Box<Sleep>>>) -> impl Future<Output = ()> + '_ {
    async move {
        match settle {
            Some(sleep) => sleep.as_mut().await,
            None => std::future::pending().await,
        }
    }
}
