// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Online/offline tracking.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use super::remote::RemoteApi;

/// Shared online flag with transition notifications.
///
/// Clones observe and update the same flag.
#[derive(Debug, Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Connectivity { tx: Arc::new(tx) }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Update the flag. Subscribers are only woken on a transition.
    ///
    /// Returns whether the state changed.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });
        if changed {
            info!(online, "connectivity changed");
        }
        changed
    }

    /// Receiver that wakes on every online/offline transition.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Probe the remote on an interval and feed the result into `connectivity`.
///
/// Runs until `shutdown` flips to true or its sender is dropped.
pub async fn probe_connectivity<R: RemoteApi + ?Sized>(
    remote: Arc<R>,
    connectivity: Connectivity,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let reachable = match remote.probe().await {
                    Ok(()) => true,
                    Err(e) => {
                        debug!(error = %e, "probe failed");
                        false
                    }
                };
                connectivity.set_online(reachable);
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}
