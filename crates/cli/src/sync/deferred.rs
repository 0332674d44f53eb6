// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Delayed tasks owned by the engine's lifecycle.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, warn};

/// A set of delayed tasks that can be aborted together.
#[derive(Debug, Default)]
pub struct DeferredTasks {
    tasks: Mutex<JoinSet<()>>,
}

impl DeferredTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay`. Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        reap(&mut tasks);
        tasks.spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
    }

    /// Number of tasks not yet reaped. Finished tasks are counted until the
    /// next `schedule`.
    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Abort every outstanding task.
    pub fn shutdown(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        if !tasks.is_empty() {
            debug!(count = tasks.len(), "aborting deferred tasks");
        }
        tasks.abort_all();
        reap(&mut tasks);
    }
}

fn reap(tasks: &mut JoinSet<()>) {
    while let Some(result) = tasks.try_join_next() {
        if let Err(e) = result {
            if e.is_panic() {
                warn!(error = %e, "deferred task panicked");
            }
        }
    }
}
