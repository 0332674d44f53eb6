// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup for the binary.

use std::fs;
use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::env;

/// Default level for the long-running runner.
pub const RUNNER_LEVEL: &str = "info";

/// Default level for one-shot commands, which report through stdout.
pub const COMMAND_LEVEL: &str = "warn";

/// Build the filter: `DRAFTSYNC_LOG`, then `RUST_LOG`, then `default`.
pub fn filter(default: &str) -> EnvFilter {
    filter_from(env::log_filter(), default)
}

fn filter_from(directives: Option<String>, default: &str) -> EnvFilter {
    match directives {
        Some(d) => EnvFilter::try_new(d).unwrap_or_else(|_| EnvFilter::new(default)),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
    }
}

/// Install the global subscriber, writing to `log_path` when given and
/// openable, otherwise to stderr.
pub fn setup_logging(default: &str, log_path: Option<&Path>) {
    let filter = filter(default);

    let file = log_path.and_then(|path| {
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    // A subscriber may already be installed (e.g. by a test harness).
    let _ = match file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .try_init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
