// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables used by the CLI are defined here
//! with typed accessor functions. The variable name constants are generated
//! by `build.rs` and live in the [`vars`] submodule.

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the value of `DRAFTSYNC_REMOTE_URL` if set and non-empty.
pub fn remote_url() -> Option<String> {
    non_empty(vars::DRAFTSYNC_REMOTE_URL)
}

/// Returns the value of `DRAFTSYNC_TOKEN` if set and non-empty.
pub fn token() -> Option<String> {
    non_empty(vars::DRAFTSYNC_TOKEN)
}

/// Returns the log filter from `DRAFTSYNC_LOG` if set.
pub fn log_filter() -> Option<String> {
    non_empty(vars::DRAFTSYNC_LOG)
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
