// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Path, PathBuf};

use ds_core::Database;

use crate::config::{get_db_path, init_data_dir, RemoteConfig};
use crate::error::Result;
use crate::id::DEFAULT_PREFIX;

pub fn run(prefix: Option<String>, path: Option<String>, remote: Option<String>) -> Result<()> {
    let target_path = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir()?,
    };
    let data_dir = run_impl(&target_path, prefix.as_deref(), remote.as_deref())?;

    println!("Initialized draft store at {}", data_dir.display());
    println!("Prefix: {}", prefix.as_deref().unwrap_or(DEFAULT_PREFIX));
    match remote {
        Some(url) => println!("Remote: {}", url),
        None => println!("Remote: not configured (set DRAFTSYNC_REMOTE_URL to sync)"),
    }
    Ok(())
}

/// Create `.draftsync/` under `target_path` with its config and database.
pub(crate) fn run_impl(
    target_path: &Path,
    prefix: Option<&str>,
    remote: Option<&str>,
) -> Result<PathBuf> {
    let prefix = prefix.unwrap_or(DEFAULT_PREFIX);
    let remote = remote.map(RemoteConfig::new);
    let data_dir = init_data_dir(target_path, prefix, remote)?;
    Database::open(&get_db_path(&data_dir))?;
    Ok(data_dir)
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
