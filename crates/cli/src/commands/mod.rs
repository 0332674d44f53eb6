// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod discard;
pub mod init;
pub mod list;
pub mod new;
pub mod queue;
pub mod run;
pub mod show;
pub mod status;
pub mod sync;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use ds_core::Database;
use fs2::FileExt;
use serde::Serialize;

use crate::config::{find_data_dir, get_db_path, get_lock_path, Config};
use crate::error::{Error, Result};

/// Helper to open the database from the current context.
pub fn open_db() -> Result<(Database, Config, PathBuf)> {
    let data_dir = find_data_dir()?;
    let config = Config::load(&data_dir)?;
    let db = Database::open(&get_db_path(&data_dir))?;
    Ok((db, config, data_dir))
}

/// Take the exclusive runner lock for the store in `data_dir`.
///
/// The lock is released when the returned file is dropped.
pub fn acquire_runner_lock(data_dir: &Path) -> Result<File> {
    let lock_path = get_lock_path(data_dir);
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)?;
    file.try_lock_exclusive()
        .map_err(|_| Error::RunnerActive(lock_path.display().to_string()))?;
    Ok(file)
}

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
