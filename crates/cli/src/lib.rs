// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! dsync - offline-first drafts that sync to a remote API.
//!
//! This crate provides the `draftsync` CLI and the async sync engine that
//! replays locally queued operations against the remote once it is reachable.
//! Durable state lives in [`ds_core`].
//!
//! # Main Components
//!
//! - [`sync`] - Engine, runner, connectivity and status broadcasting
//! - [`Config`] - Project configuration (`.draftsync/config.toml`)
//! - [`banner`] - User-visible sync state text
//! - [`Error`] - Error types for all operations

mod cli;
mod commands;
mod display;

pub mod banner;
pub mod config;
pub mod env;
pub mod error;
pub mod id;
pub mod logging;
pub mod sync;

pub use cli::{Cli, Command, OutputFormat};
pub use config::{find_data_dir, get_db_path, init_data_dir, Config};
pub use error::{Error, Result};

/// Run a parsed command.
pub fn run(command: Command) -> Result<()> {
    match command {
        Command::Init {
            prefix,
            path,
            remote,
        } => commands::init::run(prefix, path, remote),
        Command::New {
            payload,
            attach,
            finalize,
            output,
        } => commands::new::run(payload, attach, finalize, output),
        Command::List { status, output } => commands::list::run(status, output),
        Command::Show { id, output } => commands::show::run(&id, output),
        Command::Queue { output } => commands::queue::run(output),
        Command::Discard { id } => commands::discard::run(&id),
        Command::Sync => commands::sync::run(),
        Command::Run { .. } => commands::run::run(),
        Command::Status { output } => commands::status::run(output),
    }
}

/// Set up logging for `command`: the runner logs at info, optionally to
/// `sync.log` in the data directory; everything else warns on stderr.
pub fn setup_logging(command: &Command) {
    match command {
        Command::Run { log_file } => {
            let log_path = if *log_file {
                find_data_dir().ok().map(|dir| config::get_log_path(&dir))
            } else {
                None
            };
            logging::setup_logging(logging::RUNNER_LEVEL, log_path.as_deref());
        }
        _ => logging::setup_logging(logging::COMMAND_LEVEL, None),
    }
}
