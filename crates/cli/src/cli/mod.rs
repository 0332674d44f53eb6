// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    #[value(alias = "ids")]
    Id,
}

#[derive(Parser)]
#[command(name = "draftsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first drafts that sync to a remote API when connectivity returns")]
#[command(
    long_about = "Offline-first drafts that sync to a remote API when connectivity returns.\n\n\
    Drafts are stored locally with a queue of remote operations. The queue is drained \
    in order whenever the remote is reachable."
)]
pub struct Cli {
    /// Run as if draftsync was started in <path>
    #[arg(short = 'C', long = "directory", global = true, value_name = "path")]
    pub directory: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a draft store in the current directory
    Init {
        /// Prefix for draft IDs (default: ds)
        #[arg(long, short)]
        prefix: Option<String>,

        /// Directory to initialize (default: current directory)
        #[arg(long)]
        path: Option<String>,

        /// Base URL of the remote API
        #[arg(long, value_parser = non_empty_string)]
        remote: Option<String>,
    },

    /// Create a draft, queue it, and sync at once if the remote answers
    #[command(after_help = "\
Examples:
  draftsync new '{\"sku\": \"R-100\"}'                      Queue an entity
  draftsync new '{\"sku\": \"R-100\"}' -a front.jpg -a back.jpg   With two photos
  draftsync new '{\"sku\": \"R-100\"}' --finalize -o id     Finalize after upload, print only the ID")]
    New {
        /// Entity fields as a JSON object
        #[arg(value_parser = non_empty_string)]
        payload: String,

        /// File to upload after the entity is created (repeatable, uploaded in order)
        #[arg(long = "attach", short = 'a', value_name = "file")]
        attach: Vec<PathBuf>,

        /// Finalize the entity once all attachments are uploaded
        #[arg(long)]
        finalize: bool,

        /// Output format
        #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// List drafts, newest first
    List {
        /// Only drafts with this sync status (pending, syncing, synced, error)
        #[arg(long, short)]
        status: Option<String>,

        /// Output format
        #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Show a draft and its queued operations
    Show {
        /// Draft ID
        id: String,

        /// Output format
        #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// List queued operations in execution order
    Queue {
        /// Output format
        #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Delete a draft and drop its queued operations
    Discard {
        /// Draft ID
        id: String,
    },

    /// Drain the queue once against the remote
    Sync,

    /// Keep syncing until interrupted (press Enter to retry now)
    Run {
        /// Write logs to sync.log in the data directory instead of stderr
        #[arg(long)]
        log_file: bool,
    },

    /// Show pending work and the sync banner
    Status {
        /// Output format
        #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
