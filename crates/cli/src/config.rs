// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration management.
//!
//! Configuration is stored in `.draftsync/config.toml` and includes:
//! - `prefix`: The prefix for client-generated draft ids (e.g., "shop" → "shop-a1b2c3d4")
//! - `[remote]`: The API the sync engine replays drafts against
//! - `[sync]`: Retry ceiling and trigger timings for the sync engine

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env;
use crate::error::{Error, Result};
use crate::id::{validate_prefix, DEFAULT_PREFIX};

pub const DATA_DIR_NAME: &str = ".draftsync";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "drafts.db";
const LOCK_FILE_NAME: &str = "sync.lock";
const LOG_FILE_NAME: &str = "sync.log";

/// Project configuration stored in `.draftsync/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Prefix for draft ids (2+ lowercase alphanumeric with at least one letter).
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Remote API (optional - without it drafts queue up locally).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
    #[serde(default)]
    pub sync: SyncSettings,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

/// Remote API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL, e.g. `https://api.example.com/v1`.
    pub url: String,
    /// Bearer token sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl RemoteConfig {
    pub fn new(url: impl Into<String>) -> Self {
        RemoteConfig {
            url: url.into(),
            token: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Returns an error message if the URL is not http(s).
    pub fn validate_url(&self) -> Option<String> {
        if self.url.starts_with("http://") || self.url.starts_with("https://") {
            return None;
        }
        Some(format!(
            "invalid remote URL '{}': must start with http:// or https://",
            self.url
        ))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Sync engine tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Failed attempts before a draft is abandoned (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay between a draft reaching `synced` and its removal (default: 3000).
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,
    /// Wait after connectivity returns before draining (default: 1000).
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Period of the pending-work check (default: 30).
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Period of the reachability probe (default: 10).
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
}

fn default_max_retries() -> u32 {
    ds_core::DEFAULT_MAX_RETRIES
}

fn default_grace_period_ms() -> u64 {
    3_000
}

fn default_settle_delay_ms() -> u64 {
    1_000
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_probe_interval_secs() -> u64 {
    10
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            max_retries: default_max_retries(),
            grace_period_ms: default_grace_period_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            poll_interval_secs: default_poll_interval_secs(),
            probe_interval_secs: default_probe_interval_secs(),
        }
    }
}

impl SyncSettings {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs.max(1))
    }
}

impl Config {
    /// Creates a new config with the given prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPrefix`] if prefix is not 2+ lowercase alphanumeric with at least one letter.
    pub fn new(prefix: String) -> Result<Self> {
        if !validate_prefix(&prefix) {
            return Err(Error::InvalidPrefix);
        }
        Ok(Config {
            prefix,
            remote: None,
            sync: SyncSettings::default(),
        })
    }

    /// Loads configuration from the given `.draftsync/` directory.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE_NAME);
        let content = fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        if let Some(msg) = config.remote.as_ref().and_then(RemoteConfig::validate_url) {
            return Err(Error::Config(msg));
        }
        Ok(config)
    }

    /// Saves configuration to the given `.draftsync/` directory.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let config_path = data_dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// The remote to sync against, with environment overrides applied.
    pub fn effective_remote(&self) -> Option<RemoteConfig> {
        self.remote_with_overrides(env::remote_url(), env::token())
    }

    fn remote_with_overrides(
        &self,
        url: Option<String>,
        token: Option<String>,
    ) -> Option<RemoteConfig> {
        let mut remote = match (url, &self.remote) {
            (Some(url), Some(existing)) => RemoteConfig {
                url,
                ..existing.clone()
            },
            (Some(url), None) => RemoteConfig::new(url),
            (None, Some(existing)) => existing.clone(),
            (None, None) => return None,
        };
        if token.is_some() {
            remote.token = token;
        }
        Some(remote)
    }
}

/// Find the .draftsync directory by walking up from the current directory
pub fn find_data_dir() -> Result<PathBuf> {
    let current = std::env::current_dir()?;
    find_data_dir_from(&current)
}

fn find_data_dir_from(start: &Path) -> Result<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let data_dir = current.join(DATA_DIR_NAME);
        if data_dir.is_dir() {
            return Ok(data_dir);
        }
        if !current.pop() {
            return Err(Error::NotInitialized);
        }
    }
}

/// Initialize a new .draftsync directory at the given path
pub fn init_data_dir(path: &Path, prefix: &str, remote: Option<RemoteConfig>) -> Result<PathBuf> {
    let data_dir = path.join(DATA_DIR_NAME);

    if data_dir.exists() {
        return Err(Error::AlreadyInitialized(data_dir.display().to_string()));
    }

    let mut config = Config::new(prefix.to_string())?;
    if let Some(msg) = remote.as_ref().and_then(RemoteConfig::validate_url) {
        return Err(Error::Config(msg));
    }
    config.remote = remote;

    fs::create_dir_all(&data_dir)?;
    config.save(&data_dir)?;

    Ok(data_dir)
}

pub fn get_db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DB_FILE_NAME)
}

/// The exclusive lock held by whichever process is draining the queue.
pub fn get_lock_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOCK_FILE_NAME)
}

pub fn get_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_FILE_NAME)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
