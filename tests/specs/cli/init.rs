// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for `draftsync init` and data directory discovery.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::common::*;
use yare::parameterized;

#[test]
fn init_creates_data_dir() {
    let temp = TempDir::new().unwrap();

    ds().arg("init")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized draft store"))
        .stdout(predicate::str::contains("Prefix: ds"));

    assert!(temp.path().join(".draftsync/config.toml").exists());
    assert!(temp.path().join(".draftsync/drafts.db").exists());
}

#[test]
fn init_records_remote() {
    let temp = TempDir::new().unwrap();

    ds().args(["init", "--remote", "https://api.example.com"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Remote: https://api.example.com"));

    let config = std::fs::read_to_string(temp.path().join(".draftsync/config.toml")).unwrap();
    assert!(config.contains("https://api.example.com"));
}

#[test]
fn init_twice_fails() {
    let temp = init_temp();

    ds().arg("init")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[parameterized(
    uppercase = { "ABC" },
    dash = { "my-prefix" },
    too_short = { "a" },
    digits_only = { "123" },
)]
fn init_rejects_invalid_prefix(prefix: &str) {
    let temp = TempDir::new().unwrap();

    ds().args(["init", "--prefix", prefix])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid prefix"));
}

#[test]
fn init_rejects_non_http_remote() {
    let temp = TempDir::new().unwrap();

    ds().args(["init", "--remote", "ftp://example.com"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("must start with http"));
}

#[test]
fn commands_fail_before_init() {
    let temp = TempDir::new().unwrap();

    ds().arg("list")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn commands_find_data_dir_from_subdirectory() {
    let temp = init_temp();
    let nested = temp.path().join("a/b");
    std::fs::create_dir_all(&nested).unwrap();

    ds().arg("queue")
        .current_dir(&nested)
        .assert()
        .success()
        .stdout(predicate::str::contains("Queue is empty"));
}

#[test]
fn directory_flag_changes_working_directory() {
    let temp = init_temp();
    let elsewhere = TempDir::new().unwrap();

    ds().args(["-C", temp.path().to_str().unwrap(), "queue"])
        .current_dir(elsewhere.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Queue is empty"));
}
