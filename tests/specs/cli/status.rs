// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for `draftsync status`.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::common::*;

#[test]
fn status_without_remote_is_offline() {
    let temp = init_temp();
    create_draft(&temp, "{}", &[]);

    ds().arg("status")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Offline - changes will sync when reconnected"))
        .stdout(predicate::str::contains("Remote: not configured"))
        .stdout(predicate::str::contains("Pending operations: 1"));
}

#[test]
fn status_unreachable_remote() {
    let temp = init_temp_with_remote(&unreachable_url());

    ds().arg("status")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("(unreachable)"))
        .stdout(predicate::str::contains("Offline"));
}

#[test]
fn status_online_and_idle_shows_no_banner() {
    let server = FakeServer::start();
    let temp = init_temp_with_remote(&server.url);

    ds().arg("status")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Remote: "))
        .stdout(predicate::str::contains("(reachable)"))
        .stdout(predicate::str::contains("Pending operations: 0"));
}

#[test]
fn status_json() {
    let temp = init_temp();
    create_draft(&temp, "{}", &["--finalize"]);

    let output = ds()
        .args(["status", "-o", "json"])
        .current_dir(temp.path())
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(json["pending"], 2);
    assert_eq!(json["drafts"]["pending"], 1);
    assert_eq!(json["state"], "offline");
    assert_eq!(json["online"], false);
}
