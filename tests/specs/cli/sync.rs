// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for `draftsync sync` against a local stand-in for the remote API.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::common::*;

fn sync(temp: &TempDir) -> assert_cmd::assert::Assert {
    ds().arg("sync").current_dir(temp.path()).assert()
}

/// Sync a workspace created without a remote, so `new` only queued.
fn sync_with(temp: &TempDir, url: &str) -> assert_cmd::assert::Assert {
    ds().arg("sync")
        .env("DRAFTSYNC_REMOTE_URL", url)
        .current_dir(temp.path())
        .assert()
}

#[test]
fn sync_without_remote_fails_with_hint() {
    let temp = init_temp();

    sync(&temp)
        .failure()
        .stderr(predicate::str::contains("no remote configured"))
        .stderr(predicate::str::contains("DRAFTSYNC_REMOTE_URL"));
}

#[test]
fn sync_empty_queue() {
    let server = FakeServer::start();
    let temp = init_temp_with_remote(&server.url);

    sync(&temp)
        .success()
        .stdout(predicate::str::contains("Nothing to sync"));
    assert!(server.api_calls().is_empty());
}

#[test]
fn sync_replays_chain_in_order_and_marks_synced() {
    let server = FakeServer::start();
    let temp = init_temp();
    std::fs::write(temp.path().join("a.jpg"), b"aaaa").unwrap();
    std::fs::write(temp.path().join("b.jpg"), b"bbbb").unwrap();
    let id = create_draft(
        &temp,
        r#"{"sku":"R-100"}"#,
        &["-a", "a.jpg", "-a", "b.jpg", "--finalize"],
    );

    sync_with(&temp, &server.url)
        .success()
        .stdout(predicate::str::contains("Completed 4 operations, 1 drafts synced"));

    assert_eq!(
        server.api_calls(),
        vec![
            "POST /entities",
            "POST /entities/srv-1/attachments",
            "POST /entities/srv-1/attachments",
            "POST /entities/srv-1/finalize",
        ]
    );

    ds().args(["show", &id])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("[synced] {}", id)))
        .stdout(predicate::str::contains("Server ID: srv-1"));
}

#[test]
fn next_sync_purges_synced_drafts() {
    let server = FakeServer::start();
    let temp = init_temp_with_remote(&server.url);
    let id = create_draft(&temp, "{}", &[]);

    sync(&temp)
        .success()
        .stdout(predicate::str::contains("Nothing to sync"));

    ds().arg("list")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(&id).not());
}

#[test]
fn sync_drafts_in_creation_order() {
    let server = FakeServer::start();
    let temp = init_temp();
    create_draft(&temp, r#"{"n":1}"#, &["--finalize"]);
    create_draft(&temp, r#"{"n":2}"#, &["--finalize"]);

    sync_with(&temp, &server.url).success();

    assert_eq!(
        server.api_calls(),
        vec![
            "POST /entities",
            "POST /entities/srv-1/finalize",
            "POST /entities",
            "POST /entities/srv-2/finalize",
        ]
    );
}

#[test]
fn sync_while_offline_leaves_queue_untouched() {
    let temp = init_temp_with_remote(&unreachable_url());
    let id = create_draft(&temp, "{}", &["--finalize"]);

    sync(&temp)
        .success()
        .stdout(predicate::str::contains("Offline - changes will sync when reconnected"));

    ds().args(["show", &id])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("[pending] {}", id)));
    ds().arg("queue")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("create-entity"))
        .stdout(predicate::str::contains("finalize-entity"));
}

#[test]
fn remote_url_from_environment() {
    let server = FakeServer::start();
    let temp = init_temp();
    create_draft(&temp, "{}", &[]);

    sync_with(&temp, &server.url)
        .success()
        .stdout(predicate::str::contains("Completed 1 operations"));

    assert_eq!(server.api_calls(), vec!["POST /entities"]);
}

#[test]
fn rejected_draft_is_retried_then_marked_error() {
    let server = FakeServer::rejecting_creates();
    let temp = init_temp();
    let id = create_draft(&temp, r#"{"sku":"bad"}"#, &["--finalize"]);

    // Two rejections are retried on later passes.
    for _ in 0..2 {
        sync_with(&temp, &server.url)
            .success()
            .stdout(predicate::str::contains("will be retried"));
    }
    ds().arg("queue")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("(attempts: 2)"));

    // The third exhausts the retry budget.
    sync_with(&temp, &server.url)
        .success()
        .stdout(predicate::str::contains("1 drafts failed to sync"))
        .stdout(predicate::str::contains("Sync error"));

    ds().args(["list", "--status", "error"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(&id))
        .stdout(predicate::str::contains("422"));
    ds().arg("queue")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Queue is empty"));
    assert_eq!(server.api_calls().len(), 3);
}

#[test]
fn new_syncs_at_once_when_remote_is_reachable() {
    let server = FakeServer::start();
    let temp = init_temp_with_remote(&server.url);

    let output = ds()
        .args(["new", r#"{"sku":"R-7"}"#, "--finalize"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Completed 2 operations, 1 drafts synced"))
        .get_output()
        .stdout
        .clone();
    let id = String::from_utf8_lossy(&output)
        .split_whitespace()
        .nth(2)
        .unwrap()
        .to_string();

    assert_eq!(
        server.api_calls(),
        vec!["POST /entities", "POST /entities/srv-1/finalize"]
    );
    ds().args(["show", &id])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("[synced] {}", id)));
}

#[test]
fn new_while_offline_only_queues() {
    let temp = init_temp_with_remote(&unreachable_url());

    ds().args(["new", "{}"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("(1 operations queued)"))
        .stdout(predicate::str::contains("Offline - changes will sync when reconnected"));

    ds().arg("queue")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("create-entity"));
}
