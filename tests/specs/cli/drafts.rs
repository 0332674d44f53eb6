// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for creating, listing, inspecting and discarding drafts.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::common::*;
use yare::parameterized;

#[test]
fn new_prints_id_and_queued_operations() {
    let temp = init_temp();

    ds().args(["new", r#"{"sku":"R-100"}"#])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^Created draft test-[0-9a-f]{8} \(1 operations queued\)\n$").unwrap());
}

#[test]
fn new_with_attachments_and_finalize_queues_chain_in_order() {
    let temp = init_temp();
    std::fs::write(temp.path().join("front.jpg"), b"front").unwrap();
    std::fs::write(temp.path().join("back.png"), b"back").unwrap();

    let id = create_draft(
        &temp,
        r#"{"sku":"R-100"}"#,
        &["-a", "front.jpg", "-a", "back.png", "--finalize"],
    );

    let output = ds()
        .arg("queue")
        .current_dir(temp.path())
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].contains(&format!("create-entity {}", id)));
    assert!(lines[1].contains("upload-attachment") && lines[1].ends_with("[0]"));
    assert!(lines[2].contains("upload-attachment") && lines[2].ends_with("[1]"));
    assert!(lines[3].contains("finalize-entity"));
}

#[test]
fn new_with_missing_attachment_fails_without_queueing() {
    let temp = init_temp();

    ds().args(["new", "{}", "-a", "missing.jpg"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read attachment"));

    ds().arg("queue")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Queue is empty"));
}

#[parameterized(
    not_json = { "sku=R-100" },
    array = { "[1,2,3]" },
    number = { "7" },
)]
fn new_rejects_non_object_payload(payload: &str) {
    let temp = init_temp();

    ds().args(["new", payload])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid payload"));
}

#[test]
fn new_json_output_includes_status() {
    let temp = init_temp();

    let output = ds()
        .args(["new", r#"{"sku":"R-1"}"#, "--finalize", "-o", "json"])
        .current_dir(temp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["sync_status"], "pending");
    assert_eq!(json["finalize_intent"], true);
    assert_eq!(json["payload"]["sku"], "R-1");
}

#[test]
fn list_shows_drafts_with_status() {
    let temp = init_temp();
    let a = create_draft(&temp, r#"{"sku":"A"}"#, &[]);
    let b = create_draft(&temp, r#"{"sku":"B"}"#, &[]);

    ds().arg("list")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("[pending] {}", a)))
        .stdout(predicate::str::contains(format!("[pending] {}", b)));
}

#[test]
fn list_filters_by_status() {
    let temp = init_temp();
    create_draft(&temp, r#"{"sku":"A"}"#, &[]);

    ds().args(["list", "--status", "error"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn list_rejects_unknown_status() {
    let temp = init_temp();

    ds().args(["list", "--status", "done"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid sync status"));
}

#[test]
fn show_displays_payload_and_queue() {
    let temp = init_temp();
    std::fs::write(temp.path().join("photo.jpg"), b"12345").unwrap();
    let id = create_draft(&temp, r#"{"sku":"R-7"}"#, &["-a", "photo.jpg"]);

    ds().args(["show", &id])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("[pending] {}", id)))
        .stdout(predicate::str::contains("\"sku\": \"R-7\""))
        .stdout(predicate::str::contains("0. photo.jpg (image/jpeg, 5 bytes)"))
        .stdout(predicate::str::contains("Queued operations:"));
}

#[test]
fn show_json_lists_operations() {
    let temp = init_temp();
    let id = create_draft(&temp, "{}", &["--finalize"]);

    let output = ds()
        .args(["show", &id, "-o", "json"])
        .current_dir(temp.path())
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(json["id"], id.as_str());
    let ops = json["operations"].as_array().unwrap();
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[0]["kind"], "create-entity");
    assert_eq!(ops[1]["kind"], "finalize-entity");
}

#[test]
fn show_unknown_draft_fails() {
    let temp = init_temp();

    ds().args(["show", "test-00000000"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("draft not found: test-00000000"));
}

#[test]
fn discard_removes_draft_and_operations() {
    let temp = init_temp();
    let id = create_draft(&temp, "{}", &["--finalize"]);
    let keep = create_draft(&temp, r#"{"keep":true}"#, &[]);

    ds().args(["discard", &id])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2 queued operations removed"));

    ds().arg("list")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(&id).not())
        .stdout(predicate::str::contains(&keep));

    ds().arg("queue")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(&id).not());
}

#[test]
fn discard_unknown_draft_fails() {
    let temp = init_temp();

    ds().args(["discard", "test-00000000"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("draft not found"));
}
