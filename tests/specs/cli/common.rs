// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test files,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]
#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

pub fn ds() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("draftsync").unwrap();
    cmd.env_remove("DRAFTSYNC_REMOTE_URL")
        .env_remove("DRAFTSYNC_TOKEN")
        .env_remove("DRAFTSYNC_LOG")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create an initialized temp directory without a remote.
pub fn init_temp() -> TempDir {
    let temp = TempDir::new().unwrap();
    ds().args(["init", "--prefix", "test"])
        .current_dir(temp.path())
        .assert()
        .success();
    temp
}

/// Helper to create an initialized temp directory pointing at `url`.
pub fn init_temp_with_remote(url: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    ds().args(["init", "--prefix", "test", "--remote", url])
        .current_dir(temp.path())
        .assert()
        .success();
    temp
}

/// Create a draft and return its id.
pub fn create_draft(temp: &TempDir, payload: &str, extra: &[&str]) -> String {
    let output = ds()
        .arg("new")
        .arg(payload)
        .args(extra)
        .args(["-o", "id"])
        .current_dir(temp.path())
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "new failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A URL nothing listens on.
pub fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// A request received by [`FakeServer`].
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub path: String,
}

/// Minimal HTTP server standing in for the remote API.
///
/// `POST /entities` answers `{"id": "srv-N"}`, every other path answers `{}`.
/// With `reject_creates`, entity creation answers 422 instead.
pub struct FakeServer {
    pub url: String,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl FakeServer {
    pub fn start() -> Self {
        Self::start_with(false)
    }

    pub fn rejecting_creates() -> Self {
        Self::start_with(true)
    }

    fn start_with(reject_creates: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let next_id = Arc::new(AtomicU64::new(1));

        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let recorded = Arc::clone(&recorded);
                let next_id = Arc::clone(&next_id);
                std::thread::spawn(move || {
                    handle(stream, &recorded, &next_id, reject_creates);
                });
            }
        });

        FakeServer { url, requests }
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests other than health probes, as `METHOD path`.
    pub fn api_calls(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.path != "/health")
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }
}

fn handle(
    stream: TcpStream,
    recorded: &Mutex<Vec<Request>>,
    next_id: &AtomicU64,
    reject_creates: bool,
) {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).unwrap_or(0) == 0 {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0usize;
    let mut chunked = false;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
            break;
        }
        let lower = line.to_ascii_lowercase();
        if let Some(value) = lower.strip_prefix("content-length:") {
            content_length = value.trim().parse().unwrap_or(0);
        }
        if lower.starts_with("transfer-encoding:") && lower.contains("chunked") {
            chunked = true;
        }
    }
    if chunked {
        read_chunked(&mut reader);
    } else {
        let mut body = vec![0u8; content_length];
        let _ = reader.read_exact(&mut body);
    }

    recorded.lock().unwrap().push(Request {
        method: method.clone(),
        path: path.clone(),
    });

    let (status, body) = if method == "POST" && path == "/entities" {
        if reject_creates {
            ("422 Unprocessable Entity", r#"{"error":"invalid sku"}"#.to_string())
        } else {
            let n = next_id.fetch_add(1, Ordering::SeqCst);
            ("201 Created", format!(r#"{{"id":"srv-{}"}}"#, n))
        }
    } else {
        ("200 OK", "{}".to_string())
    };

    let response = format!(
        "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let mut stream = reader.into_inner();
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn read_chunked(reader: &mut BufReader<TcpStream>) {
    loop {
        let mut size_line = String::new();
        if reader.read_line(&mut size_line).unwrap_or(0) == 0 {
            return;
        }
        let size = usize::from_str_radix(size_line.trim(), 16).unwrap_or(0);
        let mut chunk = vec![0u8; size + 2];
        if reader.read_exact(&mut chunk).is_err() || size == 0 {
            return;
        }
    }
}
