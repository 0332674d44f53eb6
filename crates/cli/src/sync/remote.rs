// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote API abstraction.
//!
//! The sync engine talks to the authoritative server only through
//! [`RemoteApi`], which allows:
//! - A real HTTP client ([`HttpRemote`]) for production
//! - Scripted mock remotes for unit testing

use std::future::Future;
use std::pin::Pin;

use reqwest::multipart::{Form, Part};

use crate::config::RemoteConfig;

/// How a failure is handled by the drain loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No network path to the server. Halts the drain, queue untouched.
    Connectivity,
    /// The server answered with an error. Consumed by the retry budget.
    RemoteRejection,
    /// The operation cannot be executed as stored. Discarded.
    MalformedState,
}

/// Error type for remote operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The request never got a response (connect, DNS, TLS, timeout).
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// The server returned a non-2xx status or an unusable body.
    #[error("remote rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request could not be built from the queued operation.
    #[error("malformed operation: {0}")]
    Malformed(String),
}

impl RemoteError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RemoteError::Connectivity(_) => FailureKind::Connectivity,
            RemoteError::Rejected { .. } => FailureKind::RemoteRejection,
            RemoteError::Malformed(_) => FailureKind::MalformedState,
        }
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        RemoteError::Rejected {
            status,
            message: message.into(),
        }
    }
}

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Boxed future returned by [`RemoteApi`] methods.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = RemoteResult<T>> + Send + 'a>>;

/// One attachment upload, as read from the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentUpload {
    /// Position of the attachment on its draft.
    pub index: usize,
    pub content_type: String,
    pub name: Option<String>,
    pub data: Vec<u8>,
}

impl AttachmentUpload {
    fn file_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("attachment-{}", self.index))
    }
}

/// The remote endpoints consumed by the sync engine.
pub trait RemoteApi: Send + Sync {
    /// Create an entity from a draft payload. Returns the server id.
    fn create<'a>(&'a self, payload: &'a serde_json::Value) -> RemoteFuture<'a, String>;

    /// Upload one attachment to an existing entity.
    fn attach<'a>(&'a self, server_id: &'a str, upload: AttachmentUpload) -> RemoteFuture<'a, ()>;

    /// Commit an entity after creation and uploads.
    fn finalize<'a>(&'a self, server_id: &'a str) -> RemoteFuture<'a, ()>;

    /// Check that the server is reachable.
    fn probe(&self) -> RemoteFuture<'_, ()>;
}

/// HTTP client for the entity API.
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRemote {
    /// Create a client for the configured remote.
    pub fn new(config: &RemoteConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &RemoteConfig) -> Self {
        HttpRemote {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.post(format!("{}{}", self.base_url, path)))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(request: reqwest::RequestBuilder) -> RemoteResult<reqwest::Response> {
        let response = request.send().await.map_err(classify)?;
        ensure_success(response).await
    }
}

/// Sort a transport error into the failure taxonomy.
fn classify(err: reqwest::Error) -> RemoteError {
    if let Some(status) = err.status() {
        return RemoteError::rejected(status.as_u16(), err.to_string());
    }
    if err.is_decode() {
        return RemoteError::rejected(0, err.to_string());
    }
    if err.is_builder() {
        return RemoteError::Malformed(err.to_string());
    }
    RemoteError::Connectivity(err.to_string())
}

/// Return the response on 2xx, otherwise a rejection carrying the body.
async fn ensure_success(response: reqwest::Response) -> RemoteResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<failed to read body: {e}>"));
    Err(RemoteError::rejected(status.as_u16(), body))
}

/// Pull the entity id out of a create response.
///
/// Accepts `{"id": "abc"}` and numeric ids.
pub(crate) fn parse_entity_id(status: u16, body: &serde_json::Value) -> RemoteResult<String> {
    match body.get("id") {
        Some(serde_json::Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(serde_json::Value::Number(id)) => Ok(id.to_string()),
        _ => Err(RemoteError::rejected(
            status,
            format!("create response has no entity id: {body}"),
        )),
    }
}

impl RemoteApi for HttpRemote {
    fn create<'a>(&'a self, payload: &'a serde_json::Value) -> RemoteFuture<'a, String> {
        Box::pin(async move {
            let response = Self::send(self.post("/entities").json(payload)).await?;
            let status = response.status().as_u16();
            let body: serde_json::Value = response.json().await.map_err(classify)?;
            parse_entity_id(status, &body)
        })
    }

    fn attach<'a>(&'a self, server_id: &'a str, upload: AttachmentUpload) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            let file_name = upload.file_name();
            let part = Part::bytes(upload.data)
                .file_name(file_name)
                .mime_str(&upload.content_type)
                .map_err(|e| {
                    RemoteError::Malformed(format!(
                        "invalid content type '{}': {e}",
                        upload.content_type
                    ))
                })?;
            let form = Form::new()
                .text("index", upload.index.to_string())
                .part("file", part);
            let path = format!("/entities/{server_id}/attachments");
            Self::send(self.post(&path).multipart(form)).await?;
            Ok(())
        })
    }

    fn finalize<'a>(&'a self, server_id: &'a str) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            let path = format!("/entities/{server_id}/finalize");
            Self::send(self.post(&path)).await?;
            Ok(())
        })
    }

    fn probe(&self) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            let request = self.authorize(self.client.get(format!("{}/health", self.base_url)));
            // Any HTTP answer means the server is reachable.
            request.send().await.map_err(classify)?;
            Ok(())
        })
    }
}
