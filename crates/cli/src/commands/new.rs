// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ds_core::{Attachment, Database, Draft};
use tracing::debug;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::id::generate_unique_id;
use crate::sync::{EngineConfig, HttpRemote, RemoteApi, SyncError};

use super::sync::{connect, finish, summary_lines, SyncSummary};
use super::{acquire_runner_lock, open_db, print_json};

pub fn run(
    payload: String,
    attach: Vec<PathBuf>,
    finalize: bool,
    output: OutputFormat,
) -> Result<()> {
    let (mut db, config, data_dir) = open_db()?;
    let attachments = attach
        .iter()
        .map(|path| read_attachment(path))
        .collect::<Result<Vec<_>>>()?;
    let remote = config
        .effective_remote()
        .map(|remote_config| HttpRemote::new(&remote_config))
        .transpose()
        .map_err(SyncError::from)?;

    // A running `run` owns the queue and picks the draft up on its next poll.
    let lock = match &remote {
        Some(_) => match acquire_runner_lock(&data_dir) {
            Ok(lock) => Some(lock),
            Err(Error::RunnerActive(path)) => {
                debug!(%path, "runner active, queueing only");
                None
            }
            Err(e) => return Err(e),
        },
        None => None,
    };

    let (draft, summary) = match (remote, lock) {
        (Some(remote), Some(_lock)) => {
            let draft = build_draft(&db, &config, &payload, attachments, finalize)?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let (draft, summary) = runtime.block_on(submit_impl(
                db,
                Arc::new(remote),
                EngineConfig::from(&config.sync),
                &draft,
            ))?;
            (draft, Some(summary))
        }
        _ => (run_impl(&mut db, &config, &payload, attachments, finalize)?, None),
    };

    match output {
        OutputFormat::Text => {
            println!(
                "Created draft {} ({} operations queued)",
                draft.id,
                draft.chain_len()
            );
            for line in summary.iter().flat_map(summary_lines) {
                println!("{}", line);
            }
        }
        OutputFormat::Id => println!("{}", draft.id),
        OutputFormat::Json => print_json(&draft)?,
    }
    Ok(())
}

/// Persist a new draft and queue its creation chain.
pub(crate) fn run_impl(
    db: &mut Database,
    config: &Config,
    payload: &str,
    attachments: Vec<Attachment>,
    finalize: bool,
) -> Result<Draft> {
    let draft = build_draft(db, config, payload, attachments, finalize)?;
    let ops = db.enqueue_creation_chain(&draft)?;
    debug!(draft_id = %draft.id, ops = ops.len(), "draft created");
    Ok(draft)
}

/// Queue a draft and replay the queue at once if the remote answers.
///
/// Returns the draft as stored after the pass.
pub(crate) async fn submit_impl<R: RemoteApi + 'static>(
    db: Database,
    remote: Arc<R>,
    config: EngineConfig,
    draft: &Draft,
) -> Result<(Draft, SyncSummary)> {
    let engine = connect(db, remote, config).await;
    let mut events = engine.status().subscribe();
    let report = engine.submit(draft).await;
    let summary = finish(&engine, &mut events, report)?;

    let stored = engine.db().lock().await.get_draft(&draft.id)?;
    debug!(draft_id = %draft.id, outcome = ?summary.report.outcome, "draft submitted");
    Ok((stored.unwrap_or_else(|| draft.clone()), summary))
}

/// Build a draft with a fresh id. Nothing is written.
fn build_draft(
    db: &Database,
    config: &Config,
    payload: &str,
    attachments: Vec<Attachment>,
    finalize: bool,
) -> Result<Draft> {
    let payload = parse_payload(payload)?;
    let created_at = db.now();
    let id = generate_unique_id(&config.prefix, &payload, &created_at, |id| {
        Ok(db.draft_exists(id)?)
    })?;

    let mut draft = Draft::new(id, payload, created_at).with_finalize(finalize);
    for attachment in attachments {
        draft = draft.with_attachment(attachment);
    }
    Ok(draft)
}

/// Parse the entity fields. Only JSON objects are accepted.
pub(crate) fn parse_payload(raw: &str) -> Result<serde_json::Value> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| Error::InvalidPayload(e.to_string()))?;
    if !value.is_object() {
        return Err(Error::InvalidPayload("expected a JSON object".to_string()));
    }
    Ok(value)
}

/// Read a file from disk into an attachment named after the file.
pub(crate) fn read_attachment(path: &Path) -> Result<Attachment> {
    let data = std::fs::read(path).map_err(|e| Error::AttachmentUnreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let attachment = Attachment::new(content_type_for(path), data);
    Ok(match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => attachment.with_name(name),
        None => attachment,
    })
}

/// Guess a MIME type from the file extension.
pub(crate) fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("pdf") => "application/pdf",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[path = "new_tests.rs"]
mod tests;
