// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ds_core::{Draft, SyncOp};

/// Maximum characters of payload shown on a single list line.
const SUMMARY_WIDTH: usize = 60;

/// Compact one-line rendering of a payload, truncated to fit a list line.
pub fn payload_summary(payload: &serde_json::Value) -> String {
    let compact = payload.to_string();
    if compact.chars().count() <= SUMMARY_WIDTH {
        return compact;
    }
    let truncated: String = compact.chars().take(SUMMARY_WIDTH - 3).collect();
    format!("{}...", truncated)
}

/// Format a draft as a single list line.
///
/// Output format: `- [status] id: payload`
pub fn format_draft_line(draft: &Draft) -> String {
    let mut line = format!(
        "- [{}] {}: {}",
        draft.sync_status,
        draft.id,
        payload_summary(&draft.payload)
    );
    if let Some(err) = &draft.sync_error {
        line.push_str(&format!(" ({})", err));
    }
    line
}

/// Format a queued operation as a single line.
pub fn format_op_line(op: &SyncOp) -> String {
    let mut line = format!("#{} {} {}", op.id, op.kind, op.draft_id);
    if let Some(index) = op.attachment_index() {
        line.push_str(&format!(" [{}]", index));
    }
    if op.attempts > 0 {
        line.push_str(&format!(" (attempts: {})", op.attempts));
    }
    if let Some(err) = &op.last_error {
        line.push_str(&format!(" last error: {}", err));
    }
    line
}

/// Format full draft details with its queued operations.
pub fn format_draft_details(draft: &Draft, ops: &[SyncOp]) -> String {
    let mut lines = vec![format!("[{}] {}", draft.sync_status, draft.id)];
    lines.push(format!(
        "Created: {}",
        draft.created_at.format("%Y-%m-%d %H:%M")
    ));
    if let Some(server_id) = &draft.server_id {
        lines.push(format!("Server ID: {}", server_id));
    }
    lines.push(format!(
        "Finalize: {}",
        if draft.finalize_intent { "yes" } else { "no" }
    ));
    if let Some(err) = &draft.sync_error {
        lines.push(format!("Error: {}", err));
    }

    lines.push(String::new());
    lines.push("Payload:".to_string());
    let pretty =
        serde_json::to_string_pretty(&draft.payload).unwrap_or_else(|_| draft.payload.to_string());
    lines.extend(pretty.lines().map(|l| format!("  {}", l)));

    if !draft.attachments.is_empty() {
        lines.push(String::new());
        lines.push("Attachments:".to_string());
        for (i, attachment) in draft.attachments.iter().enumerate() {
            lines.push(format!(
                "  {}. {} ({}, {} bytes)",
                i,
                attachment.name.as_deref().unwrap_or("(unnamed)"),
                attachment.content_type,
                attachment.data.len()
            ));
        }
    }

    if !ops.is_empty() {
        lines.push(String::new());
        lines.push("Queued operations:".to_string());
        lines.extend(ops.iter().map(|op| format!("  {}", format_op_line(op))));
    }

    lines.join("\n")
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
