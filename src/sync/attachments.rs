//! Attachment references in textile content.
//!
//! A reference is `!path!` or `!path(caption)!`. Before content is pushed,
//! every reference is pointed at the canonical remote location
//! `/pro/projects/{project}/nodes/{node}/attachments/{filename}` and any
//! local file not yet stored on the node is uploaded in one batch.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::model::RemoteId;
use crate::remote::RemoteClient;
use crate::sync::types::SyncResult;

static ATTACHMENT_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"!(?P<path>[^!\s(][^!\r\n(]*\.[A-Za-z0-9]{1,8})(?P<caption>\([^!\r\n]*\))?!",
    )
    .expect("attachment pattern is valid")
});

/// One `!path(caption)!` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    /// The whole match, bangs included.
    pub full: String,
    pub path: String,
    /// Caption including its parentheses, or empty.
    pub caption: String,
}

impl AttachmentRef {
    /// Last path segment, as written.
    #[must_use]
    pub fn filename(&self) -> &str {
        self.path.rsplit(['/', '\\']).next().unwrap_or(&self.path)
    }

    /// Last path segment with `%20` decoded, as stored remotely.
    #[must_use]
    pub fn stored_filename(&self) -> String {
        self.filename().replace("%20", " ")
    }
}

/// Find every attachment reference, in order of appearance.
#[must_use]
pub fn scan(content: &str) -> Vec<AttachmentRef> {
    ATTACHMENT_REF
        .captures_iter(content)
        .map(|caps| AttachmentRef {
            full: caps[0].to_string(),
            path: caps["path"].to_string(),
            caption: caps
                .name("caption")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        })
        .collect()
}

/// Remote path of an attachment stored on a node.
#[must_use]
pub fn canonical_path(project_id: RemoteId, node_id: RemoteId, filename: &str) -> String {
    format!("/pro/projects/{project_id}/nodes/{node_id}/attachments/{filename}")
}

/// Result of [`rewrite`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub content: String,
    /// Files sent in the upload batch.
    pub uploaded: Vec<PathBuf>,
    /// Filenames already stored on the node.
    pub already_present: Vec<String>,
    /// References whose local file does not exist; left unrewritten.
    pub missing: Vec<String>,
}

/// Upload unseen attachments and point references at their remote path.
///
/// `base_dir` is the directory relative references are resolved against
/// (the folder of the file being exported). A reference to a missing local
/// file is skipped with a warning and left as is; other references in the
/// same content are still processed.
///
/// # Errors
///
/// Returns an error if listing the node's attachments or the upload fails.
pub fn rewrite(
    remote: &dyn RemoteClient,
    project_id: RemoteId,
    node_id: RemoteId,
    content: &str,
    base_dir: &Path,
) -> SyncResult<RewriteOutcome> {
    let refs = scan(content);
    let mut outcome = RewriteOutcome {
        content: content.to_string(),
        ..RewriteOutcome::default()
    };
    if refs.is_empty() {
        return Ok(outcome);
    }

    let existing = remote.list_attachments(project_id, node_id)?;
    debug!(node_id, refs = refs.len(), existing = existing.len(), "Handling attachments");

    for reference in &refs {
        let stored = reference.stored_filename();
        if existing.iter().any(|a| a.filename == stored) {
            if !outcome.already_present.contains(&stored) {
                outcome.already_present.push(stored);
            }
        } else {
            let local = base_dir.join(reference.path.replace("%20", " "));
            match fs::canonicalize(&local) {
                Ok(absolute) if absolute.is_file() => {
                    if !outcome.uploaded.contains(&absolute) {
                        outcome.uploaded.push(absolute);
                    }
                }
                _ => {
                    warn!(path = %local.display(), "Attachment not found, skipping");
                    outcome.missing.push(reference.path.clone());
                    continue;
                }
            }
        }

        let replacement = format!(
            "!{}{}!",
            canonical_path(project_id, node_id, reference.filename()),
            reference.caption
        );
        outcome.content = outcome.content.replace(&reference.full, &replacement);
    }

    if !outcome.already_present.is_empty() {
        debug!(files = ?outcome.already_present, "Attachments already on node, not uploaded");
    }
    if !outcome.uploaded.is_empty() {
        remote.create_attachments(project_id, node_id, &outcome.uploaded)?;
        debug!(count = outcome.uploaded.len(), node_id, "Uploaded attachments");
    }

    Ok(outcome)
}
