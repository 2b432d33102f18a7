//! Create-or-update of single entities.
//!
//! Each function looks the local item up in the session's cached remote
//! lists and either creates or updates it. Items missing their identity field
//! come back as [`Outcome::Skipped`]; remote failures are returned as errors
//! for the caller to record.

use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::model::node::DEFAULT_NODE_TYPE;
use crate::model::RemoteId;
use crate::sync::attachments;
use crate::sync::fields;
use crate::sync::file::{atomic_write, read_properties, read_text};
use crate::sync::names::find_by_name;
use crate::sync::resolve::NodeResolver;
use crate::sync::session::SyncSession;
use crate::sync::types::{EntityStats, ItemFailure, Outcome, SyncResult};

/// Outcome of one item plus the attachments its export uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub outcome: Outcome,
    pub uploaded: usize,
}

impl Reconciled {
    fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            uploaded: 0,
        }
    }

    fn skipped(reason: impl Into<String>) -> Self {
        Self::new(Outcome::Skipped(reason.into()))
    }
}

fn base_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}

/// Export a content block. Identity is its `#[Title]#`.
///
/// The attachment node is only resolved when the content references
/// attachments.
///
/// # Errors
///
/// Returns an error if node resolution, the attachment upload or the remote
/// write fails.
pub fn content_block(
    session: &mut SyncSession<'_>,
    resolver: &dyn NodeResolver,
    path: &Path,
    content: &str,
) -> SyncResult<Reconciled> {
    let Some(title) = fields::title(content) else {
        warn!(file = %path.display(), "No #[Title]# field, skipping");
        return Ok(Reconciled::skipped("missing #[Title]# field"));
    };

    let remote = session.remote();
    let project_id = session.project_id();

    let mut content = content.to_string();
    let mut uploaded = 0;
    if !attachments::scan(&content).is_empty() {
        let node_id = resolver.resolve_node_id(session.nodes()?, path)?;
        let rewritten = attachments::rewrite(remote, project_id, node_id, &content, base_dir(path))?;
        uploaded = rewritten.uploaded.len();
        content = rewritten.content;
    }

    let existing = find_by_name(session.content_blocks()?, &title, |b| b.title.as_str()).map(|b| b.id);
    let outcome = match existing {
        Some(block_id) => {
            info!(%title, block_id, "Updating content block");
            remote.update_content_block(project_id, block_id, &content)?;
            Outcome::Updated(block_id)
        }
        None => {
            info!(%title, "Creating content block");
            let block = remote.create_content_block(project_id, &content, &title)?;
            let id = block.id;
            session.remember_content_block(block);
            Outcome::Created(id)
        }
    };

    Ok(Reconciled { outcome, uploaded })
}

/// Export an issue. Identity is its `#[Title]#`.
///
/// # Errors
///
/// Returns an error if the remote write fails.
pub fn issue(session: &mut SyncSession<'_>, path: &Path, content: &str) -> SyncResult<Reconciled> {
    let Some(title) = fields::title(content) else {
        warn!(file = %path.display(), "No #[Title]# field, skipping");
        return Ok(Reconciled::skipped("missing #[Title]# field"));
    };

    let remote = session.remote();
    let project_id = session.project_id();

    let existing = find_by_name(session.issues()?, &title, |i| i.title.as_str()).map(|i| i.id);
    let outcome = match existing {
        Some(issue_id) => {
            info!(%title, issue_id, "Updating issue");
            remote.update_issue(project_id, issue_id, content)?;
            Outcome::Updated(issue_id)
        }
        None => {
            info!(%title, "Creating issue");
            let issue = remote.create_issue(project_id, content)?;
            let id = issue.id;
            session.remember_issue(issue);
            Outcome::Created(id)
        }
    };

    Ok(Reconciled::new(outcome))
}

/// Export one evidence file. Identity is its embedded `#[EvidenceID]#`.
///
/// Without an id the evidence is created and the new id appended to the
/// local file. With an id it is updated; if that fails the evidence is
/// created afresh and the stale id in the local file is replaced.
///
/// # Errors
///
/// Returns an error if the attachment upload, the create call or the local
/// file write fails.
pub fn evidence(
    session: &mut SyncSession<'_>,
    node_id: RemoteId,
    issue_title: &str,
    path: &Path,
    content: &str,
) -> SyncResult<Reconciled> {
    let Some(issue_id) = find_by_name(session.issues()?, issue_title, |i| i.title.as_str()).map(|i| i.id)
    else {
        warn!(issue = issue_title, "Issue not found on Dradis, skipping evidence");
        return Ok(Reconciled::skipped(format!("issue {issue_title} not found")));
    };

    let remote = session.remote();
    let project_id = session.project_id();

    let rewritten = attachments::rewrite(remote, project_id, node_id, content, base_dir(path))?;
    let uploaded = rewritten.uploaded.len();
    let content = rewritten.content;

    let Some(raw_id) = fields::evidence_id(&content) else {
        debug!(file = %path.display(), "No EvidenceID, creating evidence");
        let created = remote.create_evidence(project_id, node_id, issue_id, &content)?;
        let local = read_text(path)?;
        atomic_write(path, &fields::append_evidence_id(&local, &created.id.to_string()))?;
        info!(evidence_id = created.id, issue = issue_title, "Created evidence");
        return Ok(Reconciled {
            outcome: Outcome::Created(created.id),
            uploaded,
        });
    };

    let updated = match raw_id.parse::<RemoteId>() {
        Ok(evidence_id) => remote
            .update_evidence(project_id, node_id, issue_id, evidence_id, &content)
            .map(|_| evidence_id)
            .map_err(|e| e.to_string()),
        Err(e) => Err(format!("invalid EvidenceID: {e}")),
    };

    let outcome = match updated {
        Ok(evidence_id) => {
            info!(evidence_id, issue = issue_title, "Updated evidence");
            Outcome::Updated(evidence_id)
        }
        Err(reason) => {
            warn!(evidence_id = %raw_id, %reason, "Could not update evidence, creating a new one");
            let fresh = fields::strip_evidence_id(&content);
            let created = remote.create_evidence(project_id, node_id, issue_id, &fresh)?;
            let local = read_text(path)?;
            atomic_write(path, &fields::replace_evidence_id(&local, &created.id.to_string()))?;
            Outcome::Created(created.id)
        }
    };

    Ok(Reconciled { outcome, uploaded })
}

/// Push every key of a properties file as an update.
///
/// A failing key is logged and counted; the remaining keys are still sent.
///
/// # Errors
///
/// Returns an error only if the file cannot be read or parsed.
pub fn document_properties(
    session: &mut SyncSession<'_>,
    path: &Path,
) -> SyncResult<(EntityStats, Vec<ItemFailure>)> {
    let properties = read_properties(path)?;
    let remote = session.remote();
    let project_id = session.project_id();

    let mut stats = EntityStats::default();
    let mut failures = Vec::new();
    for property in &properties {
        match remote.update_document_property(project_id, &property.key, &property.value) {
            Ok(_) => {
                debug!(key = %property.key, "Updated document property");
                stats.updated += 1;
            }
            Err(e) => {
                error!(key = %property.key, error = %e, "Property failed to update");
                stats.failed += 1;
                failures.push(ItemFailure {
                    item: property.key.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    info!(count = stats.updated, "Document properties exported");
    Ok((stats, failures))
}

/// Resolve a node by label, creating it if absent.
///
/// # Errors
///
/// Returns an error if listing or creating the node fails.
pub fn node(session: &mut SyncSession<'_>, label: &str) -> SyncResult<Outcome> {
    if let Some(node) = find_by_name(session.nodes()?, label, |n| n.label.as_str()) {
        debug!(label, node_id = node.id, "Found existing node");
        return Ok(Outcome::Unchanged(node.id));
    }

    info!(label, "Creating node");
    let node = session
        .remote()
        .create_node(session.project_id(), label, DEFAULT_NODE_TYPE, None)?;
    let id = node.id;
    session.remember_node(node);
    Ok(Outcome::Created(id))
}
