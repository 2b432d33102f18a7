//! Node resolution for attachment uploads.
//!
//! Attachments live under a node. Evidence files sit under their node's
//! folder, so the node is known. Content blocks have no node exposed by the
//! API; the one that stores their uploads is found positionally.

use std::path::Path;

use crate::model::node::UPLOADED_FILES_LABEL;
use crate::model::{Node, RemoteId};
use crate::sync::layout::{EntryKind, classify};
use crate::sync::names::find_by_name;
use crate::sync::types::{SyncError, SyncResult};

/// Maps a local file to the remote node that owns its attachments.
pub trait NodeResolver {
    /// # Errors
    ///
    /// Returns [`SyncError::NodeNotResolvable`] when no node applies.
    fn resolve_node_id(&self, nodes: &[Node], path: &Path) -> SyncResult<RemoteId>;
}

/// Content blocks use the node whose id is one below "Uploaded files".
///
/// Relies on the order Dradis assigns node ids when a project is created.
/// Not a documented contract.
#[derive(Debug, Default, Clone, Copy)]
pub struct UploadedFilesHeuristic;

impl NodeResolver for UploadedFilesHeuristic {
    fn resolve_node_id(&self, nodes: &[Node], path: &Path) -> SyncResult<RemoteId> {
        match classify(path) {
            EntryKind::ContentBlock => {
                let uploaded = find_by_name(nodes, UPLOADED_FILES_LABEL, |n| n.label.as_str())
                    .ok_or_else(|| {
                        SyncError::node_not_resolvable(
                            path,
                            format!("no \"{UPLOADED_FILES_LABEL}\" node in project"),
                        )
                    })?;
                uploaded.id.checked_sub(1).ok_or_else(|| {
                    SyncError::node_not_resolvable(path, "\"Uploaded files\" node has id 0")
                })
            }
            EntryKind::Evidence { node_label, .. } => {
                find_by_name(nodes, &node_label, |n| n.label.as_str())
                    .map(|n| n.id)
                    .ok_or_else(|| {
                        SyncError::node_not_resolvable(path, format!("no node labeled {node_label}"))
                    })
            }
            _ => Err(SyncError::node_not_resolvable(
                path,
                "not a content block or evidence file",
            )),
        }
    }
}
