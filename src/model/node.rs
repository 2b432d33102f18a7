//! Node and evidence models.

use serde::{Deserialize, Serialize};

use super::RemoteId;

/// Label of the node Dradis creates to hold project-level uploads.
pub const UPLOADED_FILES_LABEL: &str = "Uploaded files";

/// Node type id used when creating nodes from local folders.
pub const DEFAULT_NODE_TYPE: u64 = 1;

/// A remote node (host, target, or grouping).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: RemoteId,
    pub label: String,
    pub type_id: Option<u64>,
    pub parent_id: Option<RemoteId>,

    /// Evidence attached to this node, as returned by the node listing.
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

/// Evidence tying one issue to one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// The EvidenceID
    pub id: RemoteId,
    pub issue: IssueRef,
    pub content: String,
}

/// Issue reference carried by an evidence record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub id: RemoteId,
    pub title: String,
}
