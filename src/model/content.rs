//! Content blocks, issues, document properties, attachments and library
//! entries.

use serde::{Deserialize, Serialize};

use super::RemoteId;

/// A reusable report block, matched by title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub id: RemoteId,
    pub title: String,
    pub block_group: Option<String>,
    pub content: String,
}

/// A finding, matched by title. `text` carries the `#[Title]#` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: RemoteId,
    pub title: String,
    pub text: String,
}

/// A project-level key/value property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentProperty {
    pub key: String,
    pub value: String,
}

/// A file stored on a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub link: Option<String>,
}

/// An entry of the standard issue library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardIssue {
    pub id: RemoteId,
    pub title: String,
    pub content: String,
}
