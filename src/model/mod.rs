//! Data models for dradismd.
//!
//! Typed records for everything the remote platform hands back:
//! - Project
//! - Node, Evidence
//! - ContentBlock, Issue, DocumentProperty
//! - Attachment, StandardIssue
//!
//! Records are built at the [`crate::remote`] boundary; the sync engine never
//! sees raw JSON.

pub mod content;
pub mod node;
pub mod project;

pub use content::{Attachment, ContentBlock, DocumentProperty, Issue, StandardIssue};
pub use node::{Evidence, IssueRef, Node};
pub use project::{CustomField, Project};

/// Remote identifier assigned by the platform.
pub type RemoteId = u64;
