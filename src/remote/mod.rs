//! Remote platform access.
//!
//! [`RemoteClient`] is the seam between the sync engine and the Dradis Pro
//! REST API. [`DradisClient`] is the HTTP implementation; tests use an
//! in-memory recording fake.
//!
//! Lookups (`get_*`) return `Ok(None)` when the platform answers with its
//! "record not found" sentinel. Only transport failures and rejected writes
//! are errors.

mod http;
mod wire;

#[cfg(test)]
pub(crate) mod fake;

pub use http::{DradisClient, TlsVerification};

use std::path::PathBuf;

use crate::error::Result;
use crate::model::{
    Attachment, ContentBlock, DocumentProperty, Evidence, Issue, Node, Project, RemoteId,
    StandardIssue,
};

/// Entity CRUD operations against the remote platform.
pub trait RemoteClient {
    // Projects
    fn list_projects(&self) -> Result<Vec<Project>>;
    fn get_project(&self, project_id: RemoteId) -> Result<Option<Project>>;

    // Content blocks
    fn list_content_blocks(&self, project_id: RemoteId) -> Result<Vec<ContentBlock>>;
    fn get_content_block(&self, project_id: RemoteId, block_id: RemoteId)
    -> Result<Option<ContentBlock>>;
    fn create_content_block(
        &self,
        project_id: RemoteId,
        content: &str,
        block_group: &str,
    ) -> Result<ContentBlock>;
    fn update_content_block(
        &self,
        project_id: RemoteId,
        block_id: RemoteId,
        content: &str,
    ) -> Result<ContentBlock>;

    // Document properties
    fn list_document_properties(&self, project_id: RemoteId) -> Result<Vec<DocumentProperty>>;
    fn get_document_property(
        &self,
        project_id: RemoteId,
        key: &str,
    ) -> Result<Option<DocumentProperty>>;
    fn create_document_property(
        &self,
        project_id: RemoteId,
        key: &str,
        value: &str,
    ) -> Result<DocumentProperty>;
    fn update_document_property(
        &self,
        project_id: RemoteId,
        key: &str,
        value: &str,
    ) -> Result<DocumentProperty>;

    // Issues
    fn list_issues(&self, project_id: RemoteId) -> Result<Vec<Issue>>;
    fn get_issue(&self, project_id: RemoteId, issue_id: RemoteId) -> Result<Option<Issue>>;
    fn create_issue(&self, project_id: RemoteId, text: &str) -> Result<Issue>;
    fn update_issue(&self, project_id: RemoteId, issue_id: RemoteId, text: &str) -> Result<Issue>;

    // Nodes
    fn list_nodes(&self, project_id: RemoteId) -> Result<Vec<Node>>;
    fn get_node(&self, project_id: RemoteId, node_id: RemoteId) -> Result<Option<Node>>;
    fn create_node(
        &self,
        project_id: RemoteId,
        label: &str,
        type_id: u64,
        parent_id: Option<RemoteId>,
    ) -> Result<Node>;
    fn update_node(&self, project_id: RemoteId, node_id: RemoteId, label: &str) -> Result<Node>;

    // Evidence
    fn list_evidence(&self, project_id: RemoteId, node_id: RemoteId) -> Result<Vec<Evidence>>;
    fn get_evidence(
        &self,
        project_id: RemoteId,
        node_id: RemoteId,
        evidence_id: RemoteId,
    ) -> Result<Option<Evidence>>;
    fn create_evidence(
        &self,
        project_id: RemoteId,
        node_id: RemoteId,
        issue_id: RemoteId,
        content: &str,
    ) -> Result<Evidence>;
    fn update_evidence(
        &self,
        project_id: RemoteId,
        node_id: RemoteId,
        issue_id: RemoteId,
        evidence_id: RemoteId,
        content: &str,
    ) -> Result<Evidence>;

    // Attachments
    fn list_attachments(&self, project_id: RemoteId, node_id: RemoteId) -> Result<Vec<Attachment>>;

    /// Upload every file in one request.
    fn create_attachments(
        &self,
        project_id: RemoteId,
        node_id: RemoteId,
        files: &[PathBuf],
    ) -> Result<Vec<Attachment>>;

    // Standard issue library
    fn list_standard_issues(&self) -> Result<Vec<StandardIssue>>;
    fn get_standard_issue(&self, entry_id: RemoteId) -> Result<Option<StandardIssue>>;
}
