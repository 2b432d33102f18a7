//! Per-invocation remote state.
//!
//! Lists are fetched on first use and reused for the rest of the run.
//! Records created during the run are pushed into the cached lists so later
//! lookups in the same run see them. Nothing survives the session.

use tracing::debug;

use crate::model::{ContentBlock, Issue, Node, RemoteId};
use crate::remote::RemoteClient;
use crate::sync::types::SyncResult;

/// Remote client, target project and cached entity lists.
pub struct SyncSession<'r> {
    remote: &'r dyn RemoteClient,
    project_id: RemoteId,
    nodes: Option<Vec<Node>>,
    issues: Option<Vec<Issue>>,
    content_blocks: Option<Vec<ContentBlock>>,
}

impl<'r> SyncSession<'r> {
    pub fn new(remote: &'r dyn RemoteClient, project_id: RemoteId) -> Self {
        Self {
            remote,
            project_id,
            nodes: None,
            issues: None,
            content_blocks: None,
        }
    }

    #[must_use]
    pub fn remote(&self) -> &'r dyn RemoteClient {
        self.remote
    }

    #[must_use]
    pub fn project_id(&self) -> RemoteId {
        self.project_id
    }

    /// Cached node list, fetched on first call.
    ///
    /// # Errors
    ///
    /// Returns an error if the list call fails.
    pub fn nodes(&mut self) -> SyncResult<&[Node]> {
        if self.nodes.is_none() {
            let nodes = self.remote.list_nodes(self.project_id)?;
            debug!(count = nodes.len(), "Fetched nodes");
            self.nodes = Some(nodes);
        }
        Ok(self.nodes.as_deref().unwrap_or_default())
    }

    /// Cached issue list, fetched on first call.
    ///
    /// # Errors
    ///
    /// Returns an error if the list call fails.
    pub fn issues(&mut self) -> SyncResult<&[Issue]> {
        if self.issues.is_none() {
            let issues = self.remote.list_issues(self.project_id)?;
            debug!(count = issues.len(), "Fetched issues");
            self.issues = Some(issues);
        }
        Ok(self.issues.as_deref().unwrap_or_default())
    }

    /// Cached content block list, fetched on first call.
    ///
    /// # Errors
    ///
    /// Returns an error if the list call fails.
    pub fn content_blocks(&mut self) -> SyncResult<&[ContentBlock]> {
        if self.content_blocks.is_none() {
            let blocks = self.remote.list_content_blocks(self.project_id)?;
            debug!(count = blocks.len(), "Fetched content blocks");
            self.content_blocks = Some(blocks);
        }
        Ok(self.content_blocks.as_deref().unwrap_or_default())
    }

    pub fn remember_node(&mut self, node: Node) {
        if let Some(nodes) = self.nodes.as_mut() {
            nodes.push(node);
        }
    }

    pub fn remember_issue(&mut self, issue: Issue) {
        if let Some(issues) = self.issues.as_mut() {
            issues.push(issue);
        }
    }

    pub fn remember_content_block(&mut self, block: ContentBlock) {
        if let Some(blocks) = self.content_blocks.as_mut() {
            blocks.push(block);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::fake::FakeRemote;

    #[test]
    fn test_lists_fetched_once() {
        let fake = FakeRemote::new().with_node(5, "Uploaded files").with_issue(1, "XSS");
        let mut session = SyncSession::new(&fake, 47);

        assert_eq!(session.nodes().unwrap().len(), 1);
        assert_eq!(session.nodes().unwrap().len(), 1);
        assert_eq!(session.issues().unwrap().len(), 1);
        assert_eq!(session.issues().unwrap().len(), 1);

        assert_eq!(fake.count("list_nodes"), 1);
        assert_eq!(fake.count("list_issues"), 1);
    }

    #[test]
    fn test_remembered_records_are_visible() {
        let fake = FakeRemote::new();
        let mut session = SyncSession::new(&fake, 47);

        session.issues().unwrap();
        session.remember_issue(Issue {
            id: 9,
            title: "New".to_string(),
            text: String::new(),
        });

        assert_eq!(session.issues().unwrap().len(), 1);
        assert_eq!(fake.count("list_issues"), 1);
    }
}
