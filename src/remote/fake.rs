//! In-memory [`RemoteClient`] for tests.
//!
//! Holds a single project's worth of records, logs every call by method
//! name, and can be told to fail selected calls.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

use super::RemoteClient;
use crate::error::{Error, Result};
use crate::model::{
    Attachment, ContentBlock, DocumentProperty, Evidence, Issue, IssueRef, Node, Project,
    RemoteId, StandardIssue,
};
use crate::sync::fields;

#[derive(Default)]
struct State {
    projects: Vec<Project>,
    content_blocks: Vec<ContentBlock>,
    properties: Vec<DocumentProperty>,
    issues: Vec<Issue>,
    nodes: Vec<Node>,
    attachments: HashMap<RemoteId, Vec<Attachment>>,
    standard_issues: Vec<StandardIssue>,
    next_id: RemoteId,
    calls: Vec<String>,
    failures: Vec<(String, Option<String>)>,
}

impl State {
    fn next_id(&mut self) -> RemoteId {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct FakeRemote {
    state: RefCell<State>,
}

impl FakeRemote {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.state.borrow_mut().next_id = 1000;
        fake
    }

    pub fn with_project(self, id: RemoteId, name: &str) -> Self {
        self.state.borrow_mut().projects.push(Project {
            id,
            name: name.to_string(),
            client: None,
            updated_at: None,
            custom_fields: Vec::new(),
        });
        self
    }

    pub fn with_node(self, id: RemoteId, label: &str) -> Self {
        self.state.borrow_mut().nodes.push(Node {
            id,
            label: label.to_string(),
            type_id: Some(1),
            parent_id: None,
            evidence: Vec::new(),
        });
        self
    }

    pub fn with_issue(self, id: RemoteId, title: &str) -> Self {
        self.state.borrow_mut().issues.push(Issue {
            id,
            title: title.to_string(),
            text: format!("#[Title]#\n{title}\n"),
        });
        self
    }

    pub fn with_content_block(self, id: RemoteId, title: &str, content: &str) -> Self {
        self.state.borrow_mut().content_blocks.push(ContentBlock {
            id,
            title: title.to_string(),
            block_group: Some(title.to_string()),
            content: content.to_string(),
        });
        self
    }

    pub fn with_property(self, key: &str, value: &str) -> Self {
        self.state.borrow_mut().properties.push(DocumentProperty {
            key: key.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn with_evidence(self, node_id: RemoteId, id: RemoteId, issue_id: RemoteId, content: &str) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let title = state
                .issues
                .iter()
                .find(|i| i.id == issue_id)
                .map(|i| i.title.clone())
                .unwrap_or_default();
            if let Some(node) = state.nodes.iter_mut().find(|n| n.id == node_id) {
                node.evidence.push(Evidence {
                    id,
                    issue: IssueRef { id: issue_id, title },
                    content: content.to_string(),
                });
            }
        }
        self
    }

    pub fn with_attachment(self, node_id: RemoteId, filename: &str) -> Self {
        self.state
            .borrow_mut()
            .attachments
            .entry(node_id)
            .or_default()
            .push(Attachment {
                filename: filename.to_string(),
                link: None,
            });
        self
    }

    pub fn with_standard_issue(self, id: RemoteId, title: &str, content: &str) -> Self {
        self.state.borrow_mut().standard_issues.push(StandardIssue {
            id,
            title: title.to_string(),
            content: content.to_string(),
        });
        self
    }

    /// Make every call to `method` fail.
    pub fn fail(self, method: &str) -> Self {
        self.state
            .borrow_mut()
            .failures
            .push((method.to_string(), None));
        self
    }

    /// Make calls to `method` fail when their text payload contains `needle`.
    pub fn fail_matching(self, method: &str, needle: &str) -> Self {
        self.state
            .borrow_mut()
            .failures
            .push((method.to_string(), Some(needle.to_string())));
        self
    }

    /// Method names called so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.state.borrow().calls.iter().filter(|c| *c == method).count()
    }

    pub fn issues(&self) -> Vec<Issue> {
        self.state.borrow().issues.clone()
    }

    pub fn content_blocks(&self) -> Vec<ContentBlock> {
        self.state.borrow().content_blocks.clone()
    }

    pub fn properties(&self) -> Vec<DocumentProperty> {
        self.state.borrow().properties.clone()
    }

    pub fn nodes(&self) -> Vec<Node> {
        self.state.borrow().nodes.clone()
    }

    pub fn attachments(&self, node_id: RemoteId) -> Vec<Attachment> {
        self.state
            .borrow()
            .attachments
            .get(&node_id)
            .cloned()
            .unwrap_or_default()
    }

    fn call(&self, method: &str, payload: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(method.to_string());
        let failing = state.failures.iter().any(|(m, needle)| {
            m == method && needle.as_deref().is_none_or(|n| payload.contains(n))
        });
        if failing {
            return Err(Error::Remote(format!("{method} rejected")));
        }
        Ok(())
    }
}

impl RemoteClient for FakeRemote {
    fn list_projects(&self) -> Result<Vec<Project>> {
        self.call("list_projects", "")?;
        Ok(self.state.borrow().projects.clone())
    }

    fn get_project(&self, project_id: RemoteId) -> Result<Option<Project>> {
        self.call("get_project", "")?;
        Ok(self
            .state
            .borrow()
            .projects
            .iter()
            .find(|p| p.id == project_id)
            .cloned())
    }

    fn list_content_blocks(&self, _project_id: RemoteId) -> Result<Vec<ContentBlock>> {
        self.call("list_content_blocks", "")?;
        Ok(self.state.borrow().content_blocks.clone())
    }

    fn get_content_block(&self, _project_id: RemoteId, block_id: RemoteId) -> Result<Option<ContentBlock>> {
        self.call("get_content_block", "")?;
        Ok(self
            .state
            .borrow()
            .content_blocks
            .iter()
            .find(|b| b.id == block_id)
            .cloned())
    }

    fn create_content_block(
        &self,
        _project_id: RemoteId,
        content: &str,
        block_group: &str,
    ) -> Result<ContentBlock> {
        self.call("create_content_block", content)?;
        let mut state = self.state.borrow_mut();
        let block = ContentBlock {
            id: state.next_id(),
            title: fields::title(content).unwrap_or_default(),
            block_group: Some(block_group.to_string()),
            content: content.to_string(),
        };
        state.content_blocks.push(block.clone());
        Ok(block)
    }

    fn update_content_block(
        &self,
        _project_id: RemoteId,
        block_id: RemoteId,
        content: &str,
    ) -> Result<ContentBlock> {
        self.call("update_content_block", content)?;
        let mut state = self.state.borrow_mut();
        let block = state
            .content_blocks
            .iter_mut()
            .find(|b| b.id == block_id)
            .ok_or_else(|| Error::Remote(format!("no content block {block_id}")))?;
        block.content = content.to_string();
        Ok(block.clone())
    }

    fn list_document_properties(&self, _project_id: RemoteId) -> Result<Vec<DocumentProperty>> {
        self.call("list_document_properties", "")?;
        Ok(self.state.borrow().properties.clone())
    }

    fn get_document_property(&self, _project_id: RemoteId, key: &str) -> Result<Option<DocumentProperty>> {
        self.call("get_document_property", key)?;
        Ok(self
            .state
            .borrow()
            .properties
            .iter()
            .find(|p| p.key == key)
            .cloned())
    }

    fn create_document_property(
        &self,
        _project_id: RemoteId,
        key: &str,
        value: &str,
    ) -> Result<DocumentProperty> {
        self.call("create_document_property", key)?;
        let property = DocumentProperty {
            key: key.to_string(),
            value: value.to_string(),
        };
        self.state.borrow_mut().properties.push(property.clone());
        Ok(property)
    }

    fn update_document_property(
        &self,
        _project_id: RemoteId,
        key: &str,
        value: &str,
    ) -> Result<DocumentProperty> {
        self.call("update_document_property", key)?;
        let mut state = self.state.borrow_mut();
        match state.properties.iter_mut().find(|p| p.key == key) {
            Some(property) => property.value = value.to_string(),
            None => state.properties.push(DocumentProperty {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
        Ok(DocumentProperty {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    fn list_issues(&self, _project_id: RemoteId) -> Result<Vec<Issue>> {
        self.call("list_issues", "")?;
        Ok(self.state.borrow().issues.clone())
    }

    fn get_issue(&self, _project_id: RemoteId, issue_id: RemoteId) -> Result<Option<Issue>> {
        self.call("get_issue", "")?;
        Ok(self
            .state
            .borrow()
            .issues
            .iter()
            .find(|i| i.id == issue_id)
            .cloned())
    }

    fn create_issue(&self, _project_id: RemoteId, text: &str) -> Result<Issue> {
        self.call("create_issue", text)?;
        let mut state = self.state.borrow_mut();
        let issue = Issue {
            id: state.next_id(),
            title: fields::title(text).unwrap_or_default(),
            text: text.to_string(),
        };
        state.issues.push(issue.clone());
        Ok(issue)
    }

    fn update_issue(&self, _project_id: RemoteId, issue_id: RemoteId, text: &str) -> Result<Issue> {
        self.call("update_issue", text)?;
        let mut state = self.state.borrow_mut();
        let issue = state
            .issues
            .iter_mut()
            .find(|i| i.id == issue_id)
            .ok_or_else(|| Error::Remote(format!("no issue {issue_id}")))?;
        issue.text = text.to_string();
        Ok(issue.clone())
    }

    fn list_nodes(&self, _project_id: RemoteId) -> Result<Vec<Node>> {
        self.call("list_nodes", "")?;
        Ok(self.state.borrow().nodes.clone())
    }

    fn get_node(&self, _project_id: RemoteId, node_id: RemoteId) -> Result<Option<Node>> {
        self.call("get_node", "")?;
        Ok(self
            .state
            .borrow()
            .nodes
            .iter()
            .find(|n| n.id == node_id)
            .cloned())
    }

    fn create_node(
        &self,
        _project_id: RemoteId,
        label: &str,
        type_id: u64,
        parent_id: Option<RemoteId>,
    ) -> Result<Node> {
        self.call("create_node", label)?;
        let mut state = self.state.borrow_mut();
        let node = Node {
            id: state.next_id(),
            label: label.to_string(),
            type_id: Some(type_id),
            parent_id,
            evidence: Vec::new(),
        };
        state.nodes.push(node.clone());
        Ok(node)
    }

    fn update_node(&self, _project_id: RemoteId, node_id: RemoteId, label: &str) -> Result<Node> {
        self.call("update_node", label)?;
        let mut state = self.state.borrow_mut();
        let node = state
            .nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .ok_or_else(|| Error::Remote(format!("no node {node_id}")))?;
        node.label = label.to_string();
        Ok(node.clone())
    }

    fn list_evidence(&self, _project_id: RemoteId, node_id: RemoteId) -> Result<Vec<Evidence>> {
        self.call("list_evidence", "")?;
        Ok(self
            .state
            .borrow()
            .nodes
            .iter()
            .find(|n| n.id == node_id)
            .map(|n| n.evidence.clone())
            .unwrap_or_default())
    }

    fn get_evidence(
        &self,
        _project_id: RemoteId,
        node_id: RemoteId,
        evidence_id: RemoteId,
    ) -> Result<Option<Evidence>> {
        self.call("get_evidence", "")?;
        Ok(self
            .state
            .borrow()
            .nodes
            .iter()
            .find(|n| n.id == node_id)
            .and_then(|n| n.evidence.iter().find(|e| e.id == evidence_id))
            .cloned())
    }

    fn create_evidence(
        &self,
        _project_id: RemoteId,
        node_id: RemoteId,
        issue_id: RemoteId,
        content: &str,
    ) -> Result<Evidence> {
        self.call("create_evidence", content)?;
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        let title = state
            .issues
            .iter()
            .find(|i| i.id == issue_id)
            .map(|i| i.title.clone())
            .unwrap_or_default();
        let node = state
            .nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .ok_or_else(|| Error::Remote(format!("no node {node_id}")))?;
        let evidence = Evidence {
            id,
            issue: IssueRef { id: issue_id, title },
            content: content.to_string(),
        };
        node.evidence.push(evidence.clone());
        Ok(evidence)
    }

    fn update_evidence(
        &self,
        _project_id: RemoteId,
        node_id: RemoteId,
        _issue_id: RemoteId,
        evidence_id: RemoteId,
        content: &str,
    ) -> Result<Evidence> {
        self.call("update_evidence", content)?;
        let mut state = self.state.borrow_mut();
        let evidence = state
            .nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .and_then(|n| n.evidence.iter_mut().find(|e| e.id == evidence_id))
            .ok_or_else(|| Error::Remote(format!("no evidence {evidence_id}")))?;
        evidence.content = content.to_string();
        Ok(evidence.clone())
    }

    fn list_attachments(&self, _project_id: RemoteId, node_id: RemoteId) -> Result<Vec<Attachment>> {
        self.call("list_attachments", "")?;
        Ok(self.attachments(node_id))
    }

    fn create_attachments(
        &self,
        _project_id: RemoteId,
        node_id: RemoteId,
        files: &[PathBuf],
    ) -> Result<Vec<Attachment>> {
        let names: Vec<String> = files
            .iter()
            .filter_map(|f| f.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .collect();
        self.call("create_attachments", &names.join(","))?;

        let created: Vec<Attachment> = names
            .into_iter()
            .map(|filename| Attachment { filename, link: None })
            .collect();
        self.state
            .borrow_mut()
            .attachments
            .entry(node_id)
            .or_default()
            .extend(created.iter().cloned());
        Ok(created)
    }

    fn list_standard_issues(&self) -> Result<Vec<StandardIssue>> {
        self.call("list_standard_issues", "")?;
        Ok(self.state.borrow().standard_issues.clone())
    }

    fn get_standard_issue(&self, entry_id: RemoteId) -> Result<Option<StandardIssue>> {
        self.call("get_standard_issue", "")?;
        Ok(self
            .state
            .borrow()
            .standard_issues
            .iter()
            .find(|s| s.id == entry_id)
            .cloned())
    }
}
