//! Dradis Pro API payloads.
//!
//! JSON shapes exactly as the API sends and expects them, converted into
//! [`crate::model`] records before leaving the `remote` module.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{
    Attachment, ContentBlock, CustomField, DocumentProperty, Evidence, Issue, IssueRef, Node,
    Project, RemoteId, StandardIssue,
};
use crate::sync::fields;

/// Body Dradis returns for an unknown id.
pub const NOT_FOUND_SENTINEL: &str = "ActiveRecord::RecordNotFound";

/// Whether a response body is the not-found sentinel.
#[must_use]
pub fn is_not_found(body: &Value) -> bool {
    body.get("message").and_then(Value::as_str) == Some(NOT_FOUND_SENTINEL)
}

fn field_string(fields: &HashMap<String, Value>, name: &str) -> Option<String> {
    match fields.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

// ── Projects ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProjectWire {
    pub id: RemoteId,
    pub name: String,
    pub client: Option<ClientWire>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldWire>,
}

#[derive(Debug, Deserialize)]
pub struct ClientWire {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CustomFieldWire {
    pub name: String,
    pub value: Option<Value>,
}

impl From<ProjectWire> for Project {
    fn from(w: ProjectWire) -> Self {
        Self {
            id: w.id,
            name: w.name,
            client: w.client.map(|c| c.name),
            updated_at: w.updated_at,
            custom_fields: w
                .custom_fields
                .into_iter()
                .map(|f| CustomField {
                    name: f.name,
                    value: f.value.and_then(|v| match v {
                        Value::String(s) => Some(s),
                        Value::Null => None,
                        other => Some(other.to_string()),
                    }),
                })
                .collect(),
        }
    }
}

// ── Content blocks ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ContentBlockWire {
    pub id: RemoteId,
    pub block_group: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
    #[serde(default)]
    pub content: String,
}

impl From<ContentBlockWire> for ContentBlock {
    fn from(w: ContentBlockWire) -> Self {
        let title = field_string(&w.fields, fields::TITLE_FIELD)
            .or(w.title)
            .or_else(|| fields::title(&w.content))
            .unwrap_or_default();
        Self {
            id: w.id,
            title,
            block_group: w.block_group,
            content: w.content,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContentBlockRequest<'a> {
    pub content_block: ContentBlockBody<'a>,
}

#[derive(Debug, Serialize)]
pub struct ContentBlockBody<'a> {
    pub content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_group: Option<&'a str>,
}

// ── Issues ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct IssueWire {
    pub id: RemoteId,
    pub title: Option<String>,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
    #[serde(default)]
    pub text: String,
}

impl From<IssueWire> for Issue {
    fn from(w: IssueWire) -> Self {
        let title = w
            .title
            .or_else(|| field_string(&w.fields, fields::TITLE_FIELD))
            .or_else(|| fields::title(&w.text))
            .unwrap_or_default();
        Self {
            id: w.id,
            title,
            text: w.text,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IssueRequest<'a> {
    pub issue: IssueBody<'a>,
}

#[derive(Debug, Serialize)]
pub struct IssueBody<'a> {
    pub text: &'a str,
}

// ── Nodes & evidence ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NodeWire {
    pub id: RemoteId,
    pub label: String,
    pub type_id: Option<u64>,
    pub parent_id: Option<RemoteId>,
    #[serde(default)]
    pub evidence: Vec<EvidenceWire>,
}

impl From<NodeWire> for Node {
    fn from(w: NodeWire) -> Self {
        Self {
            id: w.id,
            label: w.label,
            type_id: w.type_id,
            parent_id: w.parent_id,
            evidence: w.evidence.into_iter().map(Evidence::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NodeRequest<'a> {
    pub node: NodeBody<'a>,
}

#[derive(Debug, Serialize)]
pub struct NodeBody<'a> {
    pub label: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<RemoteId>,
}

#[derive(Debug, Deserialize)]
pub struct EvidenceWire {
    pub id: RemoteId,
    #[serde(default)]
    pub content: String,
    pub issue: IssueRefWire,
}

#[derive(Debug, Deserialize)]
pub struct IssueRefWire {
    pub id: RemoteId,
    #[serde(default)]
    pub title: String,
}

impl From<EvidenceWire> for Evidence {
    fn from(w: EvidenceWire) -> Self {
        Self {
            id: w.id,
            issue: IssueRef {
                id: w.issue.id,
                title: w.issue.title,
            },
            content: w.content,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EvidenceRequest<'a> {
    pub evidence: EvidenceBody<'a>,
}

#[derive(Debug, Serialize)]
pub struct EvidenceBody<'a> {
    pub content: &'a str,
    pub issue_id: RemoteId,
}

// ── Document properties ───────────────────────────────────────

/// Each property is a single-entry object: `{"dradis.client": "ACME"}`.
pub type DocumentPropertyWire = BTreeMap<String, Value>;

/// Flatten one wire object into properties.
pub fn document_properties(w: DocumentPropertyWire) -> Vec<DocumentProperty> {
    w.into_iter()
        .map(|(key, value)| DocumentProperty {
            key,
            value: match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            },
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct DocumentPropertyRequest<'a> {
    pub document_property: DocumentPropertyBody<'a>,
}

#[derive(Debug, Serialize)]
pub struct DocumentPropertyBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    pub value: &'a str,
}

// ── Attachments & library ─────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AttachmentWire {
    pub filename: String,
    pub link: Option<String>,
}

impl From<AttachmentWire> for Attachment {
    fn from(w: AttachmentWire) -> Self {
        Self {
            filename: w.filename,
            link: w.link,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StandardIssueWire {
    pub id: RemoteId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl From<StandardIssueWire> for StandardIssue {
    fn from(w: StandardIssueWire) -> Self {
        Self {
            id: w.id,
            title: w.title,
            content: w.content,
        }
    }
}
