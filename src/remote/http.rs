//! Dradis Pro REST client.
//!
//! Talks to `<instance>/pro/api`. Every call authenticates with
//! `Authorization: Token token="..."`; project-scoped calls add the
//! `Dradis-Project-Id` header. The client owns a private tokio runtime and
//! blocks on each request, so callers stay synchronous and requests never
//! overlap.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use super::RemoteClient;
use super::wire::{
    self, AttachmentWire, ContentBlockBody, ContentBlockRequest, ContentBlockWire,
    DocumentPropertyBody, DocumentPropertyRequest, DocumentPropertyWire, EvidenceBody,
    EvidenceRequest, EvidenceWire, IssueBody, IssueRequest, IssueWire, NodeBody, NodeRequest,
    NodeWire, ProjectWire, StandardIssueWire,
};
use crate::error::{Error, Result};
use crate::model::{
    Attachment, ContentBlock, DocumentProperty, Evidence, Issue, Node, Project, RemoteId,
    StandardIssue,
};

/// Header scoping a request to one project.
const PROJECT_HEADER: &str = "Dradis-Project-Id";

/// How the server certificate is checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System trust store.
    #[default]
    Default,
    /// Accept any certificate. Testing only.
    Disabled,
    /// Trust an additional PEM certificate.
    CustomCa(PathBuf),
}

/// A response body, or the platform's not-found sentinel.
enum Reply {
    Found(Value),
    NotFound,
}

impl Reply {
    fn required(self, what: &str) -> Result<Value> {
        match self {
            Self::Found(body) => Ok(body),
            Self::NotFound => Err(Error::Remote(format!("{what}: record not found"))),
        }
    }
}

/// HTTP implementation of [`RemoteClient`].
pub struct DradisClient {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    base_url: String,
    token: String,
}

impl DradisClient {
    /// Create a client for `base_url` (e.g. `https://dradis.example.com`).
    ///
    /// # Errors
    ///
    /// Returns an error if the CA certificate cannot be read, the HTTP client
    /// cannot be built, or the runtime cannot start.
    pub fn new(
        base_url: &str,
        token: &str,
        tls: &TlsVerification,
        timeout: Duration,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dradismd/", env!("CARGO_PKG_VERSION")));

        match tls {
            TlsVerification::Default => {}
            TlsVerification::Disabled => {
                builder = builder.danger_accept_invalid_certs(true);
            }
            TlsVerification::CustomCa(path) => {
                let pem = std::fs::read(path).map_err(|e| {
                    Error::Config(format!("Failed to read certificate {}: {e}", path.display()))
                })?;
                let cert = reqwest::Certificate::from_pem(&pem)
                    .map_err(|e| Error::Config(format!("Invalid certificate: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
        }

        let client = builder.build()?;
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| Error::Other(format!("Failed to create tokio runtime: {e}")))?;

        Ok(Self {
            client,
            runtime,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Base URL of the instance.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the instance answers at all (2xx or 3xx on its root URL).
    #[must_use]
    pub fn probe(&self) -> bool {
        let request = self.client.get(&self.base_url);
        self.block_on(async move {
            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!(%status, "Instance probe");
                    status.is_success() || status.is_redirection()
                }
                Err(e) => {
                    debug!(error = %e, "Instance probe failed");
                    false
                }
            }
        })
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    fn request(&self, method: Method, path: &str, project_id: Option<RemoteId>) -> RequestBuilder {
        let url = format!("{}/pro/api{path}", self.base_url);
        trace!(%method, %url, ?project_id, "Dradis request");

        let mut request = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, format!("Token token=\"{}\"", self.token));
        if let Some(id) = project_id {
            request = request.header(PROJECT_HEADER, id.to_string());
        }
        request
    }

    fn execute(&self, request: RequestBuilder) -> Result<Reply> {
        self.block_on(fetch(request))
    }

    fn get(&self, path: &str, project_id: Option<RemoteId>) -> Result<Reply> {
        self.execute(self.request(Method::GET, path, project_id))
    }

    fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        project_id: RemoteId,
        body: &B,
    ) -> Result<Value> {
        let what = format!("{method} {path}");
        self.execute(self.request(method, path, Some(project_id)).json(body))?
            .required(&what)
    }

    fn list<W, T>(&self, path: &str, project_id: Option<RemoteId>) -> Result<Vec<T>>
    where
        W: DeserializeOwned,
        T: From<W>,
    {
        let body = self.get(path, project_id)?.required(path)?;
        let items: Vec<W> = decode(body)?;
        Ok(items.into_iter().map(T::from).collect())
    }

    fn find<W, T>(&self, path: &str, project_id: Option<RemoteId>) -> Result<Option<T>>
    where
        W: DeserializeOwned,
        T: From<W>,
    {
        match self.get(path, project_id)? {
            Reply::Found(body) => Ok(Some(T::from(decode::<W>(body)?))),
            Reply::NotFound => Ok(None),
        }
    }
}

async fn fetch(request: RequestBuilder) -> Result<Reply> {
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    let body: Value = if text.trim().is_empty() {
        Value::Null
    } else {
        match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(Error::Remote(format!("{status}: {text}")));
            }
            Err(e) => return Err(Error::Json(e)),
        }
    };

    if wire::is_not_found(&body) {
        return Ok(Reply::NotFound);
    }
    if !status.is_success() {
        return Err(Error::Remote(format!("{status}: {text}")));
    }
    Ok(Reply::Found(body))
}

fn decode<T: DeserializeOwned>(body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(Error::Json)
}

fn file_part(path: &Path) -> Result<Part> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(Part::bytes(bytes).file_name(name))
}

impl RemoteClient for DradisClient {
    fn list_projects(&self) -> Result<Vec<Project>> {
        self.list::<ProjectWire, _>("/projects", None)
    }

    fn get_project(&self, project_id: RemoteId) -> Result<Option<Project>> {
        self.find::<ProjectWire, _>(&format!("/projects/{project_id}"), None)
    }

    fn list_content_blocks(&self, project_id: RemoteId) -> Result<Vec<ContentBlock>> {
        self.list::<ContentBlockWire, _>("/content_blocks", Some(project_id))
    }

    fn get_content_block(
        &self,
        project_id: RemoteId,
        block_id: RemoteId,
    ) -> Result<Option<ContentBlock>> {
        self.find::<ContentBlockWire, _>(&format!("/content_blocks/{block_id}"), Some(project_id))
    }

    fn create_content_block(
        &self,
        project_id: RemoteId,
        content: &str,
        block_group: &str,
    ) -> Result<ContentBlock> {
        let body = ContentBlockRequest {
            content_block: ContentBlockBody {
                content,
                block_group: Some(block_group),
            },
        };
        let reply = self.send(Method::POST, "/content_blocks", project_id, &body)?;
        Ok(decode::<ContentBlockWire>(reply)?.into())
    }

    fn update_content_block(
        &self,
        project_id: RemoteId,
        block_id: RemoteId,
        content: &str,
    ) -> Result<ContentBlock> {
        let body = ContentBlockRequest {
            content_block: ContentBlockBody {
                content,
                block_group: None,
            },
        };
        let path = format!("/content_blocks/{block_id}");
        let reply = self.send(Method::PUT, &path, project_id, &body)?;
        Ok(decode::<ContentBlockWire>(reply)?.into())
    }

    fn list_document_properties(&self, project_id: RemoteId) -> Result<Vec<DocumentProperty>> {
        let body = self
            .get("/document_properties", Some(project_id))?
            .required("/document_properties")?;
        let items: Vec<DocumentPropertyWire> = decode(body)?;
        Ok(items.into_iter().flat_map(wire::document_properties).collect())
    }

    fn get_document_property(
        &self,
        project_id: RemoteId,
        key: &str,
    ) -> Result<Option<DocumentProperty>> {
        match self.get(&format!("/document_properties/{key}"), Some(project_id))? {
            Reply::Found(body) => {
                let item: DocumentPropertyWire = decode(body)?;
                Ok(wire::document_properties(item).into_iter().next())
            }
            Reply::NotFound => Ok(None),
        }
    }

    fn create_document_property(
        &self,
        project_id: RemoteId,
        key: &str,
        value: &str,
    ) -> Result<DocumentProperty> {
        let body = DocumentPropertyRequest {
            document_property: DocumentPropertyBody {
                name: Some(key),
                value,
            },
        };
        self.send(Method::POST, "/document_properties", project_id, &body)?;
        Ok(DocumentProperty {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    fn update_document_property(
        &self,
        project_id: RemoteId,
        key: &str,
        value: &str,
    ) -> Result<DocumentProperty> {
        let body = DocumentPropertyRequest {
            document_property: DocumentPropertyBody { name: None, value },
        };
        let path = format!("/document_properties/{key}");
        self.send(Method::PUT, &path, project_id, &body)?;
        Ok(DocumentProperty {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    fn list_issues(&self, project_id: RemoteId) -> Result<Vec<Issue>> {
        self.list::<IssueWire, _>("/issues", Some(project_id))
    }

    fn get_issue(&self, project_id: RemoteId, issue_id: RemoteId) -> Result<Option<Issue>> {
        self.find::<IssueWire, _>(&format!("/issues/{issue_id}"), Some(project_id))
    }

    fn create_issue(&self, project_id: RemoteId, text: &str) -> Result<Issue> {
        let body = IssueRequest {
            issue: IssueBody { text },
        };
        let reply = self.send(Method::POST, "/issues", project_id, &body)?;
        Ok(decode::<IssueWire>(reply)?.into())
    }

    fn update_issue(&self, project_id: RemoteId, issue_id: RemoteId, text: &str) -> Result<Issue> {
        let body = IssueRequest {
            issue: IssueBody { text },
        };
        let path = format!("/issues/{issue_id}");
        let reply = self.send(Method::PUT, &path, project_id, &body)?;
        Ok(decode::<IssueWire>(reply)?.into())
    }

    fn list_nodes(&self, project_id: RemoteId) -> Result<Vec<Node>> {
        self.list::<NodeWire, _>("/nodes", Some(project_id))
    }

    fn get_node(&self, project_id: RemoteId, node_id: RemoteId) -> Result<Option<Node>> {
        self.find::<NodeWire, _>(&format!("/nodes/{node_id}"), Some(project_id))
    }

    fn create_node(
        &self,
        project_id: RemoteId,
        label: &str,
        type_id: u64,
        parent_id: Option<RemoteId>,
    ) -> Result<Node> {
        let body = NodeRequest {
            node: NodeBody {
                label,
                type_id: Some(type_id),
                parent_id,
            },
        };
        let reply = self.send(Method::POST, "/nodes", project_id, &body)?;
        Ok(decode::<NodeWire>(reply)?.into())
    }

    fn update_node(&self, project_id: RemoteId, node_id: RemoteId, label: &str) -> Result<Node> {
        let body = NodeRequest {
            node: NodeBody {
                label,
                type_id: None,
                parent_id: None,
            },
        };
        let path = format!("/nodes/{node_id}");
        let reply = self.send(Method::PUT, &path, project_id, &body)?;
        Ok(decode::<NodeWire>(reply)?.into())
    }

    fn list_evidence(&self, project_id: RemoteId, node_id: RemoteId) -> Result<Vec<Evidence>> {
        self.list::<EvidenceWire, _>(&format!("/nodes/{node_id}/evidence"), Some(project_id))
    }

    fn get_evidence(
        &self,
        project_id: RemoteId,
        node_id: RemoteId,
        evidence_id: RemoteId,
    ) -> Result<Option<Evidence>> {
        self.find::<EvidenceWire, _>(
            &format!("/nodes/{node_id}/evidence/{evidence_id}"),
            Some(project_id),
        )
    }

    fn create_evidence(
        &self,
        project_id: RemoteId,
        node_id: RemoteId,
        issue_id: RemoteId,
        content: &str,
    ) -> Result<Evidence> {
        let body = EvidenceRequest {
            evidence: EvidenceBody { content, issue_id },
        };
        let path = format!("/nodes/{node_id}/evidence");
        let reply = self.send(Method::POST, &path, project_id, &body)?;
        Ok(decode::<EvidenceWire>(reply)?.into())
    }

    fn update_evidence(
        &self,
        project_id: RemoteId,
        node_id: RemoteId,
        issue_id: RemoteId,
        evidence_id: RemoteId,
        content: &str,
    ) -> Result<Evidence> {
        let body = EvidenceRequest {
            evidence: EvidenceBody { content, issue_id },
        };
        let path = format!("/nodes/{node_id}/evidence/{evidence_id}");
        let reply = self.send(Method::PUT, &path, project_id, &body)?;
        Ok(decode::<EvidenceWire>(reply)?.into())
    }

    fn list_attachments(&self, project_id: RemoteId, node_id: RemoteId) -> Result<Vec<Attachment>> {
        self.list::<AttachmentWire, _>(&format!("/nodes/{node_id}/attachments"), Some(project_id))
    }

    fn create_attachments(
        &self,
        project_id: RemoteId,
        node_id: RemoteId,
        files: &[PathBuf],
    ) -> Result<Vec<Attachment>> {
        let mut form = Form::new();
        for file in files {
            form = form.part("files[]", file_part(file)?);
        }

        let path = format!("/nodes/{node_id}/attachments");
        let reply = self
            .execute(self.request(Method::POST, &path, Some(project_id)).multipart(form))?
            .required(&path)?;
        let items: Vec<AttachmentWire> = decode(reply)?;
        Ok(items.into_iter().map(Attachment::from).collect())
    }

    fn list_standard_issues(&self) -> Result<Vec<StandardIssue>> {
        self.list::<StandardIssueWire, _>("/addons/issuelib/entries", None)
    }

    fn get_standard_issue(&self, entry_id: RemoteId) -> Result<Option<StandardIssue>> {
        self.find::<StandardIssueWire, _>(&format!("/addons/issuelib/entries/{entry_id}"), None)
    }
}
