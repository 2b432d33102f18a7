//! Project model.
//!
//! A project is the top-level remote container for one engagement. It is
//! read-only for dradismd: listed, looked up, and used to name the local
//! project folder on import.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RemoteId;
use crate::sync::local_stem;

/// A Dradis project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Remote identifier
    pub id: RemoteId,

    /// Project name
    pub name: String,

    /// Client name, if the project is attached to one
    pub client: Option<String>,

    /// Last update on the remote side
    pub updated_at: Option<DateTime<Utc>>,

    /// Custom project fields (name/value)
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

/// A custom field attached to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub name: String,
    pub value: Option<String>,
}

impl Project {
    /// Value of a custom field by exact name.
    #[must_use]
    pub fn custom_field(&self, name: &str) -> Option<&str> {
        self.custom_fields
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.value.as_deref())
    }

    /// Name of the local folder this project is imported into.
    #[must_use]
    pub fn folder_name(&self) -> String {
        local_stem(&self.name, self.id)
    }
}

/// Sort projects by last update, most recent first, keeping only `head`
/// entries when `head` is non-zero and smaller than the list.
#[must_use]
pub fn most_recent(mut projects: Vec<Project>, head: usize) -> Vec<Project> {
    projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    if head > 0 && head < projects.len() {
        projects.truncate(head);
    }
    projects
}
