//! Sync types for import/export.
//!
//! Statistics, per-item failure records and the sync error type.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::model::RemoteId;

/// Result of reconciling one local item against the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A new remote record was created.
    Created(RemoteId),
    /// An existing remote record was updated.
    Updated(RemoteId),
    /// An existing remote record was reused as is.
    Unchanged(RemoteId),
    /// The item was not eligible for export.
    Skipped(String),
}

impl Outcome {
    /// Remote id the item ended up with, if any.
    #[must_use]
    pub fn id(&self) -> Option<RemoteId> {
        match self {
            Self::Created(id) | Self::Updated(id) | Self::Unchanged(id) => Some(*id),
            Self::Skipped(_) => None,
        }
    }
}

/// Per-entity counters.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct EntityStats {
    /// Number of remote records created.
    pub created: usize,
    /// Number of remote records updated.
    pub updated: usize,
    /// Number of remote records reused without a write.
    pub unchanged: usize,
    /// Number of local items skipped (invalid or not applicable).
    pub skipped: usize,
    /// Number of items whose remote call failed.
    pub failed: usize,
}

impl EntityStats {
    /// Total items processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.created + self.updated + self.unchanged + self.skipped + self.failed
    }

    /// Count an outcome.
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Created(_) => self.created += 1,
            Outcome::Updated(_) => self.updated += 1,
            Outcome::Unchanged(_) => self.unchanged += 1,
            Outcome::Skipped(_) => self.skipped += 1,
        }
    }

    /// Add another set of counters to this one.
    pub fn merge(&mut self, other: &Self) {
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// A local item that could not be exported or imported.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    /// File (or entity label) the failure belongs to.
    pub item: String,
    /// Error message.
    pub message: String,
}

/// Statistics for an export (local → remote) run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ExportStats {
    pub content_blocks: EntityStats,
    pub document_properties: EntityStats,
    pub issues: EntityStats,
    pub nodes: EntityStats,
    pub evidence: EntityStats,
    /// Attachments uploaded across all items.
    pub attachments_uploaded: usize,
    /// Every per-item failure, in processing order.
    pub failures: Vec<ItemFailure>,
}

impl ExportStats {
    /// Total items processed across every entity type.
    #[must_use]
    pub fn total(&self) -> usize {
        self.content_blocks.total()
            + self.document_properties.total()
            + self.issues.total()
            + self.nodes.total()
            + self.evidence.total()
    }

    /// Returns true if nothing was processed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Record a failed item.
    pub fn fail(&mut self, item: impl Into<String>, error: &SyncError) {
        self.failures.push(ItemFailure {
            item: item.into(),
            message: error.to_string(),
        });
    }
}

/// Outcome of an export run.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    /// Name of the remote project.
    pub project_name: String,
    pub stats: ExportStats,
}

/// Statistics for an import (remote → local) run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ImportStats {
    pub content_blocks: usize,
    pub document_properties: usize,
    pub issues: usize,
    pub nodes: usize,
    pub evidence: usize,
    /// Files left in textile because conversion failed.
    pub conversion_failures: usize,
    /// Every per-item failure, in processing order.
    pub failures: Vec<ItemFailure>,
}

impl ImportStats {
    /// Total files written.
    #[must_use]
    pub fn total(&self) -> usize {
        self.content_blocks + self.document_properties + self.issues + self.evidence
    }
}

/// Outcome of a full project import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    /// Local project folder.
    pub root: PathBuf,
    /// Name of the remote project.
    pub project_name: String,
    pub stats: ImportStats,
}

/// Sync-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A remote call failed.
    #[error("Remote error: {0}")]
    Remote(String),

    /// The remote project does not exist or is not accessible.
    #[error("Project {0} doesn't exist or you don't have access")]
    ProjectNotFound(RemoteId),

    /// No remote node corresponds to a local file.
    #[error("Could not find node id for {}: {reason}", path.display())]
    NodeNotResolvable { path: PathBuf, reason: String },

    /// A local path that should exist does not.
    #[error("{} does not exist", .0.display())]
    PathNotFound(PathBuf),

    /// A markup file could not be converted.
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// The properties file is malformed.
    #[error("Invalid properties file {}: {message}", path.display())]
    InvalidProperties { path: PathBuf, message: String },

    /// Every candidate name for a new file is taken.
    #[error("No free file name for {stem} in {}", dir.display())]
    NoAvailableName { dir: PathBuf, stem: String },
}

impl SyncError {
    /// Build a [`SyncError::NodeNotResolvable`] for `path`.
    pub fn node_not_resolvable(path: &Path, reason: impl Into<String>) -> Self {
        Self::NodeNotResolvable {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

impl From<crate::error::Error> for SyncError {
    fn from(err: crate::error::Error) -> Self {
        Self::Remote(err.to_string())
    }
}

impl From<crate::convert::ConvertError> for SyncError {
    fn from(err: crate::convert::ConvertError) -> Self {
        Self::Conversion(err.to_string())
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;
