//! Export: local tree → Dradis.
//!
//! Walks the fixed project layout (see [`crate::sync::layout`]) and pushes
//! each file through [`crate::sync::reconcile`]. A single file is dispatched
//! by its position in the tree; a directory is exported category by
//! category: content blocks, document properties, issues, then nodes and
//! their evidence.
//!
//! # Partial Failures
//!
//! One file or folder failing (unreadable, conversion error, rejected remote
//! write) never stops the walk. The failure is logged, counted and listed in
//! [`ExportStats::failures`], and the next file is attempted.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::convert::{DocumentConverter, read_textile};
use crate::model::RemoteId;
use crate::remote::RemoteClient;
use crate::sync::file::{dirs_in, files_in};
use crate::sync::layout::{
    CONTENT_BLOCKS_DIR, EVIDENCES_DIR, EntryKind, ISSUES_DIR, NODES_DIR, PROPERTIES_FILE, classify,
};
use crate::sync::reconcile::{self, Reconciled};
use crate::sync::resolve::NodeResolver;
use crate::sync::session::SyncSession;
use crate::sync::types::{EntityStats, ExportReport, ExportStats, SyncError, SyncResult};

#[derive(Debug, Clone, Copy)]
enum Entity {
    ContentBlock,
    Issue,
    Evidence,
}

/// Pushes a local project tree (or one file of it) to a remote project.
pub struct Exporter<'a, 'r> {
    session: SyncSession<'r>,
    converter: &'a dyn DocumentConverter,
    resolver: &'a dyn NodeResolver,
    stats: ExportStats,
}

impl<'a, 'r> Exporter<'a, 'r> {
    #[must_use]
    pub fn new(
        remote: &'r dyn RemoteClient,
        project_id: RemoteId,
        converter: &'a dyn DocumentConverter,
        resolver: &'a dyn NodeResolver,
    ) -> Self {
        Self {
            session: SyncSession::new(remote, project_id),
            converter,
            resolver,
            stats: ExportStats::default(),
        }
    }

    /// Export a file or a whole project folder.
    ///
    /// # Errors
    ///
    /// Returns an error if the project does not exist or `path` does not
    /// exist. Per-file failures and unreadable folders are reported in the
    /// stats instead.
    pub fn export_path(mut self, path: &Path) -> SyncResult<ExportReport> {
        let project_id = self.session.project_id();
        let project = self
            .session
            .remote()
            .get_project(project_id)?
            .ok_or(SyncError::ProjectNotFound(project_id))?;

        if path.is_file() {
            info!(file = %path.display(), "Updating single file on Dradis");
            self.export_file(path);
        } else if path.is_dir() {
            info!(project = %project.name, "Updating project on Dradis");
            self.export_tree(path);
        } else {
            return Err(SyncError::PathNotFound(path.to_path_buf()));
        }

        Ok(ExportReport {
            project_name: project.name,
            stats: self.stats,
        })
    }

    fn export_file(&mut self, path: &Path) {
        match classify(path) {
            EntryKind::ContentBlock => self.export_content_block(path),
            EntryKind::Issue => self.export_issue(path),
            EntryKind::DocumentProperties => self.export_properties(path),
            EntryKind::Evidence { issue_title, .. } => {
                let resolved = self
                    .session
                    .nodes()
                    .and_then(|nodes| self.resolver.resolve_node_id(nodes, path));
                match resolved {
                    Ok(node_id) => self.export_evidence(node_id, &issue_title, path),
                    Err(e) => self.record_failure(Entity::Evidence, path, &e),
                }
            }
            EntryKind::Unknown => {
                warn!(file = %path.display(), "Not part of a project tree, skipping");
            }
        }
    }

    fn export_tree(&mut self, root: &Path) {
        let blocks_dir = root.join(CONTENT_BLOCKS_DIR);
        if blocks_dir.is_dir() {
            for file in self.list(&blocks_dir, files_in) {
                self.export_content_block(&file);
            }
        } else {
            warn!("No {CONTENT_BLOCKS_DIR} folder found");
        }

        let properties = root.join(PROPERTIES_FILE);
        if properties.is_file() {
            self.export_properties(&properties);
        } else {
            warn!("No {PROPERTIES_FILE} found");
        }

        let issues_dir = root.join(ISSUES_DIR);
        if issues_dir.is_dir() {
            for file in self.list(&issues_dir, files_in) {
                self.export_issue(&file);
            }
        } else {
            warn!("No {ISSUES_DIR} folder found");
        }

        let nodes_dir = root.join(NODES_DIR);
        if nodes_dir.is_dir() {
            for node_dir in self.list(&nodes_dir, dirs_in) {
                self.export_node(&node_dir);
            }
        } else {
            warn!("No {NODES_DIR} folder found");
        }
    }

    fn export_node(&mut self, node_dir: &Path) {
        let label = node_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let node_id = match reconcile::node(&mut self.session, &label) {
            Ok(outcome) => {
                self.stats.nodes.record(&outcome);
                outcome.id()
            }
            Err(e) => {
                error!(node = %label, error = %e, "Could not resolve node");
                self.stats.nodes.failed += 1;
                self.stats.fail(label.clone(), &e);
                None
            }
        };
        let Some(node_id) = node_id else {
            return;
        };

        let evidences_dir = node_dir.join(EVIDENCES_DIR);
        let issue_dirs = match dirs_in(&evidences_dir) {
            Ok(dirs) => dirs,
            Err(SyncError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                info!(node = %label, "No {EVIDENCES_DIR} folder in node");
                return;
            }
            Err(e) => {
                self.record_listing_failure(&evidences_dir, &e);
                return;
            }
        };

        for issue_dir in issue_dirs {
            let issue_title = issue_dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            for file in self.list(&issue_dir, files_in) {
                self.export_evidence(node_id, &issue_title, &file);
            }
        }
    }

    /// List `dir`, recording a failure and yielding nothing if it can't be read.
    fn list(
        &mut self,
        dir: &Path,
        lister: fn(&Path) -> SyncResult<Vec<PathBuf>>,
    ) -> Vec<PathBuf> {
        lister(dir).unwrap_or_else(|e| {
            self.record_listing_failure(dir, &e);
            Vec::new()
        })
    }

    fn record_listing_failure(&mut self, dir: &Path, err: &SyncError) {
        error!(dir = %dir.display(), error = %err, "Could not list folder");
        self.stats.fail(dir.display().to_string(), err);
    }

    fn export_content_block(&mut self, path: &Path) {
        let resolver = self.resolver;
        self.export_item(Entity::ContentBlock, path, |session, content| {
            reconcile::content_block(session, resolver, path, content)
        });
    }

    fn export_issue(&mut self, path: &Path) {
        self.export_item(Entity::Issue, path, |session, content| {
            reconcile::issue(session, path, content)
        });
    }

    fn export_evidence(&mut self, node_id: RemoteId, issue_title: &str, path: &Path) {
        self.export_item(Entity::Evidence, path, |session, content| {
            reconcile::evidence(session, node_id, issue_title, path, content)
        });
    }

    fn export_properties(&mut self, path: &Path) {
        match reconcile::document_properties(&mut self.session, path) {
            Ok((stats, failures)) => {
                self.stats.document_properties.merge(&stats);
                self.stats.failures.extend(failures);
            }
            Err(e) => {
                error!(file = %path.display(), error = %e, "Could not export document properties");
                self.stats.document_properties.failed += 1;
                self.stats.fail(path.display().to_string(), &e);
            }
        }
    }

    /// Read `path` as textile and hand it to `push`, recording the result.
    fn export_item<F>(&mut self, entity: Entity, path: &Path, push: F)
    where
        F: FnOnce(&mut SyncSession<'r>, &str) -> SyncResult<Reconciled>,
    {
        let content = match read_textile(self.converter, path) {
            Ok(Some(content)) => content,
            Ok(None) => {
                warn!(file = %path.display(), "Not a valid markup format, skipping");
                self.entity_stats(entity).skipped += 1;
                return;
            }
            Err(e) => {
                self.record_failure(entity, path, &SyncError::from(e));
                return;
            }
        };

        match push(&mut self.session, &content) {
            Ok(reconciled) => {
                self.stats.attachments_uploaded += reconciled.uploaded;
                self.entity_stats(entity).record(&reconciled.outcome);
            }
            Err(e) => self.record_failure(entity, path, &e),
        }
    }

    fn record_failure(&mut self, entity: Entity, path: &Path, err: &SyncError) {
        error!(file = %path.display(), error = %err, "Export failed");
        self.entity_stats(entity).failed += 1;
        self.stats.fail(path.display().to_string(), err);
    }

    fn entity_stats(&mut self, entity: Entity) -> &mut EntityStats {
        match entity {
            Entity::ContentBlock => &mut self.stats.content_blocks,
            Entity::Issue => &mut self.stats.issues,
            Entity::Evidence => &mut self.stats.evidence,
        }
    }
}
