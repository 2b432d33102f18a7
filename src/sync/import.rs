//! Import: Dradis → local tree.
//!
//! Writes one file per remote entity under `<destination>/<project name>/`
//! following [`crate::sync::layout`]. Files are written as textile, then
//! converted in place when another format is requested. A file that fails to
//! convert stays in textile and the import goes on.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::convert::{DocumentConverter, MarkupFormat, convert_file};
use crate::model::{Node, RemoteId};
use crate::remote::RemoteClient;
use crate::sync::fields;
use crate::sync::file::{atomic_write, properties_content};
use crate::sync::layout::{CONTENT_BLOCKS_DIR, EVIDENCES_DIR, ISSUES_DIR, NODES_DIR, PROPERTIES_FILE};
use crate::sync::names::local_stem;
use crate::sync::types::{ImportReport, ImportStats, ItemFailure, SyncError, SyncResult};

/// Pulls a remote project into a local folder.
pub struct Importer<'a> {
    remote: &'a dyn RemoteClient,
    converter: &'a dyn DocumentConverter,
    format: MarkupFormat,
}

impl<'a> Importer<'a> {
    /// Create an importer writing files in `format`.
    #[must_use]
    pub fn new(
        remote: &'a dyn RemoteClient,
        converter: &'a dyn DocumentConverter,
        format: MarkupFormat,
    ) -> Self {
        Self {
            remote,
            converter,
            format,
        }
    }

    /// Import a whole project under `destination`.
    ///
    /// # Errors
    ///
    /// Returns an error if the project does not exist, `destination` is not
    /// a directory, or a remote list call fails.
    pub fn import_project(&self, project_id: RemoteId, destination: &Path) -> SyncResult<ImportReport> {
        let project = self
            .remote
            .get_project(project_id)?
            .ok_or(SyncError::ProjectNotFound(project_id))?;

        if !destination.is_dir() {
            return Err(SyncError::PathNotFound(destination.to_path_buf()));
        }

        let root = destination.join(project.folder_name());
        fs::create_dir_all(&root)?;
        info!(project = %project.name, format = %self.format, "Importing project from Dradis");

        let mut stats = ImportStats::default();
        self.import_content_blocks(project_id, &root, &mut stats)?;
        self.import_document_properties(project_id, &root, &mut stats)?;
        self.import_issues(project_id, &root, &mut stats)?;
        self.import_nodes(project_id, &root, &mut stats)?;

        Ok(ImportReport {
            root,
            project_name: project.name,
            stats,
        })
    }

    fn import_content_blocks(
        &self,
        project_id: RemoteId,
        root: &Path,
        stats: &mut ImportStats,
    ) -> SyncResult<()> {
        let dir = root.join(CONTENT_BLOCKS_DIR);
        fs::create_dir_all(&dir)?;

        for block in self.remote.list_content_blocks(project_id)? {
            let stem = local_stem(&block.title, block.id);
            let file = dir.join(format!("{stem}{}", MarkupFormat::NATIVE.extension()));
            debug!(title = %block.title, len = block.content.len(), "Writing content block");
            if self.write_entry(&file, &block.content, stats) {
                stats.content_blocks += 1;
                info!(title = %block.title, "Content block imported");
            }
        }
        Ok(())
    }

    fn import_document_properties(
        &self,
        project_id: RemoteId,
        root: &Path,
        stats: &mut ImportStats,
    ) -> SyncResult<()> {
        let properties = self.remote.list_document_properties(project_id)?;
        atomic_write(&root.join(PROPERTIES_FILE), &properties_content(&properties))?;
        stats.document_properties = properties.len();
        info!(count = properties.len(), "{PROPERTIES_FILE} written");
        Ok(())
    }

    fn import_issues(&self, project_id: RemoteId, root: &Path, stats: &mut ImportStats) -> SyncResult<()> {
        let dir = root.join(ISSUES_DIR);
        fs::create_dir_all(&dir)?;

        for issue in self.remote.list_issues(project_id)? {
            let stem = local_stem(&issue.title, issue.id);
            let file = dir.join(format!("{stem}{}", MarkupFormat::NATIVE.extension()));
            debug!(title = %issue.title, len = issue.text.len(), "Writing issue");
            if self.write_entry(&file, &issue.text, stats) {
                stats.issues += 1;
                info!(title = %issue.title, "Issue imported");
            }
        }
        Ok(())
    }

    fn import_nodes(&self, project_id: RemoteId, root: &Path, stats: &mut ImportStats) -> SyncResult<()> {
        for node in self.remote.list_nodes(project_id)? {
            let node_dir = root.join(NODES_DIR).join(local_stem(&node.label, node.id));
            fs::create_dir_all(&node_dir)?;
            stats.nodes += 1;
            self.import_evidence(&node, &node_dir, stats);
        }
        Ok(())
    }

    /// Evidence files are numbered across the whole node and carry their
    /// EvidenceID so a later export updates instead of duplicating.
    fn import_evidence(&self, node: &Node, node_dir: &Path, stats: &mut ImportStats) {
        for (index, evidence) in node.evidence.iter().enumerate() {
            let issue = local_stem(&evidence.issue.title, evidence.issue.id);
            let file = node_dir.join(EVIDENCES_DIR).join(&issue).join(format!(
                "Evidence-{}-{issue}{}",
                index + 1,
                MarkupFormat::NATIVE.extension()
            ));

            let id = evidence.id.to_string();
            let content = if fields::evidence_id(&evidence.content).as_deref() == Some(id.as_str()) {
                evidence.content.clone()
            } else {
                fields::replace_evidence_id(&evidence.content, &id)
            };

            debug!(node = %node.label, issue = %evidence.issue.title, "Writing evidence");
            if self.write_entry(&file, &content, stats) {
                stats.evidence += 1;
                info!(node = %node.label, evidence_id = evidence.id, "Evidence imported");
            }
        }
    }

    /// Write a textile file and convert it to the target format.
    ///
    /// Returns false if the file could not be written.
    fn write_entry(&self, file: &Path, content: &str, stats: &mut ImportStats) -> bool {
        if let Err(e) = atomic_write(file, content) {
            error!(file = %file.display(), error = %e, "Could not write file");
            stats.failures.push(ItemFailure {
                item: file.display().to_string(),
                message: e.to_string(),
            });
            return false;
        }

        if self.format != MarkupFormat::NATIVE {
            if let Err(e) = convert_file(self.converter, file, self.format, true) {
                warn!(file = %file.display(), error = %e, "Conversion failed, keeping textile");
                stats.conversion_failures += 1;
            }
        }
        true
    }
}

/// Files under `root`, directories first then by lower-cased name, hidden
/// entries skipped. Used to print the imported tree.
///
/// # Errors
///
/// Returns an error if a directory cannot be read.
pub fn tree_entries(root: &Path) -> SyncResult<Vec<(usize, PathBuf)>> {
    fn walk(dir: &Path, depth: usize, out: &mut Vec<(usize, PathBuf)>) -> SyncResult<()> {
        let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                !p.file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with('.'))
            })
            .collect();
        entries.sort_by_key(|p| {
            (
                p.is_file(),
                p.file_name()
                    .map(|n| n.to_string_lossy().to_lowercase())
                    .unwrap_or_default(),
            )
        });

        for path in entries {
            let is_dir = path.is_dir();
            out.push((depth, path.clone()));
            if is_dir {
                walk(&path, depth + 1, out)?;
            }
        }
        Ok(())
    }

    let mut out = Vec::new();
    walk(root, 0, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::tests::TaggingConverter;
    use crate::remote::fake::FakeRemote;
    use tempfile::TempDir;

    fn acme() -> FakeRemote {
        FakeRemote::new()
            .with_project(47, "ACME: Web/App")
            .with_content_block(3, "Executive Summary", "#[Title]#\nExecutive Summary\n")
            .with_property("dradis.client", "ACME")
            .with_issue(5, "Open SMB")
            .with_issue(6, "XSS <reflected>")
            .with_node(12, "10.0.0.1")
            .with_evidence(12, 90, 5, "#[Output]#\n445/tcp open\n")
            .with_evidence(12, 91, 6, "#[Output]#\nBROKEN\n")
    }

    #[test]
    fn test_import_textile_tree() {
        let dest = TempDir::new().unwrap();
        let fake = acme();

        let report = Importer::new(&fake, &TaggingConverter, MarkupFormat::Textile)
            .import_project(47, dest.path())
            .unwrap();

        let root = dest.path().join("ACME WebApp");
        assert_eq!(report.root, root);
        assert!(root.join("Content Blocks/Executive Summary.textile").is_file());
        assert!(root.join("Issues/XSS reflected.textile").is_file());
        assert_eq!(
            fs::read_to_string(root.join("document_properties.ini")).unwrap(),
            "[DOCUMENT_PROPERTIES]\ndradis.client=ACME\n"
        );

        let evidence = root.join("Nodes/10001/Evidences/Open SMB/Evidence-1-Open SMB.textile");
        let content = fs::read_to_string(evidence).unwrap();
        assert_eq!(fields::evidence_id(&content), Some("90".to_string()));
        assert!(root
            .join("Nodes/10001/Evidences/XSS reflected/Evidence-2-XSS reflected.textile")
            .is_file());

        assert_eq!(report.stats.issues, 2);
        assert_eq!(report.stats.evidence, 2);
        assert_eq!(report.stats.total(), 6);
    }

    #[test]
    fn test_import_converts_and_survives_failures() {
        let dest = TempDir::new().unwrap();
        let fake = acme();

        let report = Importer::new(&fake, &TaggingConverter, MarkupFormat::Markdown)
            .import_project(47, dest.path())
            .unwrap();

        let root = dest.path().join("ACME WebApp");
        assert!(root.join("Issues/Open SMB.md").is_file());
        assert!(!root.join("Issues/Open SMB.textile").exists());

        let evidence_dir = root.join("Nodes/10001/Evidences/XSS reflected");
        assert!(evidence_dir.join("Evidence-2-XSS reflected.textile").is_file());
        assert_eq!(report.stats.conversion_failures, 1);
        assert_eq!(report.stats.evidence, 2);
    }

    #[test]
    fn test_blank_titles_get_placeholder_names() {
        let dest = TempDir::new().unwrap();
        let fake = FakeRemote::new()
            .with_project(47, "ACME")
            .with_issue(7, "...")
            .with_node(12, "web01")
            .with_evidence(12, 93, 7, "#[Output]#\nx\n");

        Importer::new(&fake, &TaggingConverter, MarkupFormat::Textile)
            .import_project(47, dest.path())
            .unwrap();

        let root = dest.path().join("ACME");
        let issues = crate::sync::files_in(&root.join("Issues")).unwrap();
        assert_eq!(issues, vec![root.join("Issues/Untitled-7.textile")]);
        assert!(root
            .join("Nodes/web01/Evidences/Untitled-7/Evidence-1-Untitled-7.textile")
            .is_file());
    }

    #[test]
    fn test_import_unknown_project() {
        let dest = TempDir::new().unwrap();
        let fake = FakeRemote::new();

        let result = Importer::new(&fake, &TaggingConverter, MarkupFormat::Textile)
            .import_project(99, dest.path());

        assert!(matches!(result, Err(SyncError::ProjectNotFound(99))));
        assert!(fs::read_dir(dest.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_import_requires_existing_destination() {
        let dest = TempDir::new().unwrap();
        let fake = acme();

        let result = Importer::new(&fake, &TaggingConverter, MarkupFormat::Textile)
            .import_project(47, &dest.path().join("missing"));

        assert!(matches!(result, Err(SyncError::PathNotFound(_))));
    }

    #[test]
    fn test_tree_entries_order() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Issues")).unwrap();
        fs::write(dir.path().join("Issues/b.textile"), "").unwrap();
        fs::write(dir.path().join("a.ini"), "").unwrap();
        fs::write(dir.path().join(".hidden"), "").unwrap();

        let entries = tree_entries(dir.path()).unwrap();
        let names: Vec<(usize, String)> = entries
            .iter()
            .map(|(d, p)| (*d, p.file_name().unwrap().to_string_lossy().to_string()))
            .collect();

        assert_eq!(
            names,
            vec![
                (0, "Issues".to_string()),
                (1, "b.textile".to_string()),
                (0, "a.ini".to_string()),
            ]
        );
    }
}
