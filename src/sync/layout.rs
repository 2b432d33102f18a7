//! Local project tree layout.
//!
//! ```text
//! <project>/
//!   Content Blocks/*.<ext>
//!   document_properties.ini
//!   Issues/*.<ext>
//!   Nodes/<node label>/Evidences/<issue title>/*.<ext>
//! ```
//!
//! The parent folder decides what kind of entity a file is. Identity comes
//! from the file content, not from here.

use std::path::Path;

pub const CONTENT_BLOCKS_DIR: &str = "Content Blocks";
pub const ISSUES_DIR: &str = "Issues";
pub const NODES_DIR: &str = "Nodes";
pub const EVIDENCES_DIR: &str = "Evidences";
pub const PROPERTIES_FILE: &str = "document_properties.ini";
pub const PROPERTIES_SECTION: &str = "DOCUMENT_PROPERTIES";

/// What a local file represents, by position in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    ContentBlock,
    Issue,
    Evidence {
        node_label: String,
        issue_title: String,
    },
    DocumentProperties,
    Unknown,
}

fn name_of(path: Option<&Path>) -> Option<String> {
    path?.file_name().map(|n| n.to_string_lossy().to_string())
}

/// Classify a file path against the layout.
#[must_use]
pub fn classify(path: &Path) -> EntryKind {
    if name_of(Some(path)).as_deref() == Some(PROPERTIES_FILE) {
        return EntryKind::DocumentProperties;
    }

    let parent = path.parent();
    match name_of(parent).as_deref() {
        Some(CONTENT_BLOCKS_DIR) => return EntryKind::ContentBlock,
        Some(ISSUES_DIR) => return EntryKind::Issue,
        _ => {}
    }

    let grandparent = parent.and_then(Path::parent);
    if name_of(grandparent).as_deref() == Some(EVIDENCES_DIR) {
        let node = grandparent.and_then(Path::parent);
        if let (Some(node_label), Some(issue_title)) = (name_of(node), name_of(parent)) {
            return EntryKind::Evidence {
                node_label,
                issue_title,
            };
        }
    }

    EntryKind::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let root = Path::new("/work/ACME");
        assert_eq!(
            classify(&root.join("Content Blocks/Summary.textile")),
            EntryKind::ContentBlock
        );
        assert_eq!(classify(&root.join("Issues/XSS.md")), EntryKind::Issue);
        assert_eq!(
            classify(&root.join("document_properties.ini")),
            EntryKind::DocumentProperties
        );
        assert_eq!(
            classify(&root.join("Nodes/10.0.0.1/Evidences/Open SMB/Evidence.textile")),
            EntryKind::Evidence {
                node_label: "10.0.0.1".to_string(),
                issue_title: "Open SMB".to_string(),
            }
        );
        assert_eq!(classify(&root.join("notes.txt")), EntryKind::Unknown);
        assert_eq!(classify(&root.join("Nodes/10.0.0.1/x.textile")), EntryKind::Unknown);
    }
}
