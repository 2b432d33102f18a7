//! Local issue and evidence scaffolding (`add-issue`).
//!
//! An issue starts either from a template with its `#[Title]#` filled in or
//! from an entry of the standard issue library. It is written under
//! `Issues/`, and optionally an empty evidence for a node is written next to
//! it under `Nodes/<node>/Evidences/<issue>/`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::convert::{DocumentConverter, MarkupFormat, convert_file};
use crate::error::{Error, Result};
use crate::model::RemoteId;
use crate::remote::RemoteClient;
use crate::sync::layout::{EVIDENCES_DIR, ISSUES_DIR, NODES_DIR};
use crate::sync::{atomic_write, next_available_name, read_text, sanitize};

/// Issue template used when none is configured.
pub const BUILTIN_ISSUE_TEMPLATE: &str = "\
#[Title]#

#[CVSSv3.1]#

#[Type]#
Internal|External

#[Description]#

#[Solution]#

#[References]#
";

/// Evidence template used when none is configured.
pub const BUILTIN_EVIDENCE_TEMPLATE: &str = "\
#[Location]#

#[Output]#
bc..
";

const TITLE_MARKER: &str = "#[Title]#";

/// Issue and evidence templates, in textile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    pub issue: String,
    pub evidence: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            issue: BUILTIN_ISSUE_TEMPLATE.to_string(),
            evidence: BUILTIN_EVIDENCE_TEMPLATE.to_string(),
        }
    }
}

impl Templates {
    /// Load configured templates, using the built-in ones where no path is
    /// given.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured template file does not exist or
    /// cannot be read.
    pub fn load(issue: Option<&Path>, evidence: Option<&Path>) -> Result<Self> {
        fn read(path: Option<&Path>, kind: &str, builtin: &str) -> Result<String> {
            let Some(path) = path else {
                return Ok(builtin.to_string());
            };
            if !path.is_file() {
                return Err(Error::Config(format!(
                    "{kind} template not found: {}",
                    path.display()
                )));
            }
            Ok(read_text(path)?)
        }

        Ok(Self {
            issue: read(issue, "Issue", BUILTIN_ISSUE_TEMPLATE)?,
            evidence: read(evidence, "Evidence", BUILTIN_EVIDENCE_TEMPLATE)?,
        })
    }
}

/// Textile content and title of an issue about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    pub title: String,
    pub content: String,
}

impl NewIssue {
    /// Issue from the template, with `title` placed under `#[Title]#`.
    #[must_use]
    pub fn from_template(title: &str, templates: &Templates) -> Self {
        let content = if templates.issue.contains(TITLE_MARKER) {
            templates
                .issue
                .replacen(TITLE_MARKER, &format!("{TITLE_MARKER}\n{title}"), 1)
        } else {
            format!("{TITLE_MARKER}\n{title}\n\n{}", templates.issue)
        };
        Self {
            title: title.to_string(),
            content,
        }
    }

    /// Issue copied from the standard library.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StandardIssueNotFound`] if the entry does not exist,
    /// or any remote error.
    pub fn from_library(remote: &dyn RemoteClient, entry_id: RemoteId) -> Result<Self> {
        let entry = remote
            .get_standard_issue(entry_id)?
            .ok_or(Error::StandardIssueNotFound { id: entry_id })?;
        debug!(id = entry_id, title = %entry.title, "Fetched library entry");
        Ok(Self {
            title: entry.title,
            content: entry.content,
        })
    }

    fn file_stem(&self) -> String {
        sanitize(&self.title)
    }
}

/// Files written by [`add_issue`].
#[derive(Debug, Clone, Serialize)]
pub struct Scaffolded {
    pub issue: PathBuf,
    /// False when the issue file already existed and was left untouched.
    pub issue_created: bool,
    pub evidence: Option<PathBuf>,
}

/// Write `issue` (and an evidence for `node`) into the project at
/// `project_dir`.
///
/// Files are written in `format`; binary formats fall back to textile. An
/// existing issue file is kept so evidence can be added for an issue already
/// in the tree.
///
/// # Errors
///
/// Returns an error if a directory or file cannot be written.
pub fn add_issue(
    project_dir: &Path,
    issue: &NewIssue,
    node: Option<&str>,
    templates: &Templates,
    format: MarkupFormat,
    converter: &dyn DocumentConverter,
) -> Result<Scaffolded> {
    let format = if format.is_binary() {
        warn!(format = %format, "Cannot scaffold a binary format, using textile");
        MarkupFormat::NATIVE
    } else {
        format
    };

    let stem = issue.file_stem();
    if stem.trim().is_empty() {
        return Err(Error::InvalidArgument(format!(
            "Issue title '{}' has no usable characters for a file name",
            issue.title
        )));
    }

    let issues_dir = project_dir.join(ISSUES_DIR);
    fs::create_dir_all(&issues_dir)?;

    let existing = MarkupFormat::INPUT_EXTENSIONS
        .iter()
        .map(|ext| issues_dir.join(format!("{stem}{ext}")))
        .find(|p| p.is_file());

    let (issue_path, issue_created) = match existing {
        Some(path) => {
            info!(file = %path.display(), "Issue already exists, keeping it");
            (path, false)
        }
        None => {
            let path = write_markup(&issues_dir.join(&stem), &issue.content, format, converter)?;
            info!(title = %issue.title, file = %path.display(), "Local issue created");
            (path, true)
        }
    };

    let evidence = match node {
        Some(node) => {
            let dir = project_dir
                .join(NODES_DIR)
                .join(sanitize(node))
                .join(EVIDENCES_DIR)
                .join(&stem);
            fs::create_dir_all(&dir)?;

            let target = next_available_name(&dir, "Evidence", format.extension())?;
            let base = target.with_extension("");
            let path = write_markup(&base, &templates.evidence, format, converter)?;
            info!(node, file = %path.display(), "Local evidence created");
            Some(path)
        }
        None => None,
    };

    Ok(Scaffolded {
        issue: issue_path,
        issue_created,
        evidence,
    })
}

/// Write textile `content` to `<base>.textile`, then convert to `format`.
///
/// A failed conversion keeps the textile file.
fn write_markup(
    base: &Path,
    content: &str,
    format: MarkupFormat,
    converter: &dyn DocumentConverter,
) -> Result<PathBuf> {
    let mut textile = base.as_os_str().to_owned();
    textile.push(MarkupFormat::NATIVE.extension());
    let textile = PathBuf::from(textile);

    atomic_write(&textile, content)?;
    if format == MarkupFormat::NATIVE {
        return Ok(textile);
    }

    match convert_file(converter, &textile, format, true) {
        Ok(path) => Ok(path),
        Err(e) => {
            warn!(file = %textile.display(), error = %e, "Conversion failed, keeping textile");
            Ok(textile)
        }
    }
}
