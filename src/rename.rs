//! Attachment renaming for markdown files (`rename`).
//!
//! Every `![caption](path)` image reference whose file exists is renamed
//! after a configurable pattern, and the reference is rewritten to the new
//! name. Tokens:
//!
//! | token | value |
//! |-------|-------|
//! | `[section_initials]` | upper-case initials of the `#[Title]#`, `ZZZ` without title |
//! | `[section_title]` | lower-cased title |
//! | `[foldername]` | lower-cased name of the folder above the image's folder |
//! | `[filename]` | original file stem |
//! | `[count]` | 1-based position of the reference, zero-padded to 3 |
//! | `[caption]` | caption with path-illegal characters removed |

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::sync::{atomic_write, fields, read_text, sanitize};

static IMAGE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[(?P<caption>.*?)\]\((?P<path>.*?)\)").expect("valid image reference regex")
});

/// Initials used when the file has no title.
pub const NO_TITLE_INITIALS: &str = "ZZZ";

/// What [`rename_attachments`] did.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RenameReport {
    /// `(old, new)` paths on disk.
    pub renamed: Vec<(PathBuf, PathBuf)>,
    /// References whose file was not found.
    pub missing: Vec<String>,
    /// References left alone because the new name was already taken.
    pub conflicts: Vec<PathBuf>,
    /// References left alone because the file could not be renamed.
    pub failed: Vec<(PathBuf, String)>,
}

/// Values substituted into the renaming pattern for one reference.
struct Tokens<'a> {
    initials: &'a str,
    title: &'a str,
    folder: String,
    stem: String,
    count: usize,
    caption: String,
}

impl Tokens<'_> {
    fn apply(&self, pattern: &str) -> String {
        pattern
            .replace("[section_initials]", self.initials)
            .replace("[section_title]", &sanitize(self.title).to_lowercase())
            .replace("[foldername]", &sanitize(&self.folder).to_lowercase())
            .replace("[filename]", &self.stem)
            .replace("[count]", &format!("{:03}", self.count))
            .replace("[caption]", &self.caption)
    }
}

fn initials(title: &str) -> String {
    if title.is_empty() {
        return NO_TITLE_INITIALS.to_string();
    }
    title
        .split_whitespace()
        .filter_map(|w| w.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Rename the images referenced by `file` and rewrite the references.
///
/// A reference whose file cannot be renamed is reported and left as is; the
/// others are still processed and the file is always rewritten.
///
/// # Errors
///
/// Returns an error if `pattern` is empty, `file` does not exist, or `file`
/// cannot be read or written.
pub fn rename_attachments(file: &Path, pattern: &str) -> Result<RenameReport> {
    if pattern.trim().is_empty() {
        return Err(Error::Config("renaming_format is not set".into()));
    }
    if !file.is_file() {
        return Err(Error::PathNotFound {
            path: file.to_path_buf(),
        });
    }

    info!(file = %file.display(), pattern, "Renaming attachments");
    let base = file.parent().unwrap_or(Path::new("."));
    let content = read_text(file)?;
    let title = fields::title(&content).unwrap_or_default();
    let initials = initials(&title);

    let mut report = RenameReport::default();
    let mut out = String::with_capacity(content.len());
    let mut last = 0;

    for (index, caps) in IMAGE_REF.captures_iter(&content).enumerate() {
        let (Some(whole), Some(caption), Some(link)) =
            (caps.get(0), caps.name("caption"), caps.name("path"))
        else {
            continue;
        };
        out.push_str(&content[last..whole.start()]);
        last = whole.end();

        let relative = PathBuf::from(link.as_str().replace("%20", " "));
        let source = base.join(&relative);
        if !source.is_file() {
            warn!(path = %source.display(), "Attachment not found");
            report.missing.push(link.as_str().to_string());
            out.push_str(whole.as_str());
            continue;
        }

        let folder = match fs::canonicalize(&source) {
            Ok(absolute) => absolute
                .parent()
                .and_then(Path::parent)
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            Err(e) => {
                warn!(path = %source.display(), error = %e, "Could not resolve attachment");
                report.failed.push((source, e.to_string()));
                out.push_str(whole.as_str());
                continue;
            }
        };
        let tokens = Tokens {
            initials: &initials,
            title: &title,
            folder,
            stem: relative
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
            count: index + 1,
            caption: sanitize(caption.as_str()),
        };

        let new_name = tokens.apply(pattern);
        let suffix = relative
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let target = source.with_file_name(format!("{new_name}{suffix}"));

        if target != source && target.exists() {
            warn!(path = %target.display(), "Target name already taken, skipping");
            report.conflicts.push(target);
            out.push_str(whole.as_str());
            continue;
        }

        if let Err(e) = fs::rename(&source, &target) {
            warn!(
                from = %source.display(),
                to = %target.display(),
                error = %e,
                "Could not rename attachment"
            );
            report.failed.push((source, e.to_string()));
            out.push_str(whole.as_str());
            continue;
        }
        debug!(from = %source.display(), to = %target.display(), "Attachment renamed");

        let link_name = format!("{}{suffix}", new_name.replace(' ', "%20"));
        let link_path = match relative.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => format!("{}/{link_name}", parent.to_string_lossy().replace('\\', "/")),
            None => link_name,
        };
        out.push_str(&format!("![{}]({link_path})", caption.as_str()));
        report.renamed.push((source, target));
    }
    out.push_str(&content[last..]);

    atomic_write(file, &out)?;
    info!(
        renamed = report.renamed.len(),
        missing = report.missing.len(),
        failed = report.failed.len(),
        "Attachments renamed"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("xss").join("img");
        fs::create_dir_all(&images).unwrap();
        fs::write(images.join("202205101428.png"), "png").unwrap();
        fs::write(images.join("shot 2.jpg"), "jpg").unwrap();

        let file = dir.path().join("xss").join("Attack Narrative.md");
        fs::write(
            &file,
            "#[Title]#\nAttack narrative\n\n![Reflected: XSS](img/202205101428.png)\n\
             ![](img/gone.png)\n![Second shot](img/shot%202.jpg)\n",
        )
        .unwrap();
        (dir, file)
    }

    #[test]
    fn test_rename_with_all_tokens() {
        let (dir, file) = project();

        let report = rename_attachments(
            &file,
            "[section_initials]_[count]_[foldername]_[section_title]_[caption]_[filename]",
        )
        .unwrap();

        assert_eq!(report.renamed.len(), 2);
        assert_eq!(report.missing, vec!["img/gone.png".to_string()]);

        let first = "AN_001_xss_attack narrative_Reflected XSS_202205101428.png";
        assert!(dir.path().join("xss/img").join(first).is_file());
        assert!(!dir.path().join("xss/img/202205101428.png").exists());

        let content = fs::read_to_string(&file).unwrap();
        assert!(content.contains(
            "![Reflected: XSS](img/AN_001_xss_attack%20narrative_Reflected%20XSS_202205101428.png)"
        ));
        assert!(content.contains("![](img/gone.png)"));
        assert!(content.contains("(img/AN_003_xss_attack%20narrative_Second%20shot_shot%202.jpg)"));
    }

    #[test]
    fn test_untitled_file_uses_placeholder_initials() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.png"), "png").unwrap();
        let file = dir.path().join("notes.md");
        fs::write(&file, "![cap](a.png)").unwrap();

        rename_attachments(&file, "[section_initials]-[count]").unwrap();

        assert_eq!(fs::read_to_string(&file).unwrap(), "![cap](ZZZ-001.png)");
        assert!(dir.path().join("ZZZ-001.png").is_file());
    }

    #[test]
    fn test_taken_name_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.png"), "a").unwrap();
        fs::write(dir.path().join("fixed.png"), "b").unwrap();
        let file = dir.path().join("notes.md");
        fs::write(&file, "![x](a.png)").unwrap();

        let report = rename_attachments(&file, "fixed").unwrap();

        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(fs::read_to_string(dir.path().join("fixed.png")).unwrap(), "b");
        assert_eq!(fs::read_to_string(&file).unwrap(), "![x](a.png)");
    }

    #[test]
    fn test_requires_pattern_and_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.md");
        assert!(matches!(rename_attachments(&file, "  "), Err(Error::Config(_))));
        assert!(matches!(
            rename_attachments(&file, "[count]"),
            Err(Error::PathNotFound { .. })
        ));
    }

    #[test]
    fn test_title_and_folder_are_sanitized() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("x.png"), "png").unwrap();
        let file = dir.path().join("doc.md");
        fs::write(&file, "#[Title]#\nA/B\n\n![one](x.png)\n").unwrap();

        let report = rename_attachments(&file, "[section_title]_[count]").unwrap();

        assert_eq!(report.renamed.len(), 1);
        assert!(dir.path().join("ab_001.png").is_file());
        assert!(fs::read_to_string(&file).unwrap().contains("![one](ab_001.png)"));
    }

    #[test]
    fn test_failed_rename_keeps_reference_and_continues() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("a.png"), "a").unwrap();
        fs::write(dir.path().join("b.png"), "b").unwrap();
        let file = dir.path().join("doc.md");
        fs::write(&file, "![one](a.png)\n![two](b.png)\n![three](a.png)\n").unwrap();

        // only the folder for the first target exists
        let report = rename_attachments(&file, "[filename]/[count]").unwrap();

        assert_eq!(report.renamed.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, dir.path().join("b.png"));
        assert!(dir.path().join("a/001.png").is_file());
        assert!(dir.path().join("b.png").is_file());

        let content = fs::read_to_string(&file).unwrap();
        assert!(content.contains("![one](a/001.png)"));
        assert!(content.contains("![two](b.png)"));
        assert_eq!(report.missing, vec!["a.png".to_string()]);
    }
}
