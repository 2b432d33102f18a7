//! Filesystem-safe naming.
//!
//! Remote titles may contain characters that cannot appear in a path
//! component. Local files are named after the sanitized title, so matching a
//! local name back to a remote record always compares sanitized forms.

use std::path::{Path, PathBuf};

use crate::model::RemoteId;
use crate::sync::types::{SyncError, SyncResult};

/// Characters stripped from names before they are used as path components.
pub const ILLEGAL_CHARS: &[char] = &['<', '>', ':', ']', '"', '/', '\\', '|', '?', '*', '.'];

/// Upper bound on candidates probed by [`next_available_name`].
pub const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Strip characters that are illegal in (Windows) file paths.
///
/// Idempotent: `sanitize(&sanitize(x)) == sanitize(x)`.
#[must_use]
pub fn sanitize(name: &str) -> String {
    name.chars().filter(|c| !ILLEGAL_CHARS.contains(c)).collect()
}

/// Local file or folder stem for a remote record.
///
/// The sanitized title, or `Untitled-{id}` when nothing is left of it, so
/// the entry never becomes a hidden or nameless path.
#[must_use]
pub fn local_stem(title: &str, id: RemoteId) -> String {
    let stem = sanitize(title);
    if stem.trim().is_empty() {
        format!("Untitled-{id}")
    } else {
        stem
    }
}

/// Whether a local name and a remote title refer to the same entity.
///
/// Case-insensitive equality of the sanitized forms; never raw equality.
#[must_use]
pub fn names_match(a: &str, b: &str) -> bool {
    sanitize(a).to_lowercase() == sanitize(b).to_lowercase()
}

/// Find the first item whose key matches `name` under [`names_match`].
pub fn find_by_name<'a, T, F>(items: &'a [T], name: &str, key: F) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    items.iter().find(|item| names_match(key(item), name))
}

/// Pick a file name under `dir` that does not exist yet.
///
/// Probes `{stem}{ext}`, then `{stem}2{ext}`, `{stem}3{ext}`, ... and gives up
/// after [`MAX_NAME_ATTEMPTS`] candidates.
///
/// # Errors
///
/// Returns [`SyncError::NoAvailableName`] when every candidate is taken.
pub fn next_available_name(dir: &Path, stem: &str, ext: &str) -> SyncResult<PathBuf> {
    probe_names(dir, stem, ext, MAX_NAME_ATTEMPTS)
}

fn probe_names(dir: &Path, stem: &str, ext: &str, limit: u32) -> SyncResult<PathBuf> {
    let first = dir.join(format!("{stem}{ext}"));
    if !first.exists() {
        return Ok(first);
    }

    for n in 2..=limit {
        let candidate = dir.join(format!("{stem}{n}{ext}"));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(SyncError::NoAvailableName {
        dir: dir.to_path_buf(),
        stem: stem.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_strips_illegal_chars() {
        assert_eq!(sanitize("SQL Injection: login.php"), "SQL Injection loginphp");
        assert_eq!(sanitize(r#"a<b>c"d/e\f|g?h*i]j"#), "abcdefghij");
        assert_eq!(sanitize("Executive Summary"), "Executive Summary");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for s in ["", "plain", "a.b.c", "<<>>", "Cross-Site Scripting (XSS) [reflected]"] {
            let once = sanitize(s);
            assert_eq!(sanitize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_local_stem_falls_back_for_blank_titles() {
        assert_eq!(local_stem("Open SMB", 4), "Open SMB");
        assert_eq!(local_stem("...", 4), "Untitled-4");
        assert_eq!(local_stem("  ", 9), "Untitled-9");
    }

    #[test]
    fn test_names_match_ignores_case_and_illegal_chars() {
        assert!(names_match("Outdated TLS", "OUTDATED TLS"));
        assert!(names_match("host.example.com", "hostexamplecom"));
        assert!(names_match("Weak Passwords?", "weak passwords"));
        assert!(!names_match("Weak Passwords", "Weak Password"));
    }

    #[test]
    fn test_upper_case_matches_sanitized() {
        let s = "Missing HttpOnly flag";
        assert!(names_match(&sanitize(s), &sanitize(&s.to_uppercase())));
    }

    #[test]
    fn test_find_by_name() {
        let labels = vec!["10.0.0.1".to_string(), "Uploaded files".to_string()];
        let found = find_by_name(&labels, "uploaded FILES", String::as_str);
        assert_eq!(found.map(String::as_str), Some("Uploaded files"));
        assert!(find_by_name(&labels, "10.0.0.2", String::as_str).is_none());
    }

    #[test]
    fn test_next_available_name_increments() {
        let dir = TempDir::new().unwrap();

        let first = next_available_name(dir.path(), "Evidence", ".md").unwrap();
        assert_eq!(first, dir.path().join("Evidence.md"));
        fs::write(&first, "").unwrap();

        let second = next_available_name(dir.path(), "Evidence", ".md").unwrap();
        assert_eq!(second, dir.path().join("Evidence2.md"));
        fs::write(&second, "").unwrap();

        let third = next_available_name(dir.path(), "Evidence", ".md").unwrap();
        assert_eq!(third, dir.path().join("Evidence3.md"));
    }

    #[test]
    fn test_gives_up_when_every_candidate_is_taken() {
        let dir = TempDir::new().unwrap();
        for name in ["Evidence.md", "Evidence2.md", "Evidence3.md"] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        let err = probe_names(dir.path(), "Evidence", ".md", 3).unwrap_err();
        assert!(matches!(err, SyncError::NoAvailableName { ref stem, .. } if stem == "Evidence"));
        assert_eq!(
            probe_names(dir.path(), "Evidence", ".md", 4).unwrap(),
            dir.path().join("Evidence4.md")
        );
    }
}
