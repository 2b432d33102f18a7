//! File operations for sync.
//!
//! - Atomic writes: write to temp file, sync to disk, then rename
//! - Lossy text reads (invalid UTF-8 is replaced, never fatal)
//! - The `document_properties.ini` format
//! - Sorted directory listings so runs are deterministic

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::model::DocumentProperty;
use crate::sync::layout::PROPERTIES_SECTION;
use crate::sync::types::{SyncError, SyncResult};

/// Write content to a file atomically.
///
/// This function:
/// 1. Writes content to a temporary sibling file (`.<name>.tmp`)
/// 2. Calls `fsync` to ensure data is on disk
/// 3. Atomically renames the temp file to the target path
///
/// If any step fails, the original file (if any) remains untouched.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &str) -> SyncResult<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| SyncError::PathNotFound(path.to_path_buf()))?;
    let temp_path = path.with_file_name(format!(".{file_name}.tmp"));

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Read a text file, replacing invalid UTF-8.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_text(path: &Path) -> SyncResult<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Serialize properties as `document_properties.ini`.
#[must_use]
pub fn properties_content(properties: &[DocumentProperty]) -> String {
    let mut content = format!("[{PROPERTIES_SECTION}]\n");
    for property in properties {
        content.push_str(&property.key);
        content.push('=');
        content.push_str(&property.value);
        content.push('\n');
    }
    content
}

/// Parse a `document_properties.ini` file.
///
/// Accepts `key=value` and `key: value`, ignores blank lines and `#`/`;`
/// comments. Only keys inside the `[DOCUMENT_PROPERTIES]` section count.
///
/// # Errors
///
/// Returns an error if the file cannot be read, has no
/// `[DOCUMENT_PROPERTIES]` section, or contains a line that is not a pair.
pub fn read_properties(path: &Path) -> SyncResult<Vec<DocumentProperty>> {
    let content = read_text(path)?;
    let invalid = |message: String| SyncError::InvalidProperties {
        path: path.to_path_buf(),
        message,
    };

    let mut section: Option<&str> = None;
    let mut seen_section = false;
    let mut properties = Vec::new();

    for (line_num, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            section = Some(name.trim());
            seen_section |= name.trim() == PROPERTIES_SECTION;
            continue;
        }

        if section != Some(PROPERTIES_SECTION) {
            continue;
        }

        let split_at = line
            .find(['=', ':'])
            .ok_or_else(|| invalid(format!("line {}: expected key=value", line_num + 1)))?;
        let (key, value) = line.split_at(split_at);
        properties.push(DocumentProperty {
            key: key.trim().to_string(),
            value: value[1..].trim().to_string(),
        });
    }

    if !seen_section {
        return Err(invalid(format!("missing [{PROPERTIES_SECTION}] section")));
    }
    Ok(properties)
}

fn list_entries(dir: &Path, want_dirs: bool) -> SyncResult<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir() == want_dirs)
        .filter(|p| {
            !p.file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with('.'))
        })
        .collect();
    entries.sort();
    Ok(entries)
}

/// Regular files directly under `dir`, sorted, hidden files excluded.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn files_in(dir: &Path) -> SyncResult<Vec<PathBuf>> {
    list_entries(dir, false)
}

/// Sub-directories directly under `dir`, sorted, hidden ones excluded.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn dirs_in(dir: &Path) -> SyncResult<Vec<PathBuf>> {
    list_entries(dir, true)
}
