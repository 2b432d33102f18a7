//! `rename` command.

use std::path::Path;

use colored::Colorize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::rename::rename_attachments;

/// Execute the rename command.
///
/// # Errors
///
/// Returns an error if no `renaming_format` is configured, the file does not
/// exist, or the file cannot be rewritten.
pub fn execute(config: &Config, file: &Path, json: bool) -> Result<()> {
    let pattern = config
        .renaming_format
        .as_deref()
        .ok_or_else(|| Error::Config("renaming_format is not set".into()))?;

    let report = rename_attachments(file, pattern)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for (from, to) in &report.renamed {
        println!("{} → {}", from.display(), to.display().to_string().green());
    }
    for missing in &report.missing {
        println!("{} {missing} (not found)", "✗".yellow());
    }
    for taken in &report.conflicts {
        println!("{} {} (already exists)", "✗".yellow(), taken.display());
    }
    for (source, reason) in &report.failed {
        println!("{} {} ({reason})", "✗".red(), source.display());
    }
    Ok(())
}
