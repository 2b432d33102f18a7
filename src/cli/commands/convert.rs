//! `convert` command.

use std::path::Path;

use colored::Colorize;

use crate::convert::{MarkupFormat, PandocConverter, convert_path};
use crate::error::{Error, Result};

/// Execute the convert command.
///
/// # Errors
///
/// Returns an error for an unknown format, a missing path, or a failing
/// single-file conversion.
pub fn execute(path: &Path, format: &str, json: bool) -> Result<()> {
    let to = MarkupFormat::from_name(format).ok_or_else(|| Error::UnsupportedFormat {
        format: format.to_string(),
        supported: MarkupFormat::names(),
    })?;

    let report = convert_path(&PandocConverter::new(), path, to)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for file in &report.converted {
        println!("{} {}", "✔".green(), file.display());
    }
    for file in &report.failed {
        println!("{} {}", "✗".red(), file.display());
    }
    println!(
        "{} converted to {to}, {} failed",
        report.converted.len(),
        report.failed.len()
    );
    Ok(())
}
