//! Version command implementation.

use crate::convert::PandocConverter;
use crate::error::Result;
use serde::Serialize;

#[derive(Serialize)]
struct VersionOutput<'a> {
    version: &'a str,
    build: &'a str,
    pandoc: Option<String>,
}

/// Execute the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(json: bool) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    let build = if cfg!(debug_assertions) {
        "dev"
    } else {
        "release"
    };
    let pandoc = PandocConverter::new().version();

    if json {
        let output = VersionOutput {
            version,
            build,
            pandoc,
        };
        let payload = serde_json::to_string(&output)?;
        println!("{payload}");
        return Ok(());
    }

    println!("dradismd version {version} ({build})");
    match pandoc {
        Some(p) => println!("{p}"),
        None => println!("pandoc not found (conversion unavailable)"),
    }
    Ok(())
}
