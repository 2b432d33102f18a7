//! `get` command: import a project into a local folder.

use std::path::Path;

use colored::Colorize;

use crate::cli::GetArgs;
use crate::cli::commands::{format_size, resolve_format};
use crate::config::Config;
use crate::convert::{MarkupFormat, PandocConverter};
use crate::error::Result;
use crate::remote::RemoteClient;
use crate::sync::{ImportReport, Importer, tree_entries};

/// Execute the get command.
///
/// # Errors
///
/// Returns an error if the format is unknown, the project does not exist,
/// the destination is missing, or a remote list call fails.
pub fn execute(remote: &dyn RemoteClient, config: &Config, args: &GetArgs, json: bool) -> Result<()> {
    let format = resolve_format(args.format.as_deref(), config)?;
    let converter = PandocConverter::new();

    let report = Importer::new(remote, &converter, format).import_project(args.project_id, &args.destination)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_tree(&report.root)?;
    print_summary(args.project_id, &report);
    Ok(())
}

fn print_tree(root: &Path) -> Result<()> {
    println!("{}", root.display().to_string().blue().bold());
    for (depth, path) in tree_entries(root)? {
        let indent = "    ".repeat(depth);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if path.is_dir() {
            println!("{indent}└── {}", name.magenta().bold());
        } else {
            let size = path.metadata().map(|m| m.len()).unwrap_or(0);
            let marker = match path.extension().and_then(|e| e.to_str()) {
                Some("ini") => "⚙",
                _ if MarkupFormat::from_path(&path).is_some() => "•",
                _ => "?",
            };
            println!(
                "{indent}└── {marker} {} {}",
                name.blue(),
                format!("({})", format_size(size)).dimmed()
            );
        }
    }
    Ok(())
}

fn print_summary(project_id: u64, report: &ImportReport) {
    let stats = &report.stats;
    println!();
    println!(
        "Project {project_id} ({}) was imported {}",
        report.project_name.bold(),
        "✔".green()
    );
    println!(
        "  {} content blocks, {} properties, {} issues, {} nodes, {} evidence",
        stats.content_blocks, stats.document_properties, stats.issues, stats.nodes, stats.evidence
    );
    if stats.conversion_failures > 0 {
        println!(
            "  {}",
            format!("{} files kept in textile (conversion failed)", stats.conversion_failures).yellow()
        );
    }
    for failure in &stats.failures {
        println!("  {} {}: {}", "✗".red(), failure.item, failure.message);
    }
}
