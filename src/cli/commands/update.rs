//! `update` command: export local files to a project.

use colored::Colorize;

use crate::cli::UpdateArgs;
use crate::convert::PandocConverter;
use crate::error::Result;
use crate::remote::RemoteClient;
use crate::sync::{EntityStats, ExportReport, Exporter, UploadedFilesHeuristic};

/// Execute the update command.
///
/// Item failures are reported but do not fail the command.
///
/// # Errors
///
/// Returns an error if the project does not exist, the path is missing, or a
/// listing the whole export depends on fails.
pub fn execute(remote: &dyn RemoteClient, args: &UpdateArgs, json: bool) -> Result<()> {
    let converter = PandocConverter::new();
    let report = Exporter::new(remote, args.project_id, &converter, &UploadedFilesHeuristic)
        .export_path(&args.path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &ExportReport) {
    let stats = &report.stats;
    let rows: [(&str, &EntityStats); 5] = [
        ("Content blocks", &stats.content_blocks),
        ("Properties", &stats.document_properties),
        ("Issues", &stats.issues),
        ("Nodes", &stats.nodes),
        ("Evidence", &stats.evidence),
    ];

    for (label, entity) in rows {
        if entity.total() == 0 {
            continue;
        }
        println!(
            "  {label:<15} {} created, {} updated, {} unchanged, {} skipped, {}",
            entity.created,
            entity.updated,
            entity.unchanged,
            entity.skipped,
            if entity.failed > 0 {
                format!("{} failed", entity.failed).red().to_string()
            } else {
                "0 failed".to_string()
            }
        );
    }
    if stats.attachments_uploaded > 0 {
        println!("  {} attachments uploaded", stats.attachments_uploaded);
    }
    for failure in &stats.failures {
        println!("  {} {}: {}", "✗".red(), failure.item, failure.message);
    }

    if stats.failures.is_empty() {
        println!("{} was updated {}", report.project_name.bold(), "✔".green());
    } else {
        println!(
            "{} was updated with {} failures",
            report.project_name.bold(),
            stats.failures.len().to_string().yellow()
        );
    }
}
