//! `list-projects` command.

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::model::project::most_recent;
use crate::model::Project;
use crate::remote::RemoteClient;

/// Date shown in the "Last update" column.
const DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

#[derive(Serialize)]
struct ProjectRow {
    id: u64,
    name: String,
    client: Option<String>,
    updated_at: Option<DateTime<Utc>>,
    custom_fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize)]
struct ProjectListOutput {
    projects: Vec<ProjectRow>,
    count: usize,
}

/// Execute the list-projects command.
///
/// # Errors
///
/// Returns an error if the remote call fails.
pub fn execute(
    remote: &dyn RemoteClient,
    config: &Config,
    head: Option<usize>,
    json: bool,
) -> Result<()> {
    let projects = most_recent(remote.list_projects()?, head.unwrap_or(0));
    let columns = config.custom_columns();

    if json {
        let rows: Vec<ProjectRow> = projects
            .into_iter()
            .map(|p| {
                let custom_fields = columns
                    .iter()
                    .map(|c| {
                        (
                            (*c).to_string(),
                            p.custom_field(c).map_or(serde_json::Value::Null, |v| v.into()),
                        )
                    })
                    .collect();
                ProjectRow {
                    id: p.id,
                    name: p.name,
                    client: p.client,
                    updated_at: p.updated_at,
                    custom_fields,
                }
            })
            .collect();
        let output = ProjectListOutput {
            count: rows.len(),
            projects: rows,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if projects.is_empty() {
        println!("No projects found.");
        return Ok(());
    }

    let now = Utc::now();
    let mut header = vec!["ID", "Name", "Client", "Last update"];
    header.extend(columns.iter().copied());

    let rows: Vec<Vec<String>> = projects.iter().map(|p| table_row(p, &columns, now)).collect();
    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(header[i].len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header_line: Vec<String> = header
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{h:<w$}"))
        .collect();
    println!("{}", header_line.join("  ").bold());

    for (project, row) in projects.iter().zip(&rows) {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, w))| {
                let padded = format!("{cell:<w$}");
                match i {
                    0 => padded.cyan().to_string(),
                    2 if project.client.is_none() => padded.yellow().to_string(),
                    3 => padded.dimmed().to_string(),
                    _ => padded,
                }
            })
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
    Ok(())
}

fn table_row(project: &Project, columns: &[&str], now: DateTime<Utc>) -> Vec<String> {
    let updated = project.updated_at.map_or_else(String::new, |at| {
        format!("{} ({})", at.format(DATE_FORMAT), time_ago(at, now))
    });

    let mut row = vec![
        project.id.to_string(),
        project.name.clone(),
        project.client.clone().unwrap_or_else(|| "none".to_string()),
        updated,
    ];
    row.extend(
        columns
            .iter()
            .map(|c| project.custom_field(c).unwrap_or_default().to_string()),
    );
    row
}

/// Relative age such as `3 days ago`.
#[must_use]
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    if seconds < 0 {
        return "in the future".to_string();
    }

    let (value, unit) = match seconds {
        0..60 => return "just now".to_string(),
        60..3_600 => (seconds / 60, "minute"),
        3_600..86_400 => (seconds / 3_600, "hour"),
        86_400..604_800 => (seconds / 86_400, "day"),
        604_800..2_592_000 => (seconds / 604_800, "week"),
        2_592_000..31_536_000 => (seconds / 2_592_000, "month"),
        _ => (seconds / 31_536_000, "year"),
    };
    let plural = if value == 1 { "" } else { "s" };
    format!("{value} {unit}{plural} ago")
}
