//! Issue library commands: `list-issues` and `add-issue`.

use colored::Colorize;
use serde::Serialize;

use crate::cli::AddIssueArgs;
use crate::cli::commands::{connect, resolve_format};
use crate::config::Config;
use crate::convert::PandocConverter;
use crate::error::Result;
use crate::library::{SearchHit, search};
use crate::model::StandardIssue;
use crate::remote::RemoteClient;
use crate::scaffold::{NewIssue, Templates, add_issue};

#[derive(Serialize)]
struct LibraryListOutput<'a> {
    issues: &'a [StandardIssue],
    count: usize,
}

#[derive(Serialize)]
struct SearchOutput<'a> {
    terms: &'a [String],
    hits: &'a [SearchHit],
    count: usize,
}

/// Execute the list-issues command.
///
/// # Errors
///
/// Returns an error if the library cannot be fetched.
pub fn execute_list(remote: &dyn RemoteClient, terms: &[String], json: bool) -> Result<()> {
    let library = remote.list_standard_issues()?;

    if terms.is_empty() {
        if json {
            let output = LibraryListOutput {
                issues: &library,
                count: library.len(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else if library.is_empty() {
            println!("The issue library is empty.");
        } else {
            println!("{}", format!("{:>5}  Title", "ID").bold());
            for entry in &library {
                println!("{}  {}", format!("{:>5}", entry.id).cyan(), entry.title);
            }
        }
        return Ok(());
    }

    let hits = search(&library, terms);
    if json {
        let output = SearchOutput {
            terms,
            hits: &hits,
            count: hits.len(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No library entry matches '{}'.", terms.join(" "));
        return Ok(());
    }

    println!("{}", format!("{:>5}  {:>8}  Title", "ID", "Match").bold());
    for hit in &hits {
        println!(
            "{}  {}  {}",
            format!("{:>5}", hit.issue.id).cyan(),
            format!("{:>8}", hit.score_label()).dimmed(),
            hit.highlighted_title(|w| w.yellow().bold().to_string())
        );
    }
    Ok(())
}

/// Execute the add-issue command.
///
/// Only `--id` talks to Dradis; a template issue is created offline.
///
/// # Errors
///
/// Returns an error if templates are missing, the library entry does not
/// exist, or files cannot be written.
pub fn execute_add(config: &Config, args: &AddIssueArgs, json: bool) -> Result<()> {
    let templates = Templates::load(
        config.issue_template.as_deref(),
        config.evidence_template.as_deref(),
    )?;
    let format = resolve_format(args.format.as_deref(), config)?;

    let issue = match (args.id, args.title.as_deref()) {
        (Some(id), _) => NewIssue::from_library(&connect(config)?, id)?,
        (None, Some(title)) => NewIssue::from_template(title, &templates),
        (None, None) => NewIssue::from_template("New Issue", &templates),
    };

    let converter = PandocConverter::new();
    let done = add_issue(
        &args.project_path,
        &issue,
        args.node.as_deref(),
        &templates,
        format,
        &converter,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&done)?);
        return Ok(());
    }

    if done.issue_created {
        println!("{} {}", "Created".green(), done.issue.display());
    } else {
        println!("{} {}", "Kept existing".yellow(), done.issue.display());
    }
    if let Some(evidence) = &done.evidence {
        println!("{} {}", "Created".green(), evidence.display());
    }
    Ok(())
}
