//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// dradismd - Sync Dradis Pro projects with local textile/markdown files
#[derive(Parser, Debug)]
#[command(name = "dradismd", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ~/.dradismd/config.json)
    #[arg(long, global = true, env = "DRADISMD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List projects, most recently updated first
    #[command(visible_alias = "projects", alias = "lp")]
    ListProjects {
        /// Only show the N most recent projects (5 when given without value)
        #[arg(long, num_args = 0..=1, default_missing_value = "5")]
        head: Option<usize>,
    },

    /// Import a project from Dradis into a local folder
    #[command(visible_alias = "import")]
    Get(GetArgs),

    /// Export local project files to Dradis
    #[command(visible_alias = "export")]
    Update(UpdateArgs),

    /// List or search the standard issue library
    #[command(visible_alias = "issues", alias = "search")]
    ListIssues {
        /// Keywords to search for in library titles
        terms: Vec<String>,
    },

    /// Add an issue (and optionally an evidence) to a local project
    #[command(visible_alias = "add")]
    AddIssue(AddIssueArgs),

    /// Convert a file, or every markup file under a folder
    Convert {
        /// File or folder to convert
        path: PathBuf,

        /// Target format (textile, markdown, pdf, word)
        format: String,
    },

    /// Rename the images referenced by a markdown file
    Rename {
        /// Markdown file whose `![caption](path)` images are renamed
        file: PathBuf,
    },

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Dradis project ID
    pub project_id: u64,

    /// Folder the project folder is created in
    #[arg(default_value = ".")]
    pub destination: PathBuf,

    /// Format to convert files to (default: preferred_format from config)
    #[arg(long, short)]
    pub format: Option<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Dradis project ID
    pub project_id: u64,

    /// Project folder or single file to export
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("source").required(true).args(["id", "title"])))]
pub struct AddIssueArgs {
    /// Local project folder
    #[arg(default_value = ".")]
    pub project_path: PathBuf,

    /// Copy an entry from the issue library
    #[arg(long, short)]
    pub id: Option<u64>,

    /// Create a blank issue from the template
    #[arg(long, short, num_args = 0..=1, default_missing_value = "New Issue")]
    pub title: Option<String>,

    /// Also create an empty evidence for this node
    #[arg(long, short)]
    pub node: Option<String>,

    /// Format to write (default: preferred_format from config)
    #[arg(long, short)]
    pub format: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_head_without_value_defaults_to_five() {
        let cli = Cli::parse_from(["dradismd", "list-projects", "--head"]);
        assert!(matches!(cli.command, Commands::ListProjects { head: Some(5) }));

        let cli = Cli::parse_from(["dradismd", "projects"]);
        assert!(matches!(cli.command, Commands::ListProjects { head: None }));
    }

    #[test]
    fn test_add_issue_requires_id_or_title() {
        assert!(Cli::try_parse_from(["dradismd", "add-issue", "ACME"]).is_err());
        assert!(Cli::try_parse_from(["dradismd", "add", "--id", "3", "--title", "x"]).is_err());

        let cli = Cli::parse_from(["dradismd", "add-issue", "ACME", "--title", "-n", "web01"]);
        let Commands::AddIssue(args) = cli.command else {
            panic!("expected add-issue");
        };
        assert_eq!(args.title.as_deref(), Some("New Issue"));
        assert_eq!(args.node.as_deref(), Some("web01"));
    }

    #[test]
    fn test_get_defaults_destination() {
        let cli = Cli::parse_from(["dradismd", "import", "47", "--format", "markdown"]);
        let Commands::Get(args) = cli.command else {
            panic!("expected get");
        };
        assert_eq!(args.project_id, 47);
        assert_eq!(args.destination, PathBuf::from("."));
        assert_eq!(args.format.as_deref(), Some("markdown"));
    }
}
