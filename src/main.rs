//! dradismd CLI entry point.

use clap::Parser;
use dradismd::cli::commands;
use dradismd::cli::{Cli, Commands};
use dradismd::config::Config;
use dradismd::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // A broken config file only matters to commands that read it
    let config = Config::load(cli.config.as_deref());
    let configured_level = config.as_ref().map_or(0, |c| c.log_level);
    init_tracing(cli.verbose.max(configured_level), cli.quiet);

    match run(&cli, config, cli.json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,hyper=info,reqwest=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, config: Result<Config, Error>, json: bool) -> Result<(), Error> {
    match &cli.command {
        Commands::Version => commands::version::execute(json),
        Commands::Completions { shell } => commands::completions::execute(shell),
        Commands::Convert { path, format } => commands::convert::execute(path, format, json),

        Commands::Rename { file } => commands::rename::execute(&config?, file, json),
        Commands::AddIssue(args) => commands::library::execute_add(&config?, args, json),

        // Remote commands: token and reachability are checked first
        Commands::ListProjects { head } => {
            let config = config?;
            let client = commands::connect(&config)?;
            commands::projects::execute(&client, &config, *head, json)
        }
        Commands::Get(args) => {
            let config = config?;
            let client = commands::connect(&config)?;
            commands::get::execute(&client, &config, args, json)
        }
        Commands::Update(args) => {
            let client = commands::connect(&config?)?;
            commands::update::execute(&client, args, json)
        }
        Commands::ListIssues { terms } => {
            let client = commands::connect(&config?)?;
            commands::library::execute_list(&client, terms, json)
        }
    }
}
