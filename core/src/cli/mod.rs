pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "labeler")]
#[command(author, version, about = "Label pull requests by the files they change", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging (also enabled by ACTIONS_STEP_DEBUG=true)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Label open pull requests of a GitHub repository
    Run {
        /// Token used to authenticate against GitHub (falls back to GITHUB_TOKEN)
        #[arg(long, env = "INPUT_REPO-TOKEN", hide_env_values = true)]
        repo_token: Option<String>,

        /// Repository path of the label rules document
        #[arg(long, env = "INPUT_CONFIGURATION-PATH")]
        configuration_path: String,

        /// Label to add when no rule matches
        #[arg(long, env = "INPUT_NOT-FOUND-LABEL")]
        not_found_label: Option<String>,

        /// Maximum number of pull requests to label in one run
        #[arg(
            long,
            env = "INPUT_OPERATIONS-PER-RUN",
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        operations_per_run: u32,

        /// Repository as owner/name (defaults to GITHUB_REPOSITORY)
        #[arg(long)]
        repository: Option<String>,

        /// Commit to read the rules document at (defaults to GITHUB_SHA)
        #[arg(long)]
        sha: Option<String>,

        /// Label only this pull request (defaults to the triggering event's)
        #[arg(long)]
        pull_request: Option<u64>,
    },

    /// Show the labels a local rules file assigns to a list of paths
    Check {
        /// Rules file to load
        #[arg(short, long, default_value = ".github/labeler.yml")]
        config: PathBuf,

        /// Label to report when no rule matches
        #[arg(long)]
        not_found_label: Option<String>,

        /// Changed paths (read from stdin, one per line, when omitted)
        paths: Vec<String>,
    },
}

/// Initialise `env_logger`. `RUST_LOG` takes precedence over the defaults.
pub fn init_logging(verbose: bool) {
    let step_debug = std::env::var("ACTIONS_STEP_DEBUG").is_ok_and(|v| v == "true");
    let default_level = if verbose || step_debug { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// Whether the process runs as a GitHub Actions step.
pub fn in_github_actions() -> bool {
    std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
}

/// Emit a workflow command (`::error::`, `::warning::`) when running in
/// GitHub Actions. Does nothing elsewhere.
pub fn annotate(level: &str, message: &str) {
    if in_github_actions() {
        println!("::{level}::{}", escape_workflow_data(message));
    }
}

fn escape_workflow_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Run {
            repo_token,
            configuration_path,
            not_found_label,
            operations_per_run,
            repository,
            sha,
            pull_request,
        } => commands::label::run(
            commands::label::LabelArgs {
                repo_token,
                configuration_path,
                not_found_label,
                operations_per_run,
                repository,
                sha,
                pull_request,
            },
            cli.format,
        ),
        Commands::Check {
            config,
            not_found_label,
            paths,
        } => commands::check::run(&config, not_found_label.as_deref(), paths, cli.format),
    }
}
