//! # kommitter
//!
//! **kommitter** creates a single timestamped auto-commit on a GitHub
//! repository through the REST API: it resolves the branch tip, uploads a
//! blob, builds a tree on top of the existing content, creates a commit and
//! advances the branch reference.
//!
//! Everything is driven by a `config.json` in the working directory
//! (override the path with `--config`). One run makes one commit; there are
//! no retries and no cleanup of partially created objects.
//!
//! This CLI is built with [clap](https://docs.rs/clap).

use clap::Parser;
use colored::Colorize;
use kommitter::{CONFIG_FILE, Error, GithubClient, cmd_commit, config_template, load_config};
use std::path::PathBuf;
use std::process::ExitCode;

/// Command-line interface definition.
///
/// Parsed using `clap` derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "kommitter",
    version,
    about = "create a timestamped auto-commit on a GitHub repository"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,
}

/// CLI entry point.
///
/// Runs the commit pipeline and maps the outcome onto the process exit
/// code: 0 on success, 1 on any failure.
fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(sha) => {
            println!("{} commit {sha} created and pushed", "✔".green());
            ExitCode::SUCCESS
        }
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<String, Error> {
    println!("=== kommitter ===\n");
    let cfg = load_config(&cli.config)?;
    println!(
        "configuration loaded: {}/{} @ {}\n",
        cfg.username, cfg.repo_name, cfg.branch
    );
    let client = GithubClient::new(&cfg)?;
    cmd_commit(&cfg, &client)
}

/// The single error boundary: one message per category, written to stderr.
///
/// A missing config file additionally gets the embedded template so the
/// user can copy it verbatim.
fn report(err: &Error) {
    match err {
        Error::ConfigNotFound(_) => {
            eprintln!("{} {err}", "error:".red());
            eprintln!(
                "\ncreate a {CONFIG_FILE} with the following structure:\n{}",
                config_template()
            );
        }
        Error::ConfigMalformed(_) | Error::ConfigFieldMissing(_) => {
            eprintln!("{} {err}", "configuration error:".red());
        }
        Error::Auth { .. } | Error::NotFound { .. } | Error::Api { .. } => {
            eprintln!("{} {err}", "github api error:".red());
        }
        Error::Network(_) => {
            eprintln!("{} {err}", "network error:".red());
        }
        Error::Unexpected(_) => {
            eprintln!("{} {err}", "unexpected error:".red());
        }
    }
}
