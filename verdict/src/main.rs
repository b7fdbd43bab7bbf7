//! Command-line front end for verdict scenarios.
//!
//! A scenario file declares a chain of `try`/`let` steps and the clauses that
//! match its outcome. `verdict run` prints a JSON report and exits with a code
//! from [`verdict::exit_codes`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use verdict::exit_codes;
use verdict::io::scenario::{init_scenario, load_scenario};
use verdict::logging;
use verdict::scenario::run_scenario;

#[derive(Parser)]
#[command(
    name = "verdict",
    version,
    about = "Run Success/Failure step chains and match their outcome"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a scenario and print its JSON report.
    Run {
        /// Scenario TOML file.
        file: PathBuf,
    },
    /// Check a scenario against the schema and semantic rules without running it.
    Validate {
        /// Scenario TOML file.
        file: PathBuf,
    },
    /// Write a sample scenario.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
        /// Destination path.
        #[arg(default_value = "scenario.toml")]
        path: PathBuf,
    },
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::for_error(&err));
        }
    }
}

fn run(command: Command) -> Result<i32> {
    match command {
        Command::Run { file } => cmd_run(&file),
        Command::Validate { file } => cmd_validate(&file),
        Command::Init { force, path } => cmd_init(&path, force),
    }
}

fn cmd_run(file: &Path) -> Result<i32> {
    let scenario = load_scenario(file)?;
    let report = run_scenario(&scenario).with_context(|| format!("run {}", file.display()))?;
    let serialized = if scenario.options.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    };
    let rendered = serialized.context("serialize report")?;
    println!("{rendered}");

    debug!(tag = %report.outcome.tag(), "report written");
    Ok(if report.outcome.is_success() {
        exit_codes::OK
    } else {
        exit_codes::FAILURE
    })
}

fn cmd_validate(file: &Path) -> Result<i32> {
    let scenario = load_scenario(file)?;
    println!(
        "ok: {} step(s), {} clause(s)",
        scenario.steps.len(),
        scenario.clauses.len()
    );
    Ok(exit_codes::OK)
}

fn cmd_init(path: &Path, force: bool) -> Result<i32> {
    init_scenario(path, force)?;
    println!("wrote {}", path.display());
    Ok(exit_codes::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run() {
        let cli = Cli::parse_from(["verdict", "run", "chain.toml"]);
        assert!(matches!(cli.command, Command::Run { file } if file == Path::new("chain.toml")));
    }

    #[test]
    fn parse_init_defaults() {
        let cli = Cli::parse_from(["verdict", "init"]);
        assert!(matches!(
            cli.command,
            Command::Init { force: false, path } if path == Path::new("scenario.toml")
        ));
    }

    #[test]
    fn parse_init_force_with_path() {
        let cli = Cli::parse_from(["verdict", "init", "--force", "custom.toml"]);
        assert!(matches!(
            cli.command,
            Command::Init { force: true, path } if path == Path::new("custom.toml")
        ));
    }

    #[test]
    fn validate_requires_a_file() {
        assert!(Cli::try_parse_from(["verdict", "validate"]).is_err());
    }
}
