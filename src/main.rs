use clap::Parser;
use git_sync_dev::config::{Config, Verbosity};
use git_sync_dev::output;
use git_sync_dev::sync::{self, SyncOutcome};
use std::process::ExitCode;

/// Reset main to upstream, rebase dev onto it, and push both to origin.
///
/// Remotes and branches come from UPSTREAM_REMOTE, ORIGIN_REMOTE,
/// MAIN_BRANCH and DEV_BRANCH; set AUTO_STASH=1 to stash local changes
/// for the duration of the run.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Only print the final report and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print every step and git command
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli.verbosity()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            output::print_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(verbosity: Verbosity) -> anyhow::Result<bool> {
    let config = Config::from_env(verbosity)?;
    let cwd = std::env::current_dir()?;
    output::print_working_dir(&cwd, &config);
    output::print_config(&config);

    let callbacks = output::ConsoleCallbacks::new(output::create_progress(&config), config.clone());
    let result = sync::sync(&cwd, &callbacks, &config);
    callbacks.finish(&result);

    match &result.outcome {
        SyncOutcome::Success(report) => {
            output::print_report(report, result.duration, &config);
            Ok(true)
        }
        SyncOutcome::Failed(failure) => {
            output::print_failure(failure);
            Ok(false)
        }
    }
}
