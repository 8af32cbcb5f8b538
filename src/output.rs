//! Spinner, colored output, and summary formatting.
//!
//! This module provides visual feedback while the sync runs and prints the
//! final report or failure diagnostic.

use crate::config::Config;
use crate::constants::{DEFAULT_REPO_NAME, PROGRESS_TICK_MS};
use crate::sync::{SyncCallbacks, SyncFailure, SyncOutcome, SyncReport, SyncResult, SyncStep};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// No-op callbacks for when progress tracking is not needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOpCallbacks;

impl SyncCallbacks for NoOpCallbacks {
    fn on_step(&self, _step: &SyncStep) {}
    fn on_complete(&self, _result: &SyncResult) {}
}

/// Prints a step progress message in verbose mode.
pub fn print_step(config: &Config, step: &SyncStep) {
    if !config.is_verbose() {
        return;
    }
    println!("  {}...", step.to_string().dimmed());
}

/// Spinner showing the current step.
/// `None` when progress is hidden (quiet/verbose modes).
pub struct SyncProgress {
    spinner: Option<ProgressBar>,
}

impl SyncProgress {
    pub fn update(&self, step: &SyncStep) {
        if let Some(spinner) = &self.spinner {
            spinner.set_message(format!("{}...", step));
        }
    }

    pub fn finish_success(&self, repo_name: &str) {
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(format!("{} {} synced", "✓".green(), repo_name));
        }
    }

    pub fn finish_failed(&self, repo_name: &str, step: &SyncStep) {
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(format!(
                "{} {}: {} failed",
                "✗".red(),
                repo_name,
                step
            ));
        }
    }
}

/// Callbacks used by the CLI: spinner updates plus verbose step output.
pub struct ConsoleCallbacks {
    progress: SyncProgress,
    config: Config,
}

impl ConsoleCallbacks {
    pub fn new(progress: SyncProgress, config: Config) -> Self {
        Self { progress, config }
    }

    /// Finish the spinner with success/failure message.
    pub fn finish(&self, result: &SyncResult) {
        let repo_name = repo_name(&result.path);
        match &result.outcome {
            SyncOutcome::Success(_) => self.progress.finish_success(repo_name),
            SyncOutcome::Failed(failure) => self.progress.finish_failed(repo_name, &failure.step),
        }
    }
}

impl SyncCallbacks for ConsoleCallbacks {
    fn on_step(&self, step: &SyncStep) {
        self.progress.update(step);
    }

    fn on_step_execute(&self, step: &SyncStep) {
        print_step(&self.config, step);
    }

    fn on_remote_resolved(&self, remote: &str, url: &str) {
        if self.config.is_verbose() {
            println!("    {} {}", format!("{} ->", remote).dimmed(), url.dimmed());
        }
    }

    fn on_complete(&self, _result: &SyncResult) {
        // Completion is handled by main.rs using the result
    }
}

/// Creates the step spinner. Hidden in quiet or verbose mode.
#[must_use]
pub fn create_progress(config: &Config) -> SyncProgress {
    let spinner = if config.is_quiet() || config.is_verbose() {
        None
    } else {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(PROGRESS_TICK_MS));
        Some(spinner)
    };

    SyncProgress { spinner }
}

pub fn print_working_dir(path: &Path, config: &Config) {
    if config.is_quiet() {
        return;
    }
    println!(
        "{} {}",
        "Working in:".cyan(),
        path.display().to_string().white().bold()
    )
}

/// Prints the effective settings in verbose mode.
pub fn print_config(config: &Config) {
    if !config.is_verbose() {
        return;
    }
    println!(
        "{}",
        format!(
            "upstream={} origin={} main={} dev={} auto-stash={}",
            config.upstream_remote,
            config.origin_remote,
            config.main_branch,
            config.dev_branch,
            if config.auto_stash { "on" } else { "off" }
        )
        .dimmed()
    );
}

pub fn print_report(report: &SyncReport, duration: Duration, config: &Config) {
    let lines = if config.is_quiet() {
        render_quiet_report(report)
    } else {
        render_normal_report(report, duration)
    };
    for line in lines {
        println!("{}", line);
    }
}

/// Same content as the normal report, without banner, colour or timing.
fn render_quiet_report(report: &SyncReport) -> Vec<String> {
    let mut lines = vec![
        format!("{} {}", report.main_branch, report.main_short),
        format!("{} {}", report.dev_branch, report.dev_short),
    ];
    lines.extend(report.recent_commits.iter().map(|c| format!("  {}", c)));
    if let Some(label) = &report.restored_stash {
        lines.push(format!("stash restored: {}", label));
    }
    lines
}

fn render_normal_report(report: &SyncReport, duration: Duration) -> Vec<String> {
    let mut lines = render_section("Summary");
    lines.push(format!(
        "  {} {}",
        report.main_branch.white().bold(),
        report.main_short.cyan()
    ));
    lines.push(format!(
        "  {} {}",
        report.dev_branch.white().bold(),
        report.dev_short.cyan()
    ));

    if !report.recent_commits.is_empty() {
        lines.push(String::new());
        lines.push(
            format!("Recent commits on {}:", report.dev_branch)
                .bold()
                .to_string(),
        );
        lines.extend(
            report
                .recent_commits
                .iter()
                .map(|line| format!("  {}", format_log_line(line))),
        );
    }

    if let Some(label) = &report.restored_stash {
        lines.push(String::new());
        lines.push(format!("{} {}", "Stash restored:".yellow(), label));
    }

    lines.push(String::new());
    lines.push(format!(
        "{} in {}",
        "Done".green().bold(),
        format_duration(duration)
    ));
    lines
}

/// Prints the failure diagnostic, remedy, and any stash left behind to stderr.
pub fn print_failure(failure: &SyncFailure) {
    for line in render_failure(failure) {
        eprintln!("{}", line);
    }
}

fn render_failure(failure: &SyncFailure) -> Vec<String> {
    let prefix = match failure.sync_error() {
        Some(error) => format!("error[{}]:", error.kind().label()),
        None => "error:".to_string(),
    };
    let mut lines = vec![format!(
        "{} {}: {:#}",
        prefix.red().bold(),
        failure.step,
        failure.error
    )];
    if let Some(hint) = failure.sync_error().and_then(|e| e.hint()) {
        lines.push(format!("{} {}", "hint:".yellow().bold(), hint));
    }
    if let Some(stash) = &failure.pending_stash {
        lines.push(format!(
            "{} your changes are stashed as \"{}\"; restore them with `git stash pop` once the repository is settled",
            "note:".cyan().bold(),
            stash.label
        ));
    }
    lines
}

/// Prints an error that occurred outside the pipeline (configuration, cwd).
pub fn print_error(error: &anyhow::Error) {
    eprintln!("{} {:#}", "error:".red().bold(), error);
}

fn repo_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_REPO_NAME)
}

fn format_log_line(line: &str) -> String {
    match line.split_once(' ') {
        Some((hash, subject)) => format!("{} {}", hash.yellow(), subject),
        None => line.yellow().to_string(),
    }
}

fn format_duration(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f32())
}

fn render_section(title: &str) -> Vec<String> {
    let line = "=".repeat(50).cyan().dimmed().to_string();
    let padding = (50 - title.len()) / 2;
    let centered = format!("{:>width$}", title, width = padding + title.len());
    vec![
        String::new(),
        line.clone(),
        centered.cyan().bold().to_string(),
        line,
        String::new(),
    ]
}
