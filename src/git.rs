//! Git command wrappers.
//!
//! This module provides a thin wrapper around git CLI commands,
//! handling command execution and error formatting. Every wrapper takes a
//! [`GitLogger`] so callers decide whether invocations are echoed.

use anyhow::Context;
use colored::Colorize;
use std::path::Path;
use std::process::Output;

/// Callback invoked with the arguments of every git command before it runs.
pub type GitLogger = fn(&[&str]);

/// Echoes the git invocation to stdout.
pub fn verbose_logger(args: &[&str]) {
    println!("    {} {}", "$ git".dimmed(), args.join(" ").dimmed());
}

pub fn no_op_logger(_args: &[&str]) {}

fn git_output(repo: &Path, args: &[&str]) -> anyhow::Result<Output> {
    std::process::Command::new("git")
        .current_dir(repo)
        .args(args)
        .env("LC_ALL", "C")
        .output()
        .with_context(|| format!("Failed to spawn git command: git {}", args.join(" ")))
}

/// Runs git in `repo` and returns trimmed stdout, or an error carrying stderr.
pub fn run_git(repo: &Path, args: &[&str]) -> anyhow::Result<String> {
    let output = git_output(repo, args)?;

    if output.status.success() {
        let result = String::from_utf8_lossy(&output.stdout);
        Ok(result.as_ref().trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git {} failed: {}", args.join(" "), stderr.trim())
    }
}

fn logged(repo: &Path, args: &[&str], log: GitLogger) -> anyhow::Result<String> {
    log(args);
    run_git(repo, args)
}

/// Runs a query whose exit status is the answer.
fn probe(repo: &Path, args: &[&str], log: GitLogger) -> anyhow::Result<Option<String>> {
    log(args);
    let output = git_output(repo, args)?;
    if output.status.success() {
        Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
    } else {
        Ok(None)
    }
}

/// Rejects names git would refuse or misread as an option.
pub fn validate_ref_name(name: &str) -> anyhow::Result<()> {
    let bad_char = name
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || "~^:?*[\\".contains(c));
    if name.is_empty()
        || name.starts_with('-')
        || name.ends_with('/')
        || name.ends_with(".lock")
        || name.contains("..")
        || name.contains("@{")
        || bad_char
    {
        anyhow::bail!("Invalid ref name: {:?}", name);
    }
    Ok(())
}

pub fn is_inside_work_tree(repo: &Path, log: GitLogger) -> anyhow::Result<bool> {
    let answer = probe(repo, &["rev-parse", "--is-inside-work-tree"], log)
        .context("Failed to query repository state")?;
    Ok(answer.as_deref() == Some("true"))
}

/// Resolves a remote name to its URL, or `None` when no such remote exists.
pub fn remote_url(repo: &Path, remote: &str, log: GitLogger) -> anyhow::Result<Option<String>> {
    validate_ref_name(remote)?;
    probe(repo, &["remote", "get-url", remote], log)
        .with_context(|| format!("Failed to resolve remote '{}'", remote))
}

pub fn local_branch_exists(repo: &Path, branch: &str, log: GitLogger) -> anyhow::Result<bool> {
    validate_ref_name(branch)?;
    let full_ref = format!("refs/heads/{}", branch);
    let found = probe(repo, &["show-ref", "--verify", "--quiet", &full_ref], log)
        .with_context(|| format!("Failed to look up branch '{}'", branch))?;
    Ok(found.is_some())
}

/// Resolves a revision to a full commit id, or `None` if it does not exist.
pub fn resolve_commit(repo: &Path, rev: &str, log: GitLogger) -> anyhow::Result<Option<String>> {
    let spec = format!("{}^{{commit}}", rev);
    probe(repo, &["rev-parse", "--verify", "--quiet", &spec], log)
        .with_context(|| format!("Failed to resolve '{}'", rev))
}

/// Tracked modifications and untracked files both count as dirty.
pub fn has_uncommitted_changes(repo: &Path, log: GitLogger) -> anyhow::Result<bool> {
    logged(repo, &["status", "--porcelain"], log)
        .map(|output| !output.is_empty())
        .context("Failed to check for uncommitted changes")
}

/// Stashes everything, untracked files included, under `label`.
///
/// Returns `false` when git found nothing to save.
pub fn stash_push(repo: &Path, label: &str, log: GitLogger) -> anyhow::Result<bool> {
    let output = logged(
        repo,
        &["stash", "push", "--include-untracked", "--message", label],
        log,
    )
    .context("Failed to stash changes")?;
    Ok(!output.contains("No local changes to save"))
}

/// Finds the stash entry whose message ends with `label`, returning its
/// `stash@{n}` name.
pub fn find_stash(repo: &Path, label: &str, log: GitLogger) -> anyhow::Result<Option<String>> {
    let output = logged(repo, &["stash", "list", "--format=%gd%x09%gs"], log)
        .context("Failed to list stashes")?;
    Ok(output.lines().find_map(|line| {
        let (name, subject) = line.split_once('\t')?;
        subject.ends_with(label).then(|| name.to_string())
    }))
}

pub fn stash_pop(repo: &Path, stash_ref: &str, log: GitLogger) -> anyhow::Result<()> {
    logged(repo, &["stash", "pop", stash_ref], log)
        .with_context(|| format!("Failed to pop {}", stash_ref))?;
    Ok(())
}

pub fn checkout(repo: &Path, branch: &str, log: GitLogger) -> anyhow::Result<()> {
    validate_ref_name(branch)?;
    logged(repo, &["checkout", branch], log)
        .with_context(|| format!("Failed to checkout branch '{}'", branch))?;
    Ok(())
}

pub fn fetch_prune(repo: &Path, remote: &str, log: GitLogger) -> anyhow::Result<()> {
    validate_ref_name(remote)?;
    logged(repo, &["fetch", "--prune", remote], log)
        .with_context(|| format!("Failed to fetch from '{}'", remote))?;
    Ok(())
}

/// Moves the current branch and working tree to `target`.
pub fn reset_hard(repo: &Path, target: &str, log: GitLogger) -> anyhow::Result<()> {
    logged(repo, &["reset", "--hard", target], log)
        .with_context(|| format!("Failed to reset to '{}'", target))?;
    Ok(())
}

/// Rebases the current branch onto `onto`. A conflict surfaces as an error
/// with the rebase left in progress; see [`rebase_in_progress`].
pub fn rebase(repo: &Path, onto: &str, log: GitLogger) -> anyhow::Result<()> {
    validate_ref_name(onto)?;
    logged(repo, &["rebase", onto], log)
        .with_context(|| format!("Failed to rebase onto '{}'", onto))?;
    Ok(())
}

/// True when git's rebase state directory exists.
pub fn rebase_in_progress(repo: &Path, log: GitLogger) -> anyhow::Result<bool> {
    for marker in ["rebase-merge", "rebase-apply"] {
        let path = logged(repo, &["rev-parse", "--git-path", marker], log)
            .context("Failed to locate git directory")?;
        if repo.join(path).is_dir() {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn push(repo: &Path, remote: &str, branch: &str, log: GitLogger) -> anyhow::Result<()> {
    validate_ref_name(remote)?;
    validate_ref_name(branch)?;
    let refspec = format!("refs/heads/{0}:refs/heads/{0}", branch);
    logged(repo, &["push", remote, &refspec], log)
        .with_context(|| format!("Failed to push '{}' to '{}'", branch, remote))?;
    Ok(())
}

/// Force-pushes `branch` only if the remote branch still points at
/// `expected`. `None` means the remote branch must not exist yet.
pub fn push_force_with_lease(
    repo: &Path,
    remote: &str,
    branch: &str,
    expected: Option<&str>,
    log: GitLogger,
) -> anyhow::Result<()> {
    validate_ref_name(remote)?;
    validate_ref_name(branch)?;
    let lease = format!(
        "--force-with-lease=refs/heads/{}:{}",
        branch,
        expected.unwrap_or("")
    );
    let refspec = format!("refs/heads/{0}:refs/heads/{0}", branch);
    logged(repo, &["push", &lease, remote, &refspec], log)
        .with_context(|| format!("Failed to force-push '{}' to '{}'", branch, remote))?;
    Ok(())
}

pub fn short_hash(repo: &Path, rev: &str, log: GitLogger) -> anyhow::Result<String> {
    logged(repo, &["rev-parse", "--short", rev], log)
        .with_context(|| format!("Failed to resolve '{}'", rev))
}

/// One-line summaries (`<short hash> <subject>`) of the newest commits on `rev`.
pub fn recent_log(
    repo: &Path,
    rev: &str,
    limit: usize,
    log: GitLogger,
) -> anyhow::Result<Vec<String>> {
    let count = format!("--max-count={}", limit);
    let output = logged(repo, &["log", "--format=%h %s", &count, rev, "--"], log)
        .with_context(|| format!("Failed to read log of '{}'", rev))?;
    Ok(output.lines().map(str::to_string).collect())
}
