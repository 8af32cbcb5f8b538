//! Test infrastructure for git-sync-dev integration tests.
#![allow(dead_code)]

use anyhow::Result;
use git_sync_dev::config::{Config, Verbosity};
use git_sync_dev::git::run_git;
use git_sync_dev::sync::{SyncCallbacks, SyncPhase, SyncResult, SyncStep};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

static SCRATCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub const MAIN: &str = "main";
pub const DEV: &str = "sky/dev";

pub fn git(path: &Path, args: &[&str]) -> Result<String> {
    run_git(path, args)
}

fn set_identity(path: &Path) -> Result<()> {
    git(path, &["config", "user.email", "test@example.com"])?;
    git(path, &["config", "user.name", "Test User"])?;
    git(path, &["config", "commit.gpgsign", "false"])?;
    Ok(())
}

fn commit_file(path: &Path, file: &str, contents: &str, message: &str) -> Result<String> {
    std::fs::write(path.join(file), contents)?;
    git(path, &["add", file])?;
    git(path, &["commit", "-m", message])?;
    git(path, &["rev-parse", "HEAD"])
}

/// A local repository with `upstream` and `origin` bare remotes.
///
/// Layout after construction:
/// - upstream: `main` with the initial commit
/// - origin: `main` (same commit) and `sky/dev` with one extra commit
/// - local: `main` and `sky/dev`, with `sky/dev` checked out
///
/// Everything lives in one TempDir that is removed on drop.
pub struct SyncFixture {
    _root: TempDir,
    pub local: PathBuf,
    pub upstream: PathBuf,
    pub origin: PathBuf,
    root: PathBuf,
}

impl SyncFixture {
    pub fn new() -> Result<Self> {
        let root_dir = TempDir::new()?;
        let root = root_dir.path().to_path_buf();
        let local = root.join("local");
        let upstream = root.join("upstream.git");
        let origin = root.join("origin.git");

        for dir in [&local, &upstream, &origin] {
            std::fs::create_dir_all(dir)?;
        }
        git(&upstream, &["init", "--bare", "-b", MAIN])?;
        git(&origin, &["init", "--bare", "-b", MAIN])?;

        git(&local, &["init", "-b", MAIN])?;
        set_identity(&local)?;
        commit_file(&local, "README.md", "# Project\n", "Initial commit")?;

        git(&local, &["remote", "add", "upstream", path_str(&upstream)])?;
        git(&local, &["push", "upstream", MAIN])?;
        git(&local, &["remote", "add", "origin", path_str(&origin)])?;
        git(&local, &["push", "origin", MAIN])?;

        git(&local, &["checkout", "-b", DEV])?;
        commit_file(&local, "dev.txt", "dev work\n", "Dev work")?;
        git(&local, &["push", "-u", "origin", DEV])?;

        Ok(Self {
            _root: root_dir,
            local,
            upstream,
            origin,
            root,
        })
    }

    /// Config pointing at this fixture's remotes and branches.
    pub fn config(&self) -> Config {
        Config {
            verbosity: Verbosity::Quiet,
            ..Config::default()
        }
    }

    pub fn auto_stash_config(&self) -> Config {
        Config {
            auto_stash: true,
            ..self.config()
        }
    }

    /// Commits to upstream's main from a separate clone. Returns the new commit id.
    pub fn commit_upstream(&self, file: &str, contents: &str, message: &str) -> Result<String> {
        let work = self.fresh_clone(&self.upstream, MAIN)?;
        let sha = commit_file(&work, file, contents, message)?;
        git(&work, &["push", "origin", MAIN])?;
        Ok(sha)
    }

    /// Commits to origin's dev from a separate clone, as another machine would.
    pub fn commit_origin_dev(&self, file: &str, contents: &str, message: &str) -> Result<String> {
        let work = self.fresh_clone(&self.origin, DEV)?;
        let sha = commit_file(&work, file, contents, message)?;
        git(&work, &["push", "origin", DEV])?;
        Ok(sha)
    }

    /// Commits on `branch` in the local repository and returns to dev.
    pub fn commit_local(
        &self,
        branch: &str,
        file: &str,
        contents: &str,
        message: &str,
    ) -> Result<String> {
        git(&self.local, &["checkout", branch])?;
        let sha = commit_file(&self.local, file, contents, message)?;
        git(&self.local, &["checkout", DEV])?;
        Ok(sha)
    }

    fn fresh_clone(&self, remote: &Path, branch: &str) -> Result<PathBuf> {
        let n = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
        let scratch = self.root.join(format!("scratch-{}", n));
        git(
            &self.root,
            &["clone", "-b", branch, path_str(remote), path_str(&scratch)],
        )?;
        set_identity(&scratch)?;
        Ok(scratch)
    }

    pub fn make_dirty(&self) -> Result<()> {
        std::fs::write(self.local.join("README.md"), "# Project\n\nlocal edit\n")?;
        Ok(())
    }

    pub fn make_untracked(&self) -> Result<()> {
        std::fs::write(self.local.join("untracked.txt"), "scratch\n")?;
        Ok(())
    }

    pub fn stash_count(&self) -> Result<usize> {
        let output = git(&self.local, &["stash", "list"])?;
        Ok(output.lines().filter(|l| !l.trim().is_empty()).count())
    }

    pub fn local_rev(&self, rev: &str) -> Result<String> {
        git(&self.local, &["rev-parse", rev])
    }

    /// Like [`SyncFixture::local_rev`] but immune to tags sharing the name.
    pub fn local_branch_rev(&self, branch: &str) -> Result<String> {
        git(&self.local, &["rev-parse", &format!("refs/heads/{}", branch)])
    }

    pub fn current_branch(&self) -> Result<String> {
        git(&self.local, &["rev-parse", "--abbrev-ref", "HEAD"])
    }

    pub fn upstream_rev(&self, branch: &str) -> Result<String> {
        git(&self.upstream, &["rev-parse", &format!("refs/heads/{}", branch)])
    }

    pub fn origin_rev(&self, branch: &str) -> Result<String> {
        git(&self.origin, &["rev-parse", &format!("refs/heads/{}", branch)])
    }

    pub fn file_contents(&self, file: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.local.join(file))?)
    }
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are valid UTF-8")
}

/// Records every step and phase in order.
#[derive(Default)]
pub struct RecordingCallbacks {
    pub steps: RefCell<Vec<SyncStep>>,
    pub phases: RefCell<Vec<SyncPhase>>,
    pub completions: RefCell<usize>,
}

impl RecordingCallbacks {
    pub fn count(&self, predicate: impl Fn(&SyncStep) -> bool) -> usize {
        self.steps.borrow().iter().filter(|s| predicate(s)).count()
    }
}

impl SyncCallbacks for RecordingCallbacks {
    fn on_step(&self, step: &SyncStep) {
        self.steps.borrow_mut().push(step.clone());
    }

    fn on_phase(&self, phase: SyncPhase) {
        self.phases.borrow_mut().push(phase);
    }

    fn on_complete(&self, _result: &SyncResult) {
        *self.completions.borrow_mut() += 1;
    }
}
