// Sync pipeline: preconditions, stash guard, fetch/reset/rebase, push, report, restore

use crate::config::Config;
use crate::constants::{REPORT_LOG_LIMIT, STASH_LABEL_PREFIX, STASH_TIMESTAMP_FORMAT};
use crate::error::SyncError;
use crate::git::{self, GitLogger};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// A single git-facing action of the pipeline, reported to callbacks and
/// recorded in failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStep {
    CheckingRepository,
    CheckingRemote { remote: String },
    CheckingBranch { branch: String },
    CheckingChanges,
    Stashing,
    Fetching { remote: String },
    CheckingOut { branch: String },
    ResettingMain { target: String },
    Rebasing { onto: String },
    Pushing { remote: String, branch: String },
    Reporting,
    RestoringStash,
    Completed,
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CheckingRepository => write!(f, "Checking for a git working tree"),
            Self::CheckingRemote { remote } => write!(f, "Resolving remote {}", remote),
            Self::CheckingBranch { branch } => write!(f, "Looking up branch {}", branch),
            Self::CheckingChanges => write!(f, "Checking for uncommitted changes"),
            Self::Stashing => write!(f, "Stashing uncommitted changes"),
            Self::Fetching { remote } => write!(f, "Fetching {}", remote),
            Self::CheckingOut { branch } => write!(f, "Checking out {}", branch),
            Self::ResettingMain { target } => write!(f, "Resetting to {}", target),
            Self::Rebasing { onto } => write!(f, "Rebasing onto {}", onto),
            Self::Pushing { remote, branch } => write!(f, "Pushing {} to {}", branch, remote),
            Self::Reporting => write!(f, "Collecting summary"),
            Self::RestoringStash => write!(f, "Restoring stashed changes"),
            Self::Completed => write!(f, "Completed"),
        }
    }
}

/// Milestones of a run. A failure records the last one reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SyncPhase {
    Start,
    PreconditionsOk,
    Guarded,
    Fetched,
    MainSynced,
    DevRebased,
    Pushed,
    Restored,
    Done,
}

/// A stash created by this run that still has to be popped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashHandle {
    pub label: String,
}

impl StashHandle {
    fn new_label() -> String {
        format!(
            "{} {}",
            STASH_LABEL_PREFIX,
            chrono::Local::now().format(STASH_TIMESTAMP_FORMAT)
        )
    }
}

/// Receives progress notifications while a sync runs.
pub trait SyncCallbacks {
    /// Called when a step begins, for progress displays.
    fn on_step(&self, step: &SyncStep);

    /// Called when a step begins, for verbose logging.
    fn on_step_execute(&self, _step: &SyncStep) {}

    fn on_phase(&self, _phase: SyncPhase) {}

    fn on_remote_resolved(&self, _remote: &str, _url: &str) {}

    fn on_complete(&self, result: &SyncResult);
}

#[derive(Debug)]
pub struct SyncResult {
    pub path: PathBuf,
    pub outcome: SyncOutcome,
    pub duration: Duration,
}

#[derive(Debug)]
pub enum SyncOutcome {
    Success(SyncReport),
    Failed(SyncFailure),
}

/// State after a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub main_branch: String,
    pub main_short: String,
    pub dev_branch: String,
    pub dev_short: String,
    /// `<short hash> <subject>` lines, newest first.
    pub recent_commits: Vec<String>,
    /// Label of the stash that was popped, if one was created.
    pub restored_stash: Option<String>,
}

#[derive(Debug)]
pub struct SyncFailure {
    pub step: SyncStep,
    /// Last milestone completed before the failure.
    pub phase: SyncPhase,
    pub error: anyhow::Error,
    /// Stash created earlier in the run whose restoration was never
    /// attempted.
    pub pending_stash: Option<StashHandle>,
}

impl SyncFailure {
    /// The typed error behind this failure, when there is one.
    #[must_use]
    pub fn sync_error(&self) -> Option<&SyncError> {
        self.error.downcast_ref::<SyncError>()
    }
}

/// Runs the whole workflow in `path` and reports the outcome.
pub fn sync<C>(path: &Path, callbacks: &C, config: &Config) -> SyncResult
where
    C: SyncCallbacks + ?Sized,
{
    let start = Instant::now();
    let mut run = Run {
        path,
        config,
        callbacks,
        log: config.git_logger(),
        phase: SyncPhase::Start,
        stash: None,
    };

    let outcome = match run.execute() {
        Ok(report) => SyncOutcome::Success(report),
        Err(failure) => SyncOutcome::Failed(failure),
    };

    let result = SyncResult {
        path: path.to_path_buf(),
        outcome,
        duration: start.elapsed(),
    };
    callbacks.on_complete(&result);
    result
}

struct Run<'a, C: ?Sized> {
    path: &'a Path,
    config: &'a Config,
    callbacks: &'a C,
    log: GitLogger,
    phase: SyncPhase,
    stash: Option<StashHandle>,
}

impl<C> Run<'_, C>
where
    C: SyncCallbacks + ?Sized,
{
    fn step<T, F>(&self, step: SyncStep, op: F) -> Result<T, SyncFailure>
    where
        F: FnOnce() -> anyhow::Result<T>,
    {
        self.callbacks.on_step(&step);
        self.callbacks.on_step_execute(&step);
        op().map_err(|error| SyncFailure {
            step,
            phase: self.phase,
            error,
            pending_stash: self.stash.clone(),
        })
    }

    fn advance(&mut self, phase: SyncPhase) {
        self.phase = phase;
        self.callbacks.on_phase(phase);
    }

    fn execute(&mut self) -> Result<SyncReport, SyncFailure> {
        self.check_preconditions()?;
        self.advance(SyncPhase::PreconditionsOk);

        self.stash = self.guard_working_tree()?;
        self.advance(SyncPhase::Guarded);

        let observed_dev = self.fetch()?;
        self.advance(SyncPhase::Fetched);

        self.sync_main()?;
        self.advance(SyncPhase::MainSynced);

        self.rebase_dev()?;
        self.advance(SyncPhase::DevRebased);

        self.publish(observed_dev.as_deref())?;
        self.advance(SyncPhase::Pushed);

        let mut report = self.collect_report()?;

        report.restored_stash = self.restore_stash()?;
        self.advance(SyncPhase::Restored);

        self.callbacks.on_step(&SyncStep::Completed);
        self.advance(SyncPhase::Done);
        Ok(report)
    }

    fn check_preconditions(&self) -> Result<(), SyncFailure> {
        let (path, log) = (self.path, self.log);

        self.step(SyncStep::CheckingRepository, || {
            if git::is_inside_work_tree(path, log)? {
                Ok(())
            } else {
                Err(SyncError::NotARepository {
                    path: path.to_path_buf(),
                }
                .into())
            }
        })?;

        for remote in [&self.config.upstream_remote, &self.config.origin_remote] {
            let url = self.step(
                SyncStep::CheckingRemote {
                    remote: remote.clone(),
                },
                || {
                    git::remote_url(path, remote, log)?.ok_or_else(|| {
                        anyhow::Error::from(SyncError::RemoteNotFound {
                            remote: remote.clone(),
                        })
                    })
                },
            )?;
            self.callbacks.on_remote_resolved(remote, &url);
        }

        for branch in [&self.config.main_branch, &self.config.dev_branch] {
            self.step(
                SyncStep::CheckingBranch {
                    branch: branch.clone(),
                },
                || {
                    if git::local_branch_exists(path, branch, log)? {
                        Ok(())
                    } else {
                        Err(SyncError::BranchNotFound {
                            branch: branch.clone(),
                        }
                        .into())
                    }
                },
            )?;
        }
        Ok(())
    }

    fn guard_working_tree(&self) -> Result<Option<StashHandle>, SyncFailure> {
        let (path, log) = (self.path, self.log);
        let auto_stash = self.config.auto_stash;

        let is_dirty = self.step(SyncStep::CheckingChanges, || {
            let dirty = git::has_uncommitted_changes(path, log)?;
            if dirty && !auto_stash {
                return Err(SyncError::UncommittedChanges.into());
            }
            Ok(dirty)
        })?;

        if !is_dirty {
            return Ok(None);
        }

        let label = StashHandle::new_label();
        let created = self.step(SyncStep::Stashing, || git::stash_push(path, &label, log))?;
        Ok(created.then_some(StashHandle { label }))
    }

    /// Fetches both remotes and returns origin's dev commit as observed
    /// right after the fetch. That commit is the lease for the dev push.
    fn fetch(&self) -> Result<Option<String>, SyncFailure> {
        let (path, log, config) = (self.path, self.log, self.config);

        self.step(
            SyncStep::Fetching {
                remote: config.upstream_remote.clone(),
            },
            || git::fetch_prune(path, &config.upstream_remote, log),
        )?;

        self.step(
            SyncStep::Fetching {
                remote: config.origin_remote.clone(),
            },
            || {
                git::fetch_prune(path, &config.origin_remote, log)?;
                let tracking =
                    format!("refs/remotes/{}/{}", config.origin_remote, config.dev_branch);
                git::resolve_commit(path, &tracking, log)
            },
        )
    }

    fn sync_main(&self) -> Result<(), SyncFailure> {
        let (path, log, config) = (self.path, self.log, self.config);

        self.step(
            SyncStep::CheckingOut {
                branch: config.main_branch.clone(),
            },
            || git::checkout(path, &config.main_branch, log),
        )?;

        self.step(
            SyncStep::ResettingMain {
                target: config.upstream_main(),
            },
            || git::reset_hard(path, &config.upstream_main_ref(), log),
        )
    }

    fn rebase_dev(&self) -> Result<(), SyncFailure> {
        let (path, log, config) = (self.path, self.log, self.config);

        self.step(
            SyncStep::CheckingOut {
                branch: config.dev_branch.clone(),
            },
            || git::checkout(path, &config.dev_branch, log),
        )?;

        self.step(
            SyncStep::Rebasing {
                onto: config.main_branch.clone(),
            },
            || {
                let Err(e) = git::rebase(path, &config.main_ref(), log) else {
                    return Ok(());
                };
                if git::rebase_in_progress(path, log)? {
                    Err(SyncError::RebaseConflict {
                        branch: config.dev_branch.clone(),
                        onto: config.main_branch.clone(),
                    }
                    .into())
                } else {
                    Err(e)
                }
            },
        )
    }

    fn publish(&self, observed_dev: Option<&str>) -> Result<(), SyncFailure> {
        let (path, log, config) = (self.path, self.log, self.config);
        let remote = &config.origin_remote;

        let rejected = |branch: &str, e: anyhow::Error| -> anyhow::Error {
            SyncError::PushRejected {
                remote: remote.clone(),
                branch: branch.to_string(),
                detail: e.root_cause().to_string(),
            }
            .into()
        };

        self.step(
            SyncStep::Pushing {
                remote: remote.clone(),
                branch: config.main_branch.clone(),
            },
            || {
                git::push(path, remote, &config.main_branch, log)
                    .map_err(|e| rejected(&config.main_branch, e))
            },
        )?;

        self.step(
            SyncStep::Pushing {
                remote: remote.clone(),
                branch: config.dev_branch.clone(),
            },
            || {
                git::push_force_with_lease(path, remote, &config.dev_branch, observed_dev, log)
                    .map_err(|e| rejected(&config.dev_branch, e))
            },
        )
    }

    fn collect_report(&self) -> Result<SyncReport, SyncFailure> {
        let (path, log, config) = (self.path, self.log, self.config);

        self.step(SyncStep::Reporting, || {
            Ok(SyncReport {
                main_branch: config.main_branch.clone(),
                main_short: git::short_hash(path, &config.main_ref(), log)?,
                dev_branch: config.dev_branch.clone(),
                dev_short: git::short_hash(path, &config.dev_ref(), log)?,
                recent_commits: git::recent_log(path, &config.dev_ref(), REPORT_LOG_LIMIT, log)?,
                restored_stash: None,
            })
        })
    }

    /// Pops the stash created by the guard step. Once the pop has been
    /// attempted the obligation is discharged: a conflicted pop leaves the
    /// entry for manual resolution and is not reported as still pending.
    fn restore_stash(&mut self) -> Result<Option<String>, SyncFailure> {
        let Some(handle) = self.stash.take() else {
            return Ok(None);
        };
        let (path, log) = (self.path, self.log);

        self.step(SyncStep::RestoringStash, || {
            let stash_ref = git::find_stash(path, &handle.label, log)?.ok_or_else(|| {
                anyhow::anyhow!("stash entry '{}' is no longer present", handle.label)
            })?;
            git::stash_pop(path, &stash_ref, log).map_err(|_| {
                anyhow::Error::from(SyncError::StashRestoreConflict {
                    stash: stash_ref.clone(),
                    label: handle.label.clone(),
                })
            })
        })?;

        Ok(Some(handle.label))
    }
}
