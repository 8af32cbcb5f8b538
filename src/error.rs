//! Typed failures of the sync workflow.
//!
//! [`SyncError`] values travel inside `anyhow::Error`; use `downcast_ref` to
//! tell them apart from plain git command failures.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    NotARepository {
        path: PathBuf,
    },
    RemoteNotFound {
        remote: String,
    },
    BranchNotFound {
        branch: String,
    },
    UncommittedChanges,
    RebaseConflict {
        branch: String,
        onto: String,
    },
    PushRejected {
        remote: String,
        branch: String,
        detail: String,
    },
    StashRestoreConflict {
        stash: String,
        label: String,
    },
}

/// Broad failure classes. Every class exits with the same status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Precondition,
    DirtyTree,
    RebaseConflict,
    PushRejection,
    StashRestoreConflict,
}

impl FailureKind {
    /// Short tag shown in the failure diagnostic, e.g. `error[dirty-tree]:`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Precondition => "precondition",
            Self::DirtyTree => "dirty-tree",
            Self::RebaseConflict => "rebase-conflict",
            Self::PushRejection => "push-rejected",
            Self::StashRestoreConflict => "stash-conflict",
        }
    }
}

impl SyncError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotARepository { .. }
            | Self::RemoteNotFound { .. }
            | Self::BranchNotFound { .. } => FailureKind::Precondition,
            Self::UncommittedChanges => FailureKind::DirtyTree,
            Self::RebaseConflict { .. } => FailureKind::RebaseConflict,
            Self::PushRejected { .. } => FailureKind::PushRejection,
            Self::StashRestoreConflict { .. } => FailureKind::StashRestoreConflict,
        }
    }

    /// Command the operator can run to get unstuck, if there is one.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotARepository { .. } => {
                Some("run from inside the repository's working tree".to_string())
            }
            Self::RemoteNotFound { remote } => Some(format!("git remote add {} <url>", remote)),
            Self::BranchNotFound { branch } => Some(format!("git branch {} <start-point>", branch)),
            Self::UncommittedChanges => Some(
                "commit or stash your changes, or rerun with AUTO_STASH=1".to_string(),
            ),
            Self::RebaseConflict { .. } => Some(
                "resolve the conflicts, then `git rebase --continue`, or give up with `git rebase --abort`"
                    .to_string(),
            ),
            Self::PushRejected { remote, branch, .. } => Some(format!(
                "inspect `git log {0}/{1}` and rerun once {0}/{1} is reconciled",
                remote, branch
            )),
            Self::StashRestoreConflict { stash, .. } => Some(format!(
                "resolve the conflicts, then `git stash drop {}`",
                stash
            )),
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotARepository { path } => {
                write!(f, "{} is not inside a git working tree", path.display())
            }
            Self::RemoteNotFound { remote } => write!(f, "remote '{}' does not exist", remote),
            Self::BranchNotFound { branch } => {
                write!(f, "local branch '{}' does not exist", branch)
            }
            Self::UncommittedChanges => write!(f, "working tree has uncommitted changes"),
            Self::RebaseConflict { branch, onto } => {
                write!(f, "rebasing '{}' onto '{}' stopped on conflicts", branch, onto)
            }
            Self::PushRejected {
                remote,
                branch,
                detail,
            } => write!(f, "push of '{}' to '{}' was rejected: {}", branch, remote, detail),
            Self::StashRestoreConflict { stash, label } => write!(
                f,
                "restoring {} ({}) hit conflicts; the stash entry was kept",
                stash, label
            ),
        }
    }
}

impl std::error::Error for SyncError {}
