//! Runtime configuration: output verbosity plus the remotes and branches
//! the workflow operates on.

use crate::constants::{
    AUTO_STASH_VAR, DEFAULT_DEV_BRANCH, DEFAULT_MAIN_BRANCH, DEFAULT_ORIGIN_REMOTE,
    DEFAULT_UPSTREAM_REMOTE, DEV_BRANCH_VAR, MAIN_BRANCH_VAR, ORIGIN_REMOTE_VAR,
    UPSTREAM_REMOTE_VAR,
};
use crate::git::{self, GitLogger};

/// Runtime configuration derived from the environment and CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Controls the verbosity level of CLI output.
    pub verbosity: Verbosity,
    pub upstream_remote: String,
    pub origin_remote: String,
    pub main_branch: String,
    pub dev_branch: String,
    /// Stash uncommitted changes instead of refusing to run.
    pub auto_stash: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            upstream_remote: DEFAULT_UPSTREAM_REMOTE.to_string(),
            origin_remote: DEFAULT_ORIGIN_REMOTE.to_string(),
            main_branch: DEFAULT_MAIN_BRANCH.to_string(),
            dev_branch: DEFAULT_DEV_BRANCH.to_string(),
            auto_stash: false,
        }
    }
}

impl Config {
    /// Builds the configuration from the process environment.
    pub fn from_env(verbosity: Verbosity) -> anyhow::Result<Self> {
        Self::from_lookup(verbosity, |name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset. Names are validated here so that a
    /// bad override fails before any git command runs.
    pub fn from_lookup<F>(verbosity: Verbosity, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str, default: &str| -> anyhow::Result<String> {
            let value = lookup(name)
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| default.to_string());
            git::validate_ref_name(&value)
                .map_err(|e| anyhow::anyhow!("{}: {}", name, e))?;
            Ok(value)
        };

        let auto_stash = match lookup(AUTO_STASH_VAR).filter(|v| !v.trim().is_empty()) {
            Some(raw) => parse_flag(&raw)
                .ok_or_else(|| anyhow::anyhow!("{}: expected a boolean, got {:?}", AUTO_STASH_VAR, raw))?,
            None => false,
        };

        Ok(Self {
            verbosity,
            upstream_remote: get(UPSTREAM_REMOTE_VAR, DEFAULT_UPSTREAM_REMOTE)?,
            origin_remote: get(ORIGIN_REMOTE_VAR, DEFAULT_ORIGIN_REMOTE)?,
            main_branch: get(MAIN_BRANCH_VAR, DEFAULT_MAIN_BRANCH)?,
            dev_branch: get(DEV_BRANCH_VAR, DEFAULT_DEV_BRANCH)?,
            auto_stash,
        })
    }

    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    /// The remote-tracking ref main is reset to, e.g. `upstream/main`.
    #[must_use]
    pub fn upstream_main(&self) -> String {
        format!("{}/{}", self.upstream_remote, self.main_branch)
    }

    /// Fully qualified form of [`Config::upstream_main`], so a local branch
    /// or tag of the same short name cannot shadow it.
    #[must_use]
    pub fn upstream_main_ref(&self) -> String {
        format!("refs/remotes/{}", self.upstream_main())
    }

    #[must_use]
    pub fn main_ref(&self) -> String {
        format!("refs/heads/{}", self.main_branch)
    }

    #[must_use]
    pub fn dev_ref(&self) -> String {
        format!("refs/heads/{}", self.dev_branch)
    }

    /// Returns the appropriate git logger based on verbosity settings.
    ///
    /// Config only picks the callback; the logging itself lives in the git
    /// module.
    #[must_use]
    pub fn git_logger(&self) -> GitLogger {
        if self.is_verbose() {
            git::verbose_logger
        } else {
            git::no_op_logger
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Verbosity level for CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}
