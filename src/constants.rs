//! Application-wide constants.
//!
//! Defaults and environment variable names for the sync workflow.

/// Environment variables that override the defaults below.
pub const UPSTREAM_REMOTE_VAR: &str = "UPSTREAM_REMOTE";
pub const ORIGIN_REMOTE_VAR: &str = "ORIGIN_REMOTE";
pub const MAIN_BRANCH_VAR: &str = "MAIN_BRANCH";
pub const DEV_BRANCH_VAR: &str = "DEV_BRANCH";
pub const AUTO_STASH_VAR: &str = "AUTO_STASH";

pub const DEFAULT_UPSTREAM_REMOTE: &str = "upstream";
pub const DEFAULT_ORIGIN_REMOTE: &str = "origin";
pub const DEFAULT_MAIN_BRANCH: &str = "main";
pub const DEFAULT_DEV_BRANCH: &str = "sky/dev";

/// Number of dev commits listed in the final report.
pub const REPORT_LOG_LIMIT: usize = 10;

/// Prefix of the message given to stashes created by this tool.
pub const STASH_LABEL_PREFIX: &str = "git-sync-dev autostash";

/// Timestamp format appended to the stash label.
pub const STASH_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Name shown when the repository directory name cannot be determined.
pub const DEFAULT_REPO_NAME: &str = "repository";

/// Progress spinner tick interval in milliseconds.
pub const PROGRESS_TICK_MS: u64 = 80;
