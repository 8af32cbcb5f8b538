//! Fork maintenance workflow library.
//!
//! This crate keeps a personal fork in step with its upstream by:
//! - Checking that the repository, remotes and branches exist
//! - Refusing to run on a dirty tree, or stashing it when asked to
//! - Fetching both remotes and hard-resetting main to upstream's main
//! - Rebasing the dev branch onto main
//! - Pushing main, then force-pushing dev with a lease
//! - Reporting the result and restoring the stash

pub mod config;
pub mod constants;
pub mod error;
pub mod git;
pub mod output;
pub mod sync;
