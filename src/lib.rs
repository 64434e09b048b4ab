//! gl-unprotect - force-push to protected GitLab branches
//!
//! Temporarily lifts a branch's GitLab protection, runs a privileged action
//! (normally `git push --force`), and restores the original protection,
//! whether or not the action succeeded.
//!
//! # Architecture
//!
//! - [`remote`] - Parse git remote URLs into a GitLab project identity
//! - [`gitlab`] - GitLab v4 protected-branch client and in-memory mock
//! - [`protect`] - Snapshot / unprotect / act / restore orchestration
//! - [`git`] - Single interface for Git operations
//! - [`secrets`] - Per-host token storage
//! - [`config`] - Configuration schema and loading
//! - [`cli`] - Command-line interface layer
//! - [`ui`] - User interaction utilities
//! - [`logging`] - `tracing` subscriber setup
//!
//! # Correctness Invariants
//!
//! 1. Every successful unprotect is followed by a restore attempt
//! 2. The action outcome and the restore outcome are reported separately
//! 3. Tokens never appear in logs, output, or error messages

pub mod cli;
pub mod config;
pub mod git;
pub mod gitlab;
pub mod logging;
pub mod protect;
pub mod remote;
pub mod secrets;
pub mod ui;
