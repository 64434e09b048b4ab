//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the only doorway to Git. No other module imports `git2`
//! or runs the `git` executable.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - Current branch lookup
//! - Remote enumeration and URL lookup
//! - Pushing (optionally forced) through the `git` CLI
//!
//! # Example
//!
//! ```ignore
//! use gl_unprotect::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let remote = git.pick_remote()?;
//! let branch = git.current_branch()?;
//! git.push(&remote, &branch, true)?;
//! ```

mod interface;

pub use interface::{push_in, Git, GitError};
