//! git::interface
//!
//! Git interface implementation.
//!
//! Reads (HEAD, remotes) go through `git2`. Pushing shells out to the `git`
//! CLI so the user's credential helpers, SSH agent, and hooks apply exactly as
//! they would for a manual push.
//!
//! # Error Handling
//!
//! - [`GitError::NotARepo`]: not inside a Git repository
//! - [`GitError::DetachedHead`]: HEAD does not point at a branch
//! - [`GitError::NoRemotes`]: the repository has no remotes
//! - [`GitError::RemoteNotFound`]: a named remote does not exist
//! - [`GitError::PushFailed`]: `git push` exited non-zero

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::debug;

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// HEAD is detached or unborn.
    #[error("HEAD is not on a branch")]
    DetachedHead,

    /// The repository has no remotes.
    #[error("repository has no remotes")]
    NoRemotes,

    /// The named remote does not exist or has no URL.
    #[error("remote not found: {name}")]
    RemoteNotFound {
        /// Remote name
        name: String,
    },

    /// `git push` failed.
    #[error("git push failed ({status}): {stderr}")]
    PushFailed {
        /// Exit status description
        status: String,
        /// Captured stderr
        stderr: String,
    },

    /// The `git` executable could not be run.
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

/// The Git interface.
///
/// Wraps a discovered, non-bare repository.
pub struct Git {
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover` to find the repository root, so
    /// `path` can be any directory within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// The working directory of the repository.
    pub fn work_dir(&self) -> Result<&Path, GitError> {
        self.repo.workdir().ok_or(GitError::BareRepo)
    }

    /// Get the current branch name.
    ///
    /// # Errors
    ///
    /// [`GitError::DetachedHead`] if HEAD is detached or unborn.
    pub fn current_branch(&self) -> Result<String, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => {
                return Err(GitError::DetachedHead)
            }
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(name.to_string());
            }
        }

        Err(GitError::DetachedHead)
    }

    /// Names of all configured remotes.
    pub fn list_remotes(&self) -> Result<Vec<String>, GitError> {
        let remotes = self.repo.remotes()?;
        Ok(remotes.iter().flatten().map(String::from).collect())
    }

    /// Get the URL for a remote.
    ///
    /// Returns `None` if the remote doesn't exist.
    pub fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Pick the remote to operate on: `origin` if present, else the first.
    pub fn pick_remote(&self) -> Result<String, GitError> {
        pick_from(self.list_remotes()?).ok_or(GitError::NoRemotes)
    }

    /// Push `branch` to `remote`, returning git's stdout.
    ///
    /// Runs `git push [--force] <remote> <branch>` in the working directory.
    pub fn push(&self, remote: &str, branch: &str, force: bool) -> Result<String, GitError> {
        push_in(self.work_dir()?, remote, branch, force)
    }
}

/// Run `git push [--force] <remote> <branch>` in `work_dir`.
///
/// Blocks until git exits. Takes a plain path so it can run on a blocking
/// thread without the non-`Sync` repository handle.
pub fn push_in(
    work_dir: &Path,
    remote: &str,
    branch: &str,
    force: bool,
) -> Result<String, GitError> {
    let mut args = vec!["push"];
    if force {
        args.push("--force");
    }
    args.push(remote);
    args.push(branch);

    debug!(?args, dir = %work_dir.display(), "running git");
    let output = Command::new("git")
        .args(&args)
        .current_dir(work_dir)
        .output()?;

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !output.status.success() {
        return Err(GitError::PushFailed {
            status: output.status.to_string(),
            stderr,
        });
    }
    if !stderr.is_empty() {
        // git reports push progress on stderr
        debug!(%stderr, "git push stderr");
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn pick_from(remotes: Vec<String>) -> Option<String> {
    if remotes.iter().any(|r| r == "origin") {
        return Some("origin".to_string());
    }
    remotes.into_iter().next()
}
