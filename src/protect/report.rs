//! protect::report
//!
//! Outcome of one protection cycle.

use std::fmt;

use thiserror::Error;

use crate::gitlab::{GitLabError, ProtectBranchPayload, ProtectedBranch};

/// Failure of the privileged action.
///
/// Independent of restoration: an action error never prevents the restore
/// attempt.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The action ran and reported failure.
    #[error("action failed: {0}")]
    Failed(String),

    /// The action could not be started or its I/O failed.
    #[error("action I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The action panicked.
    #[error("action panicked: {0}")]
    Panicked(String),
}

/// What happened when re-protecting the branch.
#[derive(Debug, Clone)]
pub enum RestoreOutcome {
    /// Protection was re-created from the snapshot.
    Restored(ProtectedBranch),
    /// The branch was not protected before the run; nothing to restore.
    Skipped,
    /// The restore call failed. The branch is left unprotected.
    Failed {
        /// Payload that should have been applied
        payload: ProtectBranchPayload,
        /// Error from GitLab
        error: GitLabError,
    },
}

impl RestoreOutcome {
    /// Whether this outcome leaves the branch in its original state.
    pub fn is_ok(&self) -> bool {
        !matches!(self, RestoreOutcome::Failed { .. })
    }
}

impl fmt::Display for RestoreOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestoreOutcome::Restored(rule) => write!(f, "restored protection on '{}'", rule.name),
            RestoreOutcome::Skipped => write!(f, "skipped (branch was not protected)"),
            RestoreOutcome::Failed { payload, error } => write!(
                f,
                "FAILED to restore protection on '{}' (push: {}, merge: {}, unprotect: {}): {}",
                payload.name,
                payload.push_access_level,
                payload.merge_access_level,
                payload.unprotect_access_level,
                error
            ),
        }
    }
}

/// Two-part report of a protection cycle.
///
/// The action outcome and the restore outcome are kept apart so callers can
/// report both.
#[derive(Debug)]
pub struct ProtectionReport<T> {
    /// Branch the cycle ran against
    pub branch: String,
    /// Protection captured before unprotecting, if any
    pub snapshot: Option<ProtectedBranch>,
    /// Result of the privileged action
    pub action: Result<T, ActionError>,
    /// Result of re-protecting the branch
    pub restore: RestoreOutcome,
}

impl<T> ProtectionReport<T> {
    /// Whether the privileged action succeeded.
    pub fn action_succeeded(&self) -> bool {
        self.action.is_ok()
    }

    /// Whether protection is back to how it was before the run.
    pub fn restored(&self) -> bool {
        self.restore.is_ok()
    }

    /// Whether both parts succeeded.
    pub fn is_success(&self) -> bool {
        self.action_succeeded() && self.restored()
    }

    /// Whether the branch was protected before the run.
    pub fn was_protected(&self) -> bool {
        self.snapshot.is_some()
    }
}
