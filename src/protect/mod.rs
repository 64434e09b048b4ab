//! protect
//!
//! Lift branch protection around a privileged action, then restore it.
//!
//! # State machine
//!
//! ```text
//! Idle -> Snapshotting -> Unprotected -> ActionRunning -> Restoring -> Done
//!              |               |                              |
//!              +-------------> Failed <-----------------------+
//! ```
//!
//! - Snapshotting reads the current rule. A 404 means "not protected".
//! - Unprotected is reached after the DELETE (skipped when there is no rule).
//! - The action runs under `catch_unwind`; its result never blocks restore.
//! - Restoring collapses each access list to its lowest level and POSTs it.
//!
//! Failing before the action (snapshot or unprotect) returns an
//! [`OrchestratorError`]. Once the action has run, the outcome is always a
//! [`ProtectionReport`] carrying the action and restore results separately.

mod report;

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::gitlab::{GitLabError, ProjectId, ProtectedBranch, ProtectedBranchApi};

pub use report::{ActionError, ProtectionReport, RestoreOutcome};

/// Orchestrator lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    Snapshotting,
    Unprotected,
    ActionRunning,
    Restoring,
    Done,
    Failed,
}

impl std::fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OrchestratorState::Idle => "idle",
            OrchestratorState::Snapshotting => "snapshotting",
            OrchestratorState::Unprotected => "unprotected",
            OrchestratorState::ActionRunning => "action-running",
            OrchestratorState::Restoring => "restoring",
            OrchestratorState::Done => "done",
            OrchestratorState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Errors that abort the cycle before the action runs.
///
/// In both cases the branch protection is unchanged.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("failed to read protection for '{branch}': {source}")]
    Snapshot {
        branch: String,
        #[source]
        source: GitLabError,
    },

    #[error("failed to unprotect '{branch}': {source}")]
    Unprotect {
        branch: String,
        #[source]
        source: GitLabError,
    },

    /// `run` was called on an orchestrator that already ran.
    #[error("orchestrator already used (state: {0})")]
    AlreadyRun(OrchestratorState),
}

/// Runs one unprotect/action/restore cycle against a project.
pub struct ProtectionOrchestrator<'a> {
    api: &'a dyn ProtectedBranchApi,
    project: ProjectId,
    state: OrchestratorState,
    history: Vec<OrchestratorState>,
}

impl<'a> ProtectionOrchestrator<'a> {
    pub fn new(api: &'a dyn ProtectedBranchApi, project: ProjectId) -> Self {
        Self {
            api,
            project,
            state: OrchestratorState::Idle,
            history: vec![OrchestratorState::Idle],
        }
    }

    /// Current state.
    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    /// Every state entered so far, in order.
    pub fn history(&self) -> &[OrchestratorState] {
        &self.history
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    fn transition(&mut self, next: OrchestratorState) {
        debug!(from = %self.state, to = %next, project = %self.project, "orchestrator transition");
        self.state = next;
        self.history.push(next);
    }

    /// Run `action` with protection on `branch` lifted.
    ///
    /// # Errors
    ///
    /// Only failures before the action runs are errors. A failing or
    /// panicking action and a failed restore are reported in the returned
    /// [`ProtectionReport`].
    #[instrument(level = "info", skip(self, action), fields(project = %self.project))]
    pub async fn run<F, Fut, T>(
        &mut self,
        branch: &str,
        action: F,
    ) -> Result<ProtectionReport<T>, OrchestratorError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ActionError>>,
    {
        if self.state != OrchestratorState::Idle {
            return Err(OrchestratorError::AlreadyRun(self.state));
        }

        self.transition(OrchestratorState::Snapshotting);
        let snapshot = match self.api.get_branch_protection(&self.project, branch).await {
            Ok(rule) => {
                debug!(branch, ?rule, "captured protection snapshot");
                Some(rule)
            }
            Err(e) if e.is_not_found() => {
                info!(branch, "branch is not protected");
                None
            }
            Err(source) => {
                self.transition(OrchestratorState::Failed);
                return Err(OrchestratorError::Snapshot {
                    branch: branch.to_string(),
                    source,
                });
            }
        };

        if snapshot.is_some() {
            if let Err(source) = self.api.unprotect_branch(&self.project, branch).await {
                self.transition(OrchestratorState::Failed);
                return Err(OrchestratorError::Unprotect {
                    branch: branch.to_string(),
                    source,
                });
            }
            info!(branch, "protection lifted");
        }
        self.transition(OrchestratorState::Unprotected);

        self.transition(OrchestratorState::ActionRunning);
        let action = match AssertUnwindSafe(async move { action().await })
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(payload) => Err(ActionError::Panicked(panic_message(payload))),
        };
        match &action {
            Ok(_) => info!(branch, "privileged action succeeded"),
            Err(e) => warn!(branch, error = %e, "privileged action failed"),
        }

        self.transition(OrchestratorState::Restoring);
        let restore = self.restore(snapshot.as_ref()).await;
        if restore.is_ok() {
            self.transition(OrchestratorState::Done);
        } else {
            self.transition(OrchestratorState::Failed);
        }

        Ok(ProtectionReport {
            branch: branch.to_string(),
            snapshot,
            action,
            restore,
        })
    }

    async fn restore(&self, snapshot: Option<&ProtectedBranch>) -> RestoreOutcome {
        let Some(snapshot) = snapshot else {
            debug!("no snapshot, skipping restore");
            return RestoreOutcome::Skipped;
        };

        let payload = snapshot.to_payload();
        match self.api.protect_branch(&self.project, &payload).await {
            Ok(rule) => {
                info!(
                    branch = %payload.name,
                    push = %payload.push_access_level,
                    merge = %payload.merge_access_level,
                    "protection restored"
                );
                RestoreOutcome::Restored(rule)
            }
            Err(error) => {
                warn!(branch = %payload.name, %error, "failed to restore protection");
                RestoreOutcome::Failed { payload, error }
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
