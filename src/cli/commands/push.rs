//! cli::commands::push
//!
//! Force-push with branch protection lifted for the duration.
//!
//! # Output
//!
//! The report always has two lines, one for the push and one for the
//! restoration, so a failed restore is never hidden behind a successful
//! push (or the other way round). The command exits non-zero if either
//! part failed.

use anyhow::{bail, Context as _, Result};

use super::target::Target;
use crate::cli::args::RemoteArgs;
use crate::cli::Context;
use crate::git::{self, GitError};
use crate::gitlab::{GitLabError, ProtectedBranchApi};
use crate::protect::{
    ActionError, OrchestratorError, ProtectionOrchestrator, ProtectionReport, RestoreOutcome,
};
use crate::ui::output;

/// Run the push command.
pub fn push(ctx: &Context, args: &RemoteArgs, branch: Option<&str>, dry_run: bool) -> Result<()> {
    let target = Target::resolve(ctx, args.remote.as_deref(), branch)?;
    let client = target.client(ctx, args)?;

    let rt = tokio::runtime::Runtime::new()?;
    if dry_run {
        return rt.block_on(dry_run_impl(ctx, &target, &client));
    }

    let report = rt.block_on(push_impl(&target, &client))?;
    print_report(ctx, &target, &report);

    match (report.action_succeeded(), report.restored()) {
        (true, true) => Ok(()),
        (false, true) => bail!("push failed; protection is unchanged"),
        (_, false) => bail!(
            "protection on '{}' was NOT restored; re-create it in GitLab",
            report.branch
        ),
    }
}

async fn push_impl(
    target: &Target,
    api: &dyn ProtectedBranchApi,
) -> Result<ProtectionReport<String>> {
    let work_dir = target.git.work_dir()?.to_path_buf();
    let remote = target.remote_name.clone();
    let branch = target.branch.clone();

    let mut orchestrator = ProtectionOrchestrator::new(api, target.project());
    orchestrator
        .run(&target.branch, move || async move {
            tokio::task::spawn_blocking(move || git::push_in(&work_dir, &remote, &branch, true))
                .await
                .map_err(|e| ActionError::Panicked(e.to_string()))?
                .map_err(action_error)
        })
        .await
        .map_err(|e| lift_error(&target.branch, e))
}

/// Suffix for errors worth retrying as-is.
fn retry_hint(err: &GitLabError) -> &'static str {
    if err.is_transient() {
        " (transient; retrying may succeed)"
    } else {
        ""
    }
}

fn lift_error(branch: &str, err: OrchestratorError) -> anyhow::Error {
    let hint = match &err {
        OrchestratorError::Snapshot { source, .. } | OrchestratorError::Unprotect { source, .. } => {
            retry_hint(source)
        }
        OrchestratorError::AlreadyRun(_) => "",
    };
    anyhow::Error::new(err).context(format!("cannot lift protection on '{}'{}", branch, hint))
}

async fn dry_run_impl(ctx: &Context, target: &Target, api: &dyn ProtectedBranchApi) -> Result<()> {
    let verbosity = ctx.verbosity();
    let project = target.project();
    let rule = match api.get_branch_protection(&project, &target.branch).await {
        Ok(rule) => Some(rule),
        Err(e) if e.is_not_found() => None,
        Err(e) => return Err(e).context("failed to read branch protection"),
    };

    output::print(
        format!("Project: {} ({})", project, target.api_base(ctx)),
        verbosity,
    );
    match rule {
        Some(rule) => {
            let payload = rule.to_payload();
            output::print(format!("Current protection: {}", output::format_rule(&rule)), verbosity);
            output::print("Would:", verbosity);
            output::print(format!("  1. unprotect '{}'", target.branch), verbosity);
            output::print(
                format!("  2. git push --force {} {}", target.remote_name, target.branch),
                verbosity,
            );
            output::print(
                format!(
                    "  3. protect '{}' (push: {}, merge: {}, unprotect: {})",
                    payload.name,
                    payload.push_access_level,
                    payload.merge_access_level,
                    payload.unprotect_access_level
                ),
                verbosity,
            );
        }
        None => {
            output::print(format!("'{}' is not protected.", target.branch), verbosity);
            output::print(
                format!(
                    "Would: git push --force {} {}",
                    target.remote_name, target.branch
                ),
                verbosity,
            );
        }
    }
    Ok(())
}

fn action_error(err: GitError) -> ActionError {
    match err {
        GitError::Spawn(io) => ActionError::Io(io),
        other => ActionError::Failed(other.to_string()),
    }
}

fn print_report(ctx: &Context, target: &Target, report: &ProtectionReport<String>) {
    let verbosity = ctx.verbosity();

    match &report.action {
        Ok(stdout) => {
            if !stdout.is_empty() {
                output::print(stdout, verbosity);
            }
            output::print(
                format!(
                    "Push:    succeeded (git push --force {} {})",
                    target.remote_name, report.branch
                ),
                verbosity,
            );
        }
        Err(e) => output::error(format!("Push:    {}", e)),
    }

    match &report.restore {
        RestoreOutcome::Failed { error, .. } => {
            output::error(format!("Restore: {}{}", report.restore, retry_hint(error)))
        }
        outcome => output::print(format!("Restore: {}", outcome), verbosity),
    }
}
