//! cli::commands::protection
//!
//! Manual `protect` and `unprotect`.

use anyhow::{Context as _, Result};

use super::target::Target;
use crate::cli::args::RemoteArgs;
use crate::cli::Context;
use crate::gitlab::{AccessLevel, ProtectBranchPayload, ProtectedBranchApi};
use crate::ui::output;

/// Remove protection from a branch.
pub fn unprotect(ctx: &Context, args: &RemoteArgs, branch: Option<&str>) -> Result<()> {
    let target = Target::resolve(ctx, args.remote.as_deref(), branch)?;
    let client = target.client(ctx, args)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(client.unprotect_branch(&target.project(), &target.branch))
        .with_context(|| format!("failed to unprotect '{}'", target.branch))?;

    output::print(
        format!("'{}' is no longer protected.", target.branch),
        ctx.verbosity(),
    );
    Ok(())
}

/// Protect a branch with explicit levels.
pub fn protect(
    ctx: &Context,
    args: &RemoteArgs,
    branch: Option<&str>,
    push: AccessLevel,
    merge: AccessLevel,
    unprotect: AccessLevel,
) -> Result<()> {
    let target = Target::resolve(ctx, args.remote.as_deref(), branch)?;
    let client = target.client(ctx, args)?;
    let payload =
        ProtectBranchPayload::new(target.branch.clone(), push, merge).with_unprotect_level(unprotect);

    let rt = tokio::runtime::Runtime::new()?;
    let rule = rt
        .block_on(client.protect_branch(&target.project(), &payload))
        .with_context(|| format!("failed to protect '{}'", target.branch))?;

    output::print(
        format!("Protected {}", output::format_rule(&rule)),
        ctx.verbosity(),
    );
    Ok(())
}
