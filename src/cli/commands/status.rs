//! cli::commands::status
//!
//! Show protection for one branch or for the whole project.

use anyhow::{Context as _, Result};

use super::target::Target;
use crate::cli::args::RemoteArgs;
use crate::cli::Context;
use crate::gitlab::{
    GitLabError, ListProtectedBranchesQuery, ProjectId, ProtectedBranch, ProtectedBranchApi,
};
use crate::ui::output;

/// GitLab's maximum page size.
const PAGE_SIZE: u32 = 100;

/// Run the status command.
pub fn status(ctx: &Context, args: &RemoteArgs, branch: Option<&str>, all: bool) -> Result<()> {
    let target = Target::resolve(ctx, args.remote.as_deref(), branch)?;
    let client = target.client(ctx, args)?;
    let project = target.project();
    let verbosity = ctx.verbosity();

    let rt = tokio::runtime::Runtime::new()?;
    if all {
        let rules = rt
            .block_on(list_all(&client, &project))
            .context("failed to list protected branches")?;
        if rules.is_empty() {
            output::print(format!("No protected branches in {}.", project), verbosity);
        }
        for rule in &rules {
            output::print(output::format_rule(rule), verbosity);
        }
        return Ok(());
    }

    match rt.block_on(client.get_branch_protection(&project, &target.branch)) {
        Ok(rule) => output::print(output::format_rule(&rule), verbosity),
        Err(e) if e.is_not_found() => output::print(
            format!("'{}' is not protected in {}.", target.branch, project),
            verbosity,
        ),
        Err(e) => return Err(e).context("failed to read branch protection"),
    }
    Ok(())
}

/// Fetch every page of protected branches.
pub async fn list_all(
    api: &dyn ProtectedBranchApi,
    project: &ProjectId,
) -> Result<Vec<ProtectedBranch>, GitLabError> {
    let mut rules = Vec::new();
    let mut page = 1;
    loop {
        let query = ListProtectedBranchesQuery {
            search: None,
            per_page: Some(PAGE_SIZE),
            page: Some(page),
        };
        let batch = api.list_protected_branches(project, &query).await?;
        let done = batch.len() < PAGE_SIZE as usize;
        rules.extend(batch);
        if done {
            return Ok(rules);
        }
        page += 1;
    }
}
