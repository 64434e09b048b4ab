//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves the target remote, branch, and token
//! 2. Calls the GitLab client or the protection orchestrator
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! GitLab calls are async. Handlers are synchronous and drive them with a
//! short-lived tokio runtime.

mod auth;
mod completion;
mod protection;
mod push;
mod status;
mod target;

pub use auth::auth;
pub use completion::completion;
pub use protection::{protect, unprotect};
pub use push::push;
pub use status::{list_all, status};
pub use target::{resolve_remote, resolve_token, token_store, Target, TOKEN_ENV};

use crate::cli::args::Command;
use crate::cli::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Push {
            remote,
            branch,
            dry_run,
        } => push::push(ctx, &remote, branch.as_deref(), dry_run),
        Command::Status {
            remote,
            branch,
            all,
        } => status::status(ctx, &remote, branch.as_deref(), all),
        Command::Unprotect { remote, branch } => {
            protection::unprotect(ctx, &remote, branch.as_deref())
        }
        Command::Protect {
            remote,
            branch,
            push_level,
            merge_level,
            unprotect_level,
        } => protection::protect(
            ctx,
            &remote,
            branch.as_deref(),
            push_level,
            merge_level,
            unprotect_level,
        ),
        Command::Auth {
            host,
            token,
            status,
            logout,
        } => auth::auth(ctx, host.as_deref(), token.as_deref(), status, logout),
        Command::Completion { shell } => completion::completion(shell),
    }
}
