//! cli::commands::auth
//!
//! Manage stored GitLab tokens.
//!
//! Tokens are never printed, only whether one is stored.
//!
//! # Example
//!
//! ```bash
//! # Interactive (prompts for token)
//! gl-unprotect auth
//!
//! # Non-interactive
//! gl-unprotect auth --host gitlab.example.com --token glpat-xxxx
//!
//! # Check status
//! gl-unprotect auth --status
//!
//! # Remove stored token
//! gl-unprotect auth --host gitlab.example.com --logout
//! ```

use anyhow::{anyhow, bail, Context as _, Result};
use tracing::debug;

use super::target::{resolve_remote, token_store};
use crate::cli::Context;
use crate::git::Git;
use crate::secrets::{FileTokenStore, TokenStore};
use crate::ui::{output, prompts};

/// Run the auth command.
pub fn auth(
    ctx: &Context,
    host: Option<&str>,
    token: Option<&str>,
    status: bool,
    logout: bool,
) -> Result<()> {
    let store = token_store(ctx)?;

    if status && host.is_none() {
        return show_all(ctx, &store);
    }

    let host = match host {
        Some(h) => h.to_string(),
        None => match current_host(ctx) {
            Ok(host) => host,
            Err(e) if ctx.interactive => {
                debug!("no host from repository: {:#}", e);
                prompts::input("GitLab host [gitlab.com]", Some("gitlab.com"), true)?
            }
            Err(e) => bail!("{}; pass --host", e),
        },
    };

    if status {
        return show_status(ctx, &store, &host);
    }

    if logout {
        store
            .delete_token(&host)
            .context("failed to remove stored token")?;
        output::print(format!("Removed token for {}.", host), ctx.verbosity());
        return Ok(());
    }

    let token = match token {
        Some(t) => t.to_string(),
        None => prompts::password(&format!("GitLab access token for {}", host), ctx.interactive)
            .map_err(|e| anyhow!("{}; pass --token", e))?,
    };
    validate_token(&token)?;

    store.set_token(&host, &token).context("failed to store token")?;
    output::print(
        format!("Token for {} saved to {}.", host, store.path().display()),
        ctx.verbosity(),
    );
    Ok(())
}

/// Host of the current repository's remote.
fn current_host(ctx: &Context) -> Result<String> {
    let git = Git::open(&ctx.work_dir()?)?;
    let (_, remote) = resolve_remote(ctx, &git, None)?;
    Ok(remote.host)
}

fn show_status(ctx: &Context, store: &FileTokenStore, host: &str) -> Result<()> {
    let stored = store.get_token(host)?.is_some();
    if ctx.quiet {
        println!("{}", if stored { "authenticated" } else { "not_authenticated" });
    } else if stored {
        println!("Token stored for {}.", host);
    } else {
        println!("No token stored for {}.", host);
        println!("Run 'gl-unprotect auth --host {}' to add one.", host);
    }
    Ok(())
}

fn show_all(ctx: &Context, store: &FileTokenStore) -> Result<()> {
    let hosts = store.hosts()?;
    if hosts.is_empty() {
        output::print(
            format!("No tokens stored in {}.", store.path().display()),
            ctx.verbosity(),
        );
        return Ok(());
    }
    for host in hosts {
        let state = if store.get_token(&host)?.is_some() {
            "token stored"
        } else {
            "declined"
        };
        println!("{}: {}", host, state);
    }
    Ok(())
}

/// Basic token format checks. No network access.
fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        bail!("Token cannot be empty.");
    }
    if token.chars().any(char::is_whitespace) {
        bail!("Token should not contain whitespace.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_token_rules() {
        assert!(validate_token("glpat-abcdef123456").is_ok());
        assert!(validate_token("").is_err());
        assert!(validate_token("glpat abc").is_err());
        assert!(validate_token("glpat-abc\n").is_err());
    }
}
