//! cli::commands::target
//!
//! Resolution of the GitLab project, branch, and token a command acts on.

use anyhow::{anyhow, bail, Context as _, Result};
use tracing::debug;

use crate::cli::args::RemoteArgs;
use crate::cli::Context;
use crate::config;
use crate::git::Git;
use crate::gitlab::{GitLabClient, ProjectId};
use crate::remote::{parse_remote_url, redact_url, RemoteIdentity};
use crate::secrets::{FileTokenStore, TokenStore};
use crate::ui::{output, prompts};

/// Environment variable consulted for a token when `--token` is absent.
pub const TOKEN_ENV: &str = "GITLAB_TOKEN";

/// Dotenv file at the repository root that may also set [`TOKEN_ENV`].
pub const ENV_FILE: &str = ".env";

/// Repository-side half of a target: which remote and which branch.
#[derive(Debug)]
pub struct Target {
    pub git: Git,
    pub remote_name: String,
    pub remote: RemoteIdentity,
    pub branch: String,
}

impl Target {
    /// Resolve the remote and branch from flags, config, and the repository.
    ///
    /// Remote: `--remote`, then config `remote`, then `origin`, then the first
    /// remote. Branch: `--branch`, then the current branch.
    pub fn resolve(ctx: &Context, remote: Option<&str>, branch: Option<&str>) -> Result<Self> {
        let git = Git::open(&ctx.work_dir()?)?;
        let (remote_name, remote) = resolve_remote(ctx, &git, remote)?;

        let branch = match branch {
            Some(b) => b.to_string(),
            None => git
                .current_branch()
                .context("cannot determine current branch; pass --branch")?,
        };

        debug!(%remote_name, %remote, %branch, "resolved target");
        Ok(Self {
            git,
            remote_name,
            remote,
            branch,
        })
    }

    pub fn project(&self) -> ProjectId {
        ProjectId::from_remote(&self.remote)
    }

    /// API base for this target's host.
    pub fn api_base(&self, ctx: &Context) -> String {
        ctx.config.api_base(&self.remote)
    }

    /// Build a GitLab client, resolving the token.
    ///
    /// `GITLAB_TOKEN` from the process environment wins over the one in the
    /// repository's `.env`.
    pub fn client(&self, ctx: &Context, args: &RemoteArgs) -> Result<GitLabClient> {
        let store = token_store(ctx)?;
        let env = match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.is_empty() => Some(token),
            _ => self.env_file_token(ctx)?,
        };
        let token = resolve_token(ctx, &store, &self.remote.host, args.token.as_deref(), env)?;
        GitLabClient::with_reqwest(self.api_base(ctx), token, ctx.config.request_timeout())
            .context("failed to create GitLab client")
    }

    /// [`TOKEN_ENV`] as set in the repository's [`ENV_FILE`].
    ///
    /// An unreadable file is reported and skipped.
    fn env_file_token(&self, ctx: &Context) -> Result<Option<String>> {
        let path = self.git.work_dir()?.join(ENV_FILE);
        match config::env_file_value(&path, TOKEN_ENV) {
            Ok(Some(token)) => {
                debug!(path = %path.display(), "using token from {}", ENV_FILE);
                Ok(Some(token))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                output::warn(e, ctx.verbosity());
                Ok(None)
            }
        }
    }
}

/// Pick a remote and parse its URL.
pub fn resolve_remote(
    ctx: &Context,
    git: &Git,
    remote: Option<&str>,
) -> Result<(String, RemoteIdentity)> {
    let name = match remote.or_else(|| ctx.config.remote()) {
        Some(name) => name.to_string(),
        None => git.pick_remote()?,
    };
    let url = git
        .remote_url(&name)?
        .ok_or_else(|| anyhow!("remote '{}' not found", name))?;
    let identity = parse_remote_url(&url).ok_or_else(|| {
        anyhow!(
            "cannot determine GitLab project from remote '{}' ({})",
            name,
            redact_url(&url)
        )
    })?;
    Ok((name, identity))
}

/// Token store at the configured location.
pub fn token_store(ctx: &Context) -> Result<FileTokenStore> {
    Ok(FileTokenStore::with_path(ctx.config.token_file()?))
}

/// Warning text when the token file is readable by group or others.
fn permissions_warning(store: &FileTokenStore) -> Option<String> {
    match store.verify_permissions() {
        Ok(false) => Some(format!(
            "{} is accessible by other users; run 'chmod 600 {}'",
            store.path().display(),
            store.path().display()
        )),
        _ => None,
    }
}

/// Resolve a token for `host`.
///
/// Order: `--token`, `GITLAB_TOKEN`, the token store, then an interactive
/// prompt whose answer may be saved.
pub fn resolve_token(
    ctx: &Context,
    store: &FileTokenStore,
    host: &str,
    flag: Option<&str>,
    env: Option<String>,
) -> Result<String> {
    if let Some(token) = flag.filter(|t| !t.is_empty()) {
        debug!(host, "using token from --token");
        return Ok(token.to_string());
    }
    if let Some(token) = env.filter(|t| !t.is_empty()) {
        debug!(host, "using token from {}", TOKEN_ENV);
        return Ok(token);
    }
    if let Some(token) = store.get_token(host)? {
        debug!(host, path = %store.path().display(), "using stored token");
        if let Some(warning) = permissions_warning(store) {
            output::warn(warning, ctx.verbosity());
        }
        return Ok(token);
    }

    if !ctx.interactive {
        bail!(
            "no GitLab token for {}. Pass --token, set {}, or run 'gl-unprotect auth --host {}'",
            host,
            TOKEN_ENV,
            host
        );
    }

    let token = prompts::password(&format!("GitLab access token for {}", host), true)?;
    if !store.is_declined(host)? {
        let save = prompts::confirm(
            &format!("Save token to {}?", store.path().display()),
            true,
            true,
        )?;
        if save {
            store.set_token(host, &token)?;
            output::print(
                format!("Token saved to {}", store.path().display()),
                ctx.verbosity(),
            );
        } else {
            store.decline_token(host)?;
        }
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn non_interactive() -> Context {
        Context {
            interactive: false,
            ..Default::default()
        }
    }

    fn store() -> (TempDir, FileTokenStore) {
        let temp = TempDir::new().unwrap();
        let store = FileTokenStore::with_path(temp.path().join("settings.json"));
        (temp, store)
    }

    #[test]
    fn flag_beats_env_and_store() {
        let (_temp, store) = store();
        store.set_token("gitlab.com", "stored").unwrap();

        let token = resolve_token(
            &non_interactive(),
            &store,
            "gitlab.com",
            Some("flag"),
            Some("env".into()),
        )
        .unwrap();
        assert_eq!(token, "flag");
    }

    #[test]
    fn env_beats_store() {
        let (_temp, store) = store();
        store.set_token("gitlab.com", "stored").unwrap();

        let token =
            resolve_token(&non_interactive(), &store, "gitlab.com", None, Some("env".into()))
                .unwrap();
        assert_eq!(token, "env");
    }

    #[test]
    fn store_is_per_host() {
        let (_temp, store) = store();
        store.set_token("gitlab.example.com", "stored").unwrap();

        let token =
            resolve_token(&non_interactive(), &store, "gitlab.example.com", None, None).unwrap();
        assert_eq!(token, "stored");

        let err = resolve_token(&non_interactive(), &store, "gitlab.com", None, Some(String::new()))
            .unwrap_err();
        assert!(err.to_string().contains("no GitLab token for gitlab.com"));
    }

    #[cfg(unix)]
    #[test]
    fn loose_token_file_is_still_used_but_flagged() {
        use std::os::unix::fs::PermissionsExt;

        let (_temp, store) = store();
        store.set_token("gitlab.com", "stored").unwrap();
        assert_eq!(permissions_warning(&store), None);

        std::fs::set_permissions(store.path(), std::fs::Permissions::from_mode(0o644)).unwrap();
        let warning = permissions_warning(&store).expect("warning for 0644");
        assert!(warning.contains("chmod 600"));

        let token = resolve_token(&non_interactive(), &store, "gitlab.com", None, None).unwrap();
        assert_eq!(token, "stored");
    }
}
