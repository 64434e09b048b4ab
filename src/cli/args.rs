//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--interactive` / `--no-interactive`: Control prompts
//! - `--quiet` / `-q`: Minimal output

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::gitlab::AccessLevel;

/// Temporarily lift GitLab branch protection around a force-push
#[derive(Parser, Debug)]
#[command(name = "gl-unprotect")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if gl-unprotect was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; implies --no-interactive
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable interactive prompts
    #[arg(long = "interactive", global = true, conflicts_with = "no_interactive")]
    pub interactive_flag: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_interactive: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Determine if interactive mode is enabled.
    ///
    /// Returns true if:
    /// - `--interactive` was explicitly set, OR
    /// - Neither `--no-interactive` nor `--quiet` was set AND stdin is a TTY
    pub fn interactive(&self) -> bool {
        if self.interactive_flag {
            true
        } else if self.no_interactive || self.quiet {
            false
        } else {
            std::io::stdin().is_terminal()
        }
    }
}

/// Remote and credential selection shared by the GitLab commands.
#[derive(Args, Debug, Clone, Default)]
pub struct RemoteArgs {
    /// Git remote to use (default: config `remote`, then origin, then the first remote)
    #[arg(long)]
    pub remote: Option<String>,

    /// GitLab access token (default: GITLAB_TOKEN, then the token store)
    #[arg(long)]
    pub token: Option<String>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Force-push a branch with its protection temporarily lifted
    #[command(
        name = "push",
        long_about = "Force-push a branch with its protection temporarily lifted.\n\n\
            Reads the branch's current protection, removes it, runs \
            `git push --force <remote> <branch>`, then re-creates the protection. \
            Restoration is attempted even when the push fails.",
        after_help = "\
EXAMPLES:
    # Force-push the current branch to the default remote
    gl-unprotect push

    # Force-push a specific branch to a specific remote
    gl-unprotect push --remote gitlab --branch main

    # Show what would happen without changing anything
    gl-unprotect push --dry-run"
    )]
    Push {
        #[command(flatten)]
        remote: RemoteArgs,

        /// Branch to push (default: current branch)
        #[arg(long)]
        branch: Option<String>,

        /// Show the current protection and the planned steps without changing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show branch protection
    Status {
        #[command(flatten)]
        remote: RemoteArgs,

        /// Branch to inspect (default: current branch)
        #[arg(long, conflicts_with = "all")]
        branch: Option<String>,

        /// List every protected branch of the project
        #[arg(long)]
        all: bool,
    },

    /// Remove protection from a branch
    Unprotect {
        #[command(flatten)]
        remote: RemoteArgs,

        /// Branch to unprotect (default: current branch)
        #[arg(long)]
        branch: Option<String>,
    },

    /// Protect a branch
    #[command(after_help = "\
ACCESS LEVELS:
    no-one (0), developer (30), maintainer (40), admin (60)

EXAMPLES:
    gl-unprotect protect --branch main --push maintainer --merge developer")]
    Protect {
        #[command(flatten)]
        remote: RemoteArgs,

        /// Branch to protect (default: current branch)
        #[arg(long)]
        branch: Option<String>,

        /// Who may push
        #[arg(long = "push", value_name = "LEVEL")]
        push_level: AccessLevel,

        /// Who may merge
        #[arg(long = "merge", value_name = "LEVEL")]
        merge_level: AccessLevel,

        /// Who may unprotect
        #[arg(long = "unprotect", value_name = "LEVEL", default_value = "no-one")]
        unprotect_level: AccessLevel,
    },

    /// Manage stored GitLab tokens
    #[command(after_help = "\
EXAMPLES:
    # Store a token for the current repository's GitLab host (prompts)
    gl-unprotect auth

    # Store a token non-interactively
    gl-unprotect auth --host gitlab.example.com --token glpat-xxxx

    # Show which hosts have tokens
    gl-unprotect auth --status

    # Remove a stored token
    gl-unprotect auth --host gitlab.example.com --logout")]
    Auth {
        /// GitLab host (default: host of the current repository's remote)
        #[arg(long)]
        host: Option<String>,

        /// Token to store (prompts if omitted)
        #[arg(long, conflicts_with_all = ["status", "logout"])]
        token: Option<String>,

        /// Show authentication status
        #[arg(long, conflicts_with = "logout")]
        status: bool,

        /// Remove the stored token
        #[arg(long)]
        logout: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Shells supported by `completion`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}
