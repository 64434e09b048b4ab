//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and install logging
//! - Delegate to command handlers

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::config::Config;
use crate::logging;
use crate::ui::output::Verbosity;

/// Per-invocation settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Interactive mode enabled.
    pub interactive: bool,
    /// Loaded configuration.
    pub config: Config,
}

impl Context {
    /// Output verbosity derived from the flags.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }

    /// Directory commands operate in.
    pub fn work_dir(&self) -> Result<PathBuf> {
        match &self.cwd {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("cannot determine current directory"),
        }
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    // A second init only happens when embedded; keep the existing subscriber
    let _ = logging::init(cli.debug);

    let config = Config::load().context("failed to load configuration")?;
    if let Some(path) = config.path() {
        tracing::debug!(path = %path.display(), "loaded configuration");
    }

    let ctx = Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
        interactive: cli.interactive(),
        config,
    };

    commands::dispatch(cli.command, &ctx)
}
