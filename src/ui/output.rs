//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! User-facing text goes to stdout and respects the quiet flag. Diagnostics
//! go through `tracing` instead (see [`crate::logging`]).

use std::fmt::Display;

use crate::gitlab::{
    AccessLevel, AccessLevelEntry, ProtectedBranch, DEFAULT_PROTECT_LEVEL, DEFAULT_UNPROTECT_LEVEL,
};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Format one access-list entry.
///
/// Role entries show the level label; user and group entries name their id.
pub fn format_entry(entry: &AccessLevelEntry) -> String {
    match (entry.user_id, entry.group_id) {
        (Some(user), _) => format!("user #{}", user),
        (None, Some(group)) => format!("group #{}", group),
        (None, None) => entry.access_level.label().to_string(),
    }
}

fn format_entries(entries: &[AccessLevelEntry], empty: AccessLevel) -> String {
    if entries.is_empty() {
        return format!("{} (default)", empty.label());
    }
    entries
        .iter()
        .map(format_entry)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Multi-line description of a protection rule.
///
/// Empty lists show the level a restore would fall back to.
pub fn format_rule(rule: &ProtectedBranch) -> String {
    format!(
        "{}\n  push:      {}\n  merge:     {}\n  unprotect: {}",
        rule.name,
        format_entries(&rule.push_access_levels, DEFAULT_PROTECT_LEVEL),
        format_entries(&rule.merge_access_levels, DEFAULT_PROTECT_LEVEL),
        format_entries(&rule.unprotect_access_levels, DEFAULT_UNPROTECT_LEVEL),
    )
}
