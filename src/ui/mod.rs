//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`prompts`] - Interactive prompts and confirmations
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All output and prompts go through this module so interactive and
//! non-interactive modes are handled in one place.

pub mod output;
pub mod prompts;
