//! logging
//!
//! Diagnostic logging through `tracing`.
//!
//! `RUST_LOG` takes precedence when set. Otherwise only warnings are shown,
//! or everything from this crate at `debug` when `--debug` is passed. Log
//! lines go to stderr so they never mix with command output.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive used when `RUST_LOG` is unset.
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "warn,gl_unprotect=debug"
    } else {
        "warn"
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init(debug: bool) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(debug);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_depends_on_debug() {
        assert_eq!(default_directive(false), "warn");
        assert_eq!(default_directive(true), "warn,gl_unprotect=debug");
    }

    #[test]
    fn directives_parse() {
        for debug in [false, true] {
            assert!(EnvFilter::try_new(default_directive(debug)).is_ok());
        }
    }
}
