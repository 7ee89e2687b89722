//! Logging setup and crash reporting.
//!
//! Library code logs through `tracing`; the binary installs the subscriber
//! once with [`init_tracing`]. The filter comes from `TESTVERDICT_LOG`, then
//! `RUST_LOG`, then the `-v` count.
//!
//! ```ignore
//! use testverdict::observability::{init_tracing, install_panic_hook};
//!
//! install_panic_hook();
//! init_tracing(verbosity);
//! ```

pub mod context;
pub mod panic_hook;

pub use context::{
    get_current_context, get_progress, increment_processed, set_current_file, set_current_test,
    set_phase, set_phase_persistent, set_progress, AnalysisContext, AnalysisPhase, ContextGuard,
};
pub use panic_hook::install_panic_hook;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "TESTVERDICT_LOG";

/// Default directive for a `-v` count.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

pub fn env_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)))
}

/// Install the global fmt subscriber on stderr. Later calls are no-ops.
pub fn init_tracing(verbosity: u8) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(verbosity > 1)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_directives() {
        assert_eq!(default_directive(0), "warn");
        assert_eq!(default_directive(1), "info");
        assert_eq!(default_directive(5), "debug");
    }
}
