//! # Logging
//!
//! Installs a `tracing` fmt subscriber for binaries and tests.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "KILN_LOG";

/// Default filter when [`LOG_ENV`] is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber.
///
/// Filter directives come from `KILN_LOG` (e.g. `kiln_rendering=debug`),
/// falling back to `info`. Returns `false` if a global subscriber was
/// already installed; calling this more than once is harmless.
pub fn init_logging() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let _ = init_logging();
        assert!(!init_logging());
    }
}
