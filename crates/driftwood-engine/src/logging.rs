//! Tracing subscriber setup for hosts.
//!
//! The engine itself only emits `tracing` events; installing a subscriber is
//! the host's choice. `RUST_LOG` wins over the configured verbosity.

use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Filter used when `RUST_LOG` is unset.
pub fn default_directive(config: &LogConfig) -> &'static str {
    if config.verbose {
        "debug"
    } else {
        "info"
    }
}

/// Install a global `fmt` subscriber. Returns `false` if one was already
/// installed.
pub fn init(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_selects_the_default_level() {
        assert_eq!(default_directive(&LogConfig { verbose: true }), "debug");
        assert_eq!(default_directive(&LogConfig::default()), "info");
    }

    #[test]
    fn second_init_is_refused() {
        let config = LogConfig::default();
        init(&config);
        assert!(!init(&config));
    }
}
