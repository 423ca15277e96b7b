//! Structured logging setup for the joblock binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the process that embeds it. The CLI calls [`init_logging`] once at startup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable overriding the configured log filter.
pub const LOG_ENV: &str = "JOBLOCK_LOG";

/// Build the filter: `JOBLOCK_LOG` if set and valid, else `default_level`.
pub fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install a stderr fmt subscriber.
///
/// Stdout belongs to the wrapped job. Calling this twice is harmless; the
/// first subscriber stays in place.
pub fn init_logging(default_level: &str) {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let _ = tracing_subscriber::registry()
        .with(build_filter(default_level))
        .with(layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn filter_falls_back_to_default_level() {
        // SAFETY: serialized with every other test touching the environment.
        unsafe { std::env::remove_var(LOG_ENV) };

        assert_eq!(
            build_filter("warn").to_string(),
            EnvFilter::new("warn").to_string()
        );
    }

    #[test]
    #[serial]
    fn filter_prefers_environment() {
        // SAFETY: serialized with every other test touching the environment.
        unsafe { std::env::set_var(LOG_ENV, "joblock=trace") };
        let filter = build_filter("warn");
        unsafe { std::env::remove_var(LOG_ENV) };

        assert_eq!(
            filter.to_string(),
            EnvFilter::new("joblock=trace").to_string()
        );
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_logging("error");
        init_logging("error");
    }
}
