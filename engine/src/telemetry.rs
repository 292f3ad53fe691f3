//! Telemetry and Observability
//!
//! Sets up `tracing-subscriber` from the `[core] log_level` setting. `RUST_LOG`
//! overrides the configured level. Debug builds print pretty terminal output,
//! release builds emit JSON lines.

use crate::config::Config;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset: the level applies globally and to
/// this crate, while the sdk stays at warn.
fn default_directives(log_level: &str) -> String {
    format!("{level},docent_engine={level},sdk=warn", level = log_level)
}

/// Initialize the tracing subscriber from the loaded configuration.
///
/// Later calls are ignored once a global subscriber is installed.
pub fn init_telemetry(config: &Config) {
    init_telemetry_with_level(&config.core.log_level);
}

/// Initialize the tracing subscriber with an explicit level
pub fn init_telemetry_with_level(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)));

    let registry = tracing_subscriber::registry().with(env_filter);

    #[cfg(debug_assertions)]
    let installed = registry
        .with(fmt::layer().pretty().with_target(false))
        .try_init();

    #[cfg(not(debug_assertions))]
    let installed = registry
        .with(fmt::layer().json().with_current_span(true))
        .try_init();

    if installed.is_ok() {
        tracing::debug!("Telemetry initialized at level {}", log_level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_follow_level() {
        let directives = default_directives("debug");
        assert_eq!(directives, "debug,docent_engine=debug,sdk=warn");
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn test_init_from_config_is_idempotent() {
        let mut config = Config::default_config();
        config.core.log_level = "trace".to_string();

        init_telemetry(&config);
        init_telemetry(&config);
        init_telemetry_with_level("warn");
    }
}
