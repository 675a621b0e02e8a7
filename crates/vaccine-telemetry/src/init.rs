//! Telemetry initialisation primitives and logging configuration.
//!
//! # Design
//! - Centralises logging setup with a single entry point for every target.
//! - Native builds log to stderr (pretty or JSON); wasm32 builds forward
//!   formatted lines to the browser console without timestamps.
//! - Records the build SHA once so every module reports the same value.

use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, TelemetryError};

/// Default level when nothing else is configured.
pub const DEFAULT_LOG_LEVEL: &str = "info";

static BUILD_SHA: OnceCell<String> = OnceCell::new();

/// Configure and install the global tracing subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for an unparsable level and
/// [`TelemetryError::SubscriberInstall`] when a subscriber is already set.
pub fn init_logging(config: &LoggingConfig<'_>) -> Result<()> {
    BUILD_SHA
        .set(config.build_sha.to_string())
        .ok()
        .or(Some(()));
    let filter = build_env_filter(config.level)?;
    install(config.format, filter)
}

/// Access the build SHA recorded during logging initialisation.
#[must_use]
pub fn build_sha() -> &'static str {
    BUILD_SHA.get().map_or("dev", String::as_str)
}

/// Log level for a page served from `hostname`; local development gets
/// debug output.
#[must_use]
pub fn level_for_host(hostname: &str) -> &'static str {
    match hostname {
        "localhost" | "127.0.0.1" | "::1" => "debug",
        _ => DEFAULT_LOG_LEVEL,
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Level directive (`info`, `debug`, `vaccine_web=trace`, ...).
    pub level: &'a str,
    /// Output format selection for the tracing subscriber.
    pub format: LogFormat,
    /// Build identifier recorded in structured logs.
    pub build_sha: &'a str,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::infer(),
            build_sha: build_sha(),
        }
    }
}

/// Available output formats for the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Emit logs as structured JSON objects.
    Json,
    /// Emit human-readable lines.
    Pretty,
}

impl LogFormat {
    /// Choose a sensible default for the current build.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Read `log_format` from a configuration map.
#[must_use]
pub fn log_format_from_config(config: Option<&serde_json::Value>) -> Option<LogFormat> {
    config
        .and_then(|value| value.get("log_format"))
        .and_then(serde_json::Value::as_str)
        .map(|value| match value {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::infer(),
        })
}

fn build_env_filter(level: &str) -> Result<EnvFilter> {
    #[cfg(not(target_arch = "wasm32"))]
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|source| TelemetryError::InvalidFilter {
        level: level.to_string(),
        source,
    })
}

#[cfg(not(target_arch = "wasm32"))]
fn install(format: LogFormat, filter: EnvFilter) -> Result<()> {
    let installed = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(false))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .try_init(),
    };
    installed.map_err(|source| TelemetryError::SubscriberInstall { source })
}

#[cfg(target_arch = "wasm32")]
fn install(format: LogFormat, filter: EnvFilter) -> Result<()> {
    use crate::console::ConsoleMakeWriter;

    // The wasm32 clock is unavailable to the formatter, so timestamps are off.
    let installed = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .without_time()
                    .with_writer(ConsoleMakeWriter),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .without_time()
                    .with_ansi(false)
                    .with_writer(ConsoleMakeWriter),
            )
            .try_init(),
    };
    installed.map_err(|source| TelemetryError::SubscriberInstall { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn local_hosts_get_debug_level() {
        assert_eq!(level_for_host("localhost"), "debug");
        assert_eq!(level_for_host("127.0.0.1"), "debug");
        assert_eq!(level_for_host("www.vaccincenter.se"), "info");
    }

    #[test]
    fn log_format_reads_config_map() {
        let json_cfg = json!({ "log_format": "json" });
        let pretty_cfg = json!({ "log_format": "pretty" });
        assert_eq!(log_format_from_config(Some(&json_cfg)), Some(LogFormat::Json));
        assert_eq!(log_format_from_config(Some(&pretty_cfg)), Some(LogFormat::Pretty));
        assert_eq!(log_format_from_config(None), None);
        assert_eq!(log_format_from_config(Some(&json!({}))), None);
    }

    #[test]
    fn invalid_level_is_reported() {
        let config = LoggingConfig {
            level: "vaccine=loud",
            ..LoggingConfig::default()
        };
        if std::env::var("RUST_LOG").is_err() {
            assert!(matches!(
                init_logging(&config),
                Err(TelemetryError::InvalidFilter { .. })
            ));
        }
    }

    #[test]
    fn second_install_fails() {
        let config = LoggingConfig {
            build_sha: "abc123",
            ..LoggingConfig::default()
        };
        let _ = init_logging(&config);
        assert!(matches!(
            init_logging(&config),
            Err(TelemetryError::SubscriberInstall { .. })
        ));
        assert_ne!(build_sha(), "");
    }
}
