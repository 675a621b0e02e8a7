//! Logging setup failures.

use thiserror::Error;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Why the page logger could not be installed.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured level is not a valid filter directive.
    #[error("log level directive rejected")]
    InvalidFilter {
        /// Directive taken from the page configuration.
        level: String,
        /// Parser diagnostics.
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    /// Another subscriber already owns the global dispatcher.
    #[error("logger already installed")]
    SubscriberInstall {
        /// Diagnostics from `try_init`.
        #[source]
        source: tracing_subscriber::util::TryInitError,
    },
}

impl TelemetryError {
    /// Directive that failed to parse, if that was the cause.
    #[must_use]
    pub fn rejected_level(&self) -> Option<&str> {
        match self {
            Self::InvalidFilter { level, .. } => Some(level),
            Self::SubscriberInstall { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use tracing_subscriber::EnvFilter;

    #[test]
    fn rejected_directive_is_kept() {
        let Err(source) = EnvFilter::try_new("vaccine_web=chatty") else {
            panic!("directive unexpectedly accepted");
        };
        let err = TelemetryError::InvalidFilter {
            level: "vaccine_web=chatty".to_string(),
            source,
        };
        assert_eq!(err.to_string(), "log level directive rejected");
        assert_eq!(err.rejected_level(), Some("vaccine_web=chatty"));
        assert!(err.source().is_some());
    }
}
