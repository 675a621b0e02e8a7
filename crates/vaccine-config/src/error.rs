//! Error types for configuration operations.

use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Overrides were not a JSON object.
    #[error("configuration overrides must be an object")]
    NotAnObject {
        /// Section whose override had the wrong shape (`root` for the document).
        section: String,
    },
    /// Serialising the current configuration failed.
    #[error("failed to serialize configuration")]
    Serialize {
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// Merged configuration did not match the expected shape.
    #[error("invalid configuration value")]
    InvalidValue {
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// Configuration text was not valid JSON.
    #[error("configuration document is not valid json")]
    Parse {
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn json_error() -> serde_json::Error {
        match serde_json::from_str::<serde_json::Value>("{") {
            Ok(_) => unreachable!("invalid json parsed"),
            Err(err) => err,
        }
    }

    #[test]
    fn config_error_messages_are_constant() {
        let cases = [
            (
                ConfigError::NotAnObject {
                    section: "root".to_string(),
                },
                "configuration overrides must be an object",
                false,
            ),
            (
                ConfigError::Serialize {
                    source: json_error(),
                },
                "failed to serialize configuration",
                true,
            ),
            (
                ConfigError::InvalidValue {
                    source: json_error(),
                },
                "invalid configuration value",
                true,
            ),
            (
                ConfigError::Parse {
                    source: json_error(),
                },
                "configuration document is not valid json",
                true,
            ),
        ];
        for (err, message, has_source) in cases {
            assert_eq!(err.to_string(), message);
            assert_eq!(err.source().is_some(), has_source);
        }
    }
}
