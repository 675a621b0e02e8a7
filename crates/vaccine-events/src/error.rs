//! Error types for event registration.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Result alias for event manager operations.
pub type EventResult<T> = std::result::Result<T, EventError>;

/// Errors raised while registering or dispatching listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// The selector could not be parsed by the host.
    InvalidSelector {
        /// Selector text supplied by the caller.
        selector: String,
    },
    /// The manager was torn down before the call.
    Destroyed {
        /// Operation attempted after teardown.
        operation: &'static str,
    },
}

impl Display for EventError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSelector { .. } => formatter.write_str("invalid css selector"),
            Self::Destroyed { .. } => formatter.write_str("event manager has been destroyed"),
        }
    }
}

impl Error for EventError {}
