//! Error types for widget setup.

use thiserror::Error;
use vaccine_events::EventError;

/// Result alias for widget operations.
pub type WidgetResult<T> = Result<T, WidgetError>;

/// No price table matched the configured selector.
pub const PRICE_TABLE_MISSING: &str = "PRICE_TABLE_MISSING";
/// No usable `ordinary` price toggle was found.
pub const TOGGLES_MISSING: &str = "TOGGLES_MISSING";
/// Event registration failed.
pub const EVENTS_UNAVAILABLE: &str = "EVENTS_UNAVAILABLE";

/// Unrecoverable widget setup failure.
#[derive(Debug, Error)]
pub enum WidgetError {
    /// An element the widget cannot work without is absent.
    #[error("required element missing")]
    MissingElement {
        /// Widget reporting the failure.
        component: &'static str,
        /// Machine-readable code.
        code: &'static str,
        /// Selector that matched nothing.
        selector: String,
    },
    /// Setup failed for a reason other than a missing element.
    #[error("widget setup failed")]
    Setup {
        /// Widget reporting the failure.
        component: &'static str,
        /// Machine-readable code.
        code: &'static str,
        /// Human-readable detail.
        detail: String,
    },
    /// The event manager refused a registration.
    #[error("event registration failed")]
    Events {
        /// Widget reporting the failure.
        component: &'static str,
        /// Underlying event error.
        #[source]
        source: EventError,
    },
}

impl WidgetError {
    /// Widget that raised the error.
    #[must_use]
    pub const fn component(&self) -> &'static str {
        match self {
            Self::MissingElement { component, .. }
            | Self::Setup { component, .. }
            | Self::Events { component, .. } => component,
        }
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingElement { code, .. } | Self::Setup { code, .. } => code,
            Self::Events { .. } => EVENTS_UNAVAILABLE,
        }
    }

    /// Wrap an event registration failure for `component`.
    #[must_use]
    pub const fn events(component: &'static str, source: EventError) -> Self {
        Self::Events { component, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn widget_errors_expose_component_and_code() {
        let missing = WidgetError::MissingElement {
            component: "price-toggle",
            code: PRICE_TABLE_MISSING,
            selector: ".price-table".to_string(),
        };
        assert_eq!(missing.to_string(), "required element missing");
        assert_eq!(missing.component(), "price-toggle");
        assert_eq!(missing.code(), "PRICE_TABLE_MISSING");
        assert!(missing.source().is_none());

        let events = WidgetError::events(
            "accordion",
            EventError::Destroyed {
                operation: "delegate",
            },
        );
        assert_eq!(events.to_string(), "event registration failed");
        assert_eq!(events.code(), EVENTS_UNAVAILABLE);
        assert!(events.source().is_some());

        let setup = WidgetError::Setup {
            component: "lightbox",
            code: "OVERLAY_FAILED",
            detail: "body missing".to_string(),
        };
        assert_eq!(setup.to_string(), "widget setup failed");
        assert_eq!(setup.code(), "OVERLAY_FAILED");
    }
}
