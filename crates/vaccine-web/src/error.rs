//! Error types for the browser layer.

use thiserror::Error;
use vaccine_config::ConfigError;
use vaccine_telemetry::TelemetryError;
use vaccine_widgets::WidgetError;

/// Result alias for browser operations.
pub type WebResult<T> = Result<T, WebError>;

/// Failures raised while projecting widgets onto the page.
#[derive(Debug, Error)]
pub enum WebError {
    /// A browser API call failed.
    #[error("browser call failed")]
    Js {
        /// Operation attempted.
        operation: &'static str,
        /// Stringified `JsValue`.
        message: String,
    },
    /// An element the caller relies on is absent.
    #[error("element missing")]
    MissingElement {
        /// Selector or id that matched nothing.
        selector: String,
    },
    /// The inline configuration could not be used.
    #[error("configuration invalid")]
    Config {
        /// Underlying configuration error.
        #[from]
        source: ConfigError,
    },
    /// A widget failed to start.
    #[error("widget setup failed")]
    Widget {
        /// Underlying widget error.
        #[from]
        source: WidgetError,
    },
    /// A CMS resource failed to load.
    #[error("resource failed to load")]
    Resource {
        /// Resource URL.
        url: String,
        /// Failure detail.
        message: String,
    },
    /// Logging could not be installed.
    #[error("logging setup failed")]
    Telemetry {
        /// Underlying telemetry error.
        #[from]
        source: TelemetryError,
    },
}

impl WebError {
    /// Wrap a failed browser call.
    #[must_use]
    pub fn js(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Js {
            operation,
            message: message.into(),
        }
    }

    /// Detail text for logs and event payloads.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Js { operation, message } => format!("{operation}: {message}"),
            Self::MissingElement { selector } => format!("no element matches {selector}"),
            Self::Resource { url, message } => format!("{url}: {message}"),
            Self::Config { source } => source.to_string(),
            Self::Widget { source } => format!("{}: {}", source.code(), source),
            Self::Telemetry { source } => source
                .rejected_level()
                .map_or_else(|| source.to_string(), |level| format!("{source}: {level}")),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl WebError {
    /// Wrap a rejected `JsValue`.
    #[must_use]
    pub(crate) fn from_js(operation: &'static str, value: &wasm_bindgen::JsValue) -> Self {
        let message = value
            .as_string()
            .or_else(|| js_sys::JSON::stringify(value).ok().map(String::from))
            .unwrap_or_else(|| "unknown error".to_string());
        Self::js(operation, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaccine_widgets::error::PRICE_TABLE_MISSING;

    #[test]
    fn detail_includes_context() {
        let err = WebError::js("querySelector", "SyntaxError");
        assert_eq!(err.to_string(), "browser call failed");
        assert_eq!(err.detail(), "querySelector: SyntaxError");

        let err = WebError::from(WidgetError::MissingElement {
            component: "price-toggle",
            code: PRICE_TABLE_MISSING,
            selector: ".price-table".to_string(),
        });
        assert_eq!(err.detail(), "PRICE_TABLE_MISSING: required element missing");

        let err = WebError::Resource {
            url: "https://example.test/a.css".to_string(),
            message: "HTTP 404".to_string(),
        };
        assert_eq!(err.detail(), "https://example.test/a.css: HTTP 404");
    }
}
