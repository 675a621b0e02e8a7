//! What every widget factory receives.

use serde_json::Value;
use vaccine_config::AppConfig;
use vaccine_events::{BrowserHost, EventManager};
use vaccine_widgets::{Component, WidgetError};

use crate::error::WebError;

/// Page-wide services handed to widget factories.
pub(crate) struct PageContext {
    pub(crate) manager: EventManager<BrowserHost>,
    pub(crate) config: AppConfig,
}

/// Dispatch `vaccine:<component>:<step>` on the document.
pub(crate) fn emit(
    manager: &EventManager<BrowserHost>,
    component: Component,
    step: &str,
    detail: &Value,
) -> bool {
    manager.emit(&component.event(step), detail, None)
}

/// Listener tokens owned by one widget.
pub(crate) type Registrations = vaccine_widgets::Registrations<BrowserHost>;

/// Map a browser failure during setup onto a widget error.
pub(crate) fn setup_failed(
    component: &'static str,
    code: &'static str,
) -> impl Fn(WebError) -> WidgetError {
    move |err| WidgetError::Setup {
        component,
        code,
        detail: err.detail(),
    }
}
