//! Small DOM helpers shared by the widget projections.
//!
//! Attribute and class writes are one-way projections of widget state;
//! failures are logged and never read back.

use std::rc::Rc;

use gloo::timers::callback::{Interval, Timeout};
use gloo::utils::{body, document, window};
use vaccine_widgets::responsive_table::ResizeStrategy;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, Event, HtmlElement, KeyboardEvent, NodeList, ResizeObserver};

use crate::error::{WebError, WebResult};

/// Class used for visually hidden, screen-reader-only text.
pub(crate) const SR_ONLY: &str = "sr-only";

fn collect(list: &NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|index| list.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

/// Every element in the document matching `selector`.
pub(crate) fn query_all(selector: &str) -> Vec<Element> {
    match document().query_selector_all(selector) {
        Ok(list) => collect(&list),
        Err(_) => {
            tracing::warn!(selector, "invalid selector");
            Vec::new()
        }
    }
}

/// Descendants of `root` matching `selector`.
pub(crate) fn query_within(root: &Element, selector: &str) -> Vec<Element> {
    root.query_selector_all(selector)
        .map(|list| collect(&list))
        .unwrap_or_default()
}

/// First element in the document matching `selector`.
pub(crate) fn query_first(selector: &str) -> Option<Element> {
    document().query_selector(selector).ok().flatten()
}

/// First descendant of `root` matching `selector`.
pub(crate) fn query_one(root: &Element, selector: &str) -> Option<Element> {
    root.query_selector(selector).ok().flatten()
}

/// Create an element.
pub(crate) fn create(tag: &str) -> WebResult<Element> {
    document()
        .create_element(tag)
        .map_err(|err| WebError::from_js("createElement", &err))
}

/// Create an element carrying `class` and optional text.
pub(crate) fn create_with(tag: &str, class: &str, text: Option<&str>) -> WebResult<Element> {
    let element = create(tag)?;
    element.set_class_name(class);
    if let Some(text) = text {
        element.set_text_content(Some(text));
    }
    Ok(element)
}

/// Append `child` to `parent`.
pub(crate) fn append(parent: &Element, child: &Element) -> WebResult<()> {
    parent
        .append_child(child)
        .map(|_| ())
        .map_err(|err| WebError::from_js("appendChild", &err))
}

pub(crate) fn set_attr(element: &Element, name: &str, value: &str) {
    if element.set_attribute(name, value).is_err() {
        tracing::debug!(attribute = name, "attribute write rejected");
    }
}

pub(crate) fn remove_attr(element: &Element, name: &str) {
    if element.remove_attribute(name).is_err() {
        tracing::debug!(attribute = name, "attribute removal rejected");
    }
}

pub(crate) fn set_attr_if_missing(element: &Element, name: &str, value: &str) {
    if !element.has_attribute(name) {
        set_attr(element, name, value);
    }
}

pub(crate) fn toggle_class(element: &Element, class: &str, on: bool) {
    if element.class_list().toggle_with_force(class, on).is_err() {
        tracing::debug!(class, "class toggle rejected");
    }
}

pub(crate) fn has_class(element: &Element, class: &str) -> bool {
    element.class_list().contains(class)
}

/// Set (or clear, with an empty value) one inline style property.
pub(crate) fn set_style(element: &Element, property: &str, value: &str) {
    let Some(html) = element.dyn_ref::<HtmlElement>() else {
        return;
    };
    let style = html.style();
    let result = if value.is_empty() {
        style.remove_property(property).map(|_| ())
    } else {
        style.set_property(property, value)
    };
    if result.is_err() {
        tracing::debug!(property, "style write rejected");
    }
}

pub(crate) fn focus(element: &Element) {
    if let Some(html) = element.dyn_ref::<HtmlElement>() {
        if html.focus().is_err() {
            tracing::debug!("focus rejected");
        }
    }
}

/// Trimmed text content.
pub(crate) fn text(element: &Element) -> String {
    element
        .text_content()
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

/// The `id` attribute, when present and non-blank.
pub(crate) fn id_of(element: &Element) -> Option<String> {
    let id = element.id();
    (!id.trim().is_empty()).then_some(id)
}

/// `key` of a keyboard event.
pub(crate) fn key_of(event: &Event) -> Option<String> {
    event.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key)
}

/// Whether Shift was held.
pub(crate) fn has_shift(event: &Event) -> bool {
    event.dyn_ref::<KeyboardEvent>().is_some_and(KeyboardEvent::shift_key)
}

/// Element the event was dispatched at.
pub(crate) fn event_element(event: &Event) -> Option<Element> {
    event.target().and_then(|target| target.dyn_into::<Element>().ok())
}

/// Whether a global constructor or property exists on `window`.
pub(crate) fn window_has(name: &str) -> bool {
    js_sys::Reflect::has(&window(), &JsValue::from_str(name)).unwrap_or(false)
}

/// Speak `message` through a transient polite live region.
pub(crate) fn announce(message: &str, remove_after_ms: u32) {
    let region = match create_with("div", SR_ONLY, Some(message)) {
        Ok(region) => region,
        Err(err) => {
            tracing::debug!(error = %err.detail(), "live region not created");
            return;
        }
    };
    set_attr(&region, "aria-live", "polite");
    set_attr(&region, "aria-atomic", "true");
    if append(&body(), &region).is_err() {
        return;
    }
    Timeout::new(remove_after_ms, move || region.remove()).forget();
}

/// Size-change notifications for a set of elements.
pub(crate) enum ResizeWatch {
    /// A `ResizeObserver` over every element.
    Observer {
        observer: ResizeObserver,
        _callback: Closure<dyn FnMut(js_sys::Array)>,
    },
    /// Periodic re-measurement.
    Polling(Interval),
}

impl ResizeWatch {
    /// Watch `targets`, preferring `ResizeObserver` and polling every
    /// `interval_ms` without it.
    pub(crate) fn start(targets: &[Element], interval_ms: u32, on_change: Rc<dyn Fn()>) -> Self {
        let strategy = ResizeStrategy::choose(window_has("ResizeObserver"), interval_ms);
        if strategy == ResizeStrategy::Observer {
            let notify = Rc::clone(&on_change);
            let callback = Closure::<dyn FnMut(js_sys::Array)>::new(move |_entries| notify());
            match ResizeObserver::new(callback.as_ref().unchecked_ref()) {
                Ok(observer) => {
                    for target in targets {
                        observer.observe(target);
                    }
                    return Self::Observer {
                        observer,
                        _callback: callback,
                    };
                }
                Err(err) => {
                    tracing::debug!(
                        error = %WebError::from_js("ResizeObserver", &err).detail(),
                        "falling back to polling"
                    );
                }
            }
        }
        Self::Polling(Interval::new(interval_ms, move || on_change()))
    }

    /// Stop watching.
    pub(crate) fn stop(self) {
        if let Self::Observer { observer, .. } = self {
            observer.disconnect();
        }
    }
}
