//! Browser host backed by `web-sys` and `gloo`.

use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo::timers::callback::Timeout;
use gloo::utils::{document, window};
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CustomEvent, CustomEventInit, Element, Event, EventTarget, KeyboardEvent, Node};

use crate::host::{Host, HostEvent, HostNode, ListenOptions, NativeCallback, Target};

impl HostNode for Element {
    fn matches(&self, selector: &str) -> bool {
        Element::matches(self, selector).unwrap_or(false)
    }

    fn parent_element(&self) -> Option<Self> {
        Node::parent_element(self)
    }
}

impl HostEvent for Event {
    type Node = Element;

    fn event_type(&self) -> String {
        Event::type_(self)
    }

    fn target(&self) -> Option<Element> {
        let target = Event::target(self)?;
        match target.dyn_into::<Element>() {
            Ok(element) => Some(element),
            // Text nodes report their parent element.
            Err(other) => other.dyn_ref::<Node>().and_then(Node::parent_element),
        }
    }

    fn prevent_default(&self) {
        Event::prevent_default(self);
    }

    fn default_prevented(&self) -> bool {
        Event::default_prevented(self)
    }

    fn key(&self) -> Option<String> {
        self.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key)
    }

    fn has_modifier(&self) -> bool {
        self.dyn_ref::<KeyboardEvent>()
            .is_some_and(|event| event.ctrl_key() || event.meta_key())
    }
}

/// Host for the live page.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserHost;

impl BrowserHost {
    /// Resolve a listener target to its `EventTarget`.
    #[must_use]
    pub fn event_target(target: &Target<Element>) -> EventTarget {
        match target {
            Target::Window => window().into(),
            Target::Document => document().into(),
            Target::Node(element) => element.clone().into(),
        }
    }
}

impl Host for BrowserHost {
    type Node = Element;
    type Event = Event;
    type Listener = EventListener;

    fn listen(
        &self,
        target: &Target<Element>,
        event_type: &str,
        options: ListenOptions,
        callback: NativeCallback<Event>,
    ) -> EventListener {
        let phase = if options.capture {
            EventListenerPhase::Capture
        } else {
            EventListenerPhase::Bubble
        };
        EventListener::new_with_options(
            &Self::event_target(target),
            event_type.to_string(),
            EventListenerOptions {
                phase,
                passive: options.passive,
            },
            move |event| callback(event),
        )
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) {
        Timeout::new(delay_ms, callback).forget();
    }

    fn now_ms(&self) -> f64 {
        window()
            .performance()
            .map_or_else(js_sys::Date::now, |performance| performance.now())
    }

    fn validate_selector(&self, selector: &str) -> bool {
        document().query_selector(selector).is_ok()
    }

    fn dispatch(&self, target: &Target<Element>, event_type: &str, detail: &Value) -> bool {
        let detail = js_sys::JSON::parse(&detail.to_string()).unwrap_or(JsValue::NULL);
        let init = CustomEventInit::new();
        init.set_bubbles(true);
        init.set_cancelable(true);
        init.set_detail(&detail);
        let Ok(event) = CustomEvent::new_with_event_init_dict(event_type, &init) else {
            tracing::warn!(event = event_type, "custom event construction failed");
            return true;
        };
        Self::event_target(target)
            .dispatch_event(&event)
            .unwrap_or(true)
    }
}
