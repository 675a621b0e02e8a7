//! Host abstraction over the DOM event surface.
//!
//! # Design
//! - The manager only needs element matching, parent traversal, listener
//!   attachment, timers and custom-event dispatch; everything else stays in
//!   the widget projections.
//! - Listeners are RAII handles: dropping one detaches the native listener.
//! - Timers are fire-and-forget; cancellation is expressed through generation
//!   counters owned by the caller, so no timer is ever dropped while running.

use serde_json::Value;

/// Element handle understood by a host.
pub trait HostNode: Clone + PartialEq + 'static {
    /// Whether the element matches a CSS selector.
    ///
    /// An unparsable selector reports `false`.
    fn matches(&self, selector: &str) -> bool;

    /// Parent element, `None` at the document element.
    fn parent_element(&self) -> Option<Self>;
}

/// Event handle understood by a host.
pub trait HostEvent: Clone + 'static {
    /// Element type of the owning host.
    type Node: HostNode;

    /// Native event type (`click`, `keydown`, ...).
    fn event_type(&self) -> String;

    /// Nearest element the event was dispatched to.
    fn target(&self) -> Option<Self::Node>;

    /// Cancel the default browser action.
    fn prevent_default(&self);

    /// Whether a listener cancelled the event.
    fn default_prevented(&self) -> bool;

    /// `KeyboardEvent.key`; `None` for other events.
    fn key(&self) -> Option<String>;

    /// Whether Ctrl or Meta was held during a keyboard event.
    fn has_modifier(&self) -> bool;
}

/// Where a listener is attached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target<N> {
    /// The global `window`.
    Window,
    /// The `document` root.
    Document,
    /// A concrete element.
    Node(N),
}

/// Native listener flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListenOptions {
    /// Listen during the capture phase.
    pub capture: bool,
    /// Promise never to call `prevent_default`.
    pub passive: bool,
}

/// Callback signature for native listeners.
pub type NativeCallback<E> = Box<dyn Fn(&E)>;

/// Browser-like environment the event manager runs against.
pub trait Host: 'static {
    /// Element type.
    type Node: HostNode;
    /// Event type.
    type Event: HostEvent<Node = Self::Node>;
    /// RAII listener guard; dropping it removes the native listener.
    type Listener: 'static;

    /// Attach a native listener.
    fn listen(
        &self,
        target: &Target<Self::Node>,
        event_type: &str,
        options: ListenOptions,
        callback: NativeCallback<Self::Event>,
    ) -> Self::Listener;

    /// Run `callback` once after `delay_ms`.
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>);

    /// Monotonic clock in milliseconds.
    fn now_ms(&self) -> f64;

    /// Whether the host can parse the selector.
    fn validate_selector(&self, selector: &str) -> bool;

    /// Dispatch a bubbling, cancelable custom event carrying `detail`.
    ///
    /// Returns `true` when no listener cancelled it.
    fn dispatch(&self, target: &Target<Self::Node>, event_type: &str, detail: &Value) -> bool;
}
