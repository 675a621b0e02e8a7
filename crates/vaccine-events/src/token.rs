//! Registration handles returned by the event manager.

use serde::Serialize;

/// Opaque handle for a registered listener; pass it back to remove it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ListenerToken(u64);

impl ListenerToken {
    /// Build a token from its raw counter value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw counter value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// How a listener was registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerKind {
    /// Plain native listener.
    Standard,
    /// Handler behind a shared delegated root listener.
    Delegate,
    /// Trailing debounce wrapper.
    Debounce,
    /// Trailing-edge throttle wrapper.
    Throttle,
    /// Removed after the first invocation.
    Once,
}

/// Bookkeeping kept for every live registration.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ListenerRecord {
    /// Registration style.
    pub kind: ListenerKind,
    /// Native event type.
    pub event_type: String,
    /// Selector for delegated handlers.
    pub selector: Option<String>,
    /// Host clock reading at registration.
    pub created_at: f64,
}

/// Counters exposed for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EventMetrics {
    /// Registrations of any kind.
    pub registered: u64,
    /// Handler invocations.
    pub triggered: u64,
    /// Delegated registrations.
    pub delegated: u64,
    /// Debounced registrations.
    pub debounced: u64,
    /// Throttled registrations.
    pub throttled: u64,
    /// Handler failures caught during dispatch.
    pub errors: u64,
}
