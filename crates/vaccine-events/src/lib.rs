#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![allow(clippy::module_name_repetitions)]
//! Event delegation, debouncing and throttling for the clinic page widgets.
//!
//! The [`EventManager`] is constructed once per page and handed to every
//! widget. It is generic over a [`Host`], so the same registry logic runs
//! against the browser on wasm32 and against an in-memory fake in tests.

pub mod error;
pub mod host;
pub mod manager;
pub mod registry;
pub mod timing;
pub mod token;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod browser;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use error::{EventError, EventResult};
pub use host::{Host, HostEvent, HostNode, ListenOptions, Target};
pub use manager::{
    DESTROYED_EVENT, DelegateHandler, Delegated, ERROR_EVENT, EventManager, READY_EVENT,
};
pub use token::{EventMetrics, ListenerKind, ListenerRecord, ListenerToken};
pub use tuning::EventTuning;

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserHost;
