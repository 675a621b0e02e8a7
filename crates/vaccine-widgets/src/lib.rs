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

//! DOM-free widget logic for the clinic pages.
//!
//! Every widget keeps an explicit state struct here; the browser crate only
//! projects that state onto the DOM and feeds user input back in. Nothing in
//! this crate reads the DOM, so all of it is tested natively.

pub mod accordion;
pub mod app;
pub mod date_format;
pub mod error;
pub mod focus;
pub mod gdpr;
pub mod ids;
pub mod lazy_image;
pub mod lifecycle;
pub mod lightbox;
pub mod price_toggle;
pub mod pwa;
pub mod registrations;
pub mod responsive_table;
pub mod smooth_scroll;
pub mod storage;

pub use accordion::{
    AccordionChange, AccordionController, AccordionItem, AccordionKeyAction, AccordionState,
    AccordionView,
};
pub use app::{App, BootReport, Widget, WidgetEntry, WidgetFactory};
pub use error::{WidgetError, WidgetResult};
pub use gdpr::{Consent, GdprManager};
pub use ids::IdAllocator;
pub use lifecycle::Component;
pub use lightbox::{LightboxImage, LightboxSource, LightboxState};
pub use price_toggle::{
    PriceTier, PriceToggle, PriceToggleController, PriceToggleView, ToggleDescriptor, ViewChange,
};
pub use pwa::{InstallDecision, InstallEnvironment, Platform, PwaInstall};
pub use registrations::Registrations;
pub use responsive_table::{ScrollMetrics, TableController, TableScrollState, TableViewport};
pub use smooth_scroll::{ActiveScrolls, Easing, ScrollAnimation, ScrollTicket};
pub use storage::{
    CookieStore, KeyValueStore, MemoryCookieJar, MemoryStorage, StorageError, StorageResult,
};
