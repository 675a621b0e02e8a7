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

//! Page configuration for the clinic widgets.
//!
//! Layout: `defaults.rs` (documented default values), `model.rs` (per-widget
//! sections and [`AppConfig`] with override merging), `resources.rs` (CMS
//! resource manifest and URL building).

pub mod defaults;
pub mod error;
pub mod model;
pub mod resources;

pub use error::{ConfigError, ConfigResult};
pub use model::{
    AccordionConfig, AppConfig, DateFormatConfig, GdprConfig, LazyImageConfig, LightboxConfig,
    PriceToggleConfig, PwaInstallConfig, ResponsiveTableConfig, SmoothScrollConfig,
};
pub use resources::{
    LoadPhase, ResourceHashes, ResourceKind, ResourceManifest, config_key, presence_key,
};
