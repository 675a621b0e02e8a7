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
#![allow(clippy::multiple_crate_versions)]
//! Browser front end for the clinic widgets.
//!
//! Layout: `bootstrap.rs` (configuration, log level and loader payloads;
//! target independent), `error.rs`, and on wasm32 the DOM projection of
//! every widget (`widgets/`), the CMS resource loader (`loader.rs`) and the
//! page entry point (`start.rs`).

pub mod bootstrap;
pub mod error;

#[cfg(target_arch = "wasm32")]
mod context;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod loader;
#[cfg(target_arch = "wasm32")]
mod start;
#[cfg(target_arch = "wasm32")]
mod storage;
#[cfg(target_arch = "wasm32")]
mod widgets;

pub use error::{WebError, WebResult};

#[cfg(target_arch = "wasm32")]
pub use start::{run, start};
#[cfg(target_arch = "wasm32")]
pub use widgets::{
    scroll_table_to, scroll_table_to_end, scroll_table_to_start, table_scroll_percentage,
};
