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
//! Structured logging setup shared by the widget crates.

pub mod error;
pub mod init;

#[cfg(target_arch = "wasm32")]
pub mod console;

pub use error::{Result, TelemetryError};
pub use init::{
    DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging, level_for_host,
    log_format_from_config,
};
