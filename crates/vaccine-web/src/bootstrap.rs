//! Page bootstrap decisions that do not touch the DOM.
//!
//! # Design
//! - The inline `<script id="vaccine-app-config">` holds optional JSON
//!   overrides; a missing or blank element means defaults.
//! - Event tuning comes from the loaded `event-types` document and falls
//!   back to the built-in table when absent or malformed.
//! - Loader completion payloads mirror what page scripts already listen for.
//! - A `pagehide` into the back/forward cache keeps widgets alive so a
//!   restored page is still interactive; only a real unload tears down.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};
use vaccine_config::{AppConfig, ResourceManifest};
use vaccine_events::EventTuning;
use vaccine_telemetry::level_for_host;

use crate::error::WebResult;

/// Id of the inline configuration script.
pub const CONFIG_SCRIPT_ID: &str = "vaccine-app-config";
/// Key of the event tuning document among loaded JSON resources.
pub const EVENT_TYPES_KEY: &str = "event-types";
/// Dispatched on `document` once every phase ran.
pub const RESOURCES_LOADED_EVENT: &str = "vaccineBjarredResourcesLoaded";
/// Dispatched on `document` when loading aborted.
pub const RESOURCES_ERROR_EVENT: &str = "vaccineBjarredResourcesError";

/// Parse the inline configuration, if any.
///
/// # Errors
///
/// Returns [`crate::WebError::Config`] when the text is not a valid
/// override document.
pub fn load_config(inline: Option<&str>) -> WebResult<AppConfig> {
    match inline.map(str::trim) {
        None | Some("") => Ok(AppConfig::default()),
        Some(text) => Ok(AppConfig::from_json_str(text)?),
    }
}

/// Log level for the page: explicit configuration wins, then the
/// development host switch.
#[must_use]
pub fn log_level(config: &AppConfig, hostname: &str) -> String {
    if config.log_level.is_some() || config.debug {
        config.effective_log_level().to_string()
    } else {
        level_for_host(hostname).to_string()
    }
}

/// Event tuning from the loaded JSON documents.
#[must_use]
pub fn event_tuning(documents: &BTreeMap<String, Value>) -> EventTuning {
    let Some(document) = documents.get(EVENT_TYPES_KEY) else {
        return EventTuning::default();
    };
    EventTuning::from_json(document).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "event tuning document rejected; using defaults");
        EventTuning::default()
    })
}

/// Cache-busting token for resource URLs.
#[must_use]
pub fn cache_buster(now: DateTime<Utc>) -> String {
    now.timestamp_millis().to_string()
}

/// Detail of the loader's success event.
#[must_use]
pub fn loaded_detail(manifest: &ResourceManifest, now: DateTime<Utc>) -> Value {
    json!({
        "timestamp": now.to_rfc3339_opts(SecondsFormat::Millis, true),
        "loadedResources": {
            "css": manifest.css,
            "externalJs": manifest.external_js,
            "config": manifest.config,
            "modules": manifest.modules,
        },
    })
}

/// Detail of the loader's error event.
#[must_use]
pub fn error_detail(error: &str, now: DateTime<Utc>) -> Value {
    json!({
        "error": error,
        "timestamp": now.to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// How the page is being left on `pagehide`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageExit {
    /// Kept in the back/forward cache (`persisted`).
    Suspended,
    /// Discarded.
    Unloaded,
}

impl PageExit {
    /// Classify a `PageTransitionEvent.persisted` flag.
    #[must_use]
    pub const fn from_persisted(persisted: bool) -> Self {
        if persisted { Self::Suspended } else { Self::Unloaded }
    }

    /// Whether widgets and the event manager should be destroyed.
    #[must_use]
    pub const fn tears_down(self) -> bool {
        matches!(self, Self::Unloaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).single().unwrap()
    }

    #[test]
    fn inline_config_is_optional() -> WebResult<()> {
        assert_eq!(load_config(None)?, AppConfig::default());
        assert_eq!(load_config(Some("  \n"))?, AppConfig::default());
        let config = load_config(Some(r#"{"faqToggle": {"single": true}, "debug": true}"#))?;
        assert!(config.accordion.single);
        assert!(config.debug);
        assert!(load_config(Some("{not json")).is_err());
        Ok(())
    }

    #[test]
    fn log_level_prefers_configuration_then_host() {
        let mut config = AppConfig::default();
        assert_eq!(log_level(&config, "localhost"), "debug");
        assert_eq!(log_level(&config, "www.ptj.se"), "info");
        config.log_level = Some("warn".to_string());
        assert_eq!(log_level(&config, "localhost"), "warn");
        config.log_level = None;
        config.debug = true;
        assert_eq!(log_level(&config, "www.ptj.se"), "debug");
    }

    #[test]
    fn tuning_falls_back_to_defaults() {
        let mut documents = BTreeMap::new();
        assert_eq!(event_tuning(&documents), EventTuning::default());
        documents.insert(EVENT_TYPES_KEY.to_string(), json!("not an object"));
        assert_eq!(event_tuning(&documents), EventTuning::default());
    }

    #[test]
    fn cached_pages_keep_their_widgets() {
        assert_eq!(PageExit::from_persisted(true), PageExit::Suspended);
        assert!(!PageExit::from_persisted(true).tears_down());
        assert!(PageExit::from_persisted(false).tears_down());
    }

    #[test]
    fn loader_payloads() {
        let manifest = ResourceManifest::default();
        let detail = loaded_detail(&manifest, now());
        assert_eq!(detail["timestamp"], json!("2025-03-14T09:30:00.000Z"));
        assert_eq!(detail["loadedResources"]["css"][0], json!("styles/styles-min-vb.css"));
        let detail = error_detail("boom", now());
        assert_eq!(detail["error"], json!("boom"));
        assert_eq!(cache_buster(now()), "1741944600000");
    }
}
