//! Passive classification and default delays for timed listeners.
//!
//! # Design
//! - Mirrors the CMS `event-types.json` shape so the same document can
//!   replace the built-in table at runtime.
//! - Unknown sections in the document are ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Delay used when neither the caller nor the table names one.
pub const FALLBACK_DELAY_MS: u32 = 250;

/// Debounce entry of the tuning table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceTuning {
    /// Quiet period in milliseconds.
    pub delay: u32,
}

/// Throttle entry of the tuning table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleTuning {
    /// Window length in milliseconds.
    pub limit: u32,
}

/// Tuning table consulted by the event manager.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventTuning {
    /// Event types registered as passive.
    pub passive: BTreeMap<String, bool>,
    /// Default debounce delays per event type.
    pub debounced: BTreeMap<String, DebounceTuning>,
    /// Default throttle windows per event type.
    pub throttled: BTreeMap<String, ThrottleTuning>,
}

impl Default for EventTuning {
    fn default() -> Self {
        let passive = ["scroll", "wheel", "touchstart", "touchmove", "touchend", "mousewheel"]
            .into_iter()
            .map(|name| (name.to_string(), true))
            .collect();
        let debounced = [("scroll", 100), ("resize", 250), ("input", 300), ("search", 500)]
            .into_iter()
            .map(|(name, delay)| (name.to_string(), DebounceTuning { delay }))
            .collect();
        let throttled = [("scroll", 16), ("mousemove", 16), ("resize", 16)]
            .into_iter()
            .map(|(name, limit)| (name.to_string(), ThrottleTuning { limit }))
            .collect();
        Self {
            passive,
            debounced,
            throttled,
        }
    }
}

impl EventTuning {
    /// Whether listeners for `event_type` should be registered passive.
    ///
    /// Every `touch*` event is passive regardless of the table.
    #[must_use]
    pub fn is_passive(&self, event_type: &str) -> bool {
        event_type.starts_with("touch") || self.passive.get(event_type).copied().unwrap_or(false)
    }

    /// Debounce delay: explicit value, else table entry, else fallback.
    #[must_use]
    pub fn debounce_delay(&self, event_type: &str, requested: Option<u32>) -> u32 {
        requested
            .or_else(|| self.debounced.get(event_type).map(|entry| entry.delay))
            .unwrap_or(FALLBACK_DELAY_MS)
    }

    /// Throttle window: explicit value, else table entry, else fallback.
    #[must_use]
    pub fn throttle_limit(&self, event_type: &str, requested: Option<u32>) -> u32 {
        requested
            .or_else(|| self.throttled.get(event_type).map(|entry| entry.limit))
            .unwrap_or(FALLBACK_DELAY_MS)
    }

    /// Parse a tuning document, falling back to defaults for missing sections.
    ///
    /// # Errors
    ///
    /// Returns the serde error when a present section has the wrong shape.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }
}
