//! Lazy image loading state.
//!
//! # Design
//! - Every image is processed once, tracked by key.
//! - Native `loading="lazy"` is preferred, then `IntersectionObserver`,
//!   then loading everything immediately.
//! - A failed image switches to its `data-fallback` source when it has one;
//!   the fallback is tried only once.

use std::collections::HashMap;

use vaccine_config::LazyImageConfig;

/// Component slug used in logs.
pub const COMPONENT: &str = "image";

/// An image finished loading.
pub const LOADED: &str = "loaded";
/// An image failed to load.
pub const ERROR: &str = "error";

/// How images are deferred.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadStrategy {
    /// Browser-native `loading="lazy"`.
    Native,
    /// Load when an `IntersectionObserver` reports visibility.
    Observer,
    /// Load every image immediately.
    Eager,
}

impl LoadStrategy {
    /// Pick a strategy from browser support and configuration.
    #[must_use]
    pub const fn choose(
        native_supported: bool,
        observer_supported: bool,
        config: &LazyImageConfig,
    ) -> Self {
        if native_supported && config.enable_native_lazy_loading {
            Self::Native
        } else if observer_supported {
            Self::Observer
        } else {
            Self::Eager
        }
    }
}

/// Load progress of one image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    /// Waiting to be loaded.
    Pending,
    /// Request in flight.
    Loading,
    /// Displayed.
    Loaded,
    /// Failed; `fallback` tells whether a fallback source was applied.
    Failed {
        /// A fallback source replaced the broken one.
        fallback: bool,
    },
}

/// Outcome of a load failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureAction {
    /// Swap in this fallback source.
    UseFallback(String),
    /// Leave the image in its error state.
    GiveUp,
}

/// Tracks every processed image.
#[derive(Clone, Debug, Default)]
pub struct LazyImageTracker {
    states: HashMap<String, LoadState>,
}

impl LazyImageTracker {
    /// Empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image. Returns `false` when it was already processed.
    pub fn register(&mut self, key: &str) -> bool {
        if self.states.contains_key(key) {
            return false;
        }
        self.states.insert(key.to_string(), LoadState::Pending);
        true
    }

    /// State of `key`.
    #[must_use]
    pub fn state(&self, key: &str) -> Option<LoadState> {
        self.states.get(key).copied()
    }

    /// Start loading. Returns `false` unless the image is pending.
    pub fn begin(&mut self, key: &str) -> bool {
        match self.states.get_mut(key) {
            Some(state @ LoadState::Pending) => {
                *state = LoadState::Loading;
                true
            }
            _ => false,
        }
    }

    /// Record a successful load. Returns `false` for unknown or already
    /// loaded images.
    pub fn loaded(&mut self, key: &str) -> bool {
        match self.states.get_mut(key) {
            Some(LoadState::Loaded) | None => false,
            Some(state) => {
                *state = LoadState::Loaded;
                true
            }
        }
    }

    /// Record a failure and decide whether to try `fallback`.
    pub fn failed(&mut self, key: &str, fallback: Option<&str>) -> FailureAction {
        let Some(state) = self.states.get_mut(key) else {
            return FailureAction::GiveUp;
        };
        let already_fell_back = matches!(state, LoadState::Failed { fallback: true });
        match fallback.filter(|src| !src.trim().is_empty()) {
            Some(src) if !already_fell_back => {
                *state = LoadState::Failed { fallback: true };
                tracing::debug!(component = COMPONENT, image = key, "using fallback source");
                FailureAction::UseFallback(src.to_string())
            }
            _ => {
                *state = LoadState::Failed {
                    fallback: already_fell_back,
                };
                tracing::warn!(component = COMPONENT, image = key, "image failed to load");
                FailureAction::GiveUp
            }
        }
    }

    /// Number of tracked images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Forget every image.
    pub fn clear(&mut self) {
        self.states.clear();
    }
}

/// CSS transition applied when an image fades in.
#[must_use]
pub fn fade_transition(config: &LazyImageConfig) -> Option<String> {
    (config.fade_in_duration > 0)
        .then(|| format!("opacity {}ms ease-in-out", config.fade_in_duration))
}

/// Stylesheet injected once for loading, loaded and error states.
#[must_use]
pub fn stylesheet(config: &LazyImageConfig) -> String {
    format!(
        ".{lazy} {{ transition: opacity {fade}ms ease-in-out; }}\n\
         .{loading} {{ opacity: 0.6; background-color: {placeholder}; \
         background-image: linear-gradient(90deg, transparent, rgba(255,255,255,0.4), transparent); \
         background-size: 200px 100%; background-repeat: no-repeat; \
         animation: vaccine-loading-shimmer 1.5s infinite; }}\n\
         .{loaded} {{ opacity: 1; }}\n\
         .{error} {{ opacity: 0.5; filter: grayscale(1); }}\n\
         @keyframes vaccine-loading-shimmer {{ 0% {{ background-position: -200px 0; }} \
         100% {{ background-position: calc(200px + 100%) 0; }} }}\n",
        lazy = config.lazy_class,
        fade = config.fade_in_duration,
        loading = config.loading_class,
        placeholder = config.placeholder_color,
        loaded = config.loaded_class,
        error = config.error_class,
    )
}
