//! Typed configuration sections for every widget.
//!
//! # Design
//! - Keys follow the camelCase names used in CMS page templates.
//! - Every section defaults in full, so an empty document is valid.
//! - Unknown keys are kept in `extra` and passed through untouched.
//! - Overrides merge shallowly per section: keys present in the override win,
//!   everything else keeps its current value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::resources::ResourceManifest;

/// Accordion/FAQ options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccordionConfig {
    /// Container selector.
    pub selector: String,
    /// Header selector inside a container.
    pub header_selector: String,
    /// Content selector inside a container.
    pub content_selector: String,
    /// Class toggled on open containers.
    pub active_class: String,
    /// Opening one item closes the others.
    pub single: bool,
    /// Announce open/close through a live region.
    pub announce_changes: bool,
    /// Arrow/Home/End/Escape handling on headers.
    pub keyboard_navigation: bool,
    /// Transition length used by the stylesheet.
    pub animation_duration: u32,
    /// Unrecognised keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for AccordionConfig {
    fn default() -> Self {
        Self {
            selector: defaults::ACCORDION_SELECTOR.to_string(),
            header_selector: defaults::ACCORDION_HEADER_SELECTOR.to_string(),
            content_selector: defaults::ACCORDION_CONTENT_SELECTOR.to_string(),
            active_class: "active".to_string(),
            single: false,
            announce_changes: true,
            keyboard_navigation: true,
            animation_duration: 300,
            extra: Map::new(),
        }
    }
}

/// Cookie consent options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GdprConfig {
    /// Cookie holding the decision.
    pub cookie_name: String,
    /// Banner text.
    pub message: String,
    /// Accept button label.
    pub accept_text: String,
    /// Decline button label.
    pub decline_text: String,
    /// Info button label.
    pub info_text: String,
    /// Privacy policy opened by the info button.
    pub info_url: Option<String>,
    /// Escape accepts and closes the banner.
    pub allow_escape_close: bool,
    /// Announce tracking initialisation after consent.
    pub enable_tracking: bool,
    /// Policy version recorded in events.
    pub version: String,
    /// Cookie lifetime.
    pub expiry_days: u32,
    /// Unrecognised keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for GdprConfig {
    fn default() -> Self {
        Self {
            cookie_name: defaults::GDPR_COOKIE_NAME.to_string(),
            message: defaults::GDPR_MESSAGE.to_string(),
            accept_text: "Acceptera".to_string(),
            decline_text: "Avböj".to_string(),
            info_text: "Läs mer".to_string(),
            info_url: None,
            allow_escape_close: false,
            enable_tracking: false,
            version: "1.0".to_string(),
            expiry_days: defaults::GDPR_EXPIRY_DAYS,
            extra: Map::new(),
        }
    }
}

/// Lightbox options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LightboxConfig {
    /// Trigger selector.
    pub selector: String,
    /// Overlay element id.
    pub lightbox_id: String,
    /// Escape closes the overlay.
    pub close_on_escape: bool,
    /// Clicking the backdrop closes the overlay.
    pub close_on_background: bool,
    /// Tab cycles inside the overlay.
    pub trap_focus: bool,
    /// Focus returns to the trigger on close.
    pub restore_focus: bool,
    /// Body scrolling is locked while open.
    pub prevent_body_scroll: bool,
    /// Fade the overlay in and out.
    pub fade_animation: bool,
    /// Fade-in length.
    pub fade_in_duration: u32,
    /// Fade-out length.
    pub fade_out_duration: u32,
    /// Text shown when the image fails.
    pub error_message: String,
    /// Unrecognised keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for LightboxConfig {
    fn default() -> Self {
        Self {
            selector: defaults::LIGHTBOX_SELECTOR.to_string(),
            lightbox_id: defaults::LIGHTBOX_ID.to_string(),
            close_on_escape: true,
            close_on_background: true,
            trap_focus: true,
            restore_focus: true,
            prevent_body_scroll: true,
            fade_animation: true,
            fade_in_duration: 300,
            fade_out_duration: 200,
            error_message: defaults::LIGHTBOX_ERROR_MESSAGE.to_string(),
            extra: Map::new(),
        }
    }
}

/// Price view toggle options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PriceToggleConfig {
    /// Radio input selector.
    pub selector: String,
    /// Price table selector.
    pub table_selector: String,
    /// Hide columns with inline styles as well as the body class.
    pub fallback_styling: bool,
    /// Announce view changes through a live region.
    pub announce_changes: bool,
    /// Arrow/Enter/Space handling on labels.
    pub keyboard_navigation: bool,
    /// View selected when no toggle is checked.
    pub default_view: String,
    /// Unrecognised keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for PriceToggleConfig {
    fn default() -> Self {
        Self {
            selector: defaults::PRICE_TOGGLE_SELECTOR.to_string(),
            table_selector: defaults::PRICE_TABLE_SELECTOR.to_string(),
            fallback_styling: false,
            announce_changes: true,
            keyboard_navigation: true,
            default_view: "ordinary".to_string(),
            extra: Map::new(),
        }
    }
}

/// Install banner options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PwaInstallConfig {
    /// Element the banner is inserted into.
    pub container: String,
    /// Banner heading.
    pub title: String,
    /// Banner body.
    pub description: String,
    /// Install button label.
    pub install_text: String,
    /// Dismiss button label.
    pub dismiss_text: String,
    /// Delay before showing the banner without a deferred prompt.
    pub show_delay: u32,
    /// Days the banner stays hidden after a dismissal.
    pub dismissal_days: u32,
    /// `after-header` or `top`.
    pub position: String,
    /// Show automatically once eligible.
    pub auto_show: bool,
    /// localStorage key for the dismissal timestamp.
    pub storage_key: String,
    /// Unrecognised keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for PwaInstallConfig {
    fn default() -> Self {
        Self {
            container: defaults::PWA_CONTAINER_SELECTOR.to_string(),
            title: "Installera Vaccinbussen-appen".to_string(),
            description: "Få snabb tillgång till vaccinationsschema och priser".to_string(),
            install_text: "Installera".to_string(),
            dismiss_text: "Inte nu".to_string(),
            show_delay: defaults::PWA_SHOW_DELAY_MS,
            dismissal_days: defaults::PWA_DISMISSAL_DAYS,
            position: "after-header".to_string(),
            auto_show: true,
            storage_key: defaults::PWA_DISMISSAL_KEY.to_string(),
            extra: Map::new(),
        }
    }
}

/// Responsive table options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResponsiveTableConfig {
    /// Table selector.
    pub selector: String,
    /// Viewport width below which tables are expected to scroll.
    pub breakpoint: u32,
    /// Render left/right scroll indicators.
    pub show_scroll_indicators: bool,
    /// Generate a caption when the table has none.
    pub add_caption: bool,
    /// Ctrl/Meta + arrow scrolling.
    pub keyboard_navigation: bool,
    /// Use smooth behaviour for programmatic scrolls.
    pub smooth_scroll: bool,
    /// Pixels per keyboard scroll step.
    pub scroll_step: u32,
    /// Polling interval when `ResizeObserver` is unavailable.
    pub poll_interval_ms: u32,
    /// Debounce applied to window resizes.
    pub resize_debounce_ms: u32,
    /// Unrecognised keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ResponsiveTableConfig {
    fn default() -> Self {
        Self {
            selector: defaults::RESPONSIVE_TABLE_SELECTOR.to_string(),
            breakpoint: 768,
            show_scroll_indicators: true,
            add_caption: true,
            keyboard_navigation: true,
            smooth_scroll: true,
            scroll_step: 50,
            poll_interval_ms: 500,
            resize_debounce_ms: 250,
            extra: Map::new(),
        }
    }
}

/// Smooth scroll options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SmoothScrollConfig {
    /// Link selector.
    pub selector: String,
    /// Pixels left above the target (fixed header height).
    pub offset: f64,
    /// Pixels per millisecond used to derive the duration.
    pub speed: f64,
    /// Shortest animation.
    pub min_duration: u32,
    /// Longest animation.
    pub max_duration: u32,
    /// Easing name.
    pub easing: String,
    /// Push the target hash onto history.
    pub update_hash: bool,
    /// Move focus to the target afterwards.
    pub manage_focus: bool,
    /// Announce the destination.
    pub announce_to_screen_readers: bool,
    /// Wheel, touch and navigation keys cancel the animation.
    pub cancel_on_interaction: bool,
    /// Delegate to `scroll-behavior: smooth` instead of animating.
    pub use_native_scroll: bool,
    /// Unrecognised keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for SmoothScrollConfig {
    fn default() -> Self {
        Self {
            selector: defaults::SMOOTH_SCROLL_SELECTOR.to_string(),
            offset: 0.0,
            speed: 1.0,
            min_duration: 250,
            max_duration: 1500,
            easing: "ease-in-out".to_string(),
            update_hash: true,
            manage_focus: true,
            announce_to_screen_readers: true,
            cancel_on_interaction: true,
            use_native_scroll: false,
            extra: Map::new(),
        }
    }
}

/// Lazy image options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LazyImageConfig {
    /// Image selector.
    pub image_selector: String,
    /// Marker class for lazy images.
    pub lazy_class: String,
    /// Class while loading.
    pub loading_class: String,
    /// Class once loaded.
    pub loaded_class: String,
    /// Class when loading failed.
    pub error_class: String,
    /// Observer root margin.
    pub root_margin: String,
    /// Observer threshold.
    pub threshold: f64,
    /// Prefer `loading="lazy"` when the browser supports it.
    pub enable_native_lazy_loading: bool,
    /// Load everything immediately when no observer exists.
    pub fallback_for_older_browsers: bool,
    /// Placeholder background while loading.
    pub placeholder_color: String,
    /// Fade-in length once loaded.
    pub fade_in_duration: u32,
    /// Unrecognised keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for LazyImageConfig {
    fn default() -> Self {
        Self {
            image_selector: defaults::LAZY_IMAGE_SELECTOR.to_string(),
            lazy_class: "lazy".to_string(),
            loading_class: "lazy-loading".to_string(),
            loaded_class: "lazy-loaded".to_string(),
            error_class: "lazy-error".to_string(),
            root_margin: "50px 0px".to_string(),
            threshold: 0.01,
            enable_native_lazy_loading: true,
            fallback_for_older_browsers: true,
            placeholder_color: "#f0f0f0".to_string(),
            fade_in_duration: 300,
            extra: Map::new(),
        }
    }
}

/// Swedish date formatting options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DateFormatConfig {
    /// Containers whose dates are reformatted.
    pub container_selector: String,
    /// Date-bearing elements inside a container.
    pub date_selector: String,
    /// Emphasise today's row.
    pub highlight_today: bool,
    /// Weight added to today's row.
    pub today_weight_increase: u16,
    /// Rows within this many days get `data-upcoming`.
    pub upcoming_days: u32,
    /// Unrecognised keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for DateFormatConfig {
    fn default() -> Self {
        Self {
            container_selector: defaults::DATE_CONTAINER_SELECTOR.to_string(),
            date_selector: defaults::DATE_ELEMENT_SELECTOR.to_string(),
            highlight_today: true,
            today_weight_increase: 200,
            upcoming_days: 30,
            extra: Map::new(),
        }
    }
}

/// Complete page configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Verbose logging.
    pub debug: bool,
    /// Explicit log level directive.
    pub log_level: Option<String>,
    /// Accordion/FAQ section.
    pub accordion: AccordionConfig,
    /// Cookie consent section.
    pub gdpr_manager: GdprConfig,
    /// Lightbox section.
    pub lightbox: LightboxConfig,
    /// Price toggle section.
    pub price_toggle: PriceToggleConfig,
    /// Install banner section.
    pub pwa_install: PwaInstallConfig,
    /// Responsive table section.
    pub responsive_table: ResponsiveTableConfig,
    /// Smooth scroll section.
    pub smooth_scroll: SmoothScrollConfig,
    /// Lazy image section.
    pub lazy_images: LazyImageConfig,
    /// Date formatting section.
    pub date_formatter: DateFormatConfig,
    /// CMS resources loaded before the widgets start.
    pub resources: ResourceManifest,
    /// Unrecognised top-level keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: None,
            accordion: AccordionConfig::default(),
            gdpr_manager: GdprConfig::default(),
            lightbox: LightboxConfig::default(),
            price_toggle: PriceToggleConfig::default(),
            pwa_install: PwaInstallConfig::default(),
            responsive_table: ResponsiveTableConfig::default(),
            smooth_scroll: SmoothScrollConfig::default(),
            lazy_images: LazyImageConfig::default(),
            date_formatter: DateFormatConfig::default(),
            resources: ResourceManifest::default(),
            extra: Map::new(),
        }
    }
}

impl AppConfig {
    /// Parse a configuration document and merge it over the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid JSON and the errors of
    /// [`AppConfig::merge_overrides`] otherwise.
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        let overrides: Value =
            serde_json::from_str(text).map_err(|source| ConfigError::Parse { source })?;
        let mut config = Self::default();
        config.merge_overrides(&overrides)?;
        Ok(config)
    }

    /// Merge user overrides into this configuration, one section at a time.
    ///
    /// Object-valued sections are merged shallowly; any other key replaces
    /// the current value. Unknown keys are kept.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotAnObject`] when `overrides` (or a section
    /// override) is not an object, and [`ConfigError::InvalidValue`] when a
    /// merged value has the wrong type.
    pub fn merge_overrides(&mut self, overrides: &Value) -> ConfigResult<()> {
        let Value::Object(patch) = overrides else {
            return Err(ConfigError::NotAnObject {
                section: "root".to_string(),
            });
        };
        let mut current =
            serde_json::to_value(&*self).map_err(|source| ConfigError::Serialize { source })?;
        let Value::Object(base) = &mut current else {
            return Err(ConfigError::NotAnObject {
                section: "root".to_string(),
            });
        };
        for (key, value) in patch {
            let key = canonical_section(key);
            match (base.get_mut(key), value) {
                (Some(Value::Object(section)), Value::Object(fields)) => {
                    shallow_merge(section, fields);
                }
                (Some(Value::Object(_)), Value::Null) => {}
                (Some(Value::Object(_)), _) => {
                    return Err(ConfigError::NotAnObject {
                        section: key.to_string(),
                    });
                }
                _ => {
                    base.insert(key.to_string(), value.clone());
                }
            }
        }
        *self =
            serde_json::from_value(current).map_err(|source| ConfigError::InvalidValue { source })?;
        tracing::debug!(keys = patch.len(), "configuration overrides merged");
        Ok(())
    }

    /// Log level directive in effect: explicit level, else `debug` when the
    /// debug flag is set, else `info`.
    #[must_use]
    pub fn effective_log_level(&self) -> &str {
        match (&self.log_level, self.debug) {
            (Some(level), _) => level,
            (None, true) => "debug",
            (None, false) => "info",
        }
    }
}

fn canonical_section(key: &str) -> &str {
    match key {
        "faqToggle" => "accordion",
        "gdpr" => "gdprManager",
        "lazyImageLoader" => "lazyImages",
        other => other,
    }
}

fn canonical_field(key: &str) -> &str {
    match key {
        "accordionSelector" => "selector",
        "scrollSensitivity" => "scrollStep",
        "deferredPromptTimeout" => "showDelay",
        other => other,
    }
}

fn shallow_merge(target: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        target.insert(canonical_field(key).to_string(), value.clone());
    }
}
