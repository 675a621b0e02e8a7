//! Horizontal scroll state for wrapped tables.
//!
//! # Design
//! - A table is scrollable when its content is wider than its wrapper.
//! - Scroll position is tracked per table key and read back only through
//!   [`ScrollMetrics`] snapshots taken by a [`TableViewport`].
//! - Scrollability changes are reported once per transition, never on
//!   every measurement.
//! - Programmatic scrolls go through percentages of the scrollable range;
//!   keyboard shortcuts reuse them for Home and End.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use vaccine_config::ResponsiveTableConfig;
use vaccine_events::{EventManager, Host, HostEvent, Target};

use crate::error::WidgetResult;
use crate::lifecycle::Component;
use crate::registrations::Registrations;

/// Component slug used in logs.
pub const COMPONENT: &str = "responsive-table";

/// Per-table scroll notification (`vaccine:table:scroll`).
pub const SCROLL: &str = "scroll";
/// Per-table scrollability change (`vaccine:table:scrollability-changed`).
pub const SCROLLABILITY_CHANGED: &str = "scrollability-changed";

/// Hint shown while a scrollable wrapper has focus.
pub const FOCUS_HINT: &str = "Use Ctrl+Arrow keys to scroll horizontally, or swipe on touch devices";
/// Hint present from setup.
pub const SCROLL_HINT: &str = "Use arrow keys or swipe to scroll horizontally in this table";
/// Delay before the focus hint is cleared after blur.
pub const HINT_CLEAR_MS: u32 = 100;

/// Measured sizes of one wrapper and its table.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollMetrics {
    /// `wrapper.scrollLeft`.
    pub scroll_left: f64,
    /// `wrapper.scrollWidth`.
    pub scroll_width: f64,
    /// `wrapper.clientWidth`.
    pub client_width: f64,
    /// `table.scrollWidth`.
    pub table_width: f64,
}

impl ScrollMetrics {
    /// Whether the table overflows the wrapper.
    #[must_use]
    pub fn is_scrollable(&self) -> bool {
        self.table_width > self.client_width
    }

    /// Furthest possible `scroll_left`.
    #[must_use]
    pub fn max_scroll(&self) -> f64 {
        (self.scroll_width - self.client_width).max(0.0)
    }

    /// Scroll progress in percent, 0 when nothing can scroll.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        let max = self.max_scroll();
        if max > 0.0 {
            (self.scroll_left / max * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    /// Left/right indicator opacities.
    #[must_use]
    pub fn indicator_opacity(&self) -> (f64, f64) {
        if !self.is_scrollable() {
            return (0.0, 0.0);
        }
        let left = if self.scroll_left > 0.0 { 1.0 } else { 0.0 };
        let right = if self.scroll_left < self.max_scroll() {
            1.0
        } else {
            0.0
        };
        (left, right)
    }

    /// `aria-valuetext` for the wrapper.
    #[must_use]
    pub fn value_text(&self) -> String {
        format!("{}% scrolled", self.rounded_percentage())
    }

    /// Percentage rounded for `aria-valuenow`.
    #[must_use]
    pub fn rounded_percentage(&self) -> u8 {
        // Percentage is clamped to [0, 100] so the cast cannot truncate.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rounded = self.percentage().round() as u8;
        rounded
    }

    /// `scroll_left` for a percentage of the scrollable range.
    #[must_use]
    pub fn offset_for_percentage(&self, percent: f64) -> f64 {
        percent.clamp(0.0, 100.0) / 100.0 * self.max_scroll()
    }
}

/// Caption generated for tables without one.
#[must_use]
pub fn caption_for(classes: &[&str]) -> &'static str {
    if classes.contains(&"location-schedule") {
        "Vaccination schedule and location information"
    } else if classes.contains(&"price-table") {
        "Vaccination pricing information"
    } else {
        "Data table"
    }
}

/// `scope` for a header cell in column `index` (0-based).
#[must_use]
pub const fn header_scope(index: usize) -> &'static str {
    if index == 0 { "row" } else { "col" }
}

/// Id assigned to a header cell without one.
#[must_use]
pub fn header_id(table_key: &str, index: usize) -> String {
    format!("{table_key}-header-{index}")
}

/// New `scroll_left` for a keyboard shortcut, `None` when the key is not a
/// scroll shortcut. Shortcuts require Ctrl or Meta.
#[must_use]
pub fn key_scroll(key: &str, modifier: bool, metrics: &ScrollMetrics, step: f64) -> Option<f64> {
    if !modifier || !metrics.is_scrollable() {
        return None;
    }
    let max = metrics.max_scroll();
    match key {
        "ArrowLeft" => Some((metrics.scroll_left - step).max(0.0)),
        "ArrowRight" => Some((metrics.scroll_left + step).min(max)),
        "Home" => Some(0.0),
        "End" => Some(max),
        _ => None,
    }
}

/// How size changes are observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeStrategy {
    /// `ResizeObserver` on each wrapper.
    Observer,
    /// Re-measure every `interval_ms`, plus a debounced window resize.
    Polling {
        /// Poll interval.
        interval_ms: u32,
    },
}

impl ResizeStrategy {
    /// Observer when available, else polling.
    #[must_use]
    pub const fn choose(observer_available: bool, interval_ms: u32) -> Self {
        if observer_available {
            Self::Observer
        } else {
            Self::Polling { interval_ms }
        }
    }
}

/// Last known state of one wrapped table.
#[derive(Clone, Debug, PartialEq)]
pub struct TableScrollState {
    key: String,
    scrollable: bool,
    metrics: ScrollMetrics,
}

impl TableScrollState {
    /// Untracked table; first measurement decides scrollability.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            scrollable: false,
            metrics: ScrollMetrics::default(),
        }
    }

    /// Table key (`data-table-id`).
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the table currently overflows.
    #[must_use]
    pub const fn is_scrollable(&self) -> bool {
        self.scrollable
    }

    /// Latest measurement.
    #[must_use]
    pub const fn metrics(&self) -> &ScrollMetrics {
        &self.metrics
    }

    /// Record a measurement. Returns the new scrollability when it changed.
    pub fn measure(&mut self, metrics: ScrollMetrics) -> Option<bool> {
        self.metrics = metrics;
        let scrollable = metrics.is_scrollable();
        if scrollable == self.scrollable {
            return None;
        }
        self.scrollable = scrollable;
        tracing::debug!(component = COMPONENT, table = %self.key, scrollable, "scrollability changed");
        Some(scrollable)
    }
}

/// Wrapped tables a [`TableController`] measures and scrolls.
pub trait TableViewport<N> {
    /// Number of wrapped tables.
    fn len(&self) -> usize;

    /// Whether nothing is wrapped.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scroll container of table `index`.
    fn wrapper(&self, index: usize) -> Option<&N>;

    /// The `<table>` itself.
    fn table(&self, index: usize) -> Option<&N>;

    /// Current sizes of table `index`.
    fn measure(&self, index: usize) -> Option<ScrollMetrics>;

    /// Move the wrapper to `left`.
    fn scroll_left_to(&self, index: usize, left: f64, smooth: bool);

    /// Reflect a measurement on the wrapper and its indicators.
    fn render(&self, index: usize, metrics: &ScrollMetrics);

    /// Swap the screen reader hint when the wrapper gains or loses focus.
    fn focus_hint(&self, index: usize, focused: bool, scrollable: bool);
}

/// Scroll state of every wrapped table bound to an event manager.
pub struct TableController<H: Host, V> {
    states: RefCell<Vec<TableScrollState>>,
    view: V,
    manager: EventManager<H>,
    smooth: bool,
    step: f64,
}

impl<H, V> TableController<H, V>
where
    H: Host,
    V: TableViewport<H::Node> + 'static,
{
    /// Track one table per key, in viewport order.
    pub fn new(
        manager: &EventManager<H>,
        config: &ResponsiveTableConfig,
        keys: Vec<String>,
        view: V,
    ) -> Self {
        Self {
            states: RefCell::new(keys.into_iter().map(TableScrollState::new).collect()),
            view,
            manager: manager.clone(),
            smooth: config.smooth_scroll,
            step: f64::from(config.scroll_step),
        }
    }

    /// Viewport.
    pub const fn view(&self) -> &V {
        &self.view
    }

    /// Number of tracked tables.
    pub fn len(&self) -> usize {
        self.states.borrow().len()
    }

    /// Whether no table is tracked.
    pub fn is_empty(&self) -> bool {
        self.states.borrow().is_empty()
    }

    /// Position of the table keyed `key`.
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.states.borrow().iter().position(|state| state.key() == key)
    }

    /// Last recorded state of table `index`.
    pub fn scroll_state(&self, index: usize) -> Option<TableScrollState> {
        self.states.borrow().get(index).cloned()
    }

    /// Scroll table `index` to `percent` of its range. Returns the offset
    /// requested, `None` for an unknown table.
    pub fn scroll_to(&self, index: usize, percent: f64) -> Option<f64> {
        let metrics = self.view.measure(index)?;
        let left = metrics.offset_for_percentage(percent);
        self.view.scroll_left_to(index, left, self.smooth);
        Some(left)
    }

    /// Scroll table `index` fully left.
    pub fn scroll_to_start(&self, index: usize) -> Option<f64> {
        self.scroll_to(index, 0.0)
    }

    /// Scroll table `index` fully right.
    pub fn scroll_to_end(&self, index: usize) -> Option<f64> {
        self.scroll_to(index, 100.0)
    }

    /// Elements whose size changes require a re-measure: each wrapper and
    /// its table.
    pub fn resize_targets(&self) -> Vec<H::Node> {
        (0..self.view.len())
            .flat_map(|index| [self.view.wrapper(index), self.view.table(index)])
            .flatten()
            .cloned()
            .collect()
    }

    /// Re-measure table `index`, emitting a scroll event when `scrolled`.
    pub fn update(&self, index: usize, scrolled: bool) {
        let Some(metrics) = self.view.measure(index) else {
            return;
        };
        let (key, changed) = {
            let mut states = self.states.borrow_mut();
            let Some(state) = states.get_mut(index) else {
                return;
            };
            let changed = state.measure(metrics);
            (state.key().to_string(), changed)
        };
        self.view.render(index, &metrics);

        if let Some(scrollable) = changed {
            self.manager.emit(
                &Component::Table.event(SCROLLABILITY_CHANGED),
                &json!({ "tableId": key, "scrollable": scrollable }),
                None,
            );
        }
        if scrolled {
            self.manager.emit(
                &Component::Table.event(SCROLL),
                &json!({
                    "tableId": key,
                    "scrollLeft": metrics.scroll_left,
                    "percentage": metrics.percentage(),
                }),
                None,
            );
        }
    }

    /// Re-measure every table.
    pub fn update_all(&self) {
        for index in 0..self.len() {
            self.update(index, false);
        }
    }

    fn key_pressed(&self, index: usize, event: &H::Event) {
        let (Some(key), Some(metrics)) = (event.key(), self.view.measure(index)) else {
            return;
        };
        let Some(left) = key_scroll(&key, event.has_modifier(), &metrics, self.step) else {
            return;
        };
        event.prevent_default();
        match key.as_str() {
            "Home" => {
                self.scroll_to_start(index);
            }
            "End" => {
                self.scroll_to_end(index);
            }
            _ => self.view.scroll_left_to(index, left, self.smooth),
        }
    }

    fn focus_changed(&self, index: usize, focused: bool) {
        let scrollable = self
            .states
            .borrow()
            .get(index)
            .is_some_and(TableScrollState::is_scrollable);
        self.view.focus_hint(index, focused, scrollable);
    }

    /// Register wrapper scroll, key and focus listeners plus a debounced
    /// window resize.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::Events`](crate::WidgetError::Events) when a
    /// registration is refused.
    pub fn bind(
        self: &Rc<Self>,
        config: &ResponsiveTableConfig,
        registrations: &mut Registrations<H>,
    ) -> WidgetResult<()> {
        let manager = registrations.manager().clone();
        for index in 0..self.view.len() {
            let Some(wrapper) = self.view.wrapper(index) else {
                continue;
            };
            let target = Target::Node(wrapper.clone());

            let scrolls = Rc::clone(self);
            registrations.keep(manager.throttle(
                &target,
                "scroll",
                move |_| {
                    scrolls.update(index, true);
                    Ok(())
                },
                None,
            ))?;
            if config.keyboard_navigation {
                let keys = Rc::clone(self);
                registrations.keep(manager.on(&target, "keydown", move |event| {
                    keys.key_pressed(index, event);
                    Ok(())
                }))?;
            }
            let focuses = Rc::clone(self);
            registrations.keep(manager.on(&target, "focus", move |_| {
                focuses.focus_changed(index, true);
                Ok(())
            }))?;
            let blurs = Rc::clone(self);
            registrations.keep(manager.on(&target, "blur", move |_| {
                blurs.focus_changed(index, false);
                Ok(())
            }))?;
        }

        let resizes = Rc::clone(self);
        registrations.keep(manager.debounce(
            &Target::Window,
            "resize",
            move |_| {
                resizes.update_all();
                Ok(())
            },
            Some(config.resize_debounce_ms),
        ))?;
        Ok(())
    }
}
