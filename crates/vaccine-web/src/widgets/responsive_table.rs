//! Scroll wrappers for wide tables.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo::timers::callback::Timeout;
use serde_json::json;
use vaccine_config::ResponsiveTableConfig;
use vaccine_events::BrowserHost;
use vaccine_widgets::lifecycle::{DESTROYED, READY};
use vaccine_widgets::responsive_table::{
    COMPONENT, FOCUS_HINT, HINT_CLEAR_MS, SCROLL_HINT, TableController, TableViewport, caption_for,
    header_id, header_scope,
};
use vaccine_widgets::{Component, IdAllocator, ScrollMetrics, Widget, WidgetResult};
use wasm_bindgen::prelude::wasm_bindgen;
use web_sys::{Element, ScrollBehavior, ScrollToOptions};

use crate::context::{PageContext, Registrations, emit, setup_failed};
use crate::dom::{self, ResizeWatch};
use crate::error::{WebError, WebResult};

const WRAPPER_CLASS: &str = "table-scroll-container";
const WRAP_FAILED: &str = "TABLE_WRAP_FAILED";

struct TableView {
    key: String,
    wrapper: Element,
    table: Element,
    indicators: Option<(Element, Element)>,
    hint: Element,
    hint_reset: RefCell<Option<Timeout>>,
}

struct PageTables {
    views: Vec<TableView>,
}

type Controller = TableController<BrowserHost, PageTables>;

thread_local! {
    static ACTIVE: RefCell<Weak<Controller>> = RefCell::new(Weak::new());
}

fn with_table<T>(table_id: &str, run: impl FnOnce(&Controller, usize) -> Option<T>) -> Option<T> {
    let controller = ACTIVE.with(|active| active.borrow().upgrade())?;
    let index = controller.index_of(table_id)?;
    run(&controller, index)
}

/// Scroll the table keyed `table_id` to `percent` of its horizontal range.
/// Returns the requested `scrollLeft`, `None` for an unknown table.
#[wasm_bindgen(js_name = scrollTableTo)]
#[must_use]
pub fn scroll_table_to(table_id: &str, percent: f64) -> Option<f64> {
    with_table(table_id, |controller, index| controller.scroll_to(index, percent))
}

/// Scroll the table keyed `table_id` fully left.
#[wasm_bindgen(js_name = scrollTableToStart)]
#[must_use]
pub fn scroll_table_to_start(table_id: &str) -> Option<f64> {
    with_table(table_id, Controller::scroll_to_start)
}

/// Scroll the table keyed `table_id` fully right.
#[wasm_bindgen(js_name = scrollTableToEnd)]
#[must_use]
pub fn scroll_table_to_end(table_id: &str) -> Option<f64> {
    with_table(table_id, Controller::scroll_to_end)
}

/// Last measured scroll percentage of the table keyed `table_id`.
#[wasm_bindgen(js_name = tableScrollPercentage)]
#[must_use]
pub fn table_scroll_percentage(table_id: &str) -> Option<f64> {
    with_table(table_id, |controller, index| {
        controller
            .scroll_state(index)
            .map(|state| state.metrics().percentage())
    })
}

impl TableViewport<Element> for PageTables {
    fn len(&self) -> usize {
        self.views.len()
    }

    fn wrapper(&self, index: usize) -> Option<&Element> {
        self.views.get(index).map(|view| &view.wrapper)
    }

    fn table(&self, index: usize) -> Option<&Element> {
        self.views.get(index).map(|view| &view.table)
    }

    fn measure(&self, index: usize) -> Option<ScrollMetrics> {
        let view = self.views.get(index)?;
        Some(ScrollMetrics {
            scroll_left: f64::from(view.wrapper.scroll_left()),
            scroll_width: f64::from(view.wrapper.scroll_width()),
            client_width: f64::from(view.wrapper.client_width()),
            table_width: f64::from(view.table.scroll_width()),
        })
    }

    fn scroll_left_to(&self, index: usize, left: f64, smooth: bool) {
        let Some(view) = self.views.get(index) else {
            return;
        };
        let options = ScrollToOptions::new();
        options.set_left(left);
        options.set_behavior(if smooth {
            ScrollBehavior::Smooth
        } else {
            ScrollBehavior::Instant
        });
        view.wrapper.scroll_to_with_scroll_to_options(&options);
    }

    fn render(&self, index: usize, metrics: &ScrollMetrics) {
        let Some(view) = self.views.get(index) else {
            return;
        };
        let scrollable = metrics.is_scrollable();
        dom::set_attr(&view.wrapper, "data-scrollable", if scrollable { "true" } else { "false" });
        dom::toggle_class(&view.wrapper, "is-scrollable", scrollable);
        dom::set_attr(&view.wrapper, "aria-valuemin", "0");
        dom::set_attr(&view.wrapper, "aria-valuemax", "100");
        dom::set_attr(&view.wrapper, "aria-valuenow", &metrics.rounded_percentage().to_string());
        dom::set_attr(&view.wrapper, "aria-valuetext", &metrics.value_text());
        if let Some((left, right)) = &view.indicators {
            let (left_opacity, right_opacity) = metrics.indicator_opacity();
            dom::set_style(left, "opacity", &left_opacity.to_string());
            dom::set_style(right, "opacity", &right_opacity.to_string());
        }
    }

    fn focus_hint(&self, index: usize, focused: bool, scrollable: bool) {
        let Some(view) = self.views.get(index) else {
            return;
        };
        if focused {
            view.hint_reset.borrow_mut().take();
            if scrollable {
                view.hint.set_text_content(Some(FOCUS_HINT));
            }
            return;
        }
        let hint = view.hint.clone();
        let reset = Timeout::new(HINT_CLEAR_MS, move || {
            hint.set_text_content(Some(SCROLL_HINT));
        });
        view.hint_reset.borrow_mut().replace(reset);
    }
}

fn class_names(element: &Element) -> Vec<String> {
    element
        .class_name()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn ensure_wrapper(table: &Element) -> WebResult<Element> {
    if let Some(parent) = table.parent_element() {
        if dom::has_class(&parent, WRAPPER_CLASS) {
            dom::toggle_class(&parent, "responsive-table-wrapper", true);
            return Ok(parent);
        }
    }
    let wrapper = dom::create_with("div", "table-scroll-container responsive-table-wrapper", None)?;
    let parent = table.parent_node().ok_or_else(|| WebError::MissingElement {
        selector: "table parent".to_string(),
    })?;
    parent
        .insert_before(&wrapper, Some(table))
        .map_err(|err| WebError::from_js("insertBefore", &err))?;
    dom::append(&wrapper, table)?;
    Ok(wrapper)
}

fn label_cells(table: &Element, key: &str) {
    let headers = dom::query_within(table, "thead th, tr:first-child th");
    let mut ids = Vec::with_capacity(headers.len());
    for (index, header) in headers.iter().enumerate() {
        dom::set_attr_if_missing(header, "scope", header_scope(index));
        dom::set_attr_if_missing(header, "id", &header_id(key, index));
        ids.push(dom::id_of(header).unwrap_or_else(|| header_id(key, index)));
    }
    for row in dom::query_within(table, "tbody tr") {
        for (index, cell) in dom::query_within(&row, "td").iter().enumerate() {
            if let Some(id) = ids.get(index) {
                dom::set_attr_if_missing(cell, "headers", id);
            }
        }
    }
}

fn prepare(
    config: &ResponsiveTableConfig,
    ids: &mut IdAllocator,
    table: Element,
) -> WebResult<TableView> {
    let key = ids.key_for(dom::id_of(&table).as_deref());
    let wrapper = ensure_wrapper(&table)?;
    dom::set_attr(&wrapper, "role", "region");
    dom::set_attr(&wrapper, "aria-label", "Scrollable table");
    dom::set_attr(&wrapper, "tabindex", "0");
    dom::set_attr(&wrapper, "data-table-id", &key);

    dom::set_attr_if_missing(&table, "role", "table");
    if config.add_caption && dom::query_one(&table, "caption").is_none() {
        let classes = class_names(&table);
        let classes: Vec<&str> = classes.iter().map(String::as_str).collect();
        let caption = dom::create_with("caption", dom::SR_ONLY, Some(caption_for(&classes)))?;
        table
            .insert_before(&caption, table.first_child().as_ref())
            .map_err(|err| WebError::from_js("insertBefore", &err))?;
    }
    label_cells(&table, &key);

    let hint = dom::create_with("div", dom::SR_ONLY, Some(SCROLL_HINT))?;
    let hint_id = format!("{key}-hint");
    dom::set_attr(&hint, "id", &hint_id);
    dom::append(&wrapper, &hint)?;
    dom::set_attr(&wrapper, "aria-describedby", &hint_id);

    let indicators = if config.show_scroll_indicators {
        let left = dom::create_with("div", "scroll-indicator scroll-indicator-left", None)?;
        let right = dom::create_with("div", "scroll-indicator scroll-indicator-right", None)?;
        for indicator in [&left, &right] {
            dom::set_attr(indicator, "aria-hidden", "true");
            dom::append(&wrapper, indicator)?;
        }
        Some((left, right))
    } else {
        None
    };

    Ok(TableView {
        key,
        wrapper,
        table,
        indicators,
        hint,
        hint_reset: RefCell::new(None),
    })
}

/// Running responsive table widget.
pub(crate) struct ResponsiveTableWidget {
    controller: Rc<Controller>,
    registrations: Registrations,
    watch: Option<ResizeWatch>,
}

pub(crate) fn factory(context: &PageContext) -> WidgetResult<Option<Box<dyn Widget>>> {
    let config = context.config.responsive_table.clone();
    let tables = dom::query_all(&config.selector);
    if tables.is_empty() {
        return Ok(None);
    }
    let mut ids = IdAllocator::new("responsive-table");
    let views = tables
        .into_iter()
        .map(|table| prepare(&config, &mut ids, table))
        .collect::<WebResult<Vec<_>>>()
        .map_err(setup_failed(COMPONENT, WRAP_FAILED))?;
    let keys = views.iter().map(|view| view.key.clone()).collect();

    let manager = &context.manager;
    let controller = Rc::new(Controller::new(manager, &config, keys, PageTables { views }));
    let mut registrations = Registrations::new(manager, COMPONENT);
    controller.bind(&config, &mut registrations)?;

    let observed = Rc::clone(&controller);
    let watch = ResizeWatch::start(
        &controller.resize_targets(),
        config.poll_interval_ms,
        Rc::new(move || observed.update_all()),
    );

    controller.update_all();
    ACTIVE.with(|active| *active.borrow_mut() = Rc::downgrade(&controller));
    emit(
        manager,
        Component::ResponsiveTable,
        READY,
        &json!({ "tables": controller.len() }),
    );
    Ok(Some(Box::new(ResponsiveTableWidget {
        controller,
        registrations,
        watch: Some(watch),
    })))
}

impl Widget for ResponsiveTableWidget {
    fn name(&self) -> &'static str {
        "responsive-table"
    }

    fn destroy(&mut self) {
        self.registrations.release();
        if let Some(watch) = self.watch.take() {
            watch.stop();
        }
        for view in &self.controller.view().views {
            view.hint_reset.borrow_mut().take();
        }
        ACTIVE.with(|active| *active.borrow_mut() = Weak::new());
        emit(
            self.registrations.manager(),
            Component::ResponsiveTable,
            DESTROYED,
            &json!({}),
        );
    }
}
