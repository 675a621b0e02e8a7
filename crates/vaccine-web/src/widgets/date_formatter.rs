//! Width-aware Swedish dates inside table containers.
//!
//! # Design
//! - Original texts and weights are stashed in `data-original-*` attributes
//!   so every pass formats from the source values, never from its own output.
//! - A container is only rewritten when its width class changes.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{Datelike, Local, NaiveDate};
use gloo::utils::window;
use serde_json::json;
use vaccine_config::DateFormatConfig;
use vaccine_events::{BrowserHost, EventManager, Target};
use vaccine_widgets::date_format::{
    COMPONENT, CURRENT_CELL_CLASS, CURRENT_DATE_CLASS, CURRENT_ROW_CLASS, CURRENT_WEEKDAY_CLASS,
    FormatType, RowCell, UPCOMING_ATTRIBUTE, UPCOMING_LABEL, find_day_index, format_date,
    format_day, is_upcoming, parse_date_attribute, parse_weight, plan_row_highlight, row_date,
    weekday_column, weight_css,
};
use vaccine_widgets::lifecycle::{DESTROYED, READY};
use vaccine_widgets::{Component, Widget, WidgetResult};
use web_sys::Element;

use crate::context::{PageContext, Registrations, emit};
use crate::dom::{self, ResizeWatch};

const ORIGINAL_TEXT: &str = "data-original-text";
const ORIGINAL_DAY: &str = "data-original-day";
const ORIGINAL_WEIGHT: &str = "data-original-weight";
const WEEKDAY_HIDDEN_CLASS: &str = "weekday-hidden";
const POLL_INTERVAL_MS: u32 = 500;
const RESIZE_DEBOUNCE_MS: u32 = 250;

/// Stored original, recorded on first sight.
fn original(element: &Element, attribute: &str) -> String {
    if let Some(value) = element.get_attribute(attribute) {
        return value;
    }
    let value = dom::text(element);
    dom::set_attr(element, attribute, &value);
    value
}

fn original_weight(cell: &Element) -> u16 {
    if let Some(stored) = cell.get_attribute(ORIGINAL_WEIGHT) {
        return parse_weight(&stored);
    }
    let computed = window()
        .get_computed_style(cell)
        .ok()
        .flatten()
        .and_then(|style| style.get_property_value("font-weight").ok())
        .unwrap_or_default();
    let weight = parse_weight(&computed);
    dom::set_attr(cell, ORIGINAL_WEIGHT, &weight.to_string());
    weight
}

fn date_of(element: &Element) -> Option<NaiveDate> {
    element
        .get_attribute("datetime")
        .or_else(|| element.get_attribute("data-date"))
        .as_deref()
        .and_then(parse_date_attribute)
}

fn texts(cells: &[Element]) -> Vec<String> {
    cells.iter().map(dom::text).collect()
}

struct Shared {
    config: DateFormatConfig,
    containers: Vec<Element>,
    formats: RefCell<Vec<Option<FormatType>>>,
    manager: EventManager<BrowserHost>,
}

impl Shared {
    fn refresh(&self) {
        for (index, container) in self.containers.iter().enumerate() {
            let format = FormatType::for_width(f64::from(container.client_width()));
            let previous = self.formats.borrow().get(index).copied().flatten();
            if previous == Some(format) {
                continue;
            }
            if let Some(slot) = self.formats.borrow_mut().get_mut(index) {
                *slot = Some(format);
            }
            self.format_dates(container, format);
            for table in dom::query_within(container, "table") {
                self.format_weekdays(&table, format);
            }
            tracing::debug!(component = COMPONENT, container = index, format = ?format, "dates reformatted");
        }
    }

    fn format_dates(&self, container: &Element, format: FormatType) {
        for element in dom::query_within(container, &self.config.date_selector) {
            let Some(date) = date_of(&element) else {
                continue;
            };
            original(&element, ORIGINAL_TEXT);
            element.set_text_content(Some(&format_date(date, format)));
            dom::set_attr(&element, "aria-label", &format_date(date, FormatType::Full));
        }
    }

    fn format_weekdays(&self, table: &Element, format: FormatType) {
        let headers = dom::query_within(table, "thead th");
        let first_row = dom::query_one(table, "tbody tr")
            .map(|row| dom::query_within(&row, "td"))
            .unwrap_or_default();
        let header_texts = texts(&headers);
        let row_texts = texts(&first_row);
        let Some(column) = weekday_column(
            &header_texts.iter().map(String::as_str).collect::<Vec<_>>(),
            &row_texts.iter().map(String::as_str).collect::<Vec<_>>(),
        ) else {
            return;
        };
        let hidden = !format.shows_weekdays();
        if let Some(header) = headers.get(column) {
            dom::toggle_class(header, WEEKDAY_HIDDEN_CLASS, hidden);
        }
        for row in dom::query_within(table, "tbody tr") {
            let Some(cell) = dom::query_within(&row, "td").into_iter().nth(column) else {
                continue;
            };
            dom::toggle_class(&cell, WEEKDAY_HIDDEN_CLASS, hidden);
            let source = original(&cell, ORIGINAL_DAY);
            if let Some(name) = find_day_index(&source).and_then(|day| format_day(day, format)) {
                cell.set_text_content(Some(name));
            }
        }
    }

    fn highlight(&self, today: NaiveDate) -> usize {
        let mut highlighted = 0;
        for container in &self.containers {
            for row in dom::query_within(container, "tbody tr") {
                let datetime = dom::query_one(&row, "time[datetime]")
                    .and_then(|time| time.get_attribute("datetime"));
                let cells = dom::query_within(&row, "td");
                let first = cells.first().map(|cell| original(cell, ORIGINAL_TEXT));
                let Some(date) = row_date(datetime.as_deref(), first.as_deref(), today.year()) else {
                    continue;
                };
                if date == today {
                    self.highlight_row(&row, &cells);
                    highlighted += 1;
                } else if is_upcoming(date, today, self.config.upcoming_days) {
                    dom::set_attr(&row, UPCOMING_ATTRIBUTE, "true");
                    dom::set_attr(&row, "aria-description", UPCOMING_LABEL);
                }
            }
        }
        highlighted
    }

    fn highlight_row(&self, row: &Element, cells: &[Element]) {
        dom::toggle_class(row, CURRENT_ROW_CLASS, true);
        dom::set_attr(row, "aria-current", "date");
        let measured: Vec<RowCell> = cells
            .iter()
            .map(|cell| RowCell {
                original_weight: original_weight(cell),
                has_time: dom::query_one(cell, "time").is_some(),
                text: dom::text(cell),
            })
            .collect();
        let plan = plan_row_highlight(&measured, self.config.today_weight_increase);
        for (cell, highlight) in cells.iter().zip(plan) {
            dom::toggle_class(cell, CURRENT_CELL_CLASS, true);
            dom::toggle_class(cell, CURRENT_DATE_CLASS, highlight.date);
            dom::toggle_class(cell, CURRENT_WEEKDAY_CLASS, highlight.weekday);
            dom::set_style(cell, "font-weight", &weight_css(highlight.weight));
        }
    }
}

/// Running date formatter.
pub(crate) struct DateFormatterWidget {
    shared: Rc<Shared>,
    registrations: Registrations,
    watch: Option<ResizeWatch>,
}

pub(crate) fn factory(context: &PageContext) -> WidgetResult<Option<Box<dyn Widget>>> {
    let config = context.config.date_formatter.clone();
    let containers: Vec<Element> = dom::query_all(&config.container_selector)
        .into_iter()
        .filter(|container| !dom::query_within(container, &config.date_selector).is_empty())
        .collect();
    if containers.is_empty() {
        return Ok(None);
    }
    let shared = Rc::new(Shared {
        formats: RefCell::new(vec![None; containers.len()]),
        config,
        containers,
        manager: context.manager.clone(),
    });
    shared.refresh();
    let highlighted = if shared.config.highlight_today {
        shared.highlight(Local::now().date_naive())
    } else {
        0
    };

    let manager = &context.manager;
    let mut registrations = Registrations::new(manager, COMPONENT);
    let resizes = Rc::clone(&shared);
    registrations.keep(manager.debounce(
        &Target::Window,
        "resize",
        move |_| {
            resizes.refresh();
            Ok(())
        },
        Some(RESIZE_DEBOUNCE_MS),
    ))?;
    let observed = Rc::clone(&shared);
    let watch = ResizeWatch::start(
        &shared.containers,
        POLL_INTERVAL_MS,
        Rc::new(move || observed.refresh()),
    );

    emit(
        manager,
        Component::DateFormatter,
        READY,
        &json!({ "containers": shared.containers.len(), "highlightedRows": highlighted }),
    );
    Ok(Some(Box::new(DateFormatterWidget {
        shared,
        registrations,
        watch: Some(watch),
    })))
}

impl Widget for DateFormatterWidget {
    fn name(&self) -> &'static str {
        "date-formatter"
    }

    fn destroy(&mut self) {
        self.registrations.release();
        if let Some(watch) = self.watch.take() {
            watch.stop();
        }
        emit(&self.shared.manager, Component::DateFormatter, DESTROYED, &json!({}));
    }
}
