//! Accordion/FAQ projection.

use std::rc::Rc;

use serde_json::json;
use vaccine_config::AccordionConfig;
use vaccine_events::{BrowserHost, EventManager};
use vaccine_widgets::accordion::{
    ANNOUNCEMENT_MS, AccordionController, AccordionItem, AccordionView, COMPONENT,
};
use vaccine_widgets::lifecycle::{DESTROYED, READY};
use vaccine_widgets::{Component, IdAllocator, Widget, WidgetResult};
use web_sys::Element;

use crate::context::{PageContext, Registrations, emit, setup_failed};
use crate::dom;

const TITLE_WRAP_FAILED: &str = "TITLE_WRAP_FAILED";

struct ItemView {
    container: Element,
    header: Element,
    content: Option<Element>,
    details: bool,
}

struct PageItems {
    items: Vec<ItemView>,
    active_class: String,
}

impl AccordionView<Element> for PageItems {
    fn header_index(&self, header: &Element) -> Option<usize> {
        self.items.iter().position(|item| item.header == *header)
    }

    fn container_index(&self, container: &Element) -> Option<usize> {
        self.items.iter().position(|item| item.container == *container)
    }

    fn native_open(&self, index: usize) -> Option<bool> {
        let item = self.items.get(index)?;
        item.details.then(|| item.container.has_attribute("open"))
    }

    fn render(&self, index: usize, open: bool) {
        let Some(item) = self.items.get(index) else {
            return;
        };
        if item.details && item.container.has_attribute("open") != open {
            if open {
                dom::set_attr(&item.container, "open", "");
            } else {
                dom::remove_attr(&item.container, "open");
            }
        }
        dom::toggle_class(&item.container, &self.active_class, open);
        dom::set_attr(&item.header, "aria-expanded", if open { "true" } else { "false" });
        if let Some(content) = &item.content {
            dom::set_attr(content, "aria-hidden", if open { "false" } else { "true" });
        }
    }

    fn focus_header(&self, index: usize) {
        if let Some(item) = self.items.get(index) {
            dom::focus(&item.header);
        }
    }

    fn announce(&self, message: &str) {
        dom::announce(message, ANNOUNCEMENT_MS);
    }
}

type Controller = AccordionController<BrowserHost, PageItems>;

fn ensure_title(header: &Element, question: &str) -> WidgetResult<()> {
    if dom::query_one(header, ".accordion-title").is_some() {
        return Ok(());
    }
    let title = dom::create_with("span", "accordion-title", Some(question))
        .map_err(setup_failed(COMPONENT, TITLE_WRAP_FAILED))?;
    header.set_text_content(None);
    dom::append(header, &title).map_err(setup_failed(COMPONENT, TITLE_WRAP_FAILED))
}

fn prepare(
    config: &AccordionConfig,
    ids: &mut IdAllocator,
    container: Element,
) -> WidgetResult<Option<(ItemView, AccordionItem)>> {
    let Some(header) = dom::query_one(&container, &config.header_selector) else {
        tracing::warn!(component = COMPONENT, "accordion item without header skipped");
        return Ok(None);
    };
    let content = dom::query_one(&container, &config.content_selector);
    let key = ids.key_for(dom::id_of(&container).as_deref());
    let question = dom::text(&header);
    let details = container.tag_name().eq_ignore_ascii_case("details");
    let open = if details {
        container.has_attribute("open")
    } else {
        dom::has_class(&container, &config.active_class)
    };

    dom::set_attr(&container, "data-question", &question);
    ensure_title(&header, &question)?;
    let header_id = format!("{key}-header");
    dom::set_attr(&header, "id", &header_id);
    dom::set_attr(&header, "tabindex", "0");
    if !header.tag_name().eq_ignore_ascii_case("summary") {
        dom::set_attr(&header, "role", "button");
    }
    if let Some(content) = &content {
        let content_id = format!("{key}-content");
        dom::set_attr(content, "id", &content_id);
        dom::set_attr(content, "role", "region");
        dom::set_attr(content, "aria-labelledby", &header_id);
        if config.announce_changes {
            dom::set_attr(content, "aria-live", "polite");
        }
        dom::set_attr(&header, "aria-controls", &content_id);
    }
    let item = AccordionItem {
        open,
        ..AccordionItem::new(key, question)
    };
    Ok(Some((
        ItemView {
            container,
            header,
            content,
            details,
        },
        item,
    )))
}

/// Running accordion widget.
pub(crate) struct AccordionWidget {
    controller: Rc<Controller>,
    manager: EventManager<BrowserHost>,
    registrations: Registrations,
}

pub(crate) fn factory(context: &PageContext) -> WidgetResult<Option<Box<dyn Widget>>> {
    let config = &context.config.accordion;
    let mut ids = IdAllocator::new("accordion");
    let mut views = Vec::new();
    let mut items = Vec::new();
    for container in dom::query_all(&config.selector) {
        if let Some((view, item)) = prepare(config, &mut ids, container)? {
            views.push(view);
            items.push(item);
        }
    }
    if views.is_empty() {
        return Ok(None);
    }

    let page = PageItems {
        items: views,
        active_class: config.active_class.clone(),
    };
    let controller = Rc::new(AccordionController::new(&context.manager, config, items, page));
    controller.render_all();

    let mut registrations = Registrations::new(&context.manager, COMPONENT);
    controller.bind(config, &mut registrations)?;

    let count = controller.state().len();
    emit(
        &context.manager,
        Component::Accordion,
        READY,
        &json!({ "count": count, "single": config.single }),
    );
    tracing::info!(component = COMPONENT, count, "accordion ready");
    Ok(Some(Box::new(AccordionWidget {
        controller,
        manager: context.manager.clone(),
        registrations,
    })))
}

impl Widget for AccordionWidget {
    fn name(&self) -> &'static str {
        "accordion"
    }

    fn destroy(&mut self) {
        self.registrations.release();
        tracing::debug!(
            component = COMPONENT,
            open = self.controller.state().open_indices().len(),
            "accordion released"
        );
        emit(&self.manager, Component::Accordion, DESTROYED, &json!({}));
    }
}
