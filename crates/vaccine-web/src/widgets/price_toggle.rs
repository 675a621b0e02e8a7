//! Price tier switcher projection.

use std::rc::Rc;

use gloo::utils::{body, document};
use serde_json::json;
use vaccine_events::BrowserHost;
use vaccine_widgets::lifecycle::{DESTROYED, READY};
use vaccine_widgets::price_toggle::{
    COMPONENT, PriceToggleController, PriceToggleView, column_visible, is_view_class,
};
use vaccine_widgets::{Component, PriceTier, PriceToggle, ToggleDescriptor, Widget, WidgetResult};
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlInputElement};

use crate::context::{PageContext, Registrations, emit};
use crate::dom;

const ANNOUNCEMENT_MS: u32 = 1_000;

struct PageToggles {
    table: Element,
    inputs: Vec<HtmlInputElement>,
    labels: Vec<Option<Element>>,
    fallback_styling: bool,
}

type Controller = PriceToggleController<BrowserHost, PageToggles>;

fn label_for(id: &str) -> Option<Element> {
    dom::query_first(&format!("label[for=\"{id}\"]"))
}

fn clear_view_classes() {
    let list = body().class_list();
    let stale: Vec<String> = (0..list.length())
        .filter_map(|index| list.item(index))
        .filter(|class| is_view_class(class))
        .collect();
    for class in stale {
        if list.remove_1(&class).is_err() {
            tracing::debug!(component = COMPONENT, class, "body class removal rejected");
        }
    }
}

impl PageToggles {
    fn apply_fallback_styling(&self, tier: PriceTier) {
        for row in dom::query_within(&self.table, "tr") {
            for (index, cell) in dom::query_within(&row, "th, td").iter().enumerate() {
                let column = index + 1;
                let display = if column_visible(column, tier) { "" } else { "none" };
                dom::set_style(cell, "display", display);
            }
        }
    }
}

impl PriceToggleView<Element> for PageToggles {
    fn toggle_index(&self, input: &Element) -> Option<usize> {
        self.inputs.iter().position(|candidate| candidate.id() == input.id())
    }

    fn label_index(&self, label: &Element) -> Option<usize> {
        self.labels
            .iter()
            .position(|candidate| candidate.as_ref() == Some(label))
    }

    fn label_text(&self, index: usize) -> Option<String> {
        self.labels.get(index)?.as_ref().map(dom::text)
    }

    fn render(&self, toggle: &PriceToggle) {
        let current = toggle.current_view();
        let selected = toggle.selected_id();
        clear_view_classes();
        dom::toggle_class(&body(), &current.body_class(), true);

        for (input, label) in self.inputs.iter().zip(&self.labels) {
            let active = selected == Some(input.id().as_str());
            input.set_checked(active);
            if let Some(label) = label {
                dom::toggle_class(label, "active", active);
                dom::set_attr(label, "aria-pressed", if active { "true" } else { "false" });
            }
        }

        dom::set_attr(&self.table, "aria-label", &current.aria_label());
        let caption = dom::query_one(&self.table, "caption").or_else(|| {
            let caption = dom::create_with("caption", dom::SR_ONLY, None).ok()?;
            self.table
                .insert_before(&caption, self.table.first_child().as_ref())
                .ok()?;
            Some(caption)
        });
        if let Some(caption) = caption {
            caption.set_text_content(Some(&current.caption()));
        }

        if self.fallback_styling {
            self.apply_fallback_styling(current);
        }
    }

    fn focus_label(&self, index: usize) {
        if let Some(Some(label)) = self.labels.get(index) {
            dom::focus(label);
        }
    }

    fn announce(&self, message: &str) {
        dom::announce(message, ANNOUNCEMENT_MS);
    }
}

fn enhance_label(label: &Element, tier: PriceTier) {
    dom::set_attr(label, "data-enhanced", "true");
    dom::set_attr(label, "tabindex", "0");
    dom::set_attr(label, "aria-pressed", "false");
    if dom::query_one(label, ".sr-only").is_none() {
        if let Ok(suffix) = dom::create_with("span", dom::SR_ONLY, Some(&tier.label_suffix())) {
            if dom::append(label, &suffix).is_err() {
                tracing::debug!(component = COMPONENT, "label suffix not appended");
            }
        }
    }
}

/// Running price toggle widget.
pub(crate) struct PriceToggleWidget {
    controller: Rc<Controller>,
    registrations: Registrations,
}

pub(crate) fn factory(context: &PageContext) -> WidgetResult<Option<Box<dyn Widget>>> {
    let config = context.config.price_toggle.clone();
    let candidates: Vec<HtmlInputElement> = dom::query_all(&config.selector)
        .into_iter()
        .filter_map(|element| element.dyn_into::<HtmlInputElement>().ok())
        .collect();
    if candidates.is_empty() {
        return Ok(None);
    }
    let table = document().query_selector(&config.table_selector).ok().flatten();
    let descriptors: Vec<ToggleDescriptor> = candidates
        .iter()
        .map(|input| {
            let id = input.id();
            ToggleDescriptor {
                has_label: !id.trim().is_empty() && label_for(&id).is_some(),
                id,
                data_price_type: input.get_attribute("data-price-type"),
                value: Some(input.value()).filter(|value| !value.is_empty()),
                checked: input.checked(),
            }
        })
        .collect();
    let toggle = PriceToggle::new(&config, table.is_some(), &descriptors)?;
    let Some(table) = table else {
        return Ok(None);
    };

    let inputs: Vec<HtmlInputElement> = toggle
        .toggles()
        .iter()
        .filter_map(|entry| {
            candidates
                .iter()
                .find(|input| input.id() == entry.id)
                .cloned()
        })
        .collect();
    let labels: Vec<Option<Element>> = toggle
        .toggles()
        .iter()
        .map(|entry| {
            let label = label_for(&entry.id);
            if let Some(label) = &label {
                enhance_label(label, entry.tier);
            }
            label
        })
        .collect();
    let views: Vec<&'static str> = toggle
        .available_views()
        .into_iter()
        .map(PriceTier::as_str)
        .collect();
    let current = toggle.current_view();
    let view = PageToggles {
        table,
        inputs,
        labels,
        fallback_styling: config.fallback_styling,
    };
    let manager = &context.manager;
    let controller = Rc::new(Controller::new(manager, &config, toggle, view));
    controller.render();

    let mut registrations = Registrations::new(manager, COMPONENT);
    controller.bind(&config, &mut registrations)?;

    emit(
        manager,
        Component::PriceToggle,
        READY,
        &json!({ "currentView": current.as_str(), "availableViews": views }),
    );
    Ok(Some(Box::new(PriceToggleWidget {
        controller,
        registrations,
    })))
}

impl Widget for PriceToggleWidget {
    fn name(&self) -> &'static str {
        "price-toggle"
    }

    fn destroy(&mut self) {
        self.registrations.release();
        clear_view_classes();
        tracing::debug!(
            component = COMPONENT,
            view = self.controller.toggle().current_view().as_str(),
            "price toggle released"
        );
        emit(self.registrations.manager(), Component::PriceToggle, DESTROYED, &json!({}));
    }
}
