//! Image overlay projection.

use std::cell::RefCell;
use std::rc::Rc;

use gloo::utils::{body, document};
use serde_json::json;
use vaccine_config::LightboxConfig;
use vaccine_events::{BrowserHost, EventManager, Target};
use vaccine_widgets::lifecycle::{DESTROYED, READY};
use vaccine_widgets::lightbox::{CLOSED, COMPONENT, ERROR, OPENED};
use vaccine_widgets::{
    Component, LightboxSource, LightboxState, Widget, WidgetResult, focus::next_focus,
};
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, HtmlImageElement};

use crate::context::{PageContext, Registrations, emit, setup_failed};
use crate::dom;
use crate::error::{WebError, WebResult};

const OVERLAY_FAILED: &str = "OVERLAY_FAILED";

struct Overlay {
    root: Element,
    image: HtmlImageElement,
    caption: Element,
    error: Element,
    close: Element,
}

struct Shared {
    config: LightboxConfig,
    overlay: Overlay,
    state: RefCell<LightboxState>,
    previous_focus: RefCell<Option<Element>>,
    body_overflow: RefCell<String>,
    manager: EventManager<BrowserHost>,
}

fn attribute(element: &Element, name: &str) -> Option<String> {
    element.get_attribute(name)
}

fn source_of(trigger: &Element) -> LightboxSource {
    LightboxSource {
        src: attribute(trigger, "src"),
        data_src: attribute(trigger, "data-src"),
        alt: attribute(trigger, "alt"),
        data_alt: attribute(trigger, "data-alt"),
        title: attribute(trigger, "title"),
        data_title: attribute(trigger, "data-title"),
    }
}

impl Shared {
    fn open(&self, trigger: &Element) {
        let Some(image) = source_of(trigger).resolve() else {
            return;
        };
        if !self.state.borrow_mut().open(image.clone()) {
            return;
        }
        *self.previous_focus.borrow_mut() = document().active_element();
        let overlay = &self.overlay;
        dom::set_style(&overlay.error, "display", "none");
        dom::set_style(&overlay.image, "display", "");
        overlay.image.set_alt(&image.alt);
        overlay.image.set_src(&image.src);
        overlay.caption.set_text_content(image.title.as_deref());
        dom::set_style(
            &overlay.caption,
            "display",
            if image.title.is_some() { "" } else { "none" },
        );
        dom::set_style(&overlay.root, "display", "flex");
        if self.config.fade_animation {
            dom::set_style(
                &overlay.root,
                "transition",
                &format!("opacity {}ms ease-in-out", self.config.fade_in_duration),
            );
        }
        dom::set_style(&overlay.root, "opacity", "1");
        dom::set_attr(&overlay.root, "aria-hidden", "false");
        if self.config.prevent_body_scroll {
            let style = body().style();
            *self.body_overflow.borrow_mut() =
                style.get_property_value("overflow").unwrap_or_default();
            dom::set_style(&body(), "overflow", "hidden");
        }
        dom::focus(&overlay.close);
        emit(
            &self.manager,
            Component::Lightbox,
            OPENED,
            &json!({ "src": image.src, "alt": image.alt }),
        );
    }

    fn close(&self) {
        if !self.state.borrow_mut().close() {
            return;
        }
        let overlay = &self.overlay;
        dom::set_style(&overlay.root, "opacity", "0");
        dom::set_style(&overlay.root, "display", "none");
        dom::set_attr(&overlay.root, "aria-hidden", "true");
        overlay.image.set_src("");
        if self.config.prevent_body_scroll {
            let previous = self.body_overflow.borrow().clone();
            dom::set_style(&body(), "overflow", &previous);
        }
        if self.config.restore_focus {
            if let Some(previous) = self.previous_focus.borrow_mut().take() {
                dom::focus(&previous);
            }
        }
        emit(&self.manager, Component::Lightbox, CLOSED, &json!({}));
    }

    fn fail(&self) {
        if !self.state.borrow_mut().fail() {
            return;
        }
        let src = self
            .state
            .borrow()
            .current()
            .map(|image| image.src.clone())
            .unwrap_or_default();
        dom::set_style(&self.overlay.image, "display", "none");
        dom::set_style(&self.overlay.error, "display", "");
        dom::focus(&self.overlay.close);
        tracing::warn!(component = COMPONENT, src = %src, "lightbox image failed to load");
        emit(
            &self.manager,
            Component::Lightbox,
            ERROR,
            &json!({ "src": src, "message": self.config.error_message }),
        );
    }

    fn trap_focus(&self, event: &web_sys::Event) {
        let focusables = dom::query_within(
            &self.overlay.root,
            "button, [href], [tabindex]:not([tabindex=\"-1\"])",
        );
        let active = document().active_element();
        let current = focusables
            .iter()
            .position(|element| Some(element) == active.as_ref());
        if let Some(next) = next_focus(current, focusables.len(), dom::has_shift(event)) {
            event.prevent_default();
            dom::focus(&focusables[next]);
        }
    }
}

fn build_overlay(config: &LightboxConfig) -> WebResult<Overlay> {
    if let Some(existing) = document().get_element_by_id(&config.lightbox_id) {
        existing.remove();
    }
    let root = dom::create_with("div", "vaccine-lightbox", None)?;
    dom::set_attr(&root, "id", &config.lightbox_id);
    dom::set_attr(&root, "role", "dialog");
    dom::set_attr(&root, "aria-modal", "true");
    dom::set_attr(&root, "aria-hidden", "true");
    dom::set_attr(&root, "aria-label", "Bildvisning");
    dom::set_style(&root, "display", "none");
    let frame = dom::create_with("div", "lightbox-content", None)?;
    let close = dom::create_with("button", "lightbox-close", Some("\u{d7}"))?;
    dom::set_attr(&close, "type", "button");
    dom::set_attr(&close, "aria-label", "Stäng");
    let image = dom::create_with("img", "lightbox-image", None)?
        .dyn_into::<HtmlImageElement>()
        .map_err(|_| WebError::js("createElement", "img is not an image"))?;
    let caption = dom::create_with("p", "lightbox-caption", None)?;
    let error = dom::create_with("p", "lightbox-error", Some(&config.error_message))?;
    dom::set_attr(&error, "role", "alert");
    dom::set_style(&error, "display", "none");
    dom::append(&frame, &close)?;
    dom::append(&frame, &image)?;
    dom::append(&frame, &caption)?;
    dom::append(&frame, &error)?;
    dom::append(&root, &frame)?;
    dom::append(&body(), &root)?;
    Ok(Overlay {
        root,
        image,
        caption,
        error,
        close,
    })
}

/// Running lightbox widget.
pub(crate) struct LightboxWidget {
    shared: Rc<Shared>,
    registrations: Registrations,
}

pub(crate) fn factory(context: &PageContext) -> WidgetResult<Option<Box<dyn Widget>>> {
    let config = context.config.lightbox.clone();
    let triggers = dom::query_all(&config.selector);
    if triggers.is_empty() {
        return Ok(None);
    }
    for trigger in &triggers {
        dom::set_attr_if_missing(trigger, "tabindex", "0");
        dom::set_attr_if_missing(trigger, "role", "button");
        dom::set_attr(trigger, "aria-haspopup", "dialog");
        if let Some(html) = trigger.dyn_ref::<HtmlElement>() {
            if html.style().set_property("cursor", "pointer").is_err() {
                tracing::debug!(component = COMPONENT, "cursor style rejected");
            }
        }
    }
    let overlay = build_overlay(&config).map_err(setup_failed(COMPONENT, OVERLAY_FAILED))?;
    let selector = config.selector.clone();
    let shared = Rc::new(Shared {
        config,
        overlay,
        state: RefCell::new(LightboxState::new()),
        previous_focus: RefCell::new(None),
        body_overflow: RefCell::new(String::new()),
        manager: context.manager.clone(),
    });

    let manager = &context.manager;
    let mut registrations = Registrations::new(manager, COMPONENT);
    let opener = Rc::clone(&shared);
    registrations.keep(manager.delegate(&selector, "click", move |delegated| {
        delegated.event.prevent_default();
        opener.open(delegated.delegate_target);
        Ok(())
    }))?;
    let key_opener = Rc::clone(&shared);
    registrations.keep(manager.delegate(&selector, "keydown", move |delegated| {
        if matches!(dom::key_of(delegated.event).as_deref(), Some("Enter" | " ")) {
            delegated.event.prevent_default();
            key_opener.open(delegated.delegate_target);
        }
        Ok(())
    }))?;
    let closer = Rc::clone(&shared);
    registrations.keep(manager.on(
        &Target::Node(shared.overlay.close.clone()),
        "click",
        move |_| {
            closer.close();
            Ok(())
        },
    ))?;
    let background = Rc::clone(&shared);
    registrations.keep(manager.on(
        &Target::Node(shared.overlay.root.clone()),
        "click",
        move |event| {
            let on_backdrop = dom::event_element(event).as_ref() == Some(&background.overlay.root);
            if background.config.close_on_background && on_backdrop {
                background.close();
            }
            Ok(())
        },
    ))?;
    let keys = Rc::clone(&shared);
    registrations.keep(manager.on(&Target::Document, "keydown", move |event| {
        if !keys.state.borrow().is_open() {
            return Ok(());
        }
        match dom::key_of(event).as_deref() {
            Some("Escape") if keys.config.close_on_escape => {
                event.prevent_default();
                keys.close();
            }
            Some("Tab") if keys.config.trap_focus => keys.trap_focus(event),
            _ => {}
        }
        Ok(())
    }))?;
    let errors = Rc::clone(&shared);
    registrations.keep(manager.on(
        &Target::Node(shared.overlay.image.clone().into()),
        "error",
        move |_| {
            if errors.state.borrow().is_open() {
                errors.fail();
            }
            Ok(())
        },
    ))?;

    emit(
        manager,
        Component::Lightbox,
        READY,
        &json!({ "triggers": triggers.len() }),
    );
    Ok(Some(Box::new(LightboxWidget {
        shared,
        registrations,
    })))
}

impl Widget for LightboxWidget {
    fn name(&self) -> &'static str {
        "lightbox"
    }

    fn destroy(&mut self) {
        self.shared.close();
        self.registrations.release();
        self.shared.overlay.root.remove();
        emit(&self.shared.manager, Component::Lightbox, DESTROYED, &json!({}));
    }
}
