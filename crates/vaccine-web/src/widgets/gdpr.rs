//! Cookie consent banner projection.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use gloo::utils::{body, document, window};
use serde_json::json;
use vaccine_events::{BrowserHost, EventManager, Target};
use vaccine_widgets::gdpr::{
    BANNER_HIDDEN, COMPONENT, INFO_MESSAGE, INFO_SHOWN, is_secure_context,
};
use vaccine_widgets::lifecycle::{DESTROYED, READY};
use vaccine_widgets::{Component, GdprManager, Widget, WidgetResult, focus::next_focus};
use web_sys::Element;

use crate::context::{PageContext, Registrations, emit};
use crate::dom;
use crate::error::WebResult;
use crate::storage::BrowserCookies;

const BANNER_ID: &str = "gdpr-banner";

struct Shared {
    consent: RefCell<GdprManager<BrowserCookies>>,
    banner: RefCell<Option<Element>>,
    manager: EventManager<BrowserHost>,
}

impl Shared {
    fn announce_steps(&self, steps: &[&'static str]) {
        let consent = self.consent.borrow().consent().map(|consent| consent.as_str());
        for step in steps {
            if *step == BANNER_HIDDEN {
                if let Some(banner) = self.banner.borrow_mut().take() {
                    banner.remove();
                }
            }
            emit(
                &self.manager,
                Component::Gdpr,
                step,
                &json!({ "consent": consent, "timestamp": Utc::now().to_rfc3339() }),
            );
        }
    }

    fn accept(&self) {
        let steps = self.consent.borrow_mut().accept(Utc::now());
        self.announce_steps(&steps);
    }

    fn decline(&self) {
        let steps = self.consent.borrow_mut().decline(Utc::now());
        self.announce_steps(&steps);
    }

    fn info(&self) {
        let url = self.consent.borrow().config().info_url.clone();
        emit(&self.manager, Component::Gdpr, INFO_SHOWN, &json!({ "url": url }));
        match url {
            Some(url) => {
                if window().open_with_url_and_target(&url, "_blank").is_err() {
                    tracing::warn!(component = COMPONENT, "information page could not open");
                }
            }
            None => {
                if window().confirm_with_message(INFO_MESSAGE).unwrap_or(false) {
                    self.accept();
                }
            }
        }
    }

    fn buttons(&self) -> Vec<Element> {
        self.banner
            .borrow()
            .as_ref()
            .map(|banner| dom::query_within(banner, "button"))
            .unwrap_or_default()
    }
}

fn build_banner(consent: &GdprManager<BrowserCookies>) -> WebResult<Element> {
    let config = consent.config();
    let banner = dom::create_with("div", "gdpr-banner", None)?;
    dom::set_attr(&banner, "id", BANNER_ID);
    dom::set_attr(&banner, "role", "dialog");
    dom::set_attr(&banner, "aria-label", "Cookie consent");
    dom::set_attr(&banner, "aria-live", "polite");
    let message = dom::create_with("p", "gdpr-message", Some(&config.message))?;
    let actions = dom::create_with("div", "gdpr-actions", None)?;
    let accept = dom::create_with("button", "gdpr-accept", Some(&config.accept_text))?;
    let decline = dom::create_with("button", "gdpr-decline", Some(&config.decline_text))?;
    let info = dom::create_with("button", "gdpr-info", Some(&config.info_text))?;
    for button in [&accept, &decline, &info] {
        dom::set_attr(button, "type", "button");
        dom::append(&actions, button)?;
    }
    dom::append(&banner, &message)?;
    dom::append(&banner, &actions)?;
    dom::append(&body(), &banner)?;
    Ok(banner)
}

/// Running consent widget.
pub(crate) struct GdprWidget {
    shared: Rc<Shared>,
    registrations: Registrations,
}

pub(crate) fn factory(context: &PageContext) -> WidgetResult<Option<Box<dyn Widget>>> {
    let location = window().location();
    let secure = is_secure_context(
        &location.protocol().unwrap_or_default(),
        &location.hostname().unwrap_or_default(),
    );
    let consent = GdprManager::new(context.config.gdpr_manager.clone(), BrowserCookies, secure);
    let shared = Rc::new(Shared {
        consent: RefCell::new(consent),
        banner: RefCell::new(None),
        manager: context.manager.clone(),
    });
    let startup = shared.consent.borrow().startup_steps();
    shared.announce_steps(&startup);

    let mut registrations = Registrations::new(&context.manager, COMPONENT);
    let clicks = Rc::clone(&shared);
    registrations.keep(context.manager.delegate(
        "#gdpr-banner button",
        "click",
        move |delegated| {
            let button = delegated.delegate_target;
            if dom::has_class(button, "gdpr-accept") {
                clicks.accept();
            } else if dom::has_class(button, "gdpr-decline") {
                clicks.decline();
            } else if dom::has_class(button, "gdpr-info") {
                clicks.info();
            }
            Ok(())
        },
    ))?;
    let keys = Rc::clone(&shared);
    registrations.keep(context.manager.on(&Target::Document, "keydown", move |event| {
        if keys.banner.borrow().is_none() {
            return Ok(());
        }
        match dom::key_of(event).as_deref() {
            Some("Escape") => {
                let steps = keys.consent.borrow_mut().escape(Utc::now());
                keys.announce_steps(&steps);
            }
            Some("Tab") => {
                let buttons = keys.buttons();
                let active = document().active_element();
                let current = buttons
                    .iter()
                    .position(|button| Some(button) == active.as_ref());
                if let Some(next) = next_focus(current, buttons.len(), dom::has_shift(event)) {
                    event.prevent_default();
                    dom::focus(&buttons[next]);
                }
            }
            _ => {}
        }
        Ok(())
    }))?;

    if shared.consent.borrow().should_show_banner() {
        let built = build_banner(&shared.consent.borrow());
        match built {
            Ok(banner) => {
                if let Some(accept) = dom::query_one(&banner, ".gdpr-accept") {
                    dom::focus(&accept);
                }
                *shared.banner.borrow_mut() = Some(banner);
                let steps = shared.consent.borrow_mut().mark_banner_shown();
                shared.announce_steps(&steps);
            }
            Err(err) => {
                tracing::error!(
                    component = COMPONENT,
                    error = %err.detail(),
                    "consent banner could not be created; continuing without it"
                );
            }
        }
    }

    let has_consent = shared.consent.borrow().has_consent();
    emit(
        &context.manager,
        Component::Gdpr,
        READY,
        &json!({ "hasConsent": has_consent }),
    );
    Ok(Some(Box::new(GdprWidget {
        shared,
        registrations,
    })))
}

impl Widget for GdprWidget {
    fn name(&self) -> &'static str {
        "gdpr-manager"
    }

    fn destroy(&mut self) {
        self.registrations.release();
        if let Some(banner) = self.shared.banner.borrow_mut().take() {
            banner.remove();
        }
        emit(&self.shared.manager, Component::Gdpr, DESTROYED, &json!({}));
    }
}
