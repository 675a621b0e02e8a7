//! Install banner projection.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use gloo::timers::callback::Timeout;
use gloo::utils::{body, document, window};
use js_sys::{Function, Promise, Reflect};
use serde_json::json;
use vaccine_events::{BrowserHost, EventManager, Target};
use vaccine_widgets::lifecycle::{DESTROYED, READY};
use vaccine_widgets::pwa::{
    COMPONENT, InstallAction, MANUAL_INSTRUCTIONS_SHOWN, PromptOutcome,
    SUCCESS_MESSAGE, SUCCESS_NOTICE_MS,
};
use vaccine_widgets::{Component, InstallEnvironment, Platform, PwaInstall, Widget, WidgetResult};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{Element, Event};

use crate::context::{PageContext, Registrations, emit};
use crate::dom;
use crate::error::{WebError, WebResult};
use crate::storage::BrowserStorage;

const BANNER_CLASS: &str = "pwa-install-banner";

fn environment() -> InstallEnvironment {
    let navigator = window().navigator();
    InstallEnvironment {
        standalone_display: window()
            .match_media("(display-mode: standalone)")
            .ok()
            .flatten()
            .is_some_and(|query| query.matches()),
        navigator_standalone: Reflect::get(&navigator, &JsValue::from_str("standalone"))
            .ok()
            .and_then(|value| value.as_bool())
            .unwrap_or(false),
        referrer: document().referrer(),
        service_worker: Reflect::has(&navigator, &JsValue::from_str("serviceWorker"))
            .unwrap_or(false),
        install_prompt_api: dom::window_has("BeforeInstallPromptEvent"),
    }
}

async fn run_prompt(event: &Event) -> Result<PromptOutcome, JsValue> {
    let prompt = Reflect::get(event, &JsValue::from_str("prompt"))?.dyn_into::<Function>()?;
    let shown = prompt.call0(event)?;
    if let Ok(promise) = shown.dyn_into::<Promise>() {
        JsFuture::from(promise).await?;
    }
    let choice = Reflect::get(event, &JsValue::from_str("userChoice"))?.dyn_into::<Promise>()?;
    let choice = JsFuture::from(choice).await?;
    let outcome = Reflect::get(&choice, &JsValue::from_str("outcome"))?
        .as_string()
        .unwrap_or_default();
    Ok(PromptOutcome::parse(&outcome))
}

const fn platform_name(platform: Platform) -> &'static str {
    match platform {
        Platform::Ios => "ios",
        Platform::Android => "android",
        Platform::Desktop => "desktop",
    }
}

struct Shared {
    install: RefCell<PwaInstall<BrowserStorage>>,
    deferred: RefCell<Option<Event>>,
    banner: RefCell<Option<Element>>,
    show_timer: RefCell<Option<Timeout>>,
    notice_timer: RefCell<Option<Timeout>>,
    manager: EventManager<BrowserHost>,
}

impl Shared {
    fn emit_steps(&self, steps: &[&str]) {
        for step in steps {
            emit(&self.manager, Component::Pwa, step, &json!({}));
        }
    }

    fn build_banner(&self) -> WebResult<Element> {
        let install = self.install.borrow();
        let config = install.config();
        let banner = dom::create_with("div", BANNER_CLASS, None)?;
        dom::set_attr(&banner, "role", "region");
        dom::set_attr(&banner, "aria-label", &config.title);

        let content = dom::create_with("div", "pwa-install-content", None)?;
        dom::append(&content, &dom::create_with("h3", "pwa-install-title", Some(config.title.as_str()))?)?;
        dom::append(
            &content,
            &dom::create_with("p", "pwa-install-description", Some(config.description.as_str()))?,
        )?;
        let actions = dom::create_with("div", "pwa-install-actions", None)?;
        for (class, label) in [
            ("pwa-install-button", config.install_text.as_str()),
            ("pwa-dismiss-button", config.dismiss_text.as_str()),
        ] {
            let button = dom::create_with("button", class, Some(label))?;
            dom::set_attr(&button, "type", "button");
            dom::append(&actions, &button)?;
        }
        dom::append(&banner, &content)?;
        dom::append(&banner, &actions)?;

        let inserted = if config.position == "after-header" {
            dom::query_first("header, .header").map(|header| header.after_with_node_1(&banner))
        } else {
            None
        };
        let inserted = match inserted {
            Some(result) => result,
            None => dom::query_first(&config.container)
                .unwrap_or_else(|| body().into())
                .prepend_with_node_1(&banner),
        };
        inserted.map_err(|err| WebError::from_js("insert banner", &err))?;
        Ok(banner)
    }

    fn show_banner(&self) {
        if !self.install.borrow().should_show_banner() {
            return;
        }
        match self.build_banner() {
            Ok(banner) => {
                self.banner.borrow_mut().replace(banner);
                let steps = self.install.borrow_mut().mark_banner_shown();
                self.emit_steps(&steps);
            }
            Err(err) => {
                tracing::error!(component = COMPONENT, error = %err.detail(), "install banner not rendered");
            }
        }
    }

    fn hide_banner(&self) {
        if let Some(banner) = self.banner.borrow_mut().take() {
            banner.remove();
        }
    }

    fn dismiss(&self) {
        let steps = self.install.borrow_mut().dismiss(Utc::now());
        self.hide_banner();
        self.emit_steps(&steps);
    }

    fn show_instructions(&self, platform: Platform) {
        if window().alert_with_message(platform.instructions()).is_err() {
            tracing::debug!(component = COMPONENT, "instructions dialog blocked");
        }
        emit(
            &self.manager,
            Component::Pwa,
            MANUAL_INSTRUCTIONS_SHOWN,
            &json!({ "platform": platform_name(platform) }),
        );
    }

    fn show_success(&self) {
        let notice = match dom::create_with("div", "pwa-install-success", Some(SUCCESS_MESSAGE)) {
            Ok(notice) => notice,
            Err(err) => {
                tracing::debug!(component = COMPONENT, error = %err.detail(), "success notice skipped");
                return;
            }
        };
        dom::set_attr(&notice, "role", "status");
        if dom::append(&body(), &notice).is_err() {
            return;
        }
        let timer = Timeout::new(SUCCESS_NOTICE_MS, move || notice.remove());
        self.notice_timer.borrow_mut().replace(timer);
    }

    fn install(self: &Rc<Self>) {
        let action = self.install.borrow().install_action();
        let deferred = self.deferred.borrow_mut().take();
        match (action, deferred) {
            (InstallAction::Prompt, Some(event)) => {
                let shared = Rc::clone(self);
                spawn_local(async move {
                    match run_prompt(&event).await {
                        Ok(outcome) => {
                            let steps = shared
                                .install
                                .borrow_mut()
                                .prompt_answered(outcome, Utc::now());
                            shared.hide_banner();
                            shared.emit_steps(&steps);
                            if outcome == PromptOutcome::Accepted {
                                shared.show_success();
                            }
                        }
                        Err(err) => {
                            let detail = WebError::from_js("install prompt", &err).detail();
                            let steps = shared.install.borrow_mut().prompt_failed(&detail);
                            for step in steps {
                                emit(&shared.manager, Component::Pwa, step, &json!({ "error": detail }));
                            }
                            let platform = match shared.install.borrow().install_action() {
                                InstallAction::ManualInstructions(platform) => platform,
                                InstallAction::Prompt => Platform::Desktop,
                            };
                            shared.show_instructions(platform);
                        }
                    }
                });
            }
            (InstallAction::ManualInstructions(platform), _) => self.show_instructions(platform),
            (InstallAction::Prompt, None) => {
                tracing::warn!(component = COMPONENT, "install prompt already consumed");
            }
        }
    }
}

/// Running install banner widget.
pub(crate) struct PwaWidget {
    shared: Rc<Shared>,
    registrations: Registrations,
}

pub(crate) fn factory(context: &PageContext) -> WidgetResult<Option<Box<dyn Widget>>> {
    let config = context.config.pwa_install.clone();
    let user_agent = window().navigator().user_agent().unwrap_or_default();
    let install = PwaInstall::new(config, BrowserStorage, &environment(), &user_agent, Utc::now());
    let manager = &context.manager;
    if let Some(step) = install.decision().step() {
        emit(manager, Component::Pwa, step, &json!({}));
    }
    if !install.waits_for_prompt() {
        return Ok(None);
    }

    let show_delay = install.config().show_delay;
    let shared = Rc::new(Shared {
        install: RefCell::new(install),
        deferred: RefCell::new(None),
        banner: RefCell::new(None),
        show_timer: RefCell::new(None),
        notice_timer: RefCell::new(None),
        manager: manager.clone(),
    });
    let mut registrations = Registrations::new(manager, COMPONENT);

    let prompts = Rc::clone(&shared);
    registrations.keep(manager.on(&Target::Window, "beforeinstallprompt", move |event| {
        event.prevent_default();
        prompts.deferred.borrow_mut().replace(event.clone());
        let steps = prompts.install.borrow_mut().prompt_available();
        prompts.emit_steps(&steps);
        if prompts.install.borrow().config().auto_show {
            prompts.show_banner();
        }
        Ok(())
    }))?;
    let installs = Rc::clone(&shared);
    registrations.keep(manager.on(&Target::Window, "appinstalled", move |_| {
        let steps = installs.install.borrow_mut().app_installed();
        installs.hide_banner();
        installs.deferred.borrow_mut().take();
        installs.emit_steps(&steps);
        Ok(())
    }))?;
    let buttons = Rc::clone(&shared);
    registrations.keep(manager.delegate(
        ".pwa-install-button",
        "click",
        move |delegated| {
            delegated.event.prevent_default();
            buttons.install();
            Ok(())
        },
    ))?;
    let dismissals = Rc::clone(&shared);
    registrations.keep(manager.delegate(
        ".pwa-dismiss-button",
        "click",
        move |delegated| {
            delegated.event.prevent_default();
            dismissals.dismiss();
            Ok(())
        },
    ))?;
    let keys = Rc::clone(&shared);
    registrations.keep(manager.on(&Target::Document, "keydown", move |event| {
        if dom::key_of(event).as_deref() == Some("Escape") && keys.install.borrow().banner_visible() {
            keys.dismiss();
        }
        Ok(())
    }))?;

    let delayed = Rc::clone(&shared);
    let timer = Timeout::new(show_delay, move || {
        if delayed.install.borrow().show_delay_elapsed() {
            delayed.show_banner();
        }
    });
    shared.show_timer.borrow_mut().replace(timer);

    emit(manager, Component::Pwa, READY, &json!({ "showDelay": show_delay }));
    Ok(Some(Box::new(PwaWidget {
        shared,
        registrations,
    })))
}

impl Widget for PwaWidget {
    fn name(&self) -> &'static str {
        "pwa-install"
    }

    fn destroy(&mut self) {
        self.registrations.release();
        self.shared.show_timer.borrow_mut().take();
        self.shared.notice_timer.borrow_mut().take();
        self.shared.deferred.borrow_mut().take();
        self.shared.hide_banner();
        emit(&self.shared.manager, Component::Pwa, DESTROYED, &json!({}));
    }
}
