//! Page entry point.
//!
//! # Design
//! - `run` is idempotent; the wasm start hook and the binary's `main` may
//!   both call it.
//! - Resources load first, then the widgets boot once the DOM is parsed.
//! - A `pagehide` that unloads the page tears down widgets in reverse order
//!   and then the event manager; one that enters the back/forward cache
//!   leaves everything bound.

use std::cell::{Cell, RefCell};

use chrono::Utc;
use gloo::events::EventListener;
use gloo::utils::{document, window};
use js_sys::Promise;
use serde_json::{Value, json};
use vaccine_config::AppConfig;
use vaccine_events::{BrowserHost, EventManager, Host, Target};
use vaccine_telemetry::{
    LogFormat, LoggingConfig, build_sha, init_logging, log_format_from_config,
};
use vaccine_widgets::{App, Component};
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::PageTransitionEvent;

use crate::bootstrap::{
    CONFIG_SCRIPT_ID, PageExit, RESOURCES_ERROR_EVENT, RESOURCES_LOADED_EVENT, cache_buster,
    error_detail, event_tuning, load_config, loaded_detail, log_level,
};
use crate::context::PageContext;
use crate::error::WebError;
use crate::loader::{LoadedResources, load_resources};
use crate::widgets::registry;

thread_local! {
    static STARTED: Cell<bool> = const { Cell::new(false) };
    static RUNNING: RefCell<Option<(App, EventManager<BrowserHost>)>> = const { RefCell::new(None) };
}

/// wasm start hook.
#[wasm_bindgen(start)]
pub fn start() {
    run();
}

/// Boot the page once.
pub fn run() {
    if STARTED.with(|started| started.replace(true)) {
        return;
    }
    console_error_panic_hook::set_once();

    let inline = document()
        .get_element_by_id(CONFIG_SCRIPT_ID)
        .and_then(|element| element.text_content());
    let (config, config_error) = match load_config(inline.as_deref()) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    let hostname = window().location().hostname().unwrap_or_default();
    let level = log_level(&config, &hostname);
    let logging = LoggingConfig {
        level: &level,
        format: log_format_from_config(Some(&Value::Object(config.extra.clone())))
            .unwrap_or(LogFormat::Pretty),
        build_sha: build_sha(),
    };
    if let Err(err) = init_logging(&logging) {
        gloo::console::warn!(format!("logging unavailable: {}", WebError::from(err).detail()));
    }
    if let Some(err) = config_error {
        tracing::error!(error = %err.detail(), "inline configuration rejected; using defaults");
    }
    tracing::info!(level = %level, build = build_sha(), "starting clinic widgets");

    spawn_local(boot(config));
}

async fn boot(config: AppConfig) {
    let resources = if config.resources.enabled {
        let buster = cache_buster(Utc::now());
        match load_resources(&config.resources, &buster).await {
            Ok(resources) => {
                BrowserHost.dispatch(
                    &Target::Document,
                    RESOURCES_LOADED_EVENT,
                    &loaded_detail(&config.resources, Utc::now()),
                );
                resources
            }
            Err(err) => {
                tracing::error!(error = %err.detail(), "resource loading aborted");
                BrowserHost.dispatch(
                    &Target::Document,
                    RESOURCES_ERROR_EVENT,
                    &error_detail(&err.detail(), Utc::now()),
                );
                LoadedResources::default()
            }
        }
    } else {
        LoadedResources::default()
    };

    dom_ready().await;

    let manager = EventManager::new(BrowserHost, event_tuning(&resources.documents));
    let context = PageContext {
        manager: manager.clone(),
        config,
    };
    let app = App::boot(&context, &registry());
    manager.emit(&Component::App.ready(), &app.ready_detail(), None);
    RUNNING.with(|running| *running.borrow_mut() = Some((app, manager)));

    EventListener::new(&window(), "pagehide", |event| {
        let persisted = event
            .dyn_ref::<PageTransitionEvent>()
            .is_some_and(PageTransitionEvent::persisted);
        let exit = PageExit::from_persisted(persisted);
        if exit.tears_down() {
            teardown();
        } else {
            tracing::debug!(?exit, "page cached; widgets kept");
        }
    })
    .forget();
}

async fn dom_ready() {
    if document().ready_state() != "loading" {
        return;
    }
    let ready = Promise::new(&mut |resolve, _reject| {
        EventListener::once(&document(), "DOMContentLoaded", move |_| {
            if resolve.call0(&JsValue::UNDEFINED).is_err() {
                tracing::debug!("DOM ready notification failed");
            }
        })
        .forget();
    });
    if JsFuture::from(ready).await.is_err() {
        tracing::warn!("DOM ready wait failed; booting anyway");
    }
}

fn teardown() {
    let Some((mut app, manager)) = RUNNING.with(RefCell::take) else {
        return;
    };
    let stopped = app.destroy();
    manager.emit(&Component::App.destroyed(), &json!({ "widgets": stopped }), None);
    manager.destroy();
}
