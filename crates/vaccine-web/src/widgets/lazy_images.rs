//! Deferred image loading.

use std::cell::RefCell;
use std::rc::Rc;

use gloo::utils::{document, head};
use js_sys::Reflect;
use serde_json::json;
use vaccine_config::LazyImageConfig;
use vaccine_events::{BrowserHost, EventManager, Target};
use vaccine_widgets::lazy_image::{
    COMPONENT, ERROR, FailureAction, LOADED, LazyImageTracker, LoadStrategy, fade_transition,
    stylesheet,
};
use vaccine_widgets::{Component, IdAllocator, Widget, WidgetResult};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Element, HtmlImageElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit,
};

use crate::context::{PageContext, Registrations, emit};
use crate::dom;
use crate::error::{WebError, WebResult};

const STYLE_ID: &str = "vaccine-lazy-image-styles";
const PROCESSED: &str = "data-lazy-processed";
const KEY_ATTRIBUTE: &str = "data-lazy-key";

type ObserverCallback = Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>;

fn native_supported() -> bool {
    document()
        .create_element("img")
        .is_ok_and(|image| Reflect::has(&image, &JsValue::from_str("loading")).unwrap_or(false))
}

fn inject_stylesheet(config: &LazyImageConfig) {
    if document().get_element_by_id(STYLE_ID).is_some() {
        return;
    }
    let installed = dom::create("style").and_then(|style| {
        dom::set_attr(&style, "id", STYLE_ID);
        style.set_text_content(Some(&stylesheet(config)));
        dom::append(&head(), &style)
    });
    if let Err(err) = installed {
        tracing::debug!(component = COMPONENT, error = %err.detail(), "image styles not installed");
    }
}

struct Shared {
    config: LazyImageConfig,
    tracker: RefCell<LazyImageTracker>,
    manager: EventManager<BrowserHost>,
}

impl Shared {
    fn start(&self, image: &HtmlImageElement) {
        let Some(key) = image.get_attribute(KEY_ATTRIBUTE) else {
            return;
        };
        if !self.tracker.borrow_mut().begin(&key) {
            return;
        }
        dom::toggle_class(image, &self.config.loading_class, true);
        if let Some(srcset) = image.get_attribute("data-srcset") {
            image.set_srcset(&srcset);
            dom::remove_attr(image, "data-srcset");
        }
        if let Some(src) = image.get_attribute("data-src") {
            image.set_src(&src);
            dom::remove_attr(image, "data-src");
        } else if image.complete() && image.natural_width() > 0 {
            self.loaded(image);
        }
    }

    fn loaded(&self, image: &HtmlImageElement) {
        let Some(key) = image.get_attribute(KEY_ATTRIBUTE) else {
            return;
        };
        if !self.tracker.borrow_mut().loaded(&key) {
            return;
        }
        dom::toggle_class(image, &self.config.loading_class, false);
        dom::toggle_class(image, &self.config.loaded_class, true);
        emit(
            &self.manager,
            Component::Image,
            LOADED,
            &json!({ "src": image.current_src(), "key": key }),
        );
    }

    fn failed(&self, image: &HtmlImageElement) {
        let Some(key) = image.get_attribute(KEY_ATTRIBUTE) else {
            return;
        };
        let fallback = image.get_attribute("data-fallback");
        let action = self.tracker.borrow_mut().failed(&key, fallback.as_deref());
        match action {
            FailureAction::UseFallback(src) => image.set_src(&src),
            FailureAction::GiveUp => {
                dom::toggle_class(image, &self.config.loading_class, false);
                dom::toggle_class(image, &self.config.error_class, true);
                emit(
                    &self.manager,
                    Component::Image,
                    ERROR,
                    &json!({ "src": image.src(), "key": key }),
                );
            }
        }
    }
}

fn observe(shared: &Rc<Shared>, images: &[HtmlImageElement]) -> WebResult<(IntersectionObserver, ObserverCallback)> {
    let visible = Rc::clone(shared);
    let callback: ObserverCallback = Closure::new(move |entries: js_sys::Array, observer: IntersectionObserver| {
        for entry in entries.iter() {
            let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                continue;
            };
            if !entry.is_intersecting() {
                continue;
            }
            let target = entry.target();
            observer.unobserve(&target);
            if let Ok(image) = target.dyn_into::<HtmlImageElement>() {
                visible.start(&image);
            }
        }
    });
    let init = IntersectionObserverInit::new();
    init.set_root_margin(&shared.config.root_margin);
    init.set_threshold(&JsValue::from_f64(shared.config.threshold));
    let observer = IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)
        .map_err(|err| WebError::from_js("IntersectionObserver", &err))?;
    for image in images {
        observer.observe(image);
    }
    Ok((observer, callback))
}

/// Running lazy image loader.
pub(crate) struct LazyImagesWidget {
    shared: Rc<Shared>,
    registrations: Registrations,
    observer: Option<(IntersectionObserver, ObserverCallback)>,
}

pub(crate) fn factory(context: &PageContext) -> WidgetResult<Option<Box<dyn Widget>>> {
    let config = context.config.lazy_images.clone();
    let images: Vec<HtmlImageElement> = dom::query_all(&config.image_selector)
        .into_iter()
        .filter(|image: &Element| !image.has_attribute(PROCESSED))
        .filter_map(|image| image.dyn_into::<HtmlImageElement>().ok())
        .collect();
    if images.is_empty() {
        return Ok(None);
    }
    inject_stylesheet(&config);

    let strategy = LoadStrategy::choose(native_supported(), dom::window_has("IntersectionObserver"), &config);
    let shared = Rc::new(Shared {
        config,
        tracker: RefCell::new(LazyImageTracker::new()),
        manager: context.manager.clone(),
    });
    let manager = &context.manager;
    let mut registrations = Registrations::new(manager, COMPONENT);
    let mut ids = IdAllocator::new("lazy-image");
    let transition = fade_transition(&shared.config);

    for image in &images {
        let key = ids.key_for(dom::id_of(image).as_deref());
        if !shared.tracker.borrow_mut().register(&key) {
            continue;
        }
        dom::set_attr(image, PROCESSED, "true");
        dom::set_attr(image, KEY_ATTRIBUTE, &key);
        if let Some(transition) = &transition {
            dom::set_style(image, "transition", transition);
        }
        let target = Target::Node(Element::from(image.clone()));
        let loads = Rc::clone(&shared);
        let loaded_image = image.clone();
        registrations.keep(manager.on(&target, "load", move |_| {
            loads.loaded(&loaded_image);
            Ok(())
        }))?;
        let errors = Rc::clone(&shared);
        let failed_image = image.clone();
        registrations.keep(manager.on(&target, "error", move |_| {
            errors.failed(&failed_image);
            Ok(())
        }))?;
    }

    let mut observer = None;
    match strategy {
        LoadStrategy::Native => {
            for image in &images {
                dom::set_attr(image, "loading", "lazy");
                shared.start(image);
            }
        }
        LoadStrategy::Observer => match observe(&shared, &images) {
            Ok(active) => observer = Some(active),
            Err(err) => {
                tracing::warn!(component = COMPONENT, error = %err.detail(), "observer unavailable, loading eagerly");
                for image in &images {
                    shared.start(image);
                }
            }
        },
        LoadStrategy::Eager if shared.config.fallback_for_older_browsers => {
            for image in &images {
                shared.start(image);
            }
        }
        LoadStrategy::Eager => {
            tracing::info!(component = COMPONENT, "no lazy loading support, images left deferred");
        }
    }

    tracing::info!(
        component = COMPONENT,
        images = shared.tracker.borrow().len(),
        strategy = ?strategy,
        "lazy images ready"
    );
    Ok(Some(Box::new(LazyImagesWidget {
        shared,
        registrations,
        observer,
    })))
}

impl Widget for LazyImagesWidget {
    fn name(&self) -> &'static str {
        "lazy-images"
    }

    fn destroy(&mut self) {
        self.registrations.release();
        if let Some((observer, _callback)) = self.observer.take() {
            observer.disconnect();
        }
        self.shared.tracker.borrow_mut().clear();
    }
}
