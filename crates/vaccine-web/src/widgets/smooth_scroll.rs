//! Animated in-page navigation.
//!
//! # Design
//! - One `requestAnimationFrame` loop per scroll; a frame whose ticket is no
//!   longer current drops its own closure and stops.
//! - Native mode hands the motion to the browser and polls frames until the
//!   page settles near the destination.

use std::cell::RefCell;
use std::rc::Rc;

use gloo::timers::callback::Timeout;
use gloo::utils::{document, window};
use serde_json::json;
use vaccine_config::SmoothScrollConfig;
use vaccine_events::{BrowserHost, EventManager, Target};
use vaccine_widgets::lifecycle::{DESTROYED, READY};
use vaccine_widgets::smooth_scroll::{
    CANCELLED, COMPLETE, COMPONENT, FOCUS_DELAY_MS, NATIVE_SETTLE_PX, START, announcement,
    hash_target, is_cancel_key, target_position,
};
use vaccine_widgets::{ActiveScrolls, Component, ScrollAnimation, ScrollTicket, Widget, WidgetResult};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, ScrollBehavior, ScrollToOptions};

use crate::context::{PageContext, Registrations, emit};
use crate::dom;
use crate::error::WebError;

const ANNOUNCEMENT_MS: u32 = 1_000;

type FrameSlot = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

#[derive(Clone, Copy)]
enum Motion {
    Animated(ScrollAnimation),
    Native { destination: f64, started_at: f64 },
}

fn now() -> f64 {
    window().performance().map_or(0.0, |performance| performance.now())
}

fn page_offset() -> f64 {
    window().scroll_y().unwrap_or(0.0)
}

fn request_frame(slot: &FrameSlot) {
    let requested = slot.borrow().as_ref().map(|callback| {
        window().request_animation_frame(callback.as_ref().unchecked_ref())
    });
    if let Some(Err(err)) = requested {
        tracing::warn!(
            component = COMPONENT,
            error = %WebError::from_js("requestAnimationFrame", &err).detail(),
            "animation frame rejected"
        );
        slot.borrow_mut().take();
    }
}

struct Shared {
    config: SmoothScrollConfig,
    scrolls: RefCell<ActiveScrolls>,
    manager: EventManager<BrowserHost>,
}

impl Shared {
    fn navigate(self: &Rc<Self>, target: Element, id: String) {
        let start = page_offset();
        let rect = target.get_bounding_client_rect();
        let destination = target_position(start, rect.top(), self.config.offset).max(0.0);
        let (ticket, superseded) = self.scrolls.borrow_mut().begin();
        if superseded {
            emit(
                &self.manager,
                Component::SmoothScroll,
                CANCELLED,
                &json!({ "reason": "superseded" }),
            );
        }
        emit(
            &self.manager,
            Component::SmoothScroll,
            START,
            &json!({ "target": id, "from": start, "to": destination }),
        );

        let started_at = now();
        let motion = if self.config.use_native_scroll {
            let options = ScrollToOptions::new();
            options.set_top(destination);
            options.set_behavior(ScrollBehavior::Smooth);
            window().scroll_to_with_scroll_to_options(&options);
            Motion::Native {
                destination,
                started_at,
            }
        } else {
            Motion::Animated(ScrollAnimation::new(start, destination, &self.config, started_at))
        };
        self.run(ticket, motion, target, id);
    }

    fn run(self: &Rc<Self>, ticket: ScrollTicket, motion: Motion, target: Element, id: String) {
        let slot: FrameSlot = Rc::new(RefCell::new(None));
        let frames = Rc::clone(&slot);
        let shared = Rc::clone(self);
        let max_duration = f64::from(self.config.max_duration);
        let callback = Closure::<dyn FnMut(f64)>::new(move |timestamp: f64| {
            if !shared.scrolls.borrow().is_current(ticket) {
                frames.borrow_mut().take();
                return;
            }
            let done = match motion {
                Motion::Animated(animation) => {
                    let frame = animation.frame(timestamp);
                    window().scroll_to_with_x_and_y(0.0, frame.position);
                    frame.done
                }
                Motion::Native {
                    destination,
                    started_at,
                } => {
                    (page_offset() - destination).abs() <= NATIVE_SETTLE_PX
                        || timestamp - started_at >= max_duration
                }
            };
            if done {
                if shared.scrolls.borrow_mut().finish(ticket) {
                    shared.complete(&target, &id);
                }
                frames.borrow_mut().take();
            } else {
                request_frame(&frames);
            }
        });
        slot.borrow_mut().replace(callback);
        request_frame(&slot);
    }

    fn complete(&self, target: &Element, id: &str) {
        if self.config.update_hash {
            let pushed = window().history().and_then(|history| {
                history.push_state_with_url(&JsValue::NULL, "", Some(&format!("#{id}")))
            });
            if pushed.is_err() {
                tracing::debug!(component = COMPONENT, id, "history update rejected");
            }
        }
        if self.config.manage_focus {
            let focused = target.clone();
            Timeout::new(FOCUS_DELAY_MS, move || {
                dom::set_attr_if_missing(&focused, "tabindex", "-1");
                dom::focus(&focused);
            })
            .forget();
        }
        if self.config.announce_to_screen_readers {
            dom::announce(&announcement(&dom::text(target), id), ANNOUNCEMENT_MS);
        }
        emit(
            &self.manager,
            Component::SmoothScroll,
            COMPLETE,
            &json!({ "target": id, "position": page_offset() }),
        );
    }

    fn cancel(&self, reason: &str) {
        if self.scrolls.borrow_mut().cancel() {
            emit(
                &self.manager,
                Component::SmoothScroll,
                CANCELLED,
                &json!({ "reason": reason }),
            );
        }
    }
}

fn opted_out(link: &Element) -> bool {
    link.has_attribute("data-no-smooth") || dom::has_class(link, "no-smooth")
}

/// Running smooth scroll widget.
pub(crate) struct SmoothScrollWidget {
    shared: Rc<Shared>,
    registrations: Registrations,
}

pub(crate) fn factory(context: &PageContext) -> WidgetResult<Option<Box<dyn Widget>>> {
    let config = context.config.smooth_scroll.clone();
    let shared = Rc::new(Shared {
        config,
        scrolls: RefCell::new(ActiveScrolls::new()),
        manager: context.manager.clone(),
    });
    let manager = &context.manager;
    let mut registrations = Registrations::new(manager, COMPONENT);

    let clicks = Rc::clone(&shared);
    registrations.keep(manager.delegate(&shared.config.selector, "click", move |delegated| {
        let link = delegated.delegate_target;
        if opted_out(link) {
            return Ok(());
        }
        let href = link.get_attribute("href").unwrap_or_default();
        let Some(id) = hash_target(&href) else {
            return Ok(());
        };
        let Some(target) = document().get_element_by_id(id) else {
            tracing::warn!(component = COMPONENT, id, "scroll target not found");
            return Ok(());
        };
        delegated.event.prevent_default();
        clicks.navigate(target, id.to_string());
        Ok(())
    }))?;

    if shared.config.cancel_on_interaction {
        for event_type in ["wheel", "touchstart"] {
            let interrupts = Rc::clone(&shared);
            registrations.keep(manager.on(&Target::Window, event_type, move |_| {
                interrupts.cancel("user-interaction");
                Ok(())
            }))?;
        }
        let keys = Rc::clone(&shared);
        registrations.keep(manager.on(&Target::Document, "keydown", move |event| {
            if dom::key_of(event).is_some_and(|key| is_cancel_key(&key)) {
                keys.cancel("user-interaction");
            }
            Ok(())
        }))?;
    }

    emit(
        manager,
        Component::SmoothScroll,
        READY,
        &json!({ "selector": shared.config.selector, "native": shared.config.use_native_scroll }),
    );
    Ok(Some(Box::new(SmoothScrollWidget {
        shared,
        registrations,
    })))
}

impl Widget for SmoothScrollWidget {
    fn name(&self) -> &'static str {
        "smooth-scroll"
    }

    fn destroy(&mut self) {
        self.registrations.release();
        self.shared.scrolls.borrow_mut().cancel();
        emit(&self.shared.manager, Component::SmoothScroll, DESTROYED, &json!({}));
    }
}
