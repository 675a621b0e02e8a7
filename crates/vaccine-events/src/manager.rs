//! Event manager: delegation, direct listeners and timed wrappers.
//!
//! # Design
//! - One capturing root listener per delegated event type, attached lazily
//!   on the document and retired when the last selector for it goes away.
//! - Every registration returns a [`ListenerToken`]; removal goes through the
//!   token, never through handler identity.
//! - Handlers run with no registry borrow held, so they may register or
//!   remove listeners (including themselves) while running.
//! - Native listeners are retired by flipping an `active` flag and dropping
//!   the guard on the next tick, so a listener never drops its own closure.
//! - Handler failures are logged, counted and re-emitted as
//!   `vaccine:eventmanager:error`; sibling handlers still run.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde_json::{Value, json};

use crate::error::{EventError, EventResult};
use crate::host::{Host, HostEvent, HostNode, ListenOptions, NativeCallback, Target};
use crate::registry::DelegateRegistry;
use crate::timing::{Debouncer, ThrottleStep, Throttler};
use crate::token::{EventMetrics, ListenerKind, ListenerRecord, ListenerToken};
use crate::tuning::EventTuning;

/// Emitted once the manager is constructed.
pub const READY_EVENT: &str = "vaccine:eventmanager:ready";
/// Emitted when a handler returns an error.
pub const ERROR_EVENT: &str = "vaccine:eventmanager:error";
/// Emitted after [`EventManager::destroy`].
pub const DESTROYED_EVENT: &str = "vaccine:eventmanager:destroyed";

/// Context handed to delegated handlers.
pub struct Delegated<'a, H: Host> {
    /// Native event as dispatched.
    pub event: &'a H::Event,
    /// Element that matched the selector.
    pub delegate_target: &'a H::Node,
    /// Selector the handler was registered with.
    pub selector: &'a str,
}

/// Shared delegated handler; registering the same `Rc` twice for one
/// selector and event type returns the original token.
pub type DelegateHandler<H> = Rc<dyn Fn(&Delegated<'_, H>) -> anyhow::Result<()>>;

struct Attached<L> {
    listener: L,
    active: Rc<Cell<bool>>,
}

impl<L: 'static> Attached<L> {
    fn retire<H: Host<Listener = L>>(self, host: &H) {
        self.active.set(false);
        let listener = self.listener;
        host.set_timeout(0, Box::new(move || drop(listener)));
    }
}

struct DirectEntry<H: Host> {
    record: ListenerRecord,
    attached: Attached<H::Listener>,
    cancel: Option<Box<dyn Fn()>>,
}

struct State<H: Host> {
    destroyed: bool,
    next_token: u64,
    delegates: DelegateRegistry<DelegateHandler<H>>,
    delegate_records: HashMap<ListenerToken, ListenerRecord>,
    roots: HashMap<String, Attached<H::Listener>>,
    direct: HashMap<ListenerToken, DirectEntry<H>>,
    metrics: EventMetrics,
}

impl<H: Host> Default for State<H> {
    fn default() -> Self {
        Self {
            destroyed: false,
            next_token: 0,
            delegates: DelegateRegistry::default(),
            delegate_records: HashMap::new(),
            roots: HashMap::new(),
            direct: HashMap::new(),
            metrics: EventMetrics::default(),
        }
    }
}

struct Inner<H: Host> {
    host: H,
    tuning: EventTuning,
    state: RefCell<State<H>>,
}

/// Dependency-injected event service shared by every widget on a page.
///
/// Cloning is cheap and yields a handle to the same registry.
pub struct EventManager<H: Host> {
    inner: Rc<Inner<H>>,
}

impl<H: Host> Clone for EventManager<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H: Host> EventManager<H> {
    /// Build a manager over `host` and announce it with the ready event.
    pub fn new(host: H, tuning: EventTuning) -> Self {
        let manager = Self {
            inner: Rc::new(Inner {
                host,
                tuning,
                state: RefCell::new(State::default()),
            }),
        };
        let timestamp = manager.inner.host.now_ms();
        manager.emit(READY_EVENT, &json!({ "timestamp": timestamp }), None);
        tracing::debug!("event manager ready");
        manager
    }

    /// Host the manager runs against.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.inner.host
    }

    /// Tuning table in effect.
    #[must_use]
    pub fn tuning(&self) -> &EventTuning {
        &self.inner.tuning
    }

    /// Whether listeners for `event_type` are registered passive.
    #[must_use]
    pub fn is_passive(&self, event_type: &str) -> bool {
        self.inner.tuning.is_passive(event_type)
    }

    /// Register a delegated handler for elements matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::InvalidSelector`] for unparsable selectors and
    /// [`EventError::Destroyed`] after teardown.
    pub fn delegate<F>(&self, selector: &str, event_type: &str, handler: F) -> EventResult<ListenerToken>
    where
        F: Fn(&Delegated<'_, H>) -> anyhow::Result<()> + 'static,
    {
        self.delegate_shared(selector, event_type, Rc::new(handler))
    }

    /// Register a shared delegated handler. A `(selector, event type,
    /// handler)` triple is stored at most once.
    ///
    /// # Errors
    ///
    /// See [`EventManager::delegate`].
    pub fn delegate_shared(
        &self,
        selector: &str,
        event_type: &str,
        handler: DelegateHandler<H>,
    ) -> EventResult<ListenerToken> {
        if !self.inner.host.validate_selector(selector) {
            return Err(EventError::InvalidSelector {
                selector: selector.to_string(),
            });
        }
        let token = {
            let mut state = self.inner.state.borrow_mut();
            if state.destroyed {
                return Err(EventError::Destroyed {
                    operation: "delegate",
                });
            }
            if let Some(existing) = state
                .delegates
                .find(event_type, selector, |known| Rc::ptr_eq(known, &handler))
            {
                return Ok(existing);
            }
            let token = next_token(&mut state);
            state.delegates.insert(event_type, selector, token, handler);
            state.delegate_records.insert(
                token,
                ListenerRecord {
                    kind: ListenerKind::Delegate,
                    event_type: event_type.to_string(),
                    selector: Some(selector.to_string()),
                    created_at: self.inner.host.now_ms(),
                },
            );
            state.metrics.registered += 1;
            state.metrics.delegated += 1;
            token
        };
        self.ensure_root(event_type);
        Ok(token)
    }

    /// Remove a delegated handler. Unknown tokens are a no-op.
    pub fn undelegate(&self, token: ListenerToken) -> bool {
        let retired = {
            let mut state = self.inner.state.borrow_mut();
            let Some(removed) = state.delegates.remove(token) else {
                return false;
            };
            state.delegate_records.remove(&token);
            if removed.type_emptied {
                state.roots.remove(&removed.event_type)
            } else {
                None
            }
        };
        if let Some(root) = retired {
            root.retire(&self.inner.host);
        }
        true
    }

    /// Attach a plain listener.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Destroyed`] after teardown.
    pub fn on<F>(&self, target: &Target<H::Node>, event_type: &str, handler: F) -> EventResult<ListenerToken>
    where
        F: Fn(&H::Event) -> anyhow::Result<()> + 'static,
    {
        let name = event_type.to_string();
        self.register_direct(
            ListenerKind::Standard,
            target,
            event_type,
            move |inner, _, event| inner.invoke("on", None, &name, || handler(event)),
            None,
        )
    }

    /// Attach a listener that removes itself after the first invocation.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Destroyed`] after teardown.
    pub fn once<F>(&self, target: &Target<H::Node>, event_type: &str, handler: F) -> EventResult<ListenerToken>
    where
        F: Fn(&H::Event) -> anyhow::Result<()> + 'static,
    {
        let name = event_type.to_string();
        self.register_direct(
            ListenerKind::Once,
            target,
            event_type,
            move |inner, token, event| {
                inner.remove_direct(token);
                inner.invoke("once", None, &name, || handler(event));
            },
            None,
        )
    }

    /// Attach a trailing-debounced listener. `delay_ms` falls back to the
    /// tuning table.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Destroyed`] after teardown.
    pub fn debounce<F>(
        &self,
        target: &Target<H::Node>,
        event_type: &str,
        handler: F,
        delay_ms: Option<u32>,
    ) -> EventResult<ListenerToken>
    where
        F: Fn(&H::Event) -> anyhow::Result<()> + 'static,
    {
        let delay = self.inner.tuning.debounce_delay(event_type, delay_ms);
        let debouncer = Rc::new(RefCell::new(Debouncer::<H::Event>::new()));
        let handler = Rc::new(handler);
        let name = event_type.to_string();
        let cancel = {
            let debouncer = Rc::clone(&debouncer);
            Box::new(move || debouncer.borrow_mut().cancel()) as Box<dyn Fn()>
        };
        let token = self.register_direct(
            ListenerKind::Debounce,
            target,
            event_type,
            move |inner, _, event| {
                let generation = debouncer.borrow_mut().push(event.clone());
                let weak = Rc::downgrade(inner);
                let debouncer = Rc::clone(&debouncer);
                let handler = Rc::clone(&handler);
                let name = name.clone();
                inner.host.set_timeout(
                    delay,
                    Box::new(move || {
                        let Some(inner) = weak.upgrade() else {
                            return;
                        };
                        let ready = debouncer.borrow_mut().fire(generation);
                        if let Some(event) = ready {
                            inner.invoke("debounce", None, &name, || handler(&event));
                        }
                    }),
                );
            },
            Some(cancel),
        )?;
        self.inner.state.borrow_mut().metrics.debounced += 1;
        Ok(token)
    }

    /// Attach a trailing-edge throttled listener. `limit_ms` falls back to
    /// the tuning table.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Destroyed`] after teardown.
    pub fn throttle<F>(
        &self,
        target: &Target<H::Node>,
        event_type: &str,
        handler: F,
        limit_ms: Option<u32>,
    ) -> EventResult<ListenerToken>
    where
        F: Fn(&H::Event) -> anyhow::Result<()> + 'static,
    {
        let limit = self.inner.tuning.throttle_limit(event_type, limit_ms);
        let throttler = Rc::new(RefCell::new(Throttler::<H::Event>::new(limit)));
        let handler = Rc::new(handler);
        let name = event_type.to_string();
        let cancel = {
            let throttler = Rc::clone(&throttler);
            Box::new(move || throttler.borrow_mut().cancel()) as Box<dyn Fn()>
        };
        let token = self.register_direct(
            ListenerKind::Throttle,
            target,
            event_type,
            move |inner, _, event| {
                let step = throttler
                    .borrow_mut()
                    .push(inner.host.now_ms(), event.clone());
                match step {
                    ThrottleStep::Run(event) => {
                        inner.invoke("throttle", None, &name, || handler(&event));
                    }
                    ThrottleStep::Defer {
                        generation,
                        delay_ms,
                    } => {
                        let weak = Rc::downgrade(inner);
                        let throttler = Rc::clone(&throttler);
                        let handler = Rc::clone(&handler);
                        let name = name.clone();
                        inner.host.set_timeout(
                            delay_ms,
                            Box::new(move || {
                                let Some(inner) = weak.upgrade() else {
                                    return;
                                };
                                let now = inner.host.now_ms();
                                let ready = throttler.borrow_mut().fire(now, generation);
                                if let Some(event) = ready {
                                    inner.invoke("throttle", None, &name, || handler(&event));
                                }
                            }),
                        );
                    }
                    ThrottleStep::Coalesced => {}
                }
            },
            Some(cancel),
        )?;
        self.inner.state.borrow_mut().metrics.throttled += 1;
        Ok(token)
    }

    /// Remove any registration by token. Unknown tokens are a no-op.
    pub fn off(&self, token: ListenerToken) -> bool {
        let delegated = self.inner.state.borrow().delegates.contains(token);
        if delegated {
            self.undelegate(token)
        } else {
            self.inner.remove_direct(token)
        }
    }

    /// Dispatch a bubbling, cancelable custom event on `target` (the
    /// document when `None`). Returns `true` when not cancelled.
    pub fn emit(&self, event_type: &str, detail: &Value, target: Option<&Target<H::Node>>) -> bool {
        let target = target.cloned().unwrap_or(Target::Document);
        self.inner.host.dispatch(&target, event_type, detail)
    }

    /// Bookkeeping for a live registration.
    #[must_use]
    pub fn record(&self, token: ListenerToken) -> Option<ListenerRecord> {
        let state = self.inner.state.borrow();
        state
            .delegate_records
            .get(&token)
            .or_else(|| state.direct.get(&token).map(|entry| &entry.record))
            .cloned()
    }

    /// Counter snapshot.
    #[must_use]
    pub fn metrics(&self) -> EventMetrics {
        self.inner.state.borrow().metrics
    }

    /// Live registrations of every kind.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        let state = self.inner.state.borrow();
        state.delegates.len() + state.direct.len()
    }

    /// Event types that currently own a delegated root listener.
    #[must_use]
    pub fn delegated_types(&self) -> Vec<String> {
        self.inner.state.borrow().delegates.event_types()
    }

    /// Whether [`EventManager::destroy`] has run.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.inner.state.borrow().destroyed
    }

    /// Remove every native listener, clear all maps and announce teardown.
    /// Later registrations fail with [`EventError::Destroyed`].
    pub fn destroy(&self) {
        let (roots, direct) = {
            let mut state = self.inner.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            state.delegates.clear();
            state.delegate_records.clear();
            (
                std::mem::take(&mut state.roots),
                std::mem::take(&mut state.direct),
            )
        };
        for (_, root) in roots {
            root.retire(&self.inner.host);
        }
        for (_, entry) in direct {
            if let Some(cancel) = &entry.cancel {
                cancel();
            }
            entry.attached.retire(&self.inner.host);
        }
        let timestamp = self.inner.host.now_ms();
        self.emit(DESTROYED_EVENT, &json!({ "timestamp": timestamp }), None);
        tracing::debug!("event manager destroyed");
    }

    fn ensure_root(&self, event_type: &str) {
        if self.inner.state.borrow().roots.contains_key(event_type) {
            return;
        }
        let active = Rc::new(Cell::new(true));
        let flag = Rc::clone(&active);
        let weak: Weak<Inner<H>> = Rc::downgrade(&self.inner);
        let name = event_type.to_string();
        let options = ListenOptions {
            capture: true,
            passive: self.inner.tuning.is_passive(event_type),
        };
        let callback: NativeCallback<H::Event> = Box::new(move |event| {
            if !flag.get() {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                inner.dispatch_delegated(&name, event);
            }
        });
        let listener = self
            .inner
            .host
            .listen(&Target::Document, event_type, options, callback);
        self.inner
            .state
            .borrow_mut()
            .roots
            .insert(event_type.to_string(), Attached { listener, active });
    }

    fn register_direct<C>(
        &self,
        kind: ListenerKind,
        target: &Target<H::Node>,
        event_type: &str,
        callback: C,
        cancel: Option<Box<dyn Fn()>>,
    ) -> EventResult<ListenerToken>
    where
        C: Fn(&Rc<Inner<H>>, ListenerToken, &H::Event) + 'static,
    {
        let token = {
            let mut state = self.inner.state.borrow_mut();
            if state.destroyed {
                return Err(EventError::Destroyed { operation: "on" });
            }
            next_token(&mut state)
        };
        let active = Rc::new(Cell::new(true));
        let flag = Rc::clone(&active);
        let weak = Rc::downgrade(&self.inner);
        let options = ListenOptions {
            capture: false,
            passive: self.inner.tuning.is_passive(event_type),
        };
        let listener = self.inner.host.listen(
            target,
            event_type,
            options,
            Box::new(move |event| {
                if !flag.get() {
                    return;
                }
                if let Some(inner) = weak.upgrade() {
                    callback(&inner, token, event);
                }
            }),
        );
        let record = ListenerRecord {
            kind,
            event_type: event_type.to_string(),
            selector: None,
            created_at: self.inner.host.now_ms(),
        };
        let mut state = self.inner.state.borrow_mut();
        state.direct.insert(
            token,
            DirectEntry {
                record,
                attached: Attached { listener, active },
                cancel,
            },
        );
        state.metrics.registered += 1;
        Ok(token)
    }
}

impl<H: Host> Inner<H> {
    fn dispatch_delegated(&self, event_type: &str, event: &H::Event) {
        let snapshot = self.state.borrow().delegates.snapshot(event_type);
        if snapshot.is_empty() {
            return;
        }
        // Walk target -> root; the walk order is already deepest-first.
        let mut matched = Vec::new();
        let mut node = event.target();
        while let Some(current) = node {
            for (selector, handlers) in &snapshot {
                if current.matches(selector) {
                    for (token, handler) in handlers {
                        matched.push((current.clone(), selector.as_str(), *token, Rc::clone(handler)));
                    }
                }
            }
            node = current.parent_element();
        }
        for (element, selector, token, handler) in matched {
            if !self.state.borrow().delegates.contains(token) {
                continue;
            }
            let delegated = Delegated {
                event,
                delegate_target: &element,
                selector,
            };
            self.invoke("delegate", Some(selector), event_type, || handler(&delegated));
        }
    }

    fn invoke(
        &self,
        context: &'static str,
        selector: Option<&str>,
        event_type: &str,
        call: impl FnOnce() -> anyhow::Result<()>,
    ) {
        self.state.borrow_mut().metrics.triggered += 1;
        if let Err(err) = call() {
            self.state.borrow_mut().metrics.errors += 1;
            tracing::error!(
                context,
                selector = selector.unwrap_or_default(),
                event = event_type,
                error = %err,
                "event handler failed"
            );
            let detail = json!({
                "context": context,
                "selector": selector,
                "event": event_type,
                "error": format!("{err:#}"),
                "timestamp": self.host.now_ms(),
            });
            self.host.dispatch(&Target::Document, ERROR_EVENT, &detail);
        }
    }

    fn remove_direct(&self, token: ListenerToken) -> bool {
        let entry = self.state.borrow_mut().direct.remove(&token);
        let Some(entry) = entry else {
            return false;
        };
        if let Some(cancel) = &entry.cancel {
            cancel();
        }
        entry.attached.retire(&self.host);
        true
    }
}

fn next_token<H: Host>(state: &mut State<H>) -> ListenerToken {
    state.next_token += 1;
    ListenerToken::from_raw(state.next_token)
}
