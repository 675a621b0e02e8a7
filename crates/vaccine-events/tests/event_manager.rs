use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::anyhow;
use serde_json::json;
use vaccine_events::testing::{FakeEvent, FakeHost, FakeNode};
use vaccine_events::{
    DESTROYED_EVENT, ERROR_EVENT, EventError, EventManager, EventTuning, HostEvent, ListenerKind,
    ListenerToken, READY_EVENT, Target,
};

fn setup() -> (FakeHost, EventManager<FakeHost>) {
    let host = FakeHost::new();
    let manager = EventManager::new(host.clone(), EventTuning::default());
    (host, manager)
}

fn node_id(node: &FakeNode) -> String {
    node.id().unwrap_or_default()
}

#[test]
fn construction_emits_ready() {
    let (host, manager) = setup();
    assert_eq!(host.emitted_types(), vec![READY_EVENT]);
    assert!(!manager.is_destroyed());
    assert_eq!(manager.listener_count(), 0);
}

#[test]
fn delegated_handlers_run_deepest_match_first() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let outer = host.append(&host.body(), "div#outer.card");
    let inner = host.append(&outer, "div#inner.card");
    let button = host.append(&inner, "button#buy.action");
    let log = Rc::new(RefCell::new(Vec::new()));

    let card_log = Rc::clone(&log);
    manager.delegate(".card", "click", move |delegated| {
        card_log
            .borrow_mut()
            .push(format!("card:{}", node_id(delegated.delegate_target)));
        Ok(())
    })?;
    let action_log = Rc::clone(&log);
    manager.delegate(".action", "click", move |delegated| {
        action_log
            .borrow_mut()
            .push(format!("{}:{}", delegated.selector, node_id(delegated.delegate_target)));
        Ok(())
    })?;

    host.fire(&button, "click");
    assert_eq!(
        *log.borrow(),
        vec![".action:buy", "card:inner", "card:outer"]
    );
    assert_eq!(manager.delegated_types(), vec!["click"]);
    Ok(())
}

#[test]
fn delegated_handler_runs_once_per_dispatch() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let item = host.append(&host.body(), "details.faq-item");
    let summary = host.append(&item, "summary");
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let handler: vaccine_events::DelegateHandler<FakeHost> = Rc::new(move |_| {
        counter.set(counter.get() + 1);
        Ok(())
    });

    let first = manager.delegate_shared(".faq-item", "click", Rc::clone(&handler))?;
    let again = manager.delegate_shared(".faq-item", "click", handler)?;
    assert_eq!(first, again);
    assert_eq!(manager.listener_count(), 1);

    host.fire(&summary, "click");
    assert_eq!(calls.get(), 1);
    host.fire(&summary, "click");
    assert_eq!(calls.get(), 2);
    host.fire(&host.body(), "click");
    assert_eq!(calls.get(), 2);

    let record = manager.record(first).expect("record kept");
    assert_eq!(record.kind, ListenerKind::Delegate);
    assert_eq!(record.selector.as_deref(), Some(".faq-item"));
    Ok(())
}

#[test]
fn undelegate_leaves_other_handlers_untouched() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let button = host.append(&host.body(), "button.toggle");
    let log = Rc::new(RefCell::new(Vec::new()));

    let first_log = Rc::clone(&log);
    let first = manager.delegate(".toggle", "click", move |_| {
        first_log.borrow_mut().push("first");
        Ok(())
    })?;
    let second_log = Rc::clone(&log);
    let second = manager.delegate(".toggle", "click", move |_| {
        second_log.borrow_mut().push("second");
        Ok(())
    })?;

    assert!(manager.undelegate(first));
    assert!(!manager.undelegate(first));
    host.fire(&button, "click");
    assert_eq!(*log.borrow(), vec!["second"]);

    assert!(manager.off(second));
    host.fire(&button, "click");
    assert_eq!(*log.borrow(), vec!["second"]);
    assert!(manager.delegated_types().is_empty());

    host.advance(0.0);
    assert_eq!(host.active_listeners(), 0);
    Ok(())
}

#[test]
fn handler_may_remove_itself_while_running() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let button = host.append(&host.body(), "button.once");
    let calls = Rc::new(Cell::new(0));
    let slot: Rc<Cell<Option<ListenerToken>>> = Rc::new(Cell::new(None));

    let handle = manager.clone();
    let own = Rc::clone(&slot);
    let counter = Rc::clone(&calls);
    let token = manager.delegate(".once", "click", move |_| {
        counter.set(counter.get() + 1);
        if let Some(token) = own.get() {
            handle.undelegate(token);
        }
        Ok(())
    })?;
    slot.set(Some(token));

    host.fire(&button, "click");
    host.fire(&button, "click");
    assert_eq!(calls.get(), 1);
    Ok(())
}

#[test]
fn failing_handler_does_not_block_siblings() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let button = host.append(&host.body(), "button.broken");
    let ran = Rc::new(Cell::new(false));

    manager.delegate(".broken", "click", |_| Err(anyhow!("boom")))?;
    let flag = Rc::clone(&ran);
    manager.delegate(".broken", "click", move |_| {
        flag.set(true);
        Ok(())
    })?;

    host.fire(&button, "click");
    assert!(ran.get());
    let errors: Vec<_> = host
        .emitted()
        .into_iter()
        .filter(|event| event.event_type == ERROR_EVENT)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].detail["selector"], json!(".broken"));
    assert_eq!(errors[0].detail["event"], json!("click"));
    assert_eq!(errors[0].detail["error"], json!("boom"));
    assert_eq!(manager.metrics().errors, 1);
    assert_eq!(manager.metrics().triggered, 2);
    Ok(())
}

#[test]
fn debounce_fires_once_after_quiet_period_with_last_event() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let input = host.append(&host.body(), "input#search");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let clock = host.clone();
    manager.debounce(
        &Target::Node(input.clone()),
        "input",
        move |event: &FakeEvent| {
            sink.borrow_mut().push((clock.now(), event.detail().clone()));
            Ok(())
        },
        Some(50),
    )?;

    for (step, payload) in [(0.0, 1), (10.0, 2), (10.0, 3)] {
        host.advance(step);
        host.fire_event(
            &Target::Node(input.clone()),
            &FakeEvent::new("input", Some(input.clone()), json!(payload)),
        );
    }
    host.advance(49.0);
    assert!(seen.borrow().is_empty());
    host.advance(1.0);
    assert_eq!(*seen.borrow(), vec![(70.0, json!(3))]);
    host.advance(500.0);
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(manager.metrics().debounced, 1);
    Ok(())
}

#[test]
fn debounce_falls_back_to_tuning_delay() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    manager.debounce(
        &Target::Window,
        "resize",
        move |_: &FakeEvent| {
            counter.set(counter.get() + 1);
            Ok(())
        },
        None,
    )?;
    host.fire_event(&Target::Window, &FakeEvent::new("resize", None, json!(null)));
    host.advance(249.0);
    assert_eq!(calls.get(), 0);
    host.advance(1.0);
    assert_eq!(calls.get(), 1);
    Ok(())
}

#[test]
fn throttle_limits_burst_and_delivers_trailing_event() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let area = host.append(&host.body(), "div#area");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    manager.throttle(
        &Target::Node(area.clone()),
        "mousemove",
        move |event: &FakeEvent| {
            sink.borrow_mut().push(event.detail().clone());
            Ok(())
        },
        Some(16),
    )?;

    for index in 0..100 {
        host.fire_event(
            &Target::Node(area.clone()),
            &FakeEvent::new("mousemove", Some(area.clone()), json!(index)),
        );
        host.advance(0.1);
    }
    host.advance(100.0);

    let limit = (10.0_f64 / 16.0).ceil() as usize + 1;
    assert!(seen.borrow().len() <= limit);
    assert_eq!(*seen.borrow(), vec![json!(0), json!(99)]);
    Ok(())
}

#[test]
fn once_listener_runs_a_single_time() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let button = host.append(&host.body(), "button#install");
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let token = manager.once(&Target::Node(button.clone()), "click", move |_| {
        counter.set(counter.get() + 1);
        Ok(())
    })?;
    assert_eq!(
        manager.record(token).map(|record| record.kind),
        Some(ListenerKind::Once)
    );

    host.fire(&button, "click");
    host.fire(&button, "click");
    assert_eq!(calls.get(), 1);
    assert!(manager.record(token).is_none());
    host.advance(0.0);
    assert_eq!(host.active_listeners(), 0);
    Ok(())
}

#[test]
fn off_cancels_pending_debounce() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let token = manager.debounce(
        &Target::Window,
        "scroll",
        move |_: &FakeEvent| {
            counter.set(counter.get() + 1);
            Ok(())
        },
        Some(20),
    )?;
    host.fire_event(&Target::Window, &FakeEvent::new("scroll", None, json!(null)));
    assert!(manager.off(token));
    host.advance(100.0);
    assert_eq!(calls.get(), 0);
    Ok(())
}

#[test]
fn emit_reports_cancellation() -> anyhow::Result<()> {
    let (host, manager) = setup();
    manager.on(&Target::Document, "vaccine:test:veto", |event: &FakeEvent| {
        event.prevent_default();
        Ok(())
    })?;
    assert!(!manager.emit("vaccine:test:veto", &json!({}), None));
    assert!(manager.emit("vaccine:test:other", &json!({ "a": 1 }), None));
    let last = host.emitted().pop().expect("recorded");
    assert_eq!(last.detail, json!({ "a": 1 }));
    Ok(())
}

#[test]
fn passive_types_register_passive_root_listeners() -> anyhow::Result<()> {
    let (host, manager) = setup();
    manager.delegate(".table-scroll-container", "scroll", |_| Ok(()))?;
    manager.delegate(".table-scroll-container", "click", |_| Ok(()))?;
    assert!(manager.is_passive("touchmove"));
    assert_eq!(host.passive_listeners("scroll"), 1);
    assert_eq!(host.passive_listeners("click"), 0);
    Ok(())
}

#[test]
fn invalid_selector_is_rejected() {
    let (_host, manager) = setup();
    let result = manager.delegate("a[", "click", |_| Ok(()));
    assert_eq!(
        result,
        Err(EventError::InvalidSelector {
            selector: "a[".to_string()
        })
    );
}

#[test]
fn destroy_detaches_everything() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let button = host.append(&host.body(), "button.go");
    let calls = Rc::new(Cell::new(0));
    let delegated = Rc::clone(&calls);
    manager.delegate(".go", "click", move |_| {
        delegated.set(delegated.get() + 1);
        Ok(())
    })?;
    let direct = Rc::clone(&calls);
    manager.on(&Target::Node(button.clone()), "click", move |_| {
        direct.set(direct.get() + 1);
        Ok(())
    })?;

    manager.destroy();
    manager.destroy();
    host.fire(&button, "click");
    assert_eq!(calls.get(), 0);
    assert_eq!(manager.listener_count(), 0);
    assert!(manager.is_destroyed());
    assert_eq!(
        host.emitted_types()
            .iter()
            .filter(|name| *name == DESTROYED_EVENT)
            .count(),
        1
    );
    assert!(matches!(
        manager.delegate(".go", "click", |_| Ok(())),
        Err(EventError::Destroyed { .. })
    ));
    host.advance(0.0);
    assert_eq!(host.active_listeners(), 0);
    Ok(())
}
