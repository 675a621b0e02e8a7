use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Value, json};
use vaccine_config::{AccordionConfig, PriceToggleConfig, ResponsiveTableConfig};
use vaccine_events::testing::{FakeEvent, FakeHost, FakeNode};
use vaccine_events::{EventManager, EventTuning, HostEvent, Target};
use vaccine_widgets::accordion::{AccordionController, AccordionItem, AccordionView};
use vaccine_widgets::price_toggle::{
    PriceTier, PriceToggle, PriceToggleController, PriceToggleView, ToggleDescriptor, announcement,
};
use vaccine_widgets::responsive_table::{ScrollMetrics, TableController, TableViewport};
use vaccine_widgets::Registrations;

fn setup() -> (FakeHost, EventManager<FakeHost>) {
    let host = FakeHost::new();
    let manager = EventManager::new(host.clone(), EventTuning::default());
    (host, manager)
}

fn emitted_types(host: &FakeHost) -> Vec<String> {
    host.emitted().into_iter().map(|event| event.event_type).collect()
}

#[derive(Default)]
struct FaqPage {
    containers: Vec<FakeNode>,
    headers: Vec<FakeNode>,
    focused: RefCell<Vec<usize>>,
    announced: RefCell<Vec<String>>,
}

impl AccordionView<FakeNode> for FaqPage {
    fn header_index(&self, header: &FakeNode) -> Option<usize> {
        self.headers.iter().position(|candidate| candidate == header)
    }

    fn container_index(&self, container: &FakeNode) -> Option<usize> {
        self.containers.iter().position(|candidate| candidate == container)
    }

    fn native_open(&self, index: usize) -> Option<bool> {
        self.containers
            .get(index)
            .map(|container| container.attribute("open").is_some())
    }

    fn render(&self, index: usize, open: bool) {
        if let Some(container) = self.containers.get(index) {
            if open {
                container.set_attribute("open", "");
            } else {
                container.remove_attribute("open");
            }
        }
    }

    fn focus_header(&self, index: usize) {
        self.focused.borrow_mut().push(index);
    }

    fn announce(&self, message: &str) {
        self.announced.borrow_mut().push(message.to_string());
    }
}

type Faq = AccordionController<FakeHost, FaqPage>;

fn faq(
    host: &FakeHost,
    manager: &EventManager<FakeHost>,
    single: bool,
) -> anyhow::Result<(Rc<Faq>, Registrations<FakeHost>)> {
    let config = AccordionConfig {
        single,
        ..AccordionConfig::default()
    };
    let mut page = FaqPage::default();
    let mut items = Vec::new();
    for (key, question) in [
        ("faq-a", "Vilka vacciner erbjuder ni?"),
        ("faq-b", "Behöver jag boka tid?"),
    ] {
        let container = host.append(&host.body(), &format!("details#{key}.faq-item"));
        page.headers.push(host.append(&container, "summary"));
        page.containers.push(container);
        items.push(AccordionItem::new(key, question));
    }
    let controller = Rc::new(Faq::new(manager, &config, items, page));
    let mut registrations = Registrations::new(manager, "accordion");
    controller.bind(&config, &mut registrations)?;
    controller.render_all();
    Ok((controller, registrations))
}

#[test]
fn single_mode_accordion_emits_one_closing_and_one_opening() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let (faq, _registrations) = faq(&host, &manager, true)?;
    let headers = faq.view().headers.clone();

    let click = host.fire(&headers[0], "click");
    assert!(click.default_prevented());
    assert_eq!(faq.state().open_indices(), vec![0]);
    host.clear_emitted();

    host.fire(&headers[1], "click");
    assert_eq!(faq.state().open_indices(), vec![1]);
    assert!(faq.view().containers[0].attribute("open").is_none());
    assert!(faq.view().containers[1].attribute("open").is_some());
    assert_eq!(
        emitted_types(&host),
        vec![
            "vaccine:accordion:closing",
            "vaccine:accordion:opening",
            "vaccine:accordion:toggled",
        ]
    );
    let emitted = host.emitted();
    assert_eq!(emitted[0].detail["id"], json!("faq-a"));
    assert_eq!(emitted[1].detail["question"], json!("Behöver jag boka tid?"));
    assert_eq!(emitted[2].detail, json!({ "id": "faq-b", "isOpen": true }));
    assert_eq!(faq.view().announced.borrow().len(), 2);
    Ok(())
}

#[test]
fn native_details_toggles_are_adopted_once() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let (faq, _registrations) = faq(&host, &manager, true)?;
    let containers = faq.view().containers.clone();
    faq.open(0);
    host.clear_emitted();

    containers[1].set_attribute("open", "");
    host.fire(&containers[1], "toggle");
    assert_eq!(faq.state().open_indices(), vec![1]);
    assert!(containers[0].attribute("open").is_none());
    assert_eq!(
        emitted_types(&host),
        vec![
            "vaccine:accordion:closing",
            "vaccine:accordion:opening",
            "vaccine:accordion:toggled",
        ]
    );

    host.clear_emitted();
    host.fire(&containers[1], "toggle");
    host.fire(&containers[0], "toggle");
    assert!(host.emitted().is_empty());
    Ok(())
}

#[test]
fn escape_inside_an_answer_closes_every_item() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let (faq, _registrations) = faq(&host, &manager, false)?;
    let answer = host.append(&faq.view().containers[0], "div.faq-answer");
    faq.open(0);
    faq.open(1);
    host.clear_emitted();

    let escape = host.press(&answer, "Escape", false);
    assert!(escape.default_prevented());
    assert!(faq.state().open_indices().is_empty());
    let closings = emitted_types(&host)
        .into_iter()
        .filter(|event_type| event_type == "vaccine:accordion:closing")
        .count();
    assert_eq!(closings, 2);

    let again = host.press(&answer, "Escape", false);
    assert!(!again.default_prevented());
    Ok(())
}

#[test]
fn escape_on_a_header_closes_only_that_item() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let (faq, _registrations) = faq(&host, &manager, false)?;
    faq.open(0);
    faq.open(1);

    let header = faq.view().headers[0].clone();
    let escape = host.press(&header, "Escape", false);
    assert!(escape.default_prevented());
    assert_eq!(faq.state().open_indices(), vec![1]);
    assert_eq!(*faq.view().focused.borrow(), vec![0]);

    host.press(&header, "ArrowDown", false);
    assert_eq!(*faq.view().focused.borrow(), vec![0, 1]);
    Ok(())
}

#[derive(Default)]
struct PricePage {
    inputs: Vec<FakeNode>,
    labels: Vec<FakeNode>,
    texts: Vec<&'static str>,
    rendered: RefCell<Vec<PriceTier>>,
    focused: RefCell<Vec<usize>>,
    announced: RefCell<Vec<String>>,
}

impl PriceToggleView<FakeNode> for PricePage {
    fn toggle_index(&self, input: &FakeNode) -> Option<usize> {
        self.inputs.iter().position(|candidate| candidate == input)
    }

    fn label_index(&self, label: &FakeNode) -> Option<usize> {
        self.labels.iter().position(|candidate| candidate == label)
    }

    fn label_text(&self, index: usize) -> Option<String> {
        self.texts.get(index).map(|text| (*text).to_string())
    }

    fn render(&self, toggle: &PriceToggle) {
        self.rendered.borrow_mut().push(toggle.current_view());
    }

    fn focus_label(&self, index: usize) {
        self.focused.borrow_mut().push(index);
    }

    fn announce(&self, message: &str) {
        self.announced.borrow_mut().push(message.to_string());
    }
}

type Prices = PriceToggleController<FakeHost, PricePage>;

fn prices(
    host: &FakeHost,
    manager: &EventManager<FakeHost>,
) -> anyhow::Result<(Rc<Prices>, Registrations<FakeHost>)> {
    let config = PriceToggleConfig::default();
    let group = host.append(&host.body(), "div.price-toggle-group");
    let mut page = PricePage::default();
    let mut descriptors = Vec::new();
    for (id, text) in [("v-ord", "Ordinarie"), ("v-pen", "Pensionär"), ("v-stu", "Student")] {
        page.inputs
            .push(host.append(&group, &format!("input#{id}.price-toggle-input")));
        let label = host.append(&group, "label");
        label.set_attribute("for", id);
        label.set_attribute("data-enhanced", "true");
        page.labels.push(label);
        page.texts.push(text);
        descriptors.push(ToggleDescriptor {
            id: id.to_string(),
            data_price_type: None,
            value: None,
            checked: id == "v-ord",
            has_label: true,
        });
    }
    let toggle = PriceToggle::new(&config, true, &descriptors)?;
    let controller = Rc::new(Prices::new(manager, &config, toggle, page));
    let mut registrations = Registrations::new(manager, "price-toggle");
    controller.bind(&config, &mut registrations)?;
    controller.render();
    Ok((controller, registrations))
}

#[test]
fn price_toggle_switches_on_delegated_change() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let (prices, _registrations) = prices(&host, &manager)?;
    let pensioner = prices.view().inputs[1].clone();

    host.fire(&pensioner, "change");
    host.fire(&pensioner, "change");

    assert_eq!(prices.toggle().current_view(), PriceTier::Pensioner);
    assert_eq!(emitted_types(&host), vec!["vaccine:price-toggle:changed"]);
    assert_eq!(
        host.emitted()[0].detail,
        json!({ "previousView": "ordinary", "currentView": "pensioner" })
    );
    assert_eq!(
        *prices.view().rendered.borrow(),
        vec![PriceTier::Ordinary, PriceTier::Pensioner]
    );
    assert_eq!(*prices.view().announced.borrow(), vec![announcement("Pensionär")]);
    Ok(())
}

#[test]
fn label_keys_select_and_move_focus() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let (prices, _registrations) = prices(&host, &manager)?;
    let labels = prices.view().labels.clone();

    let arrow = host.press(&labels[0], "ArrowLeft", false);
    assert!(arrow.default_prevented());
    assert_eq!(*prices.view().focused.borrow(), vec![2]);

    let enter = host.press(&labels[2], "Enter", false);
    assert!(enter.default_prevented());
    assert_eq!(prices.toggle().current_view(), PriceTier::Student);

    let other = host.press(&labels[2], "a", false);
    assert!(!other.default_prevented());
    assert!(!prices.switch_to(PriceTier::Student));
    assert!(prices.switch_to(PriceTier::Ordinary));
    Ok(())
}

struct FakeTables {
    wrappers: Vec<FakeNode>,
    tables: Vec<FakeNode>,
    metrics: RefCell<Vec<ScrollMetrics>>,
    scrolls: RefCell<Vec<(usize, f64, bool)>>,
    renders: RefCell<usize>,
    hints: RefCell<Vec<(usize, bool, bool)>>,
}

impl TableViewport<FakeNode> for FakeTables {
    fn len(&self) -> usize {
        self.wrappers.len()
    }

    fn wrapper(&self, index: usize) -> Option<&FakeNode> {
        self.wrappers.get(index)
    }

    fn table(&self, index: usize) -> Option<&FakeNode> {
        self.tables.get(index)
    }

    fn measure(&self, index: usize) -> Option<ScrollMetrics> {
        self.metrics.borrow().get(index).copied()
    }

    fn scroll_left_to(&self, index: usize, left: f64, smooth: bool) {
        if let Some(metrics) = self.metrics.borrow_mut().get_mut(index) {
            metrics.scroll_left = left;
        }
        self.scrolls.borrow_mut().push((index, left, smooth));
    }

    fn render(&self, _index: usize, _metrics: &ScrollMetrics) {
        *self.renders.borrow_mut() += 1;
    }

    fn focus_hint(&self, index: usize, focused: bool, scrollable: bool) {
        self.hints.borrow_mut().push((index, focused, scrollable));
    }
}

type Tables = TableController<FakeHost, FakeTables>;

fn wide() -> ScrollMetrics {
    ScrollMetrics {
        scroll_left: 0.0,
        scroll_width: 900.0,
        client_width: 400.0,
        table_width: 900.0,
    }
}

fn tables(
    host: &FakeHost,
    manager: &EventManager<FakeHost>,
) -> anyhow::Result<(Rc<Tables>, Registrations<FakeHost>)> {
    let config = ResponsiveTableConfig {
        smooth_scroll: false,
        ..ResponsiveTableConfig::default()
    };
    let mut wrappers = Vec::new();
    let mut nodes = Vec::new();
    for id in ["schedule", "prices"] {
        let wrapper = host.append(&host.body(), "div.table-scroll-container");
        nodes.push(host.append(&wrapper, &format!("table#{id}")));
        wrappers.push(wrapper);
    }
    let fits = ScrollMetrics {
        table_width: 300.0,
        scroll_width: 400.0,
        ..wide()
    };
    let view = FakeTables {
        wrappers,
        tables: nodes,
        metrics: RefCell::new(vec![wide(), fits]),
        scrolls: RefCell::new(Vec::new()),
        renders: RefCell::new(0),
        hints: RefCell::new(Vec::new()),
    };
    let keys = vec!["schedule".to_string(), "prices".to_string()];
    let controller = Rc::new(Tables::new(manager, &config, keys, view));
    let mut registrations = Registrations::new(manager, "responsive-table");
    controller.bind(&config, &mut registrations)?;
    controller.update_all();
    Ok((controller, registrations))
}

#[test]
fn tables_scroll_by_percentage() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let (tables, _registrations) = tables(&host, &manager)?;

    assert_eq!(tables.scroll_to(0, 50.0), Some(250.0));
    assert_eq!(tables.scroll_to_end(0), Some(500.0));
    assert_eq!(tables.scroll_to_start(0), Some(0.0));
    assert_eq!(tables.scroll_to(0, 140.0), Some(500.0));
    assert_eq!(tables.scroll_to(7, 50.0), None);
    assert_eq!(tables.view().scrolls.borrow()[0], (0, 250.0, false));

    tables.update(0, false);
    let state = tables.scroll_state(0).ok_or_else(|| anyhow::anyhow!("no state"))?;
    assert!(state.is_scrollable());
    assert!((state.metrics().percentage() - 100.0).abs() < 1e-9);
    assert!(!tables.scroll_state(1).is_some_and(|state| state.is_scrollable()));
    assert_eq!(tables.index_of("prices"), Some(1));
    Ok(())
}

#[test]
fn modifier_keys_scroll_the_focused_wrapper() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let (tables, _registrations) = tables(&host, &manager)?;
    let wrapper = tables.view().wrappers[0].clone();

    let plain = host.press(&wrapper, "End", false);
    assert!(!plain.default_prevented());
    assert!(tables.view().scrolls.borrow().is_empty());

    let end = host.press(&wrapper, "End", true);
    assert!(end.default_prevented());
    let back = host.press(&wrapper, "ArrowLeft", true);
    assert!(back.default_prevented());
    host.press(&wrapper, "Home", true);
    let lefts: Vec<f64> = tables
        .view()
        .scrolls
        .borrow()
        .iter()
        .map(|(_, left, _)| *left)
        .collect();
    assert_eq!(lefts, vec![500.0, 450.0, 0.0]);

    let fits = tables.view().wrappers[1].clone();
    assert!(!host.press(&fits, "End", true).default_prevented());
    Ok(())
}

#[test]
fn scroll_and_resize_events_remeasure() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let (tables, _registrations) = tables(&host, &manager)?;
    assert_eq!(
        emitted_types(&host),
        vec!["vaccine:table:scrollability-changed"]
    );
    assert_eq!(host.emitted()[0].detail, json!({ "tableId": "schedule", "scrollable": true }));
    host.clear_emitted();

    tables.view().metrics.borrow_mut()[0].scroll_left = 125.0;
    host.fire(&tables.view().wrappers[0], "scroll");
    host.advance(1_000.0);
    let scrolls: Vec<Value> = host
        .emitted()
        .into_iter()
        .filter(|event| event.event_type == "vaccine:table:scroll")
        .map(|event| event.detail)
        .collect();
    assert_eq!(
        scrolls,
        vec![json!({ "tableId": "schedule", "scrollLeft": 125.0, "percentage": 25.0 })]
    );

    let renders = *tables.view().renders.borrow();
    tables.view().metrics.borrow_mut()[1].table_width = 800.0;
    host.fire_event(&Target::Window, &FakeEvent::new("resize", None, Value::Null));
    host.fire_event(&Target::Window, &FakeEvent::new("resize", None, Value::Null));
    host.advance(1_000.0);
    assert_eq!(*tables.view().renders.borrow(), renders + 2);
    assert!(tables.scroll_state(1).is_some_and(|state| state.is_scrollable()));
    Ok(())
}

#[test]
fn wrappers_and_tables_are_both_watched_for_size_changes() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let (tables, _registrations) = tables(&host, &manager)?;
    let view = tables.view();
    assert_eq!(
        tables.resize_targets(),
        vec![
            view.wrappers[0].clone(),
            view.tables[0].clone(),
            view.wrappers[1].clone(),
            view.tables[1].clone(),
        ]
    );
    Ok(())
}

#[test]
fn focus_swaps_the_scroll_hint() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let (tables, _registrations) = tables(&host, &manager)?;
    host.fire(&tables.view().wrappers[0], "focus");
    host.fire(&tables.view().wrappers[1], "focus");
    host.fire(&tables.view().wrappers[0], "blur");
    assert_eq!(
        *tables.view().hints.borrow(),
        vec![(0, true, true), (1, true, false), (0, false, true)]
    );
    Ok(())
}

#[test]
fn released_controllers_stop_listening() -> anyhow::Result<()> {
    let (host, manager) = setup();
    let (faq, mut registrations) = faq(&host, &manager, false)?;
    assert!(!registrations.is_empty());
    registrations.release();
    let header = faq.view().headers[0].clone();
    let click: FakeEvent = host.fire(&header, "click");
    assert!(!click.default_prevented());
    assert!(faq.state().open_indices().is_empty());
    Ok(())
}
