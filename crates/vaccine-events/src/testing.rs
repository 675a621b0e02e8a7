//! In-memory host for exercising listeners without a browser.
//!
//! # Design
//! - A small element arena with tag, id, classes and attributes.
//! - Selector support covers what the widgets use: type and universal
//!   selectors, `#id`, `.class`, attribute presence and `=`, `^=`, `*=`,
//!   `$=` tests, `:not(...)`, descendant and child combinators and lists.
//! - Events travel capture, target and bubble phases through window,
//!   document and the element ancestry.
//! - Timers run against a virtual clock advanced explicitly by tests.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::host::{Host, HostEvent, HostNode, ListenOptions, NativeCallback, Target};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Window,
    Document,
    Node(usize),
}

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, String)>,
    parent: Option<usize>,
}

struct ListenerSlot {
    slot: Slot,
    event_type: String,
    capture: bool,
    passive: bool,
    callback: Rc<dyn Fn(&FakeEvent)>,
    active: Rc<Cell<bool>>,
}

struct PendingTimer {
    due: f64,
    seq: u64,
    callback: Box<dyn FnOnce()>,
}

/// Custom event recorded by [`FakeHost::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedEvent {
    /// Event type.
    pub event_type: String,
    /// Detail payload.
    pub detail: Value,
    /// Whether a listener cancelled it.
    pub cancelled: bool,
}

#[derive(Default)]
struct Shared {
    nodes: RefCell<Vec<NodeData>>,
    listeners: RefCell<Vec<ListenerSlot>>,
    timers: RefCell<Vec<PendingTimer>>,
    clock: Cell<f64>,
    seq: Cell<u64>,
    emitted: RefCell<Vec<EmittedEvent>>,
}

/// In-memory host with a virtual clock.
#[derive(Clone)]
pub struct FakeHost {
    shared: Rc<Shared>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FakeHost {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FakeHost")
            .field("nodes", &self.shared.nodes.borrow().len())
            .field("now", &self.shared.clock.get())
            .finish_non_exhaustive()
    }
}

impl FakeHost {
    /// Create a document holding `<html><body></body></html>`.
    #[must_use]
    pub fn new() -> Self {
        let host = Self {
            shared: Rc::new(Shared::default()),
        };
        host.push_node(None, "html");
        host.push_node(Some(0), "body");
        host
    }

    /// The `<html>` element.
    #[must_use]
    pub fn document_element(&self) -> FakeNode {
        self.node(0)
    }

    /// The `<body>` element.
    #[must_use]
    pub fn body(&self) -> FakeNode {
        self.node(1)
    }

    /// Append a child described as `tag#id.class.class`.
    #[must_use]
    pub fn append(&self, parent: &FakeNode, description: &str) -> FakeNode {
        let index = self.push_node(Some(parent.index), description);
        self.node(index)
    }

    /// Dispatch a native, cancelable event at `target`.
    pub fn fire(&self, target: &FakeNode, event_type: &str) -> FakeEvent {
        let event = FakeEvent::new(event_type, Some(target.clone()), Value::Null);
        self.propagate(Slot::Node(target.index), &event);
        event
    }

    /// Dispatch a `keydown` for `key` at `target`, optionally with Ctrl held.
    pub fn press(&self, target: &FakeNode, key: &str, ctrl: bool) -> FakeEvent {
        let event = FakeEvent::new(
            "keydown",
            Some(target.clone()),
            serde_json::json!({ "key": key, "ctrlKey": ctrl }),
        );
        self.propagate(Slot::Node(target.index), &event);
        event
    }

    /// Dispatch a prepared event at window, document or an element.
    pub fn fire_event(&self, target: &Target<FakeNode>, event: &FakeEvent) {
        self.propagate(slot_of(target), event);
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.shared.clock.get()
    }

    /// Move the clock forward, running due timers in order.
    pub fn advance(&self, ms: f64) {
        let deadline = self.shared.clock.get() + ms;
        loop {
            let next = {
                let mut timers = self.shared.timers.borrow_mut();
                let position = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, timer)| timer.due <= deadline)
                    .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)))
                    .map(|(position, _)| position);
                position.map(|position| timers.remove(position))
            };
            let Some(timer) = next else {
                break;
            };
            if timer.due > self.shared.clock.get() {
                self.shared.clock.set(timer.due);
            }
            (timer.callback)();
        }
        self.shared.clock.set(deadline);
    }

    /// Timers waiting to fire.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.shared.timers.borrow().len()
    }

    /// Native listeners still attached.
    #[must_use]
    pub fn active_listeners(&self) -> usize {
        self.shared
            .listeners
            .borrow()
            .iter()
            .filter(|listener| listener.active.get())
            .count()
    }

    /// Attached listeners registered passive for `event_type`.
    #[must_use]
    pub fn passive_listeners(&self, event_type: &str) -> usize {
        self.shared
            .listeners
            .borrow()
            .iter()
            .filter(|listener| {
                listener.active.get() && listener.passive && listener.event_type == event_type
            })
            .count()
    }

    /// Every custom event dispatched so far.
    #[must_use]
    pub fn emitted(&self) -> Vec<EmittedEvent> {
        self.shared.emitted.borrow().clone()
    }

    /// Types of every custom event dispatched so far.
    #[must_use]
    pub fn emitted_types(&self) -> Vec<String> {
        self.shared
            .emitted
            .borrow()
            .iter()
            .map(|event| event.event_type.clone())
            .collect()
    }

    /// Forget recorded custom events.
    pub fn clear_emitted(&self) {
        self.shared.emitted.borrow_mut().clear();
    }

    fn node(&self, index: usize) -> FakeNode {
        FakeNode {
            index,
            shared: Rc::clone(&self.shared),
        }
    }

    fn push_node(&self, parent: Option<usize>, description: &str) -> usize {
        let mut data = parse_description(description);
        data.parent = parent;
        let mut nodes = self.shared.nodes.borrow_mut();
        nodes.push(data);
        nodes.len() - 1
    }

    fn next_seq(&self) -> u64 {
        let seq = self.shared.seq.get() + 1;
        self.shared.seq.set(seq);
        seq
    }

    fn path(&self, slot: Slot) -> Vec<Slot> {
        let mut path = vec![slot];
        if let Slot::Node(mut index) = slot {
            let nodes = self.shared.nodes.borrow();
            while let Some(parent) = nodes[index].parent {
                path.push(Slot::Node(parent));
                index = parent;
            }
        }
        if slot != Slot::Window {
            if slot != Slot::Document {
                path.push(Slot::Document);
            }
            path.push(Slot::Window);
        }
        path.reverse();
        path
    }

    fn propagate(&self, slot: Slot, event: &FakeEvent) {
        let path = self.path(slot);
        let Some((target, ancestors)) = path.split_last() else {
            return;
        };
        for ancestor in ancestors {
            self.run_listeners(*ancestor, &event.event_type(), Some(true), event);
        }
        self.run_listeners(*target, &event.event_type(), None, event);
        for ancestor in ancestors.iter().rev() {
            self.run_listeners(*ancestor, &event.event_type(), Some(false), event);
        }
    }

    fn run_listeners(&self, slot: Slot, event_type: &str, capture: Option<bool>, event: &FakeEvent) {
        let snapshot: Vec<_> = self
            .shared
            .listeners
            .borrow()
            .iter()
            .filter(|listener| {
                listener.active.get()
                    && listener.slot == slot
                    && listener.event_type == event_type
                    && capture.is_none_or(|phase| phase == listener.capture)
            })
            .map(|listener| {
                (
                    Rc::clone(&listener.callback),
                    Rc::clone(&listener.active),
                    listener.passive,
                )
            })
            .collect();
        for (callback, active, passive) in snapshot {
            if !active.get() {
                continue;
            }
            event.inner.passive_phase.set(passive);
            callback(event);
            event.inner.passive_phase.set(false);
        }
    }
}

/// RAII guard for a fake listener.
#[derive(Debug)]
pub struct FakeListener {
    active: Rc<Cell<bool>>,
}

impl Drop for FakeListener {
    fn drop(&mut self) {
        self.active.set(false);
    }
}

impl Host for FakeHost {
    type Node = FakeNode;
    type Event = FakeEvent;
    type Listener = FakeListener;

    fn listen(
        &self,
        target: &Target<FakeNode>,
        event_type: &str,
        options: ListenOptions,
        callback: NativeCallback<FakeEvent>,
    ) -> FakeListener {
        let active = Rc::new(Cell::new(true));
        self.shared.listeners.borrow_mut().push(ListenerSlot {
            slot: slot_of(target),
            event_type: event_type.to_string(),
            capture: options.capture,
            passive: options.passive,
            callback: Rc::from(callback),
            active: Rc::clone(&active),
        });
        FakeListener { active }
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) {
        let seq = self.next_seq();
        self.shared.timers.borrow_mut().push(PendingTimer {
            due: self.shared.clock.get() + f64::from(delay_ms),
            seq,
            callback,
        });
    }

    fn now_ms(&self) -> f64 {
        self.shared.clock.get()
    }

    fn validate_selector(&self, selector: &str) -> bool {
        parse_selector_list(selector).is_some()
    }

    fn dispatch(&self, target: &Target<FakeNode>, event_type: &str, detail: &Value) -> bool {
        let node = match target {
            Target::Node(node) => Some(node.clone()),
            Target::Window | Target::Document => None,
        };
        let event = FakeEvent::new(event_type, node, detail.clone());
        self.propagate(slot_of(target), &event);
        let cancelled = event.default_prevented();
        self.shared.emitted.borrow_mut().push(EmittedEvent {
            event_type: event_type.to_string(),
            detail: detail.clone(),
            cancelled,
        });
        !cancelled
    }
}

fn slot_of(target: &Target<FakeNode>) -> Slot {
    match target {
        Target::Window => Slot::Window,
        Target::Document => Slot::Document,
        Target::Node(node) => Slot::Node(node.index),
    }
}

/// Element handle inside a [`FakeHost`].
#[derive(Clone)]
pub struct FakeNode {
    index: usize,
    shared: Rc<Shared>,
}

impl PartialEq for FakeNode {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && Rc::ptr_eq(&self.shared, &other.shared)
    }
}

impl fmt::Debug for FakeNode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes = self.shared.nodes.borrow();
        let data = &nodes[self.index];
        write!(formatter, "<{}", data.tag)?;
        if let Some(id) = &data.id {
            write!(formatter, "#{id}")?;
        }
        for class in &data.classes {
            write!(formatter, ".{class}")?;
        }
        formatter.write_str(">")
    }
}

impl FakeNode {
    /// Lowercase tag name.
    #[must_use]
    pub fn tag(&self) -> String {
        self.shared.nodes.borrow()[self.index].tag.clone()
    }

    /// `id` attribute.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.shared.nodes.borrow()[self.index].id.clone()
    }

    /// Attribute value; `id` and `class` are reflected.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        attribute_of(&self.shared.nodes.borrow()[self.index], name)
    }

    /// Set an attribute; `id` and `class` update the reflected fields.
    pub fn set_attribute(&self, name: &str, value: &str) {
        let mut nodes = self.shared.nodes.borrow_mut();
        let data = &mut nodes[self.index];
        match name {
            "id" => data.id = Some(value.to_string()),
            "class" => data.classes = value.split_whitespace().map(str::to_string).collect(),
            _ => {
                if let Some(entry) = data.attributes.iter_mut().find(|(key, _)| key == name) {
                    entry.1 = value.to_string();
                } else {
                    data.attributes.push((name.to_string(), value.to_string()));
                }
            }
        }
    }

    /// Remove an attribute other than `id` and `class`.
    pub fn remove_attribute(&self, name: &str) {
        self.shared.nodes.borrow_mut()[self.index]
            .attributes
            .retain(|(key, _)| key != name);
    }

    /// Whether the class list contains `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.shared.nodes.borrow()[self.index]
            .classes
            .iter()
            .any(|existing| existing == class)
    }

    /// Add a class when absent.
    pub fn add_class(&self, class: &str) {
        if !self.has_class(class) {
            self.shared.nodes.borrow_mut()[self.index]
                .classes
                .push(class.to_string());
        }
    }
}

impl HostNode for FakeNode {
    fn matches(&self, selector: &str) -> bool {
        let Some(list) = parse_selector_list(selector) else {
            return false;
        };
        let nodes = self.shared.nodes.borrow();
        list.iter()
            .any(|complex| matches_complex(&nodes, self.index, complex, complex.len() - 1))
    }

    fn parent_element(&self) -> Option<Self> {
        let parent = self.shared.nodes.borrow()[self.index].parent?;
        Some(Self {
            index: parent,
            shared: Rc::clone(&self.shared),
        })
    }
}

struct EventData {
    event_type: String,
    target: Option<FakeNode>,
    detail: Value,
    default_prevented: Cell<bool>,
    passive_phase: Cell<bool>,
}

/// Event handle delivered by a [`FakeHost`].
#[derive(Clone)]
pub struct FakeEvent {
    inner: Rc<EventData>,
}

impl fmt::Debug for FakeEvent {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FakeEvent")
            .field("event_type", &self.inner.event_type)
            .field("target", &self.inner.target)
            .field("detail", &self.inner.detail)
            .finish_non_exhaustive()
    }
}

impl FakeEvent {
    /// Build an event for [`FakeHost::fire_event`].
    #[must_use]
    pub fn new(event_type: &str, target: Option<FakeNode>, detail: Value) -> Self {
        Self {
            inner: Rc::new(EventData {
                event_type: event_type.to_string(),
                target,
                detail,
                default_prevented: Cell::new(false),
                passive_phase: Cell::new(false),
            }),
        }
    }

    /// Detail payload.
    #[must_use]
    pub fn detail(&self) -> &Value {
        &self.inner.detail
    }
}

impl HostEvent for FakeEvent {
    type Node = FakeNode;

    fn event_type(&self) -> String {
        self.inner.event_type.clone()
    }

    fn target(&self) -> Option<FakeNode> {
        self.inner.target.clone()
    }

    fn prevent_default(&self) {
        // Passive listeners cannot cancel.
        if !self.inner.passive_phase.get() {
            self.inner.default_prevented.set(true);
        }
    }

    fn default_prevented(&self) -> bool {
        self.inner.default_prevented.get()
    }

    fn key(&self) -> Option<String> {
        self.inner
            .detail
            .get("key")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn has_modifier(&self) -> bool {
        ["ctrlKey", "metaKey"]
            .iter()
            .any(|flag| self.inner.detail.get(*flag).and_then(Value::as_bool) == Some(true))
    }
}

fn parse_description(description: &str) -> NodeData {
    let mut data = NodeData {
        tag: String::new(),
        id: None,
        classes: Vec::new(),
        attributes: Vec::new(),
        parent: None,
    };
    let mut current = String::new();
    let mut mode = '\0';
    for ch in description.chars().chain(std::iter::once('.')) {
        if ch == '#' || ch == '.' {
            match mode {
                '#' => data.id = Some(std::mem::take(&mut current)),
                '.' if !current.is_empty() => data.classes.push(std::mem::take(&mut current)),
                '\0' => data.tag = std::mem::take(&mut current).to_ascii_lowercase(),
                _ => current.clear(),
            }
            mode = ch;
        } else {
            current.push(ch);
        }
    }
    if data.tag.is_empty() {
        data.tag = "div".to_string();
    }
    data
}

fn attribute_of(data: &NodeData, name: &str) -> Option<String> {
    match name {
        "id" => data.id.clone(),
        "class" if !data.classes.is_empty() => Some(data.classes.join(" ")),
        _ => data
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone)]
enum AttrOp {
    Exists,
    Equals(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
}

#[derive(Debug, Clone, Default)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<(String, AttrOp)>,
    negations: Vec<Compound>,
}

type Complex = Vec<(Combinator, Compound)>;

fn parse_selector_list(input: &str) -> Option<Vec<Complex>> {
    let mut list = Vec::new();
    let mut depth = 0_i32;
    let mut start = 0;
    for (position, ch) in input.char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ',' if depth == 0 => {
                list.push(parse_complex(&input[start..position])?);
                start = position + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    list.push(parse_complex(&input[start..])?);
    Some(list)
}

fn parse_complex(input: &str) -> Option<Complex> {
    let chars: Vec<char> = input.trim().chars().collect();
    let mut parts = Vec::new();
    let mut position = 0;
    let mut combinator = Combinator::Descendant;
    while position < chars.len() {
        match chars[position] {
            ch if ch.is_whitespace() => position += 1,
            '>' => {
                if parts.is_empty() {
                    return None;
                }
                combinator = Combinator::Child;
                position += 1;
            }
            _ => {
                let compound = parse_compound(&chars, &mut position)?;
                parts.push((combinator, compound));
                combinator = Combinator::Descendant;
            }
        }
    }
    if parts.is_empty() || combinator == Combinator::Child {
        return None;
    }
    Some(parts)
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

fn read_ident(chars: &[char], position: &mut usize) -> Option<String> {
    let start = *position;
    while *position < chars.len() && is_ident_char(chars[*position]) {
        *position += 1;
    }
    (*position > start).then(|| chars[start..*position].iter().collect())
}

fn parse_compound(chars: &[char], position: &mut usize) -> Option<Compound> {
    let mut compound = Compound::default();
    let start = *position;
    if chars[*position] == '*' {
        *position += 1;
    } else if is_ident_char(chars[*position]) {
        compound.tag = Some(read_ident(chars, position)?.to_ascii_lowercase());
    }
    while *position < chars.len() {
        match chars[*position] {
            '#' => {
                *position += 1;
                compound.ids.push(read_ident(chars, position)?);
            }
            '.' => {
                *position += 1;
                compound.classes.push(read_ident(chars, position)?);
            }
            '[' => {
                let close = chars[*position..].iter().position(|ch| *ch == ']')? + *position;
                let body: String = chars[*position + 1..close].iter().collect();
                compound.attrs.push(parse_attribute(&body)?);
                *position = close + 1;
            }
            ':' => {
                let rest: String = chars[*position..].iter().collect();
                if !rest.starts_with(":not(") {
                    return None;
                }
                *position += ":not(".len();
                let close = chars[*position..].iter().position(|ch| *ch == ')')? + *position;
                let inner: Vec<char> = chars[*position..close]
                    .iter()
                    .collect::<String>()
                    .trim()
                    .chars()
                    .collect();
                if inner.is_empty() {
                    return None;
                }
                let mut inner_position = 0;
                let negated = parse_compound(&inner, &mut inner_position)?;
                if inner_position != inner.len() {
                    return None;
                }
                compound.negations.push(negated);
                *position = close + 1;
            }
            _ => break,
        }
    }
    (*position > start).then_some(compound)
}

fn parse_attribute(body: &str) -> Option<(String, AttrOp)> {
    let body = body.trim();
    let split = body.find(['=', '^', '*', '$']);
    let Some(split) = split else {
        return valid_name(body).then(|| (body.to_string(), AttrOp::Exists));
    };
    let name = body[..split].trim();
    let (operator, value) = body[split..].split_once('=')?;
    let value = value.trim().trim_matches(|ch| ch == '"' || ch == '\'').to_string();
    if !valid_name(name) {
        return None;
    }
    let op = match operator {
        "" => AttrOp::Equals(value),
        "^" => AttrOp::Prefix(value),
        "$" => AttrOp::Suffix(value),
        "*" => AttrOp::Contains(value),
        _ => return None,
    };
    Some((name.to_string(), op))
}

fn valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_ident_char)
}

fn matches_compound(data: &NodeData, compound: &Compound) -> bool {
    if compound
        .tag
        .as_ref()
        .is_some_and(|tag| *tag != data.tag)
    {
        return false;
    }
    if !compound
        .ids
        .iter()
        .all(|id| data.id.as_deref() == Some(id.as_str()))
    {
        return false;
    }
    if !compound
        .classes
        .iter()
        .all(|class| data.classes.contains(class))
    {
        return false;
    }
    let attrs_match = compound.attrs.iter().all(|(name, op)| {
        let Some(actual) = attribute_of(data, name) else {
            return false;
        };
        match op {
            AttrOp::Exists => true,
            AttrOp::Equals(expected) => actual == *expected,
            AttrOp::Prefix(expected) => actual.starts_with(expected.as_str()),
            AttrOp::Suffix(expected) => actual.ends_with(expected.as_str()),
            AttrOp::Contains(expected) => actual.contains(expected.as_str()),
        }
    });
    attrs_match
        && !compound
            .negations
            .iter()
            .any(|negated| matches_compound(data, negated))
}

fn matches_complex(nodes: &[NodeData], index: usize, complex: &Complex, part: usize) -> bool {
    let (combinator, compound) = &complex[part];
    if !matches_compound(&nodes[index], compound) {
        return false;
    }
    if part == 0 {
        return true;
    }
    match combinator {
        Combinator::Child => nodes[index]
            .parent
            .is_some_and(|parent| matches_complex(nodes, parent, complex, part - 1)),
        Combinator::Descendant => {
            let mut ancestor = nodes[index].parent;
            while let Some(current) = ancestor {
                if matches_complex(nodes, current, complex, part - 1) {
                    return true;
                }
                ancestor = nodes[current].parent;
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_matching_covers_widget_selectors() {
        let host = FakeHost::new();
        let list = host.append(&host.body(), "div.faq-list");
        let item = host.append(&list, "details.faq-item");
        item.set_attribute("data-accordion", "");
        let link = host.append(&item, "a.nav");
        link.set_attribute("href", "#prices");
        let opted_out = host.append(&item, "a");
        opted_out.set_attribute("href", "#top");
        opted_out.set_attribute("data-no-smooth", "");

        assert!(item.matches(".faq-item, details[data-accordion]"));
        assert!(item.matches("details[data-accordion]"));
        assert!(link.matches("a[href^=\"#\"]:not([data-no-smooth])"));
        assert!(!opted_out.matches("a[href^=\"#\"]:not([data-no-smooth])"));
        assert!(link.matches(".faq-list a"));
        assert!(link.matches("details > a"));
        assert!(!link.matches(".faq-list > a"));
        assert!(link.matches("*[href*=pri]"));
        assert!(link.matches("[href$='ces']"));
        assert!(!link.matches("button"));
    }

    #[test]
    fn invalid_selectors_are_rejected() {
        let host = FakeHost::new();
        for selector in ["", "[", "a >", "a:hover", ":not()", "a[=x]"] {
            assert!(!host.validate_selector(selector), "{selector:?}");
        }
        assert!(host.validate_selector("input[name=\"price-view\"], .price-toggle-input"));
    }

    #[test]
    fn descriptions_build_tag_id_and_classes() {
        let host = FakeHost::new();
        let node = host.append(&host.body(), "input#v-pen.price-toggle-input.big");
        assert_eq!(node.tag(), "input");
        assert_eq!(node.id().as_deref(), Some("v-pen"));
        assert!(node.has_class("big"));
        assert_eq!(node.attribute("class").as_deref(), Some("price-toggle-input big"));
        let plain = host.append(&host.body(), ".row");
        assert_eq!(plain.tag(), "div");
        assert_eq!(format!("{plain:?}"), "<div.row>");
    }

    #[test]
    fn events_travel_capture_target_bubble() {
        let host = FakeHost::new();
        let child = host.append(&host.body(), "button");
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut guards = Vec::new();
        for (label, target, capture) in [
            ("doc-bubble", Target::Document, false),
            ("doc-capture", Target::Document, true),
            ("target", Target::Node(child.clone()), false),
            ("window-bubble", Target::Window, false),
        ] {
            let order = Rc::clone(&order);
            guards.push(host.listen(
                &target,
                "click",
                ListenOptions {
                    capture,
                    passive: false,
                },
                Box::new(move |_| order.borrow_mut().push(label)),
            ));
        }
        host.fire(&child, "click");
        assert_eq!(
            *order.borrow(),
            vec!["doc-capture", "target", "doc-bubble", "window-bubble"]
        );
        drop(guards);
        assert_eq!(host.active_listeners(), 0);
    }

    #[test]
    fn passive_listeners_cannot_cancel() {
        let host = FakeHost::new();
        let _guard = host.listen(
            &Target::Document,
            "wheel",
            ListenOptions {
                capture: false,
                passive: true,
            },
            Box::new(|event: &FakeEvent| event.prevent_default()),
        );
        let event = host.fire(&host.body(), "wheel");
        assert!(!event.default_prevented());
    }

    #[test]
    fn timers_fire_in_due_order() {
        let host = FakeHost::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (delay, label) in [(30, "late"), (10, "early"), (10, "early-second")] {
            let log = Rc::clone(&log);
            host.set_timeout(delay, Box::new(move || log.borrow_mut().push(label)));
        }
        host.advance(15.0);
        assert_eq!(*log.borrow(), vec!["early", "early-second"]);
        assert_eq!(host.pending_timers(), 1);
        host.advance(15.0);
        assert_eq!(*log.borrow(), vec!["early", "early-second", "late"]);
        assert!((host.now() - 30.0).abs() < f64::EPSILON);
    }
}
