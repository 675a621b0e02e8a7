//! Accordion/FAQ open state and keyboard model.
//!
//! # Design
//! - One component covers both `<details>` accordions and `.faq-item` blocks.
//! - Transitions return the ordered list of changes so the caller can
//!   project them and announce `closing`/`opening` exactly once each.
//! - In single mode, opening an item first closes every other open item.
//! - [`AccordionController`] owns the delegated wiring and event emission;
//!   the page supplies an [`AccordionView`] that does the DOM work.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use serde_json::json;
use vaccine_config::AccordionConfig;
use vaccine_events::{EventManager, Host, HostEvent};

use crate::error::WidgetResult;
use crate::lifecycle::Component;
use crate::registrations::Registrations;

/// Component slug used in logs.
pub const COMPONENT: &str = "accordion";

/// An item is about to open.
pub const OPENING: &str = "opening";
/// An item is about to close.
pub const CLOSING: &str = "closing";
/// An item finished changing state.
pub const TOGGLED: &str = "toggled";

/// How long the screen-reader announcement stays in the DOM.
pub const ANNOUNCEMENT_MS: u32 = 1_000;

/// One accordion/FAQ entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccordionItem {
    /// Element key (`id` or generated).
    pub key: String,
    /// Header text, used in announcements.
    pub question: String,
    /// Whether the item is expanded.
    pub open: bool,
}

impl AccordionItem {
    /// Closed item.
    #[must_use]
    pub fn new(key: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            question: question.into(),
            open: false,
        }
    }
}

/// A state change to project, by item index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccordionChange {
    /// The item at this index opens.
    Opening(usize),
    /// The item at this index closes.
    Closing(usize),
}

impl AccordionChange {
    /// Item index.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Opening(index) | Self::Closing(index) => index,
        }
    }

    /// Lifecycle step name.
    #[must_use]
    pub const fn step(self) -> &'static str {
        match self {
            Self::Opening(_) => OPENING,
            Self::Closing(_) => CLOSING,
        }
    }

    /// Whether the item ends up open.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Opening(_))
    }
}

/// Keyboard outcome on a focused header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccordionKeyAction {
    /// Move focus to the header at this index.
    Focus(usize),
    /// Toggle the item at this index.
    Toggle(usize),
    /// Close the item at this index and focus its header.
    CloseAndFocus(usize),
}

/// Open/closed state for every accordion on the page.
#[derive(Clone, Debug)]
pub struct AccordionState {
    items: Vec<AccordionItem>,
    single: bool,
    keyboard: bool,
}

impl AccordionState {
    /// Track `items` with the behaviour flags from `config`.
    #[must_use]
    pub fn new(config: &AccordionConfig, items: Vec<AccordionItem>) -> Self {
        Self {
            items,
            single: config.single,
            keyboard: config.keyboard_navigation,
        }
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no items were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at `index`.
    #[must_use]
    pub fn item(&self, index: usize) -> Option<&AccordionItem> {
        self.items.get(index)
    }

    /// Index of the item with `key`.
    #[must_use]
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.items.iter().position(|item| item.key == key)
    }

    /// Whether the item at `index` is open.
    #[must_use]
    pub fn is_open(&self, index: usize) -> bool {
        self.items.get(index).is_some_and(|item| item.open)
    }

    /// Indices of open items.
    #[must_use]
    pub fn open_indices(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| item.open.then_some(index))
            .collect()
    }

    /// Open an item; in single mode the others close first.
    pub fn open(&mut self, index: usize) -> Vec<AccordionChange> {
        if index >= self.items.len() || self.items[index].open {
            return Vec::new();
        }
        let mut changes = Vec::new();
        if self.single {
            for (other, item) in self.items.iter_mut().enumerate() {
                if other != index && item.open {
                    item.open = false;
                    changes.push(AccordionChange::Closing(other));
                }
            }
        }
        self.items[index].open = true;
        changes.push(AccordionChange::Opening(index));
        changes
    }

    /// Close an item.
    pub fn close(&mut self, index: usize) -> Vec<AccordionChange> {
        match self.items.get_mut(index) {
            Some(item) if item.open => {
                item.open = false;
                vec![AccordionChange::Closing(index)]
            }
            _ => Vec::new(),
        }
    }

    /// Flip an item.
    pub fn toggle(&mut self, index: usize) -> Vec<AccordionChange> {
        if self.is_open(index) {
            self.close(index)
        } else {
            self.open(index)
        }
    }

    /// Close every open item.
    pub fn close_all(&mut self) -> Vec<AccordionChange> {
        self.items
            .iter_mut()
            .enumerate()
            .filter(|(_, item)| item.open)
            .map(|(index, item)| {
                item.open = false;
                AccordionChange::Closing(index)
            })
            .collect()
    }

    /// Record a state the browser changed on its own (native `<details>`
    /// toggle). Returns nothing when it matches what we tracked; an opening
    /// in single mode also closes the other items.
    pub fn sync(&mut self, index: usize, open: bool) -> Vec<AccordionChange> {
        if self.items.get(index).is_none_or(|item| item.open == open) {
            return Vec::new();
        }
        if open {
            self.open(index)
        } else {
            self.close(index)
        }
    }

    /// Screen-reader text for the item's current state.
    #[must_use]
    pub fn announcement(&self, index: usize) -> Option<String> {
        let item = self.items.get(index)?;
        let state = if item.open { "expanded" } else { "collapsed" };
        Some(format!("{} {state}", item.question))
    }

    /// Interpret `key` pressed on the header at `focused`.
    #[must_use]
    pub fn key_action(&self, focused: usize, key: &str) -> Option<AccordionKeyAction> {
        let count = self.items.len();
        if focused >= count {
            return None;
        }
        match key {
            "Enter" | " " | "Spacebar" => Some(AccordionKeyAction::Toggle(focused)),
            _ if !self.keyboard => None,
            "ArrowDown" => Some(AccordionKeyAction::Focus((focused + 1) % count)),
            "ArrowUp" => Some(AccordionKeyAction::Focus((focused + count - 1) % count)),
            "Home" => Some(AccordionKeyAction::Focus(0)),
            "End" => Some(AccordionKeyAction::Focus(count - 1)),
            "Escape" => {
                let target = if self.is_open(focused) {
                    Some(focused)
                } else {
                    self.open_indices().first().copied()
                };
                target.map(AccordionKeyAction::CloseAndFocus)
            }
            _ => None,
        }
    }
}

/// Page surface an [`AccordionController`] projects onto.
pub trait AccordionView<N> {
    /// Item whose header is `header`.
    fn header_index(&self, header: &N) -> Option<usize>;

    /// Item whose container is `container`.
    fn container_index(&self, container: &N) -> Option<usize>;

    /// Open state the element reports on its own (`<details open>`), `None`
    /// for items without native state.
    fn native_open(&self, index: usize) -> Option<bool>;

    /// Reflect the item's open state.
    fn render(&self, index: usize, open: bool);

    /// Move focus to the item's header.
    fn focus_header(&self, index: usize);

    /// Speak `message` to screen readers.
    fn announce(&self, message: &str);
}

/// Accordion state bound to an event manager and a page view.
pub struct AccordionController<H: Host, V> {
    state: RefCell<AccordionState>,
    view: V,
    manager: EventManager<H>,
    announce: bool,
}

impl<H, V> AccordionController<H, V>
where
    H: Host,
    V: AccordionView<H::Node> + 'static,
{
    /// Track `items` and project them through `view`.
    pub fn new(
        manager: &EventManager<H>,
        config: &AccordionConfig,
        items: Vec<AccordionItem>,
        view: V,
    ) -> Self {
        Self {
            state: RefCell::new(AccordionState::new(config, items)),
            view,
            manager: manager.clone(),
            announce: config.announce_changes,
        }
    }

    /// Current state.
    pub fn state(&self) -> Ref<'_, AccordionState> {
        self.state.borrow()
    }

    /// Page view.
    pub const fn view(&self) -> &V {
        &self.view
    }

    /// Render every item from the tracked state.
    pub fn render_all(&self) {
        let open: Vec<bool> = {
            let state = self.state.borrow();
            (0..state.len()).map(|index| state.is_open(index)).collect()
        };
        for (index, open) in open.into_iter().enumerate() {
            self.view.render(index, open);
        }
    }

    /// Open the item at `index`.
    pub fn open(&self, index: usize) {
        let changes = self.state.borrow_mut().open(index);
        self.commit(&changes, Some(index));
    }

    /// Close the item at `index`.
    pub fn close(&self, index: usize) {
        let changes = self.state.borrow_mut().close(index);
        self.commit(&changes, Some(index));
    }

    /// Flip the item at `index`.
    pub fn toggle(&self, index: usize) {
        let changes = self.state.borrow_mut().toggle(index);
        self.commit(&changes, Some(index));
    }

    /// Close every open item. Returns how many closed.
    pub fn close_all(&self) -> usize {
        let changes = self.state.borrow_mut().close_all();
        self.commit(&changes, None);
        changes.len()
    }

    /// Adopt the state the browser toggled natively.
    pub fn native_toggle(&self, index: usize) {
        let Some(open) = self.view.native_open(index) else {
            return;
        };
        let changes = self.state.borrow_mut().sync(index, open);
        self.commit(&changes, Some(index));
    }

    fn emit(&self, step: &str, detail: &serde_json::Value) {
        self.manager.emit(&Component::Accordion.event(step), detail, None);
    }

    fn commit(&self, changes: &[AccordionChange], primary: Option<usize>) {
        if changes.is_empty() {
            return;
        }
        for change in changes {
            let index = change.index();
            self.view.render(index, change.is_open());
            let (key, question) = self
                .state
                .borrow()
                .item(index)
                .map(|item| (item.key.clone(), item.question.clone()))
                .unwrap_or_default();
            self.emit(
                change.step(),
                &json!({ "id": key, "question": question, "isOpen": change.is_open() }),
            );
        }
        let finished: Vec<usize> = match primary {
            Some(index) => vec![index],
            None => changes.iter().map(|change| change.index()).collect(),
        };
        for index in finished {
            let (key, open) = {
                let state = self.state.borrow();
                (
                    state.item(index).map(|item| item.key.clone()).unwrap_or_default(),
                    state.is_open(index),
                )
            };
            self.emit(TOGGLED, &json!({ "id": key, "isOpen": open }));
        }
        if self.announce {
            let message = primary.and_then(|index| self.state.borrow().announcement(index));
            if let Some(message) = message {
                self.view.announce(&message);
            }
        }
    }

    fn key_pressed(&self, index: usize, event: &H::Event) {
        let Some(key) = event.key() else {
            return;
        };
        let action = self.state.borrow().key_action(index, &key);
        match action {
            Some(AccordionKeyAction::Toggle(target)) => {
                event.prevent_default();
                self.toggle(target);
            }
            Some(AccordionKeyAction::Focus(target)) => {
                event.prevent_default();
                self.view.focus_header(target);
            }
            Some(AccordionKeyAction::CloseAndFocus(target)) => {
                event.prevent_default();
                self.close(target);
                self.view.focus_header(target);
            }
            None => {}
        }
    }

    /// Register header clicks and keys, native `toggle` events and Escape
    /// inside an item's content.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WidgetError::Events`] when a registration is refused.
    pub fn bind(
        self: &Rc<Self>,
        config: &AccordionConfig,
        registrations: &mut Registrations<H>,
    ) -> WidgetResult<()> {
        let manager = registrations.manager().clone();

        let clicks = Rc::clone(self);
        registrations.keep(manager.delegate(&config.header_selector, "click", move |delegated| {
            if let Some(index) = clicks.view.header_index(delegated.delegate_target) {
                delegated.event.prevent_default();
                clicks.toggle(index);
            }
            Ok(())
        }))?;

        let keys = Rc::clone(self);
        registrations.keep(manager.delegate(&config.header_selector, "keydown", move |delegated| {
            if let Some(index) = keys.view.header_index(delegated.delegate_target) {
                keys.key_pressed(index, delegated.event);
            }
            Ok(())
        }))?;

        let toggles = Rc::clone(self);
        registrations.keep(manager.delegate(&config.selector, "toggle", move |delegated| {
            if let Some(index) = toggles.view.container_index(delegated.delegate_target) {
                toggles.native_toggle(index);
            }
            Ok(())
        }))?;

        if config.keyboard_navigation {
            let escapes = Rc::clone(self);
            registrations.keep(manager.delegate(&config.selector, "keydown", move |delegated| {
                let escape = delegated.event.key().as_deref() == Some("Escape");
                if escape
                    && !delegated.event.default_prevented()
                    && escapes.view.container_index(delegated.delegate_target).is_some()
                    && escapes.close_all() > 0
                {
                    delegated.event.prevent_default();
                }
                Ok(())
            }))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(single: bool) -> AccordionState {
        let config = AccordionConfig {
            single,
            ..AccordionConfig::default()
        };
        AccordionState::new(
            &config,
            vec![
                AccordionItem::new("faq-a", "Vem kan vaccinera sig?"),
                AccordionItem::new("faq-b", "Vad kostar det?"),
                AccordionItem::new("accordion-0", "Behöver jag boka tid?"),
            ],
        )
    }

    #[test]
    fn single_mode_closes_the_previous_item_once() {
        let mut accordion = state(true);
        assert_eq!(accordion.open(0), vec![AccordionChange::Opening(0)]);

        let changes = accordion.open(1);
        assert_eq!(
            changes,
            vec![AccordionChange::Closing(0), AccordionChange::Opening(1)]
        );
        let steps: Vec<_> = changes.iter().map(|change| change.step()).collect();
        assert_eq!(steps, vec![CLOSING, OPENING]);
        assert!(!accordion.is_open(0));
        assert!(accordion.is_open(1));
    }

    #[test]
    fn independent_mode_keeps_siblings_open() {
        let mut accordion = state(false);
        accordion.open(0);
        assert_eq!(accordion.open(2), vec![AccordionChange::Opening(2)]);
        assert_eq!(accordion.open_indices(), vec![0, 2]);
        assert!(accordion.open(2).is_empty());
        assert_eq!(
            accordion.close_all(),
            vec![AccordionChange::Closing(0), AccordionChange::Closing(2)]
        );
        assert!(accordion.toggle(5).is_empty());
    }

    #[test]
    fn native_toggles_are_synced_once() {
        let mut accordion = state(false);
        assert_eq!(accordion.sync(1, true), vec![AccordionChange::Opening(1)]);
        assert!(accordion.sync(1, true).is_empty());
        assert!(accordion.sync(7, true).is_empty());
        assert_eq!(
            accordion.announcement(1).as_deref(),
            Some("Vad kostar det? expanded")
        );
        assert_eq!(accordion.index_of("accordion-0"), Some(2));
    }

    #[test]
    fn native_open_in_single_mode_closes_siblings() {
        let mut accordion = state(true);
        accordion.open(0);
        assert_eq!(
            accordion.sync(2, true),
            vec![AccordionChange::Closing(0), AccordionChange::Opening(2)]
        );
        assert_eq!(accordion.sync(2, false), vec![AccordionChange::Closing(2)]);
    }

    #[test]
    fn keyboard_navigation_cycles_and_escape_closes() {
        let mut accordion = state(false);
        assert_eq!(accordion.key_action(2, "ArrowDown"), Some(AccordionKeyAction::Focus(0)));
        assert_eq!(accordion.key_action(0, "ArrowUp"), Some(AccordionKeyAction::Focus(2)));
        assert_eq!(accordion.key_action(1, "Home"), Some(AccordionKeyAction::Focus(0)));
        assert_eq!(accordion.key_action(1, "End"), Some(AccordionKeyAction::Focus(2)));
        assert_eq!(accordion.key_action(1, " "), Some(AccordionKeyAction::Toggle(1)));
        assert_eq!(accordion.key_action(1, "Escape"), None);

        accordion.open(2);
        assert_eq!(
            accordion.key_action(0, "Escape"),
            Some(AccordionKeyAction::CloseAndFocus(2))
        );
        assert_eq!(accordion.key_action(0, "Tab"), None);
    }

    #[test]
    fn keyboard_navigation_can_be_disabled() {
        let config = AccordionConfig {
            keyboard_navigation: false,
            ..AccordionConfig::default()
        };
        let accordion = AccordionState::new(&config, vec![AccordionItem::new("a", "A")]);
        assert_eq!(accordion.key_action(0, "ArrowDown"), None);
        assert_eq!(accordion.key_action(0, "Enter"), Some(AccordionKeyAction::Toggle(0)));
    }
}
