//! Price tier selection for the vaccination price table.
//!
//! # Design
//! - Each radio toggle maps to a [`PriceTier`] through an ordered fallback
//!   chain: known ids, `data-price-type`, `value`, id substrings, ordinary.
//! - The selected tier drives a `price-view-<tier>` body class; the web
//!   layer can additionally hide columns directly when styling is missing.
//! - A page without a price table or without an ordinary toggle cannot use
//!   the widget and reports a typed error.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use serde_json::json;
use vaccine_config::PriceToggleConfig;
use vaccine_events::{EventManager, Host, HostEvent};

use crate::error::{PRICE_TABLE_MISSING, TOGGLES_MISSING, WidgetError, WidgetResult};
use crate::lifecycle::Component;
use crate::registrations::Registrations;

/// Component slug used in logs and errors.
pub const COMPONENT: &str = "price-toggle";

/// The selected tier changed.
pub const CHANGED: &str = "changed";

/// Labels the widget made keyboard-operable.
pub const ENHANCED_LABEL_SELECTOR: &str = "label[data-enhanced]";

/// Prefix shared by the body classes this widget owns.
pub const VIEW_CLASS_PREFIX: &str = "price-view-";

/// Price columns offered on the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PriceTier {
    /// Full price.
    Ordinary,
    /// Pensioner discount.
    Pensioner,
    /// Student discount.
    Student,
}

impl PriceTier {
    /// Every tier in column order.
    pub const ALL: [Self; 3] = [Self::Ordinary, Self::Pensioner, Self::Student];

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ordinary => "ordinary",
            Self::Pensioner => "pensioner",
            Self::Student => "student",
        }
    }

    /// Parse a wire name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str() == value.trim())
    }

    /// 1-based table column holding this tier's prices.
    #[must_use]
    pub const fn column(self) -> usize {
        match self {
            Self::Ordinary => 2,
            Self::Pensioner => 3,
            Self::Student => 4,
        }
    }

    /// Swedish heading for the tier.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ordinary => "Ordinarie priser",
            Self::Pensioner => "Pensionärspriser (10% rabatt)",
            Self::Student => "Studentpriser (15% rabatt)",
        }
    }

    /// Body class selecting this tier.
    #[must_use]
    pub fn body_class(self) -> String {
        format!("{VIEW_CLASS_PREFIX}{}", self.as_str())
    }

    /// Table caption text.
    #[must_use]
    pub fn caption(self) -> String {
        format!("Prislista - {}", self.label())
    }

    /// Table `aria-label`.
    #[must_use]
    pub fn aria_label(self) -> String {
        format!("Vaccinationspriser för {}", self.label())
    }

    /// Screen-reader suffix appended to a toggle label.
    #[must_use]
    pub fn label_suffix(self) -> String {
        format!(" ({} prices)", self.as_str())
    }
}

/// Map a toggle to its tier.
#[must_use]
pub fn extract_price_type(id: &str, data_price_type: Option<&str>, value: Option<&str>) -> PriceTier {
    let known = match id {
        "v-ord" | "price-ordinary" => Some(PriceTier::Ordinary),
        "v-pen" | "price-pensioner" => Some(PriceTier::Pensioner),
        "v-stu" | "price-student" => Some(PriceTier::Student),
        _ => None,
    };
    known
        .or_else(|| data_price_type.and_then(PriceTier::parse))
        .or_else(|| value.and_then(PriceTier::parse))
        .or_else(|| {
            [
                ("ord", PriceTier::Ordinary),
                ("pen", PriceTier::Pensioner),
                ("stu", PriceTier::Student),
            ]
            .into_iter()
            .find_map(|(needle, tier)| id.contains(needle).then_some(tier))
        })
        .unwrap_or(PriceTier::Ordinary)
}

/// Whether a body class belongs to this widget.
#[must_use]
pub fn is_view_class(class: &str) -> bool {
    class.starts_with(VIEW_CLASS_PREFIX)
}

/// Whether a 1-based column stays visible when hiding columns directly.
#[must_use]
pub fn column_visible(column: usize, tier: PriceTier) -> bool {
    column < 2 || column == tier.column()
}

/// Spoken after a switch.
#[must_use]
pub fn announcement(label_text: &str) -> String {
    format!("Pristabell bytt till {}", label_text.trim())
}

/// Radio toggle found on the page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToggleDescriptor {
    /// Element id; toggles without one are skipped.
    pub id: String,
    /// `data-price-type`.
    pub data_price_type: Option<String>,
    /// `value`.
    pub value: Option<String>,
    /// Whether the input is checked.
    pub checked: bool,
    /// Whether a `label[for=id]` exists.
    pub has_label: bool,
}

/// Usable toggle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceToggleEntry {
    /// Element id.
    pub id: String,
    /// Tier it selects.
    pub tier: PriceTier,
}

/// A tier switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewChange {
    /// Tier before the switch.
    pub previous: PriceTier,
    /// Tier after the switch.
    pub current: PriceTier,
}

/// Keyboard outcome on a focused toggle label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelKeyAction {
    /// Check the toggle at this index.
    Select(usize),
    /// Focus the label at this index.
    Focus(usize),
}

/// Selected tier and the toggles that can change it.
#[derive(Clone, Debug)]
pub struct PriceToggle {
    toggles: Vec<PriceToggleEntry>,
    current: PriceTier,
    keyboard: bool,
}

impl PriceToggle {
    /// Validate the page and pick the initial tier: the first checked
    /// toggle, else the ordinary toggle.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::MissingElement`] with
    /// [`PRICE_TABLE_MISSING`] when no table was found, and
    /// [`TOGGLES_MISSING`] when no usable ordinary toggle exists.
    pub fn new(
        config: &PriceToggleConfig,
        table_found: bool,
        descriptors: &[ToggleDescriptor],
    ) -> WidgetResult<Self> {
        if !table_found {
            return Err(WidgetError::MissingElement {
                component: COMPONENT,
                code: PRICE_TABLE_MISSING,
                selector: config.table_selector.clone(),
            });
        }
        let mut checked = None;
        let mut toggles = Vec::new();
        for descriptor in descriptors {
            if descriptor.id.trim().is_empty() || !descriptor.has_label {
                tracing::warn!(
                    component = COMPONENT,
                    id = %descriptor.id,
                    "price toggle missing id or label"
                );
                continue;
            }
            let tier = extract_price_type(
                &descriptor.id,
                descriptor.data_price_type.as_deref(),
                descriptor.value.as_deref(),
            );
            if descriptor.checked && checked.is_none() {
                checked = Some(tier);
            }
            toggles.push(PriceToggleEntry {
                id: descriptor.id.clone(),
                tier,
            });
        }
        if !toggles.iter().any(|toggle| toggle.tier == PriceTier::Ordinary) {
            return Err(WidgetError::MissingElement {
                component: COMPONENT,
                code: TOGGLES_MISSING,
                selector: config.selector.clone(),
            });
        }
        let default_view = PriceTier::parse(&config.default_view)
            .filter(|tier| toggles.iter().any(|toggle| toggle.tier == *tier))
            .unwrap_or(PriceTier::Ordinary);
        Ok(Self {
            toggles,
            current: checked.unwrap_or(default_view),
            keyboard: config.keyboard_navigation,
        })
    }

    /// Selected tier.
    #[must_use]
    pub const fn current_view(&self) -> PriceTier {
        self.current
    }

    /// Tiers with at least one toggle, in column order.
    #[must_use]
    pub fn available_views(&self) -> Vec<PriceTier> {
        PriceTier::ALL
            .into_iter()
            .filter(|tier| self.toggles.iter().any(|toggle| toggle.tier == *tier))
            .collect()
    }

    /// Usable toggles in document order.
    #[must_use]
    pub fn toggles(&self) -> &[PriceToggleEntry] {
        &self.toggles
    }

    /// Tier selected by the toggle `id`.
    #[must_use]
    pub fn tier_for(&self, id: &str) -> Option<PriceTier> {
        self.toggles
            .iter()
            .find(|toggle| toggle.id == id)
            .map(|toggle| toggle.tier)
    }

    /// Id of the toggle that should be checked.
    #[must_use]
    pub fn selected_id(&self) -> Option<&str> {
        self.toggles
            .iter()
            .find(|toggle| toggle.tier == self.current)
            .map(|toggle| toggle.id.as_str())
    }

    /// Switch to `tier`. `None` when unchanged or not offered.
    pub fn switch_to(&mut self, tier: PriceTier) -> Option<ViewChange> {
        if tier == self.current || !self.available_views().contains(&tier) {
            return None;
        }
        let change = ViewChange {
            previous: self.current,
            current: tier,
        };
        self.current = tier;
        tracing::debug!(component = COMPONENT, view = tier.as_str(), "price view changed");
        Some(change)
    }

    /// Switch to the tier of toggle `id`.
    pub fn select_toggle(&mut self, id: &str) -> Option<ViewChange> {
        self.tier_for(id).and_then(|tier| self.switch_to(tier))
    }

    /// Interpret `key` on the label of the toggle at `focused`.
    #[must_use]
    pub fn key_action(&self, focused: usize, key: &str) -> Option<LabelKeyAction> {
        let count = self.toggles.len();
        if focused >= count {
            return None;
        }
        match key {
            "Enter" | " " | "Spacebar" => Some(LabelKeyAction::Select(focused)),
            _ if !self.keyboard => None,
            "ArrowLeft" | "ArrowUp" => Some(LabelKeyAction::Focus((focused + count - 1) % count)),
            "ArrowRight" | "ArrowDown" => Some(LabelKeyAction::Focus((focused + 1) % count)),
            _ => None,
        }
    }
}

/// Page surface a [`PriceToggleController`] projects onto.
pub trait PriceToggleView<N> {
    /// Toggle whose input is `input`.
    fn toggle_index(&self, input: &N) -> Option<usize>;

    /// Toggle whose enhanced label is `label`.
    fn label_index(&self, label: &N) -> Option<usize>;

    /// Visible label text of a toggle.
    fn label_text(&self, index: usize) -> Option<String>;

    /// Reflect the selected tier on inputs, labels, body and table.
    fn render(&self, toggle: &PriceToggle);

    /// Move focus to a toggle's label.
    fn focus_label(&self, index: usize);

    /// Speak `message` to screen readers.
    fn announce(&self, message: &str);
}

/// Price tier state bound to an event manager and a page view.
pub struct PriceToggleController<H: Host, V> {
    toggle: RefCell<PriceToggle>,
    view: V,
    manager: EventManager<H>,
    announce: bool,
}

impl<H, V> PriceToggleController<H, V>
where
    H: Host,
    V: PriceToggleView<H::Node> + 'static,
{
    /// Wrap a validated `toggle`.
    pub fn new(
        manager: &EventManager<H>,
        config: &PriceToggleConfig,
        toggle: PriceToggle,
        view: V,
    ) -> Self {
        Self {
            toggle: RefCell::new(toggle),
            view,
            manager: manager.clone(),
            announce: config.announce_changes,
        }
    }

    /// Current selection.
    pub fn toggle(&self) -> Ref<'_, PriceToggle> {
        self.toggle.borrow()
    }

    /// Page view.
    pub const fn view(&self) -> &V {
        &self.view
    }

    /// Project the current selection.
    pub fn render(&self) {
        self.view.render(&self.toggle.borrow());
    }

    /// Switch to `tier`. Returns whether anything changed.
    pub fn switch_to(&self, tier: PriceTier) -> bool {
        let change = self.toggle.borrow_mut().switch_to(tier);
        change.is_some_and(|change| self.apply(change))
    }

    /// Select the toggle at `index`. Returns whether anything changed.
    pub fn select(&self, index: usize) -> bool {
        let tier = self.toggle.borrow().toggles().get(index).map(|entry| entry.tier);
        tier.is_some_and(|tier| self.switch_to(tier))
    }

    fn apply(&self, change: ViewChange) -> bool {
        self.render();
        self.manager.emit(
            &Component::PriceToggle.event(CHANGED),
            &json!({
                "previousView": change.previous.as_str(),
                "currentView": change.current.as_str(),
            }),
            None,
        );
        if self.announce {
            let selected = {
                let toggle = self.toggle.borrow();
                toggle
                    .toggles()
                    .iter()
                    .position(|entry| entry.tier == change.current)
            };
            let label_text = selected
                .and_then(|index| self.view.label_text(index))
                .unwrap_or_else(|| change.current.label().to_string());
            self.view.announce(&announcement(&label_text));
        }
        true
    }

    fn key_pressed(&self, index: usize, event: &H::Event) {
        let Some(key) = event.key() else {
            return;
        };
        let action = self.toggle.borrow().key_action(index, &key);
        match action {
            Some(LabelKeyAction::Select(target)) => {
                event.prevent_default();
                self.select(target);
            }
            Some(LabelKeyAction::Focus(target)) => {
                event.prevent_default();
                self.view.focus_label(target);
            }
            None => {}
        }
    }

    /// Register input changes and label keys.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::Events`] when a registration is refused.
    pub fn bind(
        self: &Rc<Self>,
        config: &PriceToggleConfig,
        registrations: &mut Registrations<H>,
    ) -> WidgetResult<()> {
        let manager = registrations.manager().clone();

        let changes = Rc::clone(self);
        registrations.keep(manager.delegate(&config.selector, "change", move |delegated| {
            if let Some(index) = changes.view.toggle_index(delegated.delegate_target) {
                changes.select(index);
            }
            Ok(())
        }))?;

        let keys = Rc::clone(self);
        registrations.keep(manager.delegate(ENHANCED_LABEL_SELECTOR, "keydown", move |delegated| {
            if let Some(index) = keys.view.label_index(delegated.delegate_target) {
                keys.key_pressed(index, delegated.event);
            }
            Ok(())
        }))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toggle(id: &str, checked: bool) -> ToggleDescriptor {
        ToggleDescriptor {
            id: id.to_string(),
            checked,
            has_label: true,
            ..ToggleDescriptor::default()
        }
    }

    #[test]
    fn price_type_fallback_chain() {
        assert_eq!(extract_price_type("v-pen", None, None).as_str(), "pensioner");
        assert_eq!(
            extract_price_type("custom-id", Some("student"), None).as_str(),
            "student"
        );
        assert_eq!(extract_price_type("custom-id", None, None).as_str(), "ordinary");
        assert_eq!(
            extract_price_type("custom-id", Some("senior"), Some("pensioner")),
            PriceTier::Pensioner
        );
        assert_eq!(extract_price_type("radio-stud", None, Some("on")), PriceTier::Student);
        assert_eq!(extract_price_type("v-stu", Some("ordinary"), None), PriceTier::Student);
    }

    #[test]
    fn missing_table_and_missing_ordinary_toggle_are_errors() {
        let config = PriceToggleConfig::default();
        let err = PriceToggle::new(&config, false, &[toggle("v-ord", true)])
            .err()
            .map(|err| err.code());
        assert_eq!(err, Some(PRICE_TABLE_MISSING));

        let err = PriceToggle::new(&config, true, &[toggle("v-pen", true), toggle("v-stu", false)])
            .err()
            .map(|err| err.code());
        assert_eq!(err, Some(TOGGLES_MISSING));

        let unlabeled = ToggleDescriptor {
            has_label: false,
            ..toggle("v-ord", true)
        };
        assert!(PriceToggle::new(&config, true, &[unlabeled]).is_err());
    }

    #[test]
    fn initial_view_prefers_the_checked_toggle() -> WidgetResult<()> {
        let config = PriceToggleConfig::default();
        let toggles = [toggle("v-ord", false), toggle("v-pen", true), toggle("v-stu", false)];
        let widget = PriceToggle::new(&config, true, &toggles)?;
        assert_eq!(widget.current_view(), PriceTier::Pensioner);
        assert_eq!(widget.selected_id(), Some("v-pen"));

        let toggles = [toggle("v-ord", false), toggle("v-stu", false)];
        let widget = PriceToggle::new(&config, true, &toggles)?;
        assert_eq!(widget.current_view(), PriceTier::Ordinary);
        assert_eq!(
            widget.available_views(),
            vec![PriceTier::Ordinary, PriceTier::Student]
        );
        Ok(())
    }

    #[test]
    fn switching_reports_previous_and_current() -> WidgetResult<()> {
        let config = PriceToggleConfig::default();
        let toggles = [toggle("v-ord", true), toggle("v-stu", false)];
        let mut widget = PriceToggle::new(&config, true, &toggles)?;
        assert_eq!(
            widget.select_toggle("v-stu"),
            Some(ViewChange {
                previous: PriceTier::Ordinary,
                current: PriceTier::Student,
            })
        );
        assert_eq!(widget.switch_to(PriceTier::Student), None);
        assert_eq!(widget.switch_to(PriceTier::Pensioner), None);
        assert_eq!(widget.select_toggle("unknown"), None);
        Ok(())
    }

    #[test]
    fn presentation_helpers() {
        assert_eq!(PriceTier::Student.body_class(), "price-view-student");
        assert!(is_view_class("price-view-ordinary"));
        assert!(!is_view_class("price-table"));
        assert_eq!(PriceTier::Ordinary.caption(), "Prislista - Ordinarie priser");
        assert_eq!(
            PriceTier::Pensioner.aria_label(),
            "Vaccinationspriser för Pensionärspriser (10% rabatt)"
        );
        assert_eq!(PriceTier::Pensioner.label_suffix(), " (pensioner prices)");
        assert_eq!(announcement(" Student "), "Pristabell bytt till Student");
        assert!(column_visible(1, PriceTier::Student));
        assert!(column_visible(4, PriceTier::Student));
        assert!(!column_visible(2, PriceTier::Student));
    }

    #[test]
    fn label_keys_cycle_focus() -> WidgetResult<()> {
        let config = PriceToggleConfig::default();
        let toggles = [toggle("v-ord", true), toggle("v-pen", false), toggle("v-stu", false)];
        let widget = PriceToggle::new(&config, true, &toggles)?;
        assert_eq!(widget.key_action(0, "ArrowLeft"), Some(LabelKeyAction::Focus(2)));
        assert_eq!(widget.key_action(2, "ArrowDown"), Some(LabelKeyAction::Focus(0)));
        assert_eq!(widget.key_action(1, "Enter"), Some(LabelKeyAction::Select(1)));
        assert_eq!(widget.key_action(1, "x"), None);
        Ok(())
    }
}
