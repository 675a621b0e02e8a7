//! Static widget registry and page bootstrap.
//!
//! # Design
//! - Widgets are listed at compile time as `(name, factory)` pairs and
//!   started strictly in registry order.
//! - A factory returns `Ok(None)` when its elements are absent; that widget
//!   is skipped, not failed.
//! - One failing factory never stops the rest; failures are logged with the
//!   component and code and collected in the [`BootReport`].

use serde_json::{Value, json};

use crate::error::WidgetResult;

/// Component slug used in logs.
pub const COMPONENT: &str = "app";

/// Registry order used by the page bootstrap.
pub const WIDGET_ORDER: [&str; 9] = [
    "accordion",
    "gdpr-manager",
    "lightbox",
    "price-toggle",
    "pwa-install",
    "responsive-table",
    "smooth-scroll",
    "lazy-images",
    "date-formatter",
];

/// A started widget owned by the [`App`].
pub trait Widget {
    /// Registry name.
    fn name(&self) -> &'static str;

    /// Detach listeners and clear state. Called at most once.
    fn destroy(&mut self);
}

/// Builds a widget from the page context.
pub type WidgetFactory<C> = fn(&C) -> WidgetResult<Option<Box<dyn Widget>>>;

/// Registry entry.
pub struct WidgetEntry<C> {
    /// Registry name.
    pub name: &'static str,
    /// Constructor.
    pub factory: WidgetFactory<C>,
}

impl<C> WidgetEntry<C> {
    /// Pair a name with its factory.
    #[must_use]
    pub const fn new(name: &'static str, factory: WidgetFactory<C>) -> Self {
        Self { name, factory }
    }
}

impl<C> Clone for WidgetEntry<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for WidgetEntry<C> {}

/// Outcome of a bootstrap pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BootReport {
    /// Widgets started, in order.
    pub active: Vec<&'static str>,
    /// Widgets whose elements were absent.
    pub skipped: Vec<&'static str>,
    /// Widgets whose factory failed, with the error code.
    pub failed: Vec<(&'static str, &'static str)>,
}

/// Running set of widgets for one page.
pub struct App {
    widgets: Vec<Box<dyn Widget>>,
    report: BootReport,
    destroyed: bool,
}

impl App {
    /// Start every registry entry in order against `context`.
    pub fn boot<C>(context: &C, registry: &[WidgetEntry<C>]) -> Self {
        let mut widgets = Vec::with_capacity(registry.len());
        let mut report = BootReport::default();
        for entry in registry {
            match (entry.factory)(context) {
                Ok(Some(widget)) => {
                    tracing::debug!(component = COMPONENT, widget = entry.name, "widget started");
                    report.active.push(entry.name);
                    widgets.push(widget);
                }
                Ok(None) => {
                    tracing::info!(
                        component = COMPONENT,
                        widget = entry.name,
                        "no matching elements; widget skipped"
                    );
                    report.skipped.push(entry.name);
                }
                Err(err) => {
                    tracing::error!(
                        component = err.component(),
                        code = err.code(),
                        widget = entry.name,
                        error = %err,
                        "widget failed to start"
                    );
                    report.failed.push((entry.name, err.code()));
                }
            }
        }
        tracing::info!(
            component = COMPONENT,
            active = report.active.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "widgets loaded"
        );
        Self {
            widgets,
            report,
            destroyed: false,
        }
    }

    /// What the bootstrap did.
    #[must_use]
    pub const fn report(&self) -> &BootReport {
        &self.report
    }

    /// Names of the running widgets, in start order.
    #[must_use]
    pub fn active(&self) -> Vec<&'static str> {
        self.widgets.iter().map(|widget| widget.name()).collect()
    }

    /// Whether `name` is running.
    #[must_use]
    pub fn is_active(&self, name: &str) -> bool {
        self.widgets.iter().any(|widget| widget.name() == name)
    }

    /// Detail payload for the `vaccine:app:ready` event.
    #[must_use]
    pub fn ready_detail(&self) -> Value {
        json!({
            "widgets": self.report.active,
            "skipped": self.report.skipped,
            "failed": self
                .report
                .failed
                .iter()
                .map(|(name, code)| json!({ "widget": name, "code": code }))
                .collect::<Vec<_>>(),
        })
    }

    /// Tear widgets down in reverse start order; returns the order used.
    /// Later calls do nothing.
    pub fn destroy(&mut self) -> Vec<&'static str> {
        if self.destroyed {
            return Vec::new();
        }
        self.destroyed = true;
        let mut order = Vec::with_capacity(self.widgets.len());
        while let Some(mut widget) = self.widgets.pop() {
            widget.destroy();
            order.push(widget.name());
        }
        tracing::info!(component = COMPONENT, widgets = order.len(), "widgets destroyed");
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PRICE_TABLE_MISSING, WidgetError};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Page {
        log: Rc<RefCell<Vec<String>>>,
    }

    struct Recorder {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Widget for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn destroy(&mut self) {
            self.log.borrow_mut().push(format!("destroy {}", self.name));
        }
    }

    fn started(name: &'static str, page: &Page) -> WidgetResult<Option<Box<dyn Widget>>> {
        page.log.borrow_mut().push(format!("start {name}"));
        Ok(Some(Box::new(Recorder {
            name,
            log: Rc::clone(&page.log),
        })))
    }

    fn accordion(page: &Page) -> WidgetResult<Option<Box<dyn Widget>>> {
        started("accordion", page)
    }

    fn lightbox(page: &Page) -> WidgetResult<Option<Box<dyn Widget>>> {
        started("lightbox", page)
    }

    fn absent(page: &Page) -> WidgetResult<Option<Box<dyn Widget>>> {
        page.log.borrow_mut().push("start gdpr-manager".to_string());
        Ok(None)
    }

    fn broken(page: &Page) -> WidgetResult<Option<Box<dyn Widget>>> {
        page.log.borrow_mut().push("start price-toggle".to_string());
        Err(WidgetError::MissingElement {
            component: "price-toggle",
            code: PRICE_TABLE_MISSING,
            selector: ".price-table".to_string(),
        })
    }

    fn registry() -> Vec<WidgetEntry<Page>> {
        vec![
            WidgetEntry::<Page>::new("accordion", accordion),
            WidgetEntry::<Page>::new("gdpr-manager", absent),
            WidgetEntry::<Page>::new("price-toggle", broken),
            WidgetEntry::<Page>::new("lightbox", lightbox),
        ]
    }

    #[test]
    fn boot_runs_in_order_and_isolates_failures() {
        let page = Page {
            log: Rc::new(RefCell::new(Vec::new())),
        };
        let app = App::boot(&page, &registry());
        assert_eq!(
            *page.log.borrow(),
            vec![
                "start accordion",
                "start gdpr-manager",
                "start price-toggle",
                "start lightbox"
            ]
        );
        assert_eq!(app.active(), vec!["accordion", "lightbox"]);
        assert_eq!(app.report().skipped, vec!["gdpr-manager"]);
        assert_eq!(app.report().failed, vec![("price-toggle", PRICE_TABLE_MISSING)]);
        assert!(app.is_active("lightbox"));
        assert!(!app.is_active("price-toggle"));
    }

    #[test]
    fn destroy_runs_in_reverse_once() {
        let page = Page {
            log: Rc::new(RefCell::new(Vec::new())),
        };
        let mut app = App::boot(&page, &registry());
        assert_eq!(app.destroy(), vec!["lightbox", "accordion"]);
        assert!(app.destroy().is_empty());
        let log = page.log.borrow();
        assert_eq!(&log[log.len() - 2..], ["destroy lightbox", "destroy accordion"]);
        assert!(app.active().is_empty());
    }

    #[test]
    fn ready_detail_lists_outcomes() {
        let page = Page {
            log: Rc::new(RefCell::new(Vec::new())),
        };
        let app = App::boot(&page, &registry());
        let detail = app.ready_detail();
        assert_eq!(detail["widgets"], json!(["accordion", "lightbox"]));
        assert_eq!(detail["skipped"], json!(["gdpr-manager"]));
        assert_eq!(detail["failed"][0]["code"], json!(PRICE_TABLE_MISSING));
    }

    #[test]
    fn registry_order_is_fixed() {
        assert_eq!(WIDGET_ORDER.first(), Some(&"accordion"));
        assert_eq!(WIDGET_ORDER.last(), Some(&"date-formatter"));
        assert_eq!(WIDGET_ORDER.len(), 9);
    }
}
