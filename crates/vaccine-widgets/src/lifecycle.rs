//! Namespaced lifecycle event names (`vaccine:<component>:<step>`).

/// Event namespace shared by every widget.
pub const NAMESPACE: &str = "vaccine";

/// Emitted once a widget finished setup.
pub const READY: &str = "ready";
/// Emitted after a widget tore itself down.
pub const DESTROYED: &str = "destroyed";

/// Source component of a lifecycle event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Component {
    /// Page orchestrator.
    App,
    /// Accordion/FAQ items.
    Accordion,
    /// Cookie consent banner.
    Gdpr,
    /// Image overlay.
    Lightbox,
    /// Price tier switcher.
    PriceToggle,
    /// Install prompt.
    Pwa,
    /// Table wrapper lifecycle.
    ResponsiveTable,
    /// Per-table scroll notifications.
    Table,
    /// Animated in-page navigation.
    SmoothScroll,
    /// Lazily loaded images.
    Image,
    /// Swedish date formatting.
    DateFormatter,
}

impl Component {
    /// Slug used in event names.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Accordion => "accordion",
            Self::Gdpr => "gdpr",
            Self::Lightbox => "lightbox",
            Self::PriceToggle => "price-toggle",
            Self::Pwa => "pwa",
            Self::ResponsiveTable => "responsive-table",
            Self::Table => "table",
            Self::SmoothScroll => "smoothscroll",
            Self::Image => "image",
            Self::DateFormatter => "date-formatter",
        }
    }

    /// Full event name for `step`.
    #[must_use]
    pub fn event(self, step: &str) -> String {
        format!("{NAMESPACE}:{}:{step}", self.slug())
    }

    /// `vaccine:<component>:ready`.
    #[must_use]
    pub fn ready(self) -> String {
        self.event(READY)
    }

    /// `vaccine:<component>:destroyed`.
    #[must_use]
    pub fn destroyed(self) -> String {
        self.event(DESTROYED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_are_namespaced() {
        assert_eq!(Component::Accordion.event("opening"), "vaccine:accordion:opening");
        assert_eq!(Component::PriceToggle.ready(), "vaccine:price-toggle:ready");
        assert_eq!(Component::SmoothScroll.destroyed(), "vaccine:smoothscroll:destroyed");
        assert_eq!(
            Component::Table.event("scrollability-changed"),
            "vaccine:table:scrollability-changed"
        );
    }
}
