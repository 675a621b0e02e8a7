//! Browser projections of the widget state machines.

mod accordion;
mod date_formatter;
mod gdpr;
mod lazy_images;
mod lightbox;
mod price_toggle;
mod pwa;
mod responsive_table;
mod smooth_scroll;

use vaccine_widgets::WidgetEntry;

pub use responsive_table::{
    scroll_table_to, scroll_table_to_end, scroll_table_to_start, table_scroll_percentage,
};

use crate::context::PageContext;

/// Every widget in boot order.
pub(crate) fn registry() -> [WidgetEntry<PageContext>; 9] {
    [
        WidgetEntry::new("accordion", accordion::factory),
        WidgetEntry::new("gdpr-manager", gdpr::factory),
        WidgetEntry::new("lightbox", lightbox::factory),
        WidgetEntry::new("price-toggle", price_toggle::factory),
        WidgetEntry::new("pwa-install", pwa::factory),
        WidgetEntry::new("responsive-table", responsive_table::factory),
        WidgetEntry::new("smooth-scroll", smooth_scroll::factory),
        WidgetEntry::new("lazy-images", lazy_images::factory),
        WidgetEntry::new("date-formatter", date_formatter::factory),
    ]
}
