//! Default selectors, texts and timings for the widget sections.
//!
//! # Design
//! - Every default lives here so the CMS templates and the widgets agree.
//! - Swedish copy is the production text shown to visitors.

/// Accordion/FAQ container selector.
pub const ACCORDION_SELECTOR: &str = ".faq-item, details[data-accordion]";
/// Accordion header selector, relative to a container.
pub const ACCORDION_HEADER_SELECTOR: &str = "summary, .faq-question";
/// Accordion content selector, relative to a container.
pub const ACCORDION_CONTENT_SELECTOR: &str =
    ".faq-content, .accordion-content, .vaccine-content, .faq-answer, .details-content";

/// Cookie holding the consent decision.
pub const GDPR_COOKIE_NAME: &str = "vaccine_gdpr_consent";
/// Consent banner message.
pub const GDPR_MESSAGE: &str = "Vi använder endast tekniskt nödvändiga cookies för att säkerställa att vår tjänst fungerar korrekt. Inga personuppgifter lagras utan ditt samtycke enligt GDPR.";
/// Consent cookie lifetime.
pub const GDPR_EXPIRY_DAYS: u32 = 365;

/// Lightbox trigger selector.
pub const LIGHTBOX_SELECTOR: &str = "img[data-lightbox], .lightbox-trigger";
/// Lightbox overlay id.
pub const LIGHTBOX_ID: &str = "vaccine-lightbox";
/// Message shown when the full-size image fails.
pub const LIGHTBOX_ERROR_MESSAGE: &str = "Bilden kunde inte laddas";

/// Price view radio selector.
pub const PRICE_TOGGLE_SELECTOR: &str = "input[name=\"price-view\"], .price-toggle-input";
/// Price table selector.
pub const PRICE_TABLE_SELECTOR: &str = ".price-table, table[class*=\"price\"]";

/// Install banner container selector.
pub const PWA_CONTAINER_SELECTOR: &str = "#pwa-install-container, .pwa-install, #vaccine-bjarred-app";
/// localStorage key holding the dismissal timestamp.
pub const PWA_DISMISSAL_KEY: &str = "pwa_install_dismissed";
/// Days the banner stays hidden after a dismissal.
pub const PWA_DISMISSAL_DAYS: u32 = 7;
/// Delay before showing the banner without a deferred prompt.
pub const PWA_SHOW_DELAY_MS: u32 = 5_000;

/// Tables enhanced for horizontal scrolling.
pub const RESPONSIVE_TABLE_SELECTOR: &str =
    ".location-schedule, .price-table, .table-responsive, table[data-responsive]";

/// In-page links animated by smooth scroll.
pub const SMOOTH_SCROLL_SELECTOR: &str = "a[href^=\"#\"]:not([data-no-smooth]), .smooth-scroll";

/// Images loaded lazily.
pub const LAZY_IMAGE_SELECTOR: &str = "img[data-src], img.lazy";

/// Containers whose dates are reformatted.
pub const DATE_CONTAINER_SELECTOR: &str = ".table-scroll-container";
/// Date-bearing elements inside a container.
pub const DATE_ELEMENT_SELECTOR: &str = "time[datetime], [data-date]";

/// Host serving CMS assets.
pub const RESOURCE_ORIGIN: &str = "https://www.ptj.se";
/// CMS content hash segment.
pub const RESOURCE_HASH: &str = "49f763";
/// CMS folder holding the clinic assets.
pub const RESOURCE_BASE_PATH: &str = "/globalassets/vaccincenter-varvet/";
