//! Lightbox image resolution and open/close state.

/// Component slug used in logs.
pub const COMPONENT: &str = "lightbox";

/// The overlay opened.
pub const OPENED: &str = "opened";
/// The overlay closed.
pub const CLOSED: &str = "closed";
/// The full-size image failed to load.
pub const ERROR: &str = "error";

/// Attributes read from a trigger element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LightboxSource {
    /// `src`.
    pub src: Option<String>,
    /// `data-src`.
    pub data_src: Option<String>,
    /// `alt`.
    pub alt: Option<String>,
    /// `data-alt`.
    pub data_alt: Option<String>,
    /// `title`.
    pub title: Option<String>,
    /// `data-title`.
    pub data_title: Option<String>,
}

/// Image shown in the overlay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LightboxImage {
    /// Image URL.
    pub src: String,
    /// Alternative text.
    pub alt: String,
    /// Caption, if any.
    pub title: Option<String>,
}

fn first_present(primary: Option<&String>, fallback: Option<&String>) -> Option<String> {
    primary
        .filter(|value| !value.trim().is_empty())
        .or_else(|| fallback.filter(|value| !value.trim().is_empty()))
        .cloned()
}

impl LightboxSource {
    /// Resolve the overlay image: `src` then `data-src`, `alt` then
    /// `data-alt`, `title` then `data-title`. `None` without a source.
    #[must_use]
    pub fn resolve(&self) -> Option<LightboxImage> {
        let Some(src) = first_present(self.src.as_ref(), self.data_src.as_ref()) else {
            tracing::warn!(component = COMPONENT, "trigger has no image source");
            return None;
        };
        Some(LightboxImage {
            src,
            alt: first_present(self.alt.as_ref(), self.data_alt.as_ref()).unwrap_or_default(),
            title: first_present(self.title.as_ref(), self.data_title.as_ref()),
        })
    }
}

/// Whether the overlay is showing, and what.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LightboxState {
    current: Option<LightboxImage>,
    failed: bool,
}

impl LightboxState {
    /// Closed overlay.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the overlay is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Image on screen.
    #[must_use]
    pub const fn current(&self) -> Option<&LightboxImage> {
        self.current.as_ref()
    }

    /// Whether the current image failed to load.
    #[must_use]
    pub const fn failed(&self) -> bool {
        self.failed
    }

    /// Open with `image`. Returns `false` when already open.
    pub fn open(&mut self, image: LightboxImage) -> bool {
        if self.current.is_some() {
            return false;
        }
        self.current = Some(image);
        self.failed = false;
        true
    }

    /// Close the overlay. Returns `false` when already closed.
    pub fn close(&mut self) -> bool {
        self.failed = false;
        self.current.take().is_some()
    }

    /// Record an image load failure. Returns `false` when closed or already
    /// failed.
    pub fn fail(&mut self) -> bool {
        if self.current.is_none() || self.failed {
            return false;
        }
        self.failed = true;
        true
    }
}
