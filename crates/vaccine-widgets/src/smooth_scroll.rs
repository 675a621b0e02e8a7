//! Eased in-page scrolling.
//!
//! # Design
//! - Durations scale with distance at `speed` px/ms and are clamped to
//!   `[min_duration, max_duration]`.
//! - Each scroll gets a [`ScrollTicket`]; starting another scroll or user
//!   input invalidates older tickets, and animation frames holding a stale
//!   ticket stop on their own.

use vaccine_config::SmoothScrollConfig;

/// Component slug used in logs.
pub const COMPONENT: &str = "smoothscroll";

/// A scroll began.
pub const START: &str = "start";
/// A scroll reached its target.
pub const COMPLETE: &str = "complete";
/// An in-flight scroll was superseded or interrupted.
pub const CANCELLED: &str = "cancelled";

/// Delay before focusing the target.
pub const FOCUS_DELAY_MS: u32 = 100;
/// Native scrolling counts as finished within this many pixels.
pub const NATIVE_SETTLE_PX: f64 = 5.0;

/// Named easing curves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Easing {
    /// Constant speed.
    Linear,
    /// Quadratic acceleration.
    EaseIn,
    /// Quadratic deceleration.
    EaseOut,
    /// Accelerate then decelerate.
    EaseInOut,
}

impl Easing {
    /// Curve for a configured name; unknown names use ease-in-out.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "linear" => Self::Linear,
            "ease-in" => Self::EaseIn,
            "ease-out" => Self::EaseOut,
            _ => Self::EaseInOut,
        }
    }

    /// Eased progress for linear progress `p` in `[0, 1]`.
    #[must_use]
    pub fn apply(self, p: f64) -> f64 {
        let p = p.clamp(0.0, 1.0);
        match self {
            Self::Linear => p,
            Self::EaseIn => p * p,
            Self::EaseOut => 1.0 - (1.0 - p).powi(2),
            Self::EaseInOut => {
                if p < 0.5 {
                    2.0 * p * p
                } else {
                    1.0 - (-2.0f64).mul_add(p, 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// Animation length for `distance` pixels.
#[must_use]
pub fn calculate_duration(distance: f64, config: &SmoothScrollConfig) -> f64 {
    let min = f64::from(config.min_duration);
    let max = f64::from(config.max_duration).max(min);
    if config.speed <= 0.0 || !config.speed.is_finite() {
        return max;
    }
    (distance.abs() / config.speed).clamp(min, max)
}

/// Document scroll offset that puts an element at the top, minus the
/// header offset.
#[must_use]
pub fn target_position(page_y_offset: f64, rect_top: f64, offset: f64) -> f64 {
    page_y_offset + rect_top - offset
}

/// Element id referenced by an in-page link, `None` for `#` and external
/// links.
#[must_use]
pub fn hash_target(href: &str) -> Option<&str> {
    href.strip_prefix('#').filter(|id| !id.is_empty())
}

/// Keys that interrupt an in-flight scroll.
#[must_use]
pub fn is_cancel_key(key: &str) -> bool {
    matches!(
        key,
        "ArrowUp" | "ArrowDown" | "PageUp" | "PageDown" | "Home" | "End" | " " | "Space" | "Spacebar"
    )
}

/// Screen-reader text after navigating to an element.
#[must_use]
pub fn announcement(text: &str, id: &str) -> String {
    let text = text.trim();
    let label = if text.is_empty() { id } else { text };
    format!("Navigerat till {label}")
}

/// Identity of one scroll operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScrollTicket(u64);

/// Tracks which scroll, if any, is still allowed to move the page.
#[derive(Clone, Debug, Default)]
pub struct ActiveScrolls {
    next: u64,
    active: Option<ScrollTicket>,
}

impl ActiveScrolls {
    /// Empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new scroll, superseding any active one. Returns the new ticket
    /// and whether an older scroll was cancelled.
    pub fn begin(&mut self) -> (ScrollTicket, bool) {
        let superseded = self.active.is_some();
        self.next += 1;
        let ticket = ScrollTicket(self.next);
        self.active = Some(ticket);
        (ticket, superseded)
    }

    /// Whether `ticket` may still drive the page.
    #[must_use]
    pub fn is_current(&self, ticket: ScrollTicket) -> bool {
        self.active == Some(ticket)
    }

    /// Mark `ticket` finished. Returns `false` for stale tickets.
    pub fn finish(&mut self, ticket: ScrollTicket) -> bool {
        if self.is_current(ticket) {
            self.active = None;
            true
        } else {
            false
        }
    }

    /// Cancel the active scroll, returning whether one was running.
    pub fn cancel(&mut self) -> bool {
        self.active.take().is_some()
    }

    /// Whether a scroll is running.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

/// One animation frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollFrame {
    /// Position to scroll to.
    pub position: f64,
    /// Time since the animation started.
    pub elapsed: f64,
    /// Whether this is the final frame.
    pub done: bool,
}

/// Eased animation from one scroll offset to another.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollAnimation {
    start: f64,
    distance: f64,
    duration: f64,
    easing: Easing,
    started_at: f64,
}

impl ScrollAnimation {
    /// Plan an animation from `start` to `target` beginning at `now`.
    #[must_use]
    pub fn new(start: f64, target: f64, config: &SmoothScrollConfig, now: f64) -> Self {
        let distance = target - start;
        Self {
            start,
            distance,
            duration: calculate_duration(distance, config),
            easing: Easing::from_name(&config.easing),
            started_at: now,
        }
    }

    /// Planned duration.
    #[must_use]
    pub const fn duration(&self) -> f64 {
        self.duration
    }

    /// Target offset.
    #[must_use]
    pub fn target(&self) -> f64 {
        self.start + self.distance
    }

    /// Frame for time `now`.
    #[must_use]
    pub fn frame(&self, now: f64) -> ScrollFrame {
        let elapsed = (now - self.started_at).max(0.0);
        let progress = if self.duration > 0.0 {
            (elapsed / self.duration).min(1.0)
        } else {
            1.0
        };
        ScrollFrame {
            position: self.distance.mul_add(self.easing.apply(progress), self.start),
            elapsed,
            done: progress >= 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn easing_curves_match_their_formulas() {
        assert!(close(Easing::Linear.apply(0.3), 0.3));
        assert!(close(Easing::EaseIn.apply(0.5), 0.25));
        assert!(close(Easing::EaseOut.apply(0.5), 0.75));
        assert!(close(Easing::EaseInOut.apply(0.25), 0.125));
        assert!(close(Easing::EaseInOut.apply(0.75), 0.875));
        assert_eq!(Easing::from_name("bounce"), Easing::EaseInOut);
        for easing in [Easing::Linear, Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut] {
            assert!(close(easing.apply(0.0), 0.0));
            assert!(close(easing.apply(1.0), 1.0));
        }
    }

    #[test]
    fn duration_is_monotone_and_clamped() {
        let config = SmoothScrollConfig::default();
        let mut previous = 0.0;
        for distance in (0..5_000).step_by(37) {
            let duration = calculate_duration(f64::from(distance), &config);
            assert!(duration >= previous);
            assert!((250.0..=1_500.0).contains(&duration));
            previous = duration;
        }
        assert!(close(calculate_duration(-600.0, &config), 600.0));

        let stalled = SmoothScrollConfig {
            speed: 0.0,
            ..SmoothScrollConfig::default()
        };
        assert!(close(calculate_duration(10.0, &stalled), 1_500.0));
    }

    #[test]
    fn animation_reaches_the_target() {
        let config = SmoothScrollConfig {
            easing: "linear".to_string(),
            ..SmoothScrollConfig::default()
        };
        let start = target_position(0.0, 0.0, 0.0);
        let target = target_position(100.0, 900.0, 80.0);
        assert!(close(target, 920.0));

        let animation = ScrollAnimation::new(start, target, &config, 1_000.0);
        assert!(close(animation.duration(), 920.0));
        let halfway = animation.frame(1_460.0);
        assert!(close(halfway.position, 460.0));
        assert!(!halfway.done);
        let last = animation.frame(3_000.0);
        assert!(close(last.position, animation.target()));
        assert!(last.done);
    }

    #[test]
    fn newer_scrolls_supersede_older_tickets() {
        let mut scrolls = ActiveScrolls::new();
        let (first, superseded) = scrolls.begin();
        assert!(!superseded);
        let (second, superseded) = scrolls.begin();
        assert!(superseded);
        assert!(!scrolls.is_current(first));
        assert!(!scrolls.finish(first));
        assert!(scrolls.finish(second));
        assert!(!scrolls.cancel());

        let (third, _) = scrolls.begin();
        assert!(scrolls.cancel());
        assert!(!scrolls.is_current(third));
    }

    #[test]
    fn link_and_key_helpers() {
        assert_eq!(hash_target("#boka"), Some("boka"));
        assert_eq!(hash_target("#"), None);
        assert_eq!(hash_target("/priser#boka"), None);
        assert!(is_cancel_key("PageDown"));
        assert!(is_cancel_key(" "));
        assert!(!is_cancel_key("a"));
        assert_eq!(announcement("  Priser ", "priser"), "Navigerat till Priser");
        assert_eq!(announcement("", "priser"), "Navigerat till priser");
    }
}
