//! Debounce and throttle state machines.
//!
//! # Design
//! - Timers are driven by the caller; these types only decide what to run.
//! - Every scheduled timer carries a generation so stale firings are ignored.

/// Trailing debounce: only the last value pushed before a quiet period runs.
#[derive(Debug)]
pub struct Debouncer<T> {
    generation: u64,
    pending: Option<T>,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self {
            generation: 0,
            pending: None,
        }
    }
}

impl<T> Debouncer<T> {
    /// Create an idle debouncer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value and return the generation the caller must schedule.
    pub fn push(&mut self, value: T) -> u64 {
        self.generation += 1;
        self.pending = Some(value);
        self.generation
    }

    /// Timer callback; yields the value only for the latest generation.
    pub fn fire(&mut self, generation: u64) -> Option<T> {
        if generation == self.generation {
            self.pending.take()
        } else {
            None
        }
    }

    /// Drop any pending value and invalidate outstanding timers.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.pending = None;
    }

    /// Whether a value is waiting for its timer.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Decision returned by [`Throttler::push`].
#[derive(Debug, PartialEq, Eq)]
pub enum ThrottleStep<T> {
    /// Outside the window: run immediately.
    Run(T),
    /// Inside the window: schedule a trailing call.
    Defer {
        /// Generation to hand back to [`Throttler::fire`].
        generation: u64,
        /// Time until the window closes.
        delay_ms: u32,
    },
    /// Inside the window with a trailing call already scheduled; the value
    /// replaced the previously pending one.
    Coalesced,
}

/// Trailing-edge throttle with a fixed window.
#[derive(Debug)]
pub struct Throttler<T> {
    limit_ms: u32,
    last_run: Option<f64>,
    pending: Option<T>,
    scheduled: bool,
    generation: u64,
}

impl<T> Throttler<T> {
    /// Create a throttler allowing one run per `limit_ms`.
    #[must_use]
    pub const fn new(limit_ms: u32) -> Self {
        Self {
            limit_ms,
            last_run: None,
            pending: None,
            scheduled: false,
            generation: 0,
        }
    }

    /// Record a value observed at `now_ms`.
    pub fn push(&mut self, now_ms: f64, value: T) -> ThrottleStep<T> {
        let elapsed = self.last_run.map(|last| now_ms - last);
        match elapsed {
            Some(elapsed) if elapsed < f64::from(self.limit_ms) => {
                self.pending = Some(value);
                if self.scheduled {
                    ThrottleStep::Coalesced
                } else {
                    self.scheduled = true;
                    ThrottleStep::Defer {
                        generation: self.generation,
                        delay_ms: remaining_ms(self.limit_ms, elapsed),
                    }
                }
            }
            _ => {
                self.last_run = Some(now_ms);
                self.pending = None;
                self.scheduled = false;
                self.generation += 1;
                ThrottleStep::Run(value)
            }
        }
    }

    /// Timer callback at the window boundary.
    pub fn fire(&mut self, now_ms: f64, generation: u64) -> Option<T> {
        if generation != self.generation {
            return None;
        }
        self.scheduled = false;
        let value = self.pending.take()?;
        self.last_run = Some(now_ms);
        Some(value)
    }

    /// Drop any pending value and invalidate outstanding timers.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.pending = None;
        self.scheduled = false;
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn remaining_ms(limit_ms: u32, elapsed: f64) -> u32 {
    (f64::from(limit_ms) - elapsed).ceil().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debouncer_keeps_only_latest_generation() {
        let mut debouncer = Debouncer::new();
        let first = debouncer.push("a");
        let second = debouncer.push("b");
        assert!(debouncer.is_pending());
        assert_eq!(debouncer.fire(first), None);
        assert_eq!(debouncer.fire(second), Some("b"));
        assert_eq!(debouncer.fire(second), None);
    }

    #[test]
    fn debouncer_cancel_invalidates_timer() {
        let mut debouncer = Debouncer::new();
        let generation = debouncer.push(1);
        debouncer.cancel();
        assert_eq!(debouncer.fire(generation), None);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn throttler_runs_first_and_defers_rest() {
        let mut throttler = Throttler::new(16);
        assert_eq!(throttler.push(0.0, 1), ThrottleStep::Run(1));
        assert_eq!(
            throttler.push(4.0, 2),
            ThrottleStep::Defer {
                generation: 1,
                delay_ms: 12
            }
        );
        assert_eq!(throttler.push(8.0, 3), ThrottleStep::Coalesced);
        assert_eq!(throttler.fire(16.0, 1), Some(3));
        assert_eq!(throttler.fire(16.0, 1), None);
        assert_eq!(throttler.push(40.0, 4), ThrottleStep::Run(4));
    }

    #[test]
    fn throttler_ignores_stale_timer_after_run() {
        let mut throttler = Throttler::new(10);
        assert_eq!(throttler.push(0.0, 'a'), ThrottleStep::Run('a'));
        let ThrottleStep::Defer { generation, .. } = throttler.push(5.0, 'b') else {
            panic!("expected deferral");
        };
        assert_eq!(throttler.push(10.0, 'c'), ThrottleStep::Run('c'));
        assert_eq!(throttler.fire(10.0, generation), None);
    }

    #[test]
    fn throttler_cancel_drops_pending() {
        let mut throttler = Throttler::new(10);
        let _ = throttler.push(0.0, 1);
        let ThrottleStep::Defer { generation, .. } = throttler.push(1.0, 2) else {
            panic!("expected deferral");
        };
        throttler.cancel();
        assert_eq!(throttler.fire(10.0, generation), None);
    }
}
