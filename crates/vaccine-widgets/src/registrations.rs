//! Listener tokens owned by one widget.

use vaccine_events::{EventManager, EventResult, Host, ListenerToken};

use crate::error::{WidgetError, WidgetResult};

/// Tokens a widget registered, released together on teardown or drop.
pub struct Registrations<H: Host> {
    manager: EventManager<H>,
    component: &'static str,
    tokens: Vec<ListenerToken>,
}

impl<H: Host> Registrations<H> {
    /// Empty set for `component`.
    #[must_use]
    pub fn new(manager: &EventManager<H>, component: &'static str) -> Self {
        Self {
            manager: manager.clone(),
            component,
            tokens: Vec::new(),
        }
    }

    /// Manager the tokens belong to.
    #[must_use]
    pub const fn manager(&self) -> &EventManager<H> {
        &self.manager
    }

    /// Keep a fresh registration.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::Events`] when the manager refused it.
    pub fn keep(&mut self, registration: EventResult<ListenerToken>) -> WidgetResult<()> {
        let token = registration.map_err(|source| WidgetError::events(self.component, source))?;
        self.tokens.push(token);
        Ok(())
    }

    /// Number of live tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Remove every kept listener.
    pub fn release(&mut self) {
        for token in self.tokens.drain(..) {
            self.manager.off(token);
        }
    }
}

impl<H: Host> Drop for Registrations<H> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaccine_events::EventTuning;
    use vaccine_events::testing::FakeHost;

    #[test]
    fn dropping_a_half_built_set_releases_its_listeners() {
        let host = FakeHost::new();
        let manager = EventManager::new(host, EventTuning::default());
        {
            let mut registrations = Registrations::new(&manager, "accordion");
            registrations
                .keep(manager.delegate(".faq-item summary", "click", |_| Ok(())))
                .unwrap();
            let refused = registrations.keep(manager.delegate("[", "click", |_| Ok(())));
            assert_eq!(refused.unwrap_err().component(), "accordion");
            assert_eq!(registrations.len(), 1);
        }
        assert_eq!(manager.listener_count(), 0);
    }
}
