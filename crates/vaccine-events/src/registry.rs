//! Delegated handler registry.
//!
//! # Design
//! - Maps event type to selector to handlers, preserving registration order.
//! - Empty selector entries and empty event-type entries are pruned on removal.
//! - Pure bookkeeping; no DOM access so it is tested natively.

use std::collections::HashMap;

use crate::token::ListenerToken;

#[derive(Debug, Clone)]
struct SelectorEntry<F> {
    selector: String,
    handlers: Vec<(ListenerToken, F)>,
}

/// Outcome of removing a delegated handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removed {
    /// Event type the handler was registered for.
    pub event_type: String,
    /// Selector the handler was registered for.
    pub selector: String,
    /// Whether no handlers remain for the event type.
    pub type_emptied: bool,
}

/// Event type to selector to handlers mapping.
#[derive(Debug, Clone)]
pub struct DelegateRegistry<F> {
    by_type: HashMap<String, Vec<SelectorEntry<F>>>,
    index: HashMap<ListenerToken, (String, String)>,
}

impl<F> Default for DelegateRegistry<F> {
    fn default() -> Self {
        Self {
            by_type: HashMap::new(),
            index: HashMap::new(),
        }
    }
}

impl<F: Clone> DelegateRegistry<F> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Returns `true` when this is the first handler for
    /// the event type.
    pub fn insert(&mut self, event_type: &str, selector: &str, token: ListenerToken, handler: F) -> bool {
        let first_for_type = !self.by_type.contains_key(event_type);
        let entries = self.by_type.entry(event_type.to_string()).or_default();
        if let Some(entry) = entries.iter_mut().find(|entry| entry.selector == selector) {
            entry.handlers.push((token, handler));
        } else {
            entries.push(SelectorEntry {
                selector: selector.to_string(),
                handlers: vec![(token, handler)],
            });
        }
        self.index
            .insert(token, (event_type.to_string(), selector.to_string()));
        first_for_type
    }

    /// Find the token of an existing handler accepted by `same`.
    pub fn find(
        &self,
        event_type: &str,
        selector: &str,
        same: impl Fn(&F) -> bool,
    ) -> Option<ListenerToken> {
        self.by_type
            .get(event_type)?
            .iter()
            .find(|entry| entry.selector == selector)?
            .handlers
            .iter()
            .find(|(_, handler)| same(handler))
            .map(|(token, _)| *token)
    }

    /// Remove a handler by token. Unknown tokens are a no-op.
    pub fn remove(&mut self, token: ListenerToken) -> Option<Removed> {
        let (event_type, selector) = self.index.remove(&token)?;
        let entries = self.by_type.get_mut(&event_type)?;
        if let Some(position) = entries.iter().position(|entry| entry.selector == selector) {
            entries[position].handlers.retain(|(existing, _)| *existing != token);
            if entries[position].handlers.is_empty() {
                entries.remove(position);
            }
        }
        let type_emptied = entries.is_empty();
        if type_emptied {
            self.by_type.remove(&event_type);
        }
        Some(Removed {
            event_type,
            selector,
            type_emptied,
        })
    }

    /// Whether the token is still registered.
    #[must_use]
    pub fn contains(&self, token: ListenerToken) -> bool {
        self.index.contains_key(&token)
    }

    /// Selector entries for an event type, cloned so handlers can run
    /// without holding a borrow on the registry.
    #[must_use]
    pub fn snapshot(&self, event_type: &str) -> Vec<(String, Vec<(ListenerToken, F)>)> {
        self.by_type
            .get(event_type)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| (entry.selector.clone(), entry.handlers.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Registered event types.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.by_type.keys().cloned().collect();
        types.sort();
        types
    }

    /// Number of selectors registered for an event type.
    #[must_use]
    pub fn selector_count(&self, event_type: &str) -> usize {
        self.by_type.get(event_type).map_or(0, Vec::len)
    }

    /// Total number of handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Drop every registration.
    pub fn clear(&mut self) {
        self.by_type.clear();
        self.index.clear();
    }
}
