//! Element keys: an existing `id` attribute, else a generated `prefix-N`.

/// Hands out `prefix-N` keys for elements without an id.
#[derive(Clone, Debug)]
pub struct IdAllocator {
    prefix: String,
    next: u32,
}

impl IdAllocator {
    /// Allocator producing `prefix-0`, `prefix-1`, ...
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: 0,
        }
    }

    /// Next generated key.
    pub fn allocate(&mut self) -> String {
        let key = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        key
    }

    /// Key for an element: its non-blank `id`, else a generated one.
    pub fn key_for(&mut self, existing_id: Option<&str>) -> String {
        match existing_id.map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => self.allocate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_ids_win_over_generated_keys() {
        let mut ids = IdAllocator::new("accordion");
        assert_eq!(ids.key_for(Some("faq-covid")), "faq-covid");
        assert_eq!(ids.key_for(None), "accordion-0");
        assert_eq!(ids.key_for(Some("  ")), "accordion-1");
        assert_eq!(ids.allocate(), "accordion-2");
    }
}
