//! Listener registry.
//!
//! Maps event names to ordered listener lists. A type entry exists only
//! while it has at least one listener.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;

use super::listener::Listener;

// ============================================================================
// ListenerRegistry
// ============================================================================

/// Per-type listener lists in registration order.
#[derive(Debug, Default, Clone)]
pub struct ListenerRegistry {
    entries: FxHashMap<String, Vec<Listener>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `listener` to the list for `event_type`.
    ///
    /// Returns `false` when that exact listener is already registered for
    /// the type.
    pub fn add(&mut self, event_type: &str, listener: &Listener) -> bool {
        let listeners = self.entries.entry(event_type.to_string()).or_default();
        if listeners.contains(listener) {
            return false;
        }
        listeners.push(listener.clone());
        true
    }

    /// Removes `listener` from the list for `event_type`.
    ///
    /// Drops the type entry once its list is empty. Returns `false` when
    /// nothing was removed.
    pub fn remove(&mut self, event_type: &str, listener: &Listener) -> bool {
        let Some(listeners) = self.entries.get_mut(event_type) else {
            return false;
        };

        let Some(index) = listeners.iter().position(|l| l == listener) else {
            return false;
        };

        listeners.remove(index);
        if listeners.is_empty() {
            self.entries.remove(event_type);
        }
        true
    }

    /// Returns a copy of the listeners for `event_type`.
    ///
    /// Dispatch iterates the copy, so callbacks may modify the registry.
    #[must_use]
    pub fn snapshot(&self, event_type: &str) -> Vec<Listener> {
        self.entries.get(event_type).cloned().unwrap_or_default()
    }

    /// Returns the number of listeners for `event_type`.
    #[inline]
    #[must_use]
    pub fn count(&self, event_type: &str) -> usize {
        self.entries.get(event_type).map_or(0, Vec::len)
    }

    /// Returns `true` if `event_type` has an entry.
    #[inline]
    #[must_use]
    pub fn contains_type(&self, event_type: &str) -> bool {
        self.entries.contains_key(event_type)
    }

    /// Returns `true` if no type has listeners.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_registration_ignored() {
        let mut registry = ListenerRegistry::new();
        let listener = Listener::new(|_| {});

        assert!(registry.add("message", &listener));
        assert!(!registry.add("message", &listener));
        assert_eq!(registry.count("message"), 1);
    }

    #[test]
    fn test_same_listener_under_two_types() {
        let mut registry = ListenerRegistry::new();
        let listener = Listener::new(|_| {});

        registry.add("message", &listener);
        registry.add("update", &listener);
        assert_eq!(registry.count("message"), 1);
        assert_eq!(registry.count("update"), 1);
    }

    #[test]
    fn test_remove_drops_empty_entry() {
        let mut registry = ListenerRegistry::new();
        let listener = Listener::new(|_| {});

        registry.add("message", &listener);
        assert!(registry.contains_type("message"));

        assert!(registry.remove("message", &listener));
        assert!(!registry.contains_type("message"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_keeps_others() {
        let mut registry = ListenerRegistry::new();
        let first = Listener::new(|_| {});
        let second = Listener::new(|_| {});

        registry.add("message", &first);
        registry.add("message", &second);
        registry.remove("message", &first);

        assert_eq!(registry.snapshot("message"), vec![second]);
    }

    #[test]
    fn test_remove_unknown_is_silent() {
        let mut registry = ListenerRegistry::new();
        let listener = Listener::new(|_| {});

        assert!(!registry.remove("nothing", &listener));

        registry.add("message", &Listener::new(|_| {}));
        assert!(!registry.remove("message", &listener));
        assert_eq!(registry.count("message"), 1);
    }

    #[test]
    fn test_snapshot_preserves_order() {
        let mut registry = ListenerRegistry::new();
        let listeners: Vec<Listener> = (0..4).map(|_| Listener::new(|_| {})).collect();
        for listener in &listeners {
            registry.add("tick", listener);
        }

        assert_eq!(registry.snapshot("tick"), listeners);
        assert!(registry.snapshot("other").is_empty());
    }
}
