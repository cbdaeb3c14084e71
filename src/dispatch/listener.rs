//! Callback references.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::protocol::Event;

// ============================================================================
// Types
// ============================================================================

/// Shared callback signature.
type Callback = dyn Fn(&mut Event) + Send + Sync;

/// Primary handlers share the listener representation.
pub type Handler = Listener;

// ============================================================================
// Listener
// ============================================================================

/// A reference-counted event callback.
///
/// Equality is identity: two `Listener`s are equal when they are clones of
/// the same allocation, which is how the registry de-duplicates and removes
/// them. Keep a clone around to unregister later.
///
/// # Example
///
/// ```ignore
/// let listener = Listener::new(|event| println!("{:?}", event.data()));
/// source.add_event_listener("message", &listener);
/// source.remove_event_listener("message", &listener);
/// ```
#[derive(Clone)]
pub struct Listener(Arc<Callback>);

impl Listener {
    /// Wraps a closure.
    #[must_use]
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&mut Event) + Send + Sync + 'static,
    {
        Self(Arc::new(callback))
    }

    /// Invokes the callback.
    #[inline]
    pub fn call(&self, event: &mut Event) {
        (self.0)(event);
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_is_equal() {
        let listener = Listener::new(|_| {});
        assert_eq!(listener, listener.clone());
    }

    #[test]
    fn test_identical_closures_are_distinct() {
        let a = Listener::new(|_| {});
        let b = Listener::new(|_| {});
        assert_ne!(a, b);
    }

    #[test]
    fn test_call_mutates_event() {
        let listener = Listener::new(Event::prevent_default);
        let mut event = Event::open();
        listener.call(&mut event);
        assert!(event.default_prevented());
    }
}
