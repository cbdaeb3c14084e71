//! Event target: registry plus primary handlers plus dispatch.
//!
//! # Dispatch Order
//!
//! 1. The primary handler for the event's slot, if any.
//! 2. If it called `prevent_default`, dispatch stops and returns `false`.
//! 3. Every listener registered for the event's name, in registration
//!    order. A listener cancelling the event does not stop the rest.
//!
//! The return value is `false` whenever anything cancelled the event.
//!
//! No lock is held while a callback runs, so callbacks may register or
//! remove listeners (taking effect on the next dispatch) and may call back
//! into the owning source.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::identifiers::SourceId;
use crate::protocol::{Event, EventType};

use super::listener::{Handler, Listener};
use super::registry::ListenerRegistry;
use super::slots::{HandlerSlot, HandlerSlots};

// ============================================================================
// EventTarget
// ============================================================================

/// Listener registry and handler table for one source.
#[derive(Debug)]
pub struct EventTarget {
    /// Identifier stamped on every dispatched event.
    owner: SourceId,
    /// Log dispatched events at `debug` instead of `trace`.
    verbose: bool,
    registry: Mutex<ListenerRegistry>,
    slots: Mutex<HandlerSlots>,
}

impl EventTarget {
    /// Creates a target owned by `owner`.
    #[must_use]
    pub fn new(owner: SourceId, verbose: bool) -> Self {
        Self {
            owner,
            verbose,
            registry: Mutex::new(ListenerRegistry::new()),
            slots: Mutex::new(HandlerSlots::new()),
        }
    }

    /// Returns the owning source id.
    #[inline]
    #[must_use]
    pub fn owner(&self) -> SourceId {
        self.owner
    }

    /// Registers `listener` for `event_type` unless already registered.
    pub fn add_event_listener(&self, event_type: impl Into<EventType>, listener: &Listener) {
        let event_type = event_type.into();
        let added = self.registry.lock().add(event_type.as_str(), listener);
        trace!(source = %self.owner, %event_type, added, "add_event_listener");
    }

    /// Unregisters `listener` from `event_type`. Unknown pairs are ignored.
    pub fn remove_event_listener(&self, event_type: impl Into<EventType>, listener: &Listener) {
        let event_type = event_type.into();
        let removed = self.registry.lock().remove(event_type.as_str(), listener);
        trace!(source = %self.owner, %event_type, removed, "remove_event_listener");
    }

    /// Returns the number of listeners registered for `event_type`.
    #[must_use]
    pub fn listener_count(&self, event_type: impl Into<EventType>) -> usize {
        self.registry.lock().count(event_type.into().as_str())
    }

    /// Returns `true` if `event_type` has a registry entry.
    #[must_use]
    pub fn has_listeners(&self, event_type: impl Into<EventType>) -> bool {
        self.registry.lock().contains_type(event_type.into().as_str())
    }

    /// Installs or clears the primary handler for `slot`.
    ///
    /// Returns the handler previously installed.
    pub fn set_handler(&self, slot: HandlerSlot, handler: Option<Handler>) -> Option<Handler> {
        self.slots.lock().set(slot, handler)
    }

    /// Returns the primary handler for `slot`.
    #[must_use]
    pub fn handler(&self, slot: HandlerSlot) -> Option<Handler> {
        self.slots.lock().get(slot).cloned()
    }

    /// Delivers `event` to its primary handler and listeners.
    ///
    /// Returns `true` for `None`, otherwise `false` if any callback
    /// cancelled the event.
    pub fn dispatch_event(&self, event: Option<Event>) -> bool {
        let Some(mut event) = event else {
            return true;
        };

        event.set_source(self.owner);
        self.log_dispatch(&event);

        let slot = HandlerSlot::for_type(event.event_type());
        if let Some(handler) = self.handler(slot) {
            handler.call(&mut event);
            if event.default_prevented() {
                trace!(source = %self.owner, event_type = %event.event_type(), "Cancelled by primary handler");
                return false;
            }
        }

        let listeners = self.registry.lock().snapshot(event.type_name());
        for listener in &listeners {
            listener.call(&mut event);
        }

        !event.default_prevented()
    }

    fn log_dispatch(&self, event: &Event) {
        if self.verbose {
            debug!(
                source = %self.owner,
                event_type = %event.event_type(),
                data = ?event.data(),
                id = ?event.id(),
                "Dispatching event"
            );
        } else {
            trace!(source = %self.owner, event_type = %event.event_type(), "Dispatching event");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    /// Listener that appends `label` to a shared log.
    fn recorder(log: &Arc<Mutex<Vec<String>>>, label: &str) -> Listener {
        let log = Arc::clone(log);
        let label = label.to_string();
        Listener::new(move |_| log.lock().push(label.clone()))
    }

    fn target() -> EventTarget {
        EventTarget::new(SourceId::generate(), false)
    }

    #[test]
    fn test_dispatch_none_is_true() {
        assert!(target().dispatch_event(None));
    }

    #[test]
    fn test_duplicate_listener_runs_once() {
        let target = target();
        let log = Arc::new(Mutex::new(Vec::new()));
        let listener = recorder(&log, "a");

        target.add_event_listener("message", &listener);
        target.add_event_listener("message", &listener);
        assert_eq!(target.listener_count("message"), 1);

        assert!(target.dispatch_event(Some(Event::message("message", None, "x", ""))));
        assert_eq!(*log.lock(), vec!["a"]);
    }

    #[test]
    fn test_remove_drops_type_entry() {
        let target = target();
        let listener = Listener::new(|_| {});

        target.add_event_listener("message", &listener);
        assert!(target.has_listeners("message"));

        target.remove_event_listener("message", &listener);
        assert!(!target.has_listeners("message"));
    }

    #[test]
    fn test_listener_order() {
        let target = target();
        let log = Arc::new(Mutex::new(Vec::new()));

        target.add_event_listener("tick", &recorder(&log, "1"));
        target.add_event_listener("tick", &recorder(&log, "2"));
        target.add_event_listener("tick", &recorder(&log, "3"));
        target.add_event_listener("tock", &recorder(&log, "other"));

        target.dispatch_event(Some(Event::message("tick", None, "", "")));
        assert_eq!(*log.lock(), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_cancel_does_not_stop_listeners() {
        let target = target();
        let log = Arc::new(Mutex::new(Vec::new()));

        let log_first = Arc::clone(&log);
        let cancelling = Listener::new(move |event| {
            log_first.lock().push("first".to_string());
            event.prevent_default();
        });

        target.add_event_listener("message", &cancelling);
        target.add_event_listener("message", &recorder(&log, "second"));

        let result = target.dispatch_event(Some(Event::message("message", None, "", "")));
        assert!(!result);
        assert_eq!(*log.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_primary_handler_runs_first() {
        let target = target();
        let log = Arc::new(Mutex::new(Vec::new()));

        target.add_event_listener("open", &recorder(&log, "listener"));
        target.set_handler(HandlerSlot::Open, Some(recorder(&log, "handler")));

        assert!(target.dispatch_event(Some(Event::open())));
        assert_eq!(*log.lock(), vec!["handler", "listener"]);
    }

    #[test]
    fn test_primary_handler_cancel_stops_dispatch() {
        let target = target();
        let log = Arc::new(Mutex::new(Vec::new()));

        target.add_event_listener("error", &recorder(&log, "listener"));
        target.set_handler(HandlerSlot::Error, Some(Listener::new(Event::prevent_default)));

        assert!(!target.dispatch_event(Some(Event::error("boom"))));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_custom_slot_handles_server_types() {
        let target = target();
        let log = Arc::new(Mutex::new(Vec::new()));
        target.set_handler(HandlerSlot::Custom, Some(recorder(&log, "custom")));
        target.set_handler(HandlerSlot::Message, Some(recorder(&log, "message")));

        target.dispatch_event(Some(Event::message("update", None, "", "")));
        target.dispatch_event(Some(Event::message("ping", None, "", "")));
        target.dispatch_event(Some(Event::message("message", None, "", "")));

        assert_eq!(*log.lock(), vec!["custom", "custom", "message"]);
    }

    #[test]
    fn test_source_is_stamped() {
        let target = target();
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);

        target.add_event_listener(
            "abort",
            &Listener::new(move |event| *seen_clone.lock() = event.source()),
        );
        target.dispatch_event(Some(Event::abort()));

        assert_eq!(*seen.lock(), Some(target.owner()));
    }

    #[test]
    fn test_listener_may_mutate_registry() {
        let target = Arc::new(target());
        let log = Arc::new(Mutex::new(Vec::new()));
        let late = recorder(&log, "late");

        let target_clone = Arc::clone(&target);
        let late_clone = late.clone();
        let adder = Listener::new(move |_| target_clone.add_event_listener("message", &late_clone));
        target.add_event_listener("message", &adder);

        target.dispatch_event(Some(Event::message("message", None, "", "")));
        assert!(log.lock().is_empty());

        target.dispatch_event(Some(Event::message("message", None, "", "")));
        assert_eq!(*log.lock(), vec!["late"]);
    }
}
