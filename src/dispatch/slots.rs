//! Primary handler slots.
//!
//! Each recognized event type owns one slot; every server-specified type
//! shares the [`HandlerSlot::Custom`] slot. The slot for an event is found
//! by matching on its [`EventType`], never by building a name.

// ============================================================================
// Imports
// ============================================================================

use crate::protocol::EventType;

use super::listener::Handler;

// ============================================================================
// Constants
// ============================================================================

/// Number of slots in the table.
const SLOT_COUNT: usize = 7;

// ============================================================================
// HandlerSlot
// ============================================================================

/// A primary handler slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerSlot {
    /// `open` events.
    Open,
    /// `message` events.
    Message,
    /// `load` events.
    Load,
    /// `error` events.
    Error,
    /// `abort` events.
    Abort,
    /// `readystatechange` events.
    ReadyStateChange,
    /// Every server-specified type.
    Custom,
}

impl HandlerSlot {
    /// All slots, in table order.
    pub const ALL: [Self; SLOT_COUNT] = [
        Self::Open,
        Self::Message,
        Self::Load,
        Self::Error,
        Self::Abort,
        Self::ReadyStateChange,
        Self::Custom,
    ];

    /// Returns the slot consulted for `event_type`.
    #[must_use]
    pub fn for_type(event_type: &EventType) -> Self {
        match event_type {
            EventType::Open => Self::Open,
            EventType::Message => Self::Message,
            EventType::Load => Self::Load,
            EventType::Error => Self::Error,
            EventType::Abort => Self::Abort,
            EventType::ReadyStateChange => Self::ReadyStateChange,
            EventType::Custom(_) => Self::Custom,
        }
    }

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

// ============================================================================
// HandlerSlots
// ============================================================================

/// Table of primary handlers, one per [`HandlerSlot`].
#[derive(Debug, Default, Clone)]
pub struct HandlerSlots {
    table: [Option<Handler>; SLOT_COUNT],
}

impl HandlerSlots {
    /// Creates an empty table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs or clears the handler for `slot`, returning the previous one.
    pub fn set(&mut self, slot: HandlerSlot, handler: Option<Handler>) -> Option<Handler> {
        std::mem::replace(&mut self.table[slot.index()], handler)
    }

    /// Returns the handler for `slot`.
    #[inline]
    #[must_use]
    pub fn get(&self, slot: HandlerSlot) -> Option<&Handler> {
        self.table[slot.index()].as_ref()
    }
}

// ============================================================================
// Tests
// ============================================================================
