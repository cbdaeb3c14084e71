//! Listener registration and event dispatch.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Listener`] | Shared callback, compared by identity |
//! | [`ListenerRegistry`] | Ordered listener lists per event name |
//! | [`HandlerSlot`] / [`HandlerSlots`] | Primary handler table |
//! | [`EventTarget`] | Registry + handlers + dispatch |

// ============================================================================
// Submodules
// ============================================================================

/// Callback references.
pub mod listener;

/// Per-type listener lists.
pub mod registry;

/// Primary handler table.
pub mod slots;

/// Dispatch.
pub mod target;

// ============================================================================
// Re-exports
// ============================================================================

pub use listener::{Handler, Listener};
pub use registry::ListenerRegistry;
pub use slots::{HandlerSlot, HandlerSlots};
pub use target::EventTarget;
