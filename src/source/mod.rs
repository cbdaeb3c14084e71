//! Event source: configuration, lifecycle and the connection state machine.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `builder` | Fluent configuration and validation |
//! | `core` | [`EventSource`] state machine |
//! | `options` | Request method, body and validated options |
//! | `state` | [`ReadyState`] lifecycle codes |

// ============================================================================
// Submodules
// ============================================================================

/// Source builder.
pub mod builder;

/// Connection state machine.
pub mod core;

/// Request configuration.
pub mod options;

/// Lifecycle state.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::EventSourceBuilder;
pub use self::core::EventSource;
pub use options::{CONTENT_TYPE_HEADER, LAST_EVENT_ID_HEADER, Method, Payload, SourceOptions};
pub use state::ReadyState;
