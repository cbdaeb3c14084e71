//! SSE Source - Transport-agnostic Server-Sent Events client core.
//!
//! This library turns a streamed HTTP response into typed events. Unlike a
//! browser `EventSource`, requests may use any method, custom headers and a
//! request body.
//!
//! # Architecture
//!
//! The core never touches the network:
//!
//! - **Transport**: issues the request, reports response progress
//! - **Core**: assembles records, parses fields, dispatches events
//!
//! Key design principles:
//!
//! - Each [`EventSource`] owns one attempt at a time, restartable after close
//! - Response text arrives cumulatively; only the new suffix is processed
//! - Listeners are compared by identity, run in registration order
//! - No lock is held while a callback runs
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use sse_source::{EventSource, Listener, Payload, RecordingTransport, Result};
//!
//! fn main() -> Result<()> {
//!     let transport = Arc::new(RecordingTransport::new());
//!
//!     let source = EventSource::builder()
//!         .url("https://example.com/events")
//!         .header("Authorization", "Bearer token")
//!         .payload(Payload::text("{\"topic\":\"prices\"}"))
//!         .listener("price", Listener::new(|event| {
//!             println!("price: {:?}", event.data());
//!         }))
//!         .build(transport)?;
//!
//!     // Normally called by the HTTP client as the body streams in
//!     source.handle_progress("event: price\ndata: 101.5\n\n", 200);
//!     source.close();
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`dispatch`] | Listener registry, primary handlers, [`EventTarget`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Record assembly, field parsing, [`Event`] |
//! | [`source`] | [`EventSource`] state machine and configuration |
//! | [`transport`] | [`Transport`] boundary and ready-made transports |

// ============================================================================
// Modules
// ============================================================================

/// Listener registration and dispatch.
///
/// - [`Listener`] - Shared callback compared by identity
/// - [`EventTarget`] - Registry plus primary handler slots
pub mod dispatch;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Server-Sent Events wire handling.
///
/// Splits cumulative response text into records and parses their fields.
pub mod protocol;

/// Event source and its configuration.
///
/// Use [`EventSource::builder()`] to create a configured source.
pub mod source;

/// Transport boundary.
///
/// The trait the core drives, the notifications it consumes, and two
/// transports: an in-memory recorder and a channel bridge.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Dispatch types
pub use dispatch::{EventTarget, Handler, HandlerSlot, Listener};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::SourceId;

// Protocol types
pub use protocol::{Event, EventPayload, EventType, StreamBuffer, parse_record};

// Source types
pub use source::{EventSource, EventSourceBuilder, Method, Payload, ReadyState, SourceOptions};

// Transport types
pub use transport::{
    ChannelTransport, Notification, NotificationPump, PumpHandle, RecordingTransport, Transport,
    TransportCall, TransportRequest,
};
