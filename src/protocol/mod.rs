//! Server-Sent Events wire handling.
//!
//! # Wire Format
//!
//! Records are separated by a blank line (`\r\n\r\n`, `\r\r` or `\n\n`).
//! Each record is a sequence of `field: value` lines:
//!
//! ```text
//! id: 5
//! event: update
//! data: first line
//! data: second line
//! : comments start with a colon
//!
//! ```
//!
//! Recognized fields are `id`, `event`, `data` and `retry`.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `assembler` | Splits cumulative response text into records |
//! | `parser` | Extracts fields from one record |
//! | `event` | Event types handed to listeners |

// ============================================================================
// Submodules
// ============================================================================

/// Incremental record assembly.
pub mod assembler;

/// Event types.
pub mod event;

/// Field-level record parsing.
pub mod parser;

// ============================================================================
// Re-exports
// ============================================================================

pub use assembler::StreamBuffer;
pub use event::{Event, EventPayload, EventType};
pub use parser::{DEFAULT_EVENT_TYPE, ParsedRecord, parse_record};
