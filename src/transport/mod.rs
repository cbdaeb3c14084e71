//! Transport boundary.
//!
//! The core never performs network I/O. It asks a [`Transport`] to issue
//! the request and is told about the response through [`Notification`]s.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐   open / set_header / send   ┌─────────────────┐
//! │   EventSource   │─────────────────────────────►│    Transport    │
//! │                 │                              │  (HTTP client)  │
//! │  StreamBuffer   │◄─────────────────────────────│                 │
//! │  EventTarget    │   Progress / Load / Error    └─────────────────┘
//! └─────────────────┘
//! ```
//!
//! Notifications must be delivered one at a time. Each one is handled
//! synchronously, including every dispatch it causes.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `recording` | In-memory transport that records requests |
//! | `channel` | Channel-backed transport and async notification pump |

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::error::Result;
use crate::source::{Method, Payload};

// ============================================================================
// Submodules
// ============================================================================

/// Channel-backed transport and notification pump.
pub mod channel;

/// Request-recording transport.
pub mod recording;

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::{ChannelTransport, NotificationPump, PumpHandle, TransportRequest, drive};
pub use recording::{RecordingTransport, TransportCall};

// ============================================================================
// Transport
// ============================================================================

/// Request side of the streaming HTTP exchange.
///
/// Methods take `&self`; implementations hold their own interior state.
/// `abort` may report back synchronously through
/// [`EventSource::handle_abort`](crate::EventSource::handle_abort).
pub trait Transport: Send + Sync {
    /// Prepares a request.
    fn open(&self, method: &Method, url: &Url) -> Result<()>;

    /// Adds a request header. Called once per header, after `open`.
    fn set_header(&self, name: &str, value: &str) -> Result<()>;

    /// Sets whether cross-origin credentials are included.
    fn set_credentials(&self, with_credentials: bool) -> Result<()>;

    /// Sends the request with an optional body.
    fn send(&self, payload: Option<&Payload>) -> Result<()>;

    /// Cancels the request in flight.
    fn abort(&self);
}

// ============================================================================
// Notification
// ============================================================================

/// Response-side notification delivered to the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// More of the body arrived. `text` is cumulative.
    Progress {
        /// Whole response text received so far.
        text: String,
        /// HTTP status code.
        status: u16,
    },

    /// The body is complete.
    Load {
        /// Final cumulative response text.
        text: String,
    },

    /// The request changed state.
    ReadyStateChange {
        /// `true` once the request is fully done.
        done: bool,
    },

    /// Network failure.
    Error {
        /// Response text received before the failure, if any.
        text: Option<String>,
    },

    /// The request was aborted.
    Abort,
}

impl Notification {
    /// Returns `true` for notifications that end an attempt.
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Load { .. } | Self::Error { .. } | Self::Abort)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(Notification::Abort.is_terminal());
        assert!(Notification::Error { text: None }.is_terminal());
        assert!(Notification::Load { text: String::new() }.is_terminal());
        assert!(!Notification::ReadyStateChange { done: true }.is_terminal());
        assert!(
            !Notification::Progress {
                text: String::new(),
                status: 200
            }
            .is_terminal()
        );
    }
}
