//! Error types for the event source.
//!
//! This module defines all error types used throughout the crate.
//!
//! Malformed stream content never produces an error: unknown fields, stray
//! colons and broken lines are dropped silently by the parser. Errors are
//! reserved for configuration mistakes and transport failures.
//!
//! # Usage
//!
//! ```ignore
//! use sse_source::{EventSource, Result};
//!
//! fn example() -> Result<()> {
//!     let source = EventSource::builder()
//!         .url("https://example.com/events")
//!         .start(false)
//!         .build(transport)?;
//!     source.stream()?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidArgument`], [`Error::Url`] |
//! | Transport | [`Error::Transport`], [`Error::ConnectionClosed`] |
//! | External | [`Error::Json`], [`Error::Base64`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use base64::DecodeError;
use thiserror::Error;
use url::ParseError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when source configuration is incomplete or inconsistent.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Invalid argument passed to a builder or payload constructor.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// Target address could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(#[from] ParseError),

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// The transport rejected an operation.
    ///
    /// Returned by [`Transport`](crate::transport::Transport) implementations
    /// when a request cannot be opened or sent.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The channel to the transport side is gone.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 decoding error.
    #[error("Base64 error: {0}")]
    Base64(#[from] DecodeError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a configuration error.
    #[inline]
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::InvalidArgument { .. } | Self::Url(_)
        )
    }

    /// Returns `true` if this is a transport error.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::ConnectionClosed)
    }
}

// ============================================================================
// Tests
// ============================================================================
