//! Connection lifecycle state.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// ReadyState
// ============================================================================

/// Lifecycle stage of a connection attempt.
///
/// Forward-only within one attempt:
/// `Initializing → Connecting → Open|Closed → Closed`.
/// A new attempt re-enters `Connecting` from `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i8)]
pub enum ReadyState {
    /// Constructed, no attempt started.
    Initializing = -1,
    /// Request issued, no data yet.
    Connecting = 0,
    /// First successful data received.
    Open = 1,
    /// Attempt over.
    Closed = 2,
}

impl ReadyState {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_i8(self) -> i8 {
        self as i8
    }

    /// Returns `true` while an attempt is in flight.
    #[inline]
    #[must_use]
    pub const fn is_streaming(self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }

    /// Returns `true` if [`EventSource::stream`](crate::EventSource::stream)
    /// may start a new attempt from this state.
    #[inline]
    #[must_use]
    pub const fn can_start(self) -> bool {
        matches!(self, Self::Initializing | Self::Closed)
    }
}

impl TryFrom<i8> for ReadyState {
    type Error = Error;

    fn try_from(code: i8) -> Result<Self> {
        match code {
            -1 => Ok(Self::Initializing),
            0 => Ok(Self::Connecting),
            1 => Ok(Self::Open),
            2 => Ok(Self::Closed),
            other => Err(Error::invalid_argument(format!(
                "Unknown ready state code: {other}"
            ))),
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initializing => "INITIALIZING",
            Self::Connecting => "CONNECTING",
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Tests
// ============================================================================
