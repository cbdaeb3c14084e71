//! In-memory transport.
//!
//! Records every request-side call so the exchange can be inspected.
//! Response notifications are fed to the source by the caller.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use url::Url;

use crate::error::{Error, Result};
use crate::source::{Method, Payload};

use super::Transport;

// ============================================================================
// TransportCall
// ============================================================================

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    /// `open(method, url)`
    Open {
        /// Request method.
        method: Method,
        /// Target URL.
        url: Url,
    },
    /// `set_header(name, value)`
    SetHeader {
        /// Header name.
        name: String,
        /// Header value.
        value: String,
    },
    /// `set_credentials(flag)`
    SetCredentials(bool),
    /// `send(payload)`
    Send(Option<Payload>),
    /// `abort()`
    Abort,
}

// ============================================================================
// RecordingTransport
// ============================================================================

/// Transport that records calls and optionally fails `send`.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<TransportCall>>,
    send_failure: Mutex<Option<String>>,
}

impl RecordingTransport {
    /// Creates a transport that accepts everything.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following `send` fail with `message`.
    pub fn fail_sends(&self, message: impl Into<String>) {
        *self.send_failure.lock() = Some(message.into());
    }

    /// Returns the calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().clone()
    }

    /// Returns the recorded headers in call order.
    #[must_use]
    pub fn headers(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                TransportCall::SetHeader { name, value } => Some((name.clone(), value.clone())),
                _ => None,
            })
            .collect()
    }

    /// Returns how many times `send` was called.
    #[must_use]
    pub fn send_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, TransportCall::Send(_)))
            .count()
    }

    /// Returns how many times `abort` was called.
    #[must_use]
    pub fn abort_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, TransportCall::Abort))
            .count()
    }

    /// Forgets recorded calls.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().push(call);
    }
}

impl Transport for RecordingTransport {
    fn open(&self, method: &Method, url: &Url) -> Result<()> {
        self.record(TransportCall::Open {
            method: method.clone(),
            url: url.clone(),
        });
        Ok(())
    }

    fn set_header(&self, name: &str, value: &str) -> Result<()> {
        self.record(TransportCall::SetHeader {
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn set_credentials(&self, with_credentials: bool) -> Result<()> {
        self.record(TransportCall::SetCredentials(with_credentials));
        Ok(())
    }

    fn send(&self, payload: Option<&Payload>) -> Result<()> {
        self.record(TransportCall::Send(payload.cloned()));
        match self.send_failure.lock().as_ref() {
            Some(message) => Err(Error::transport(message.clone())),
            None => Ok(()),
        }
    }

    fn abort(&self) {
        self.record(TransportCall::Abort);
    }
}

// ============================================================================
// Tests
// ============================================================================
