//! Channel-backed transport and notification pump.
//!
//! Bridges the synchronous core to an async HTTP client running elsewhere:
//!
//! - [`ChannelTransport`] forwards request-side calls as
//!   [`TransportRequest`] messages.
//! - [`NotificationPump`] runs a tokio loop applying incoming
//!   [`Notification`]s to an [`EventSource`] strictly one at a time.
//!
//! # Event Loop
//!
//! The pump selects between:
//!
//! - Notifications from the HTTP side
//! - Commands from [`PumpHandle`] (shutdown)
//!
//! It stops on shutdown or when every notification sender is gone.

// ============================================================================
// Imports
// ============================================================================

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};
use crate::source::{EventSource, Method, Payload};

use super::{Notification, Transport};

// ============================================================================
// TransportRequest
// ============================================================================

/// Request-side call forwarded by [`ChannelTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum TransportRequest {
    /// Prepare a request.
    Open {
        /// Request method.
        method: Method,
        /// Target URL.
        url: Url,
    },
    /// Add a header.
    Header {
        /// Header name.
        name: String,
        /// Header value.
        value: String,
    },
    /// Set the credentials mode.
    Credentials(bool),
    /// Send with an optional body.
    Send(Option<Payload>),
    /// Cancel the request.
    Abort,
}

// ============================================================================
// ChannelTransport
// ============================================================================

/// Transport that forwards every call over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    request_tx: mpsc::UnboundedSender<TransportRequest>,
}

impl ChannelTransport {
    /// Creates the transport and the receiver the HTTP side reads from.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TransportRequest>) {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        (Self { request_tx }, request_rx)
    }

    fn forward(&self, request: TransportRequest) -> Result<()> {
        self.request_tx
            .send(request)
            .map_err(|_| Error::ConnectionClosed)
    }
}

impl Transport for ChannelTransport {
    fn open(&self, method: &Method, url: &Url) -> Result<()> {
        self.forward(TransportRequest::Open {
            method: method.clone(),
            url: url.clone(),
        })
    }

    fn set_header(&self, name: &str, value: &str) -> Result<()> {
        self.forward(TransportRequest::Header {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    fn set_credentials(&self, with_credentials: bool) -> Result<()> {
        self.forward(TransportRequest::Credentials(with_credentials))
    }

    fn send(&self, payload: Option<&Payload>) -> Result<()> {
        self.forward(TransportRequest::Send(payload.cloned()))
    }

    fn abort(&self) {
        if self.forward(TransportRequest::Abort).is_err() {
            trace!("Abort not forwarded, request side already gone");
        }
    }
}

// ============================================================================
// PumpCommand
// ============================================================================

/// Internal commands for the pump loop.
#[derive(Debug)]
enum PumpCommand {
    /// Stop the loop.
    Shutdown,
}

// ============================================================================
// PumpHandle
// ============================================================================

/// Sending side of a [`NotificationPump`].
///
/// Cheap to clone; hand one to the HTTP client.
#[derive(Debug, Clone)]
pub struct PumpHandle {
    notification_tx: mpsc::UnboundedSender<Notification>,
    command_tx: mpsc::UnboundedSender<PumpCommand>,
}

impl PumpHandle {
    /// Queues a notification.
    ///
    /// # Errors
    ///
    /// [`Error::ConnectionClosed`] if the pump has stopped.
    pub fn notify(&self, notification: Notification) -> Result<()> {
        self.notification_tx
            .send(notification)
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Queues a progress notification.
    pub fn progress(&self, text: impl Into<String>, status: u16) -> Result<()> {
        self.notify(Notification::Progress {
            text: text.into(),
            status,
        })
    }

    /// Queues a load notification.
    pub fn load(&self, text: impl Into<String>) -> Result<()> {
        self.notify(Notification::Load { text: text.into() })
    }

    /// Stops the pump. Notifications still queued are dropped.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(PumpCommand::Shutdown);
    }
}

// ============================================================================
// NotificationPump
// ============================================================================

/// Async loop applying notifications to one source.
pub struct NotificationPump {
    source: EventSource,
    notification_rx: mpsc::UnboundedReceiver<Notification>,
    command_rx: mpsc::UnboundedReceiver<PumpCommand>,
}

impl NotificationPump {
    /// Creates a pump for `source` and the handle feeding it.
    #[must_use]
    pub fn new(source: EventSource) -> (Self, PumpHandle) {
        let (notification_tx, notification_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let pump = Self {
            source,
            notification_rx,
            command_rx,
        };
        let handle = PumpHandle {
            notification_tx,
            command_tx,
        };

        (pump, handle)
    }

    /// Runs until shutdown or until every handle is dropped.
    ///
    /// Returns the number of notifications applied.
    pub async fn run(mut self) -> usize {
        let mut applied = 0;

        loop {
            tokio::select! {
                biased;

                command = self.command_rx.recv() => {
                    match command {
                        Some(PumpCommand::Shutdown) => {
                            debug!(source = %self.source.id(), "Shutdown command received");
                            break;
                        }
                        // Handles dropped; apply what is still queued.
                        None => {
                            applied += self.drain().await;
                            break;
                        }
                    }
                }

                notification = self.notification_rx.recv() => {
                    match notification {
                        Some(notification) => {
                            apply(&self.source, notification);
                            applied += 1;
                        }
                        None => {
                            debug!(source = %self.source.id(), "Notification channel closed");
                            break;
                        }
                    }
                }
            }
        }

        debug!(source = %self.source.id(), applied, "Notification pump terminated");
        applied
    }

    /// Applies the remaining notifications once no command can arrive.
    async fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Some(notification) = self.notification_rx.recv().await {
            apply(&self.source, notification);
            applied += 1;
        }
        applied
    }
}

// ============================================================================
// drive
// ============================================================================

/// Applies every notification from `notifications` to `source` in order.
///
/// Returns the number of notifications applied.
pub async fn drive<S>(source: &EventSource, notifications: S) -> usize
where
    S: Stream<Item = Notification>,
{
    let mut notifications = std::pin::pin!(notifications);
    let mut applied = 0;

    while let Some(notification) = notifications.next().await {
        apply(source, notification);
        applied += 1;
    }

    applied
}

/// Applies one notification, logging when it ends the attempt.
fn apply(source: &EventSource, notification: Notification) {
    let terminal = notification.is_terminal();
    source.notify(notification);

    if terminal {
        debug!(
            source = %source.id(),
            state = %source.ready_state(),
            live = source.is_live(),
            "Terminal notification applied"
        );
    }
}

// ============================================================================
// Tests
// ============================================================================
