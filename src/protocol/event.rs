//! Event types delivered to listeners.
//!
//! Every dispatch builds a fresh [`Event`]. Its payload is one of a closed
//! set of shapes chosen when the event is constructed:
//!
//! | Shape | Produced by |
//! |-------|-------------|
//! | [`EventPayload::Open`] | first successful progress notification |
//! | [`EventPayload::Message`] | every record parsed from the stream |
//! | [`EventPayload::Error`] | non-success status or transport failure |
//! | [`EventPayload::Abort`] | transport abort |
//! | [`EventPayload::Load`] | end of the response body |
//! | [`EventPayload::ReadyStateChange`] | every lifecycle transition |
//!
//! Records always carry the `Message` shape, even when the server names
//! them `error` or `open`.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::identifiers::SourceId;
use crate::source::ReadyState;

// ============================================================================
// EventType
// ============================================================================

/// Name of an event, as used for listener registration.
///
/// Recognized names map to dedicated variants, everything else is
/// [`EventType::Custom`]. Build values through [`EventType::from_name`] (or
/// the `From` impls) so a recognized name never ends up as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    /// `open`
    Open,
    /// `message`
    Message,
    /// `load`
    Load,
    /// `error`
    Error,
    /// `abort`
    Abort,
    /// `readystatechange`
    ReadyStateChange,
    /// Any server-specified name.
    Custom(String),
}

impl EventType {
    /// Maps an event name to its type.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "open" => Self::Open,
            "message" => Self::Message,
            "load" => Self::Load,
            "error" => Self::Error,
            "abort" => Self::Abort,
            "readystatechange" => Self::ReadyStateChange,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Returns the event name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "open",
            Self::Message => "message",
            Self::Load => "load",
            Self::Error => "error",
            Self::Abort => "abort",
            Self::ReadyStateChange => "readystatechange",
            Self::Custom(name) => name,
        }
    }

    /// Returns `true` for server-specified names.
    #[inline]
    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl From<&str> for EventType {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// EventPayload
// ============================================================================

/// Data attached to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    /// Connection opened.
    Open,

    /// A record from the stream.
    Message {
        /// Value of the record's `id` field, if it had one.
        id: Option<String>,
        /// Accumulated `data` lines joined with `\n`.
        data: String,
        /// Most recent id seen on this source, including this record's.
        last_event_id: String,
        /// Raw `retry` value. Never acted upon.
        retry: Option<String>,
    },

    /// Transport failure.
    Error {
        /// Response text received before the failure.
        data: String,
    },

    /// Transport aborted.
    Abort,

    /// Response body complete.
    Load,

    /// Lifecycle transition.
    ReadyStateChange {
        /// State just entered.
        state: ReadyState,
    },
}

// ============================================================================
// Event
// ============================================================================

/// An event as seen by handlers and listeners.
///
/// Handlers receive `&mut Event` and may call [`Event::prevent_default`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    event_type: EventType,
    payload: EventPayload,
    source: Option<SourceId>,
    default_prevented: bool,
}

// ============================================================================
// Event - Constructors
// ============================================================================

impl Event {
    /// Creates an event with an explicit type and payload.
    #[must_use]
    pub fn new(event_type: impl Into<EventType>, payload: EventPayload) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            source: None,
            default_prevented: false,
        }
    }

    /// Creates an `open` event.
    #[inline]
    #[must_use]
    pub fn open() -> Self {
        Self::new(EventType::Open, EventPayload::Open)
    }

    /// Creates a message-shaped event of any type.
    #[must_use]
    pub fn message(
        event_type: impl Into<EventType>,
        id: Option<String>,
        data: impl Into<String>,
        last_event_id: impl Into<String>,
    ) -> Self {
        Self::new(
            event_type,
            EventPayload::Message {
                id,
                data: data.into(),
                last_event_id: last_event_id.into(),
                retry: None,
            },
        )
    }

    /// Creates an `error` event.
    #[inline]
    #[must_use]
    pub fn error(data: impl Into<String>) -> Self {
        Self::new(EventType::Error, EventPayload::Error { data: data.into() })
    }

    /// Creates an `abort` event.
    #[inline]
    #[must_use]
    pub fn abort() -> Self {
        Self::new(EventType::Abort, EventPayload::Abort)
    }

    /// Creates a `load` event.
    #[inline]
    #[must_use]
    pub fn load() -> Self {
        Self::new(EventType::Load, EventPayload::Load)
    }

    /// Creates a `readystatechange` event.
    #[inline]
    #[must_use]
    pub fn ready_state_change(state: ReadyState) -> Self {
        Self::new(
            EventType::ReadyStateChange,
            EventPayload::ReadyStateChange { state },
        )
    }
}

// ============================================================================
// Event - Accessors
// ============================================================================

impl Event {
    /// Returns the event type.
    #[inline]
    #[must_use]
    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    /// Returns the event name.
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.event_type.as_str()
    }

    /// Returns the payload.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// Returns the data of message and error events.
    #[must_use]
    pub fn data(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Message { data, .. } | EventPayload::Error { data } => Some(data.as_str()),
            _ => None,
        }
    }

    /// Returns the record id of a message event.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Message { id, .. } => id.as_deref(),
            _ => None,
        }
    }

    /// Returns the last event id seen when a message event was parsed.
    #[must_use]
    pub fn last_event_id(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Message { last_event_id, .. } => Some(last_event_id.as_str()),
            _ => None,
        }
    }

    /// Returns the `retry` value of a message event, if it is a number.
    #[must_use]
    pub fn retry(&self) -> Option<u64> {
        match &self.payload {
            EventPayload::Message { retry, .. } => retry.as_deref()?.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns the new state of a `readystatechange` event.
    #[must_use]
    pub fn ready_state(&self) -> Option<ReadyState> {
        match self.payload {
            EventPayload::ReadyStateChange { state } => Some(state),
            _ => None,
        }
    }

    /// Returns the id of the source that dispatched this event.
    #[inline]
    #[must_use]
    pub fn source(&self) -> Option<SourceId> {
        self.source
    }

    /// Returns `true` once any handler called [`Event::prevent_default`].
    #[inline]
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Marks the event as cancelled.
    #[inline]
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Stamps the dispatching source.
    #[inline]
    pub(crate) fn set_source(&mut self, source: SourceId) {
        self.source = Some(source);
    }

    /// Attaches the raw `retry` value of a message event.
    pub(crate) fn with_retry(mut self, value: Option<String>) -> Self {
        if let EventPayload::Message { retry, .. } = &mut self.payload {
            *retry = value;
        }
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
