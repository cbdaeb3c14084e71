//! Event source: the connection state machine.
//!
//! Ties the pieces together. Transport notifications come in through the
//! `handle_*` methods (or [`EventSource::notify`]); text goes through the
//! [`StreamBuffer`], records through [`parse_record`], and events out
//! through the [`EventTarget`].
//!
//! # Transitions
//!
//! | From | Trigger | Events | To |
//! |------|---------|--------|----|
//! | `Initializing`/`Closed` | [`stream`](EventSource::stream) | | `Connecting` |
//! | `Connecting` | first 2xx progress | `open` | `Open` |
//! | `Connecting`/`Open` | non-2xx progress | `error` | `Closed` |
//! | `Connecting`/`Open` | network error | `error` | `Closed` |
//! | `Connecting`/`Open` | abort | `abort` | `Closed` |
//! | any live | load | records, `load` | `Closed` |
//! | `Connecting`/`Open` | request done | | `Closed` |
//! | `Connecting`/`Open` | [`close`](EventSource::close) | | `Closed` |
//!
//! Every state change also dispatches `readystatechange`.
//!
//! An attempt stays *live* from `stream` until load, error, abort or
//! `close`. The request-done notification closes the state but keeps the
//! attempt live, so a load that follows it still flushes the final record.
//! Notifications arriving after the attempt ended are ignored.
//!
//! Calling `stream` while a closed attempt is still live queues the
//! restart: the new request is issued once the old one reports load, error
//! or abort, so its trailing text never leaks into the new attempt.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};
use url::Url;

use crate::dispatch::{EventTarget, Handler, HandlerSlot, Listener};
use crate::error::Result;
use crate::identifiers::SourceId;
use crate::protocol::{Event, EventType, StreamBuffer, parse_record};
use crate::transport::{Notification, Transport};

use super::builder::EventSourceBuilder;
use super::options::{CONTENT_TYPE_HEADER, LAST_EVENT_ID_HEADER, Method, SourceOptions};
use super::state::ReadyState;

// ============================================================================
// Types
// ============================================================================

/// Mutable per-attempt state.
#[derive(Debug)]
struct StreamState {
    ready_state: ReadyState,
    buffer: StreamBuffer,
    /// Kept across attempts.
    last_event_id: String,
    /// Attempt accepts notifications.
    live: bool,
    /// `stream` was called before the live attempt finished.
    restart_pending: bool,
}

/// Shared internals.
struct Inner {
    id: SourceId,
    options: SourceOptions,
    transport: Arc<dyn Transport>,
    target: EventTarget,
    state: Mutex<StreamState>,
}

// ============================================================================
// EventSource
// ============================================================================

/// Streaming event source over a pluggable transport.
///
/// Cheap to clone: clones share the same connection. Callbacks may hold a
/// clone and call [`close`](Self::close) or [`stream`](Self::stream) from
/// inside a dispatch.
///
/// # Example
///
/// ```ignore
/// let source = EventSource::builder()
///     .url("https://example.com/events")
///     .start(false)
///     .build(transport)?;
///
/// source.add_event_listener("update", &Listener::new(|event| {
///     println!("{:?}", event.data());
/// }));
/// source.stream()?;
///
/// // from the transport side:
/// source.handle_progress("event: update\ndata: 1\n\n", 200);
/// ```
#[derive(Clone)]
pub struct EventSource {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSource")
            .field("id", &self.inner.id)
            .field("url", &self.inner.options.url.as_str())
            .field("ready_state", &self.ready_state())
            .finish()
    }
}

// ============================================================================
// EventSource - Construction
// ============================================================================

impl EventSource {
    /// Creates a builder.
    #[inline]
    #[must_use]
    pub fn builder() -> EventSourceBuilder {
        EventSourceBuilder::new()
    }

    /// Creates a source for `url` with default options and starts it.
    ///
    /// # Errors
    ///
    /// See [`EventSourceBuilder::build`].
    pub fn new(url: impl Into<String>, transport: Arc<dyn Transport>) -> Result<Self> {
        Self::builder().url(url).build(transport)
    }

    /// Creates a source from validated options without starting it.
    #[must_use]
    pub fn from_options(options: SourceOptions, transport: Arc<dyn Transport>) -> Self {
        let id = SourceId::generate();
        let target = EventTarget::new(id, options.debug);

        debug!(source = %id, url = %options.url, method = %options.method, "Event source created");

        Self {
            inner: Arc::new(Inner {
                id,
                options,
                transport,
                target,
                state: Mutex::new(StreamState {
                    ready_state: ReadyState::Initializing,
                    buffer: StreamBuffer::new(),
                    last_event_id: String::new(),
                    live: false,
                    restart_pending: false,
                }),
            }),
        }
    }
}

// ============================================================================
// EventSource - Accessors
// ============================================================================

impl EventSource {
    /// Returns this source's identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> SourceId {
        self.inner.id
    }

    /// Returns the target address.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.inner.options.url
    }

    /// Returns the request method.
    #[inline]
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.inner.options.method
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &SourceOptions {
        &self.inner.options
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.inner.state.lock().ready_state
    }

    /// Returns the last event id received, empty if none.
    #[must_use]
    pub fn last_event_id(&self) -> String {
        self.inner.state.lock().last_event_id.clone()
    }

    /// Returns `true` while the current attempt accepts notifications.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.inner.state.lock().live
    }
}

// ============================================================================
// EventSource - Lifecycle
// ============================================================================

impl EventSource {
    /// Starts a new attempt.
    ///
    /// Does nothing while `Connecting` or `Open`. Otherwise resets the
    /// stream buffer, enters `Connecting` and issues the request.
    ///
    /// If the previous request is done but has not delivered its load yet,
    /// the new attempt starts right after that load (or an error or abort).
    ///
    /// # Errors
    ///
    /// The transport error that prevented the request from being sent. The
    /// source has then already dispatched `error` and entered `Closed`. A
    /// queued restart reports its failure only through the `error` event.
    pub fn stream(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if !state.ready_state.can_start() {
                trace!(source = %self.inner.id, state = %state.ready_state, "Already streaming");
                return Ok(());
            }
            if state.live {
                debug!(source = %self.inner.id, "Previous attempt still flushing, restart queued");
                state.restart_pending = true;
                return Ok(());
            }
            state.buffer.reset();
            state.live = true;
        }

        debug!(source = %self.inner.id, url = %self.inner.options.url, "Starting stream");
        self.set_state_if(|_| true, ReadyState::Connecting);

        // a readystatechange callback may have closed us already
        if !self.is_live() || self.ready_state() != ReadyState::Connecting {
            return Ok(());
        }

        if let Err(e) = self.send_request() {
            warn!(source = %self.inner.id, error = %e, "Failed to start request");
            self.fail(String::new());
            return Err(e);
        }

        Ok(())
    }

    /// Ends the current attempt.
    ///
    /// No-op before the first attempt and while `Closed`: a done request
    /// still delivers its final record and `load`. Otherwise aborts the
    /// transport and forces `Closed`. A transport that reports the abort
    /// synchronously causes an `abort` event first.
    ///
    /// Always drops a queued restart.
    pub fn close(&self) {
        {
            let mut state = self.inner.state.lock();
            state.restart_pending = false;
            if !state.ready_state.is_streaming() {
                return;
            }
        }

        debug!(source = %self.inner.id, "Closing stream");
        self.inner.transport.abort();

        self.inner.state.lock().live = false;
        self.set_state_if(|_| true, ReadyState::Closed);
    }

    /// Issues the request through the transport.
    fn send_request(&self) -> Result<()> {
        let options = &self.inner.options;
        let transport = &self.inner.transport;

        transport.open(&options.method, &options.url)?;

        for (name, value) in &options.headers {
            transport.set_header(name, value)?;
        }

        if let Some(content_type) = options.payload.as_ref().and_then(|p| p.content_type())
            && !options.has_header(CONTENT_TYPE_HEADER)
        {
            transport.set_header(CONTENT_TYPE_HEADER, content_type)?;
        }

        let last_event_id = self.last_event_id();
        if !last_event_id.is_empty() && !options.has_header(LAST_EVENT_ID_HEADER) {
            transport.set_header(LAST_EVENT_ID_HEADER, &last_event_id)?;
        }

        transport.set_credentials(options.with_credentials)?;
        transport.send(options.payload.as_ref())
    }
}

// ============================================================================
// EventSource - Transport Notifications
// ============================================================================

impl EventSource {
    /// Applies a notification.
    pub fn notify(&self, notification: Notification) {
        match notification {
            Notification::Progress { text, status } => self.handle_progress(&text, status),
            Notification::Load { text } => self.handle_load(&text),
            Notification::ReadyStateChange { done } => self.handle_ready_state_change(done),
            Notification::Error { text } => self.handle_error(text.as_deref()),
            Notification::Abort => self.handle_abort(),
        }
    }

    /// More response text arrived. `text` is cumulative.
    ///
    /// A non-2xx `status` fails the attempt with `text` as error data.
    pub fn handle_progress(&self, text: &str, status: u16) {
        {
            let state = self.inner.state.lock();
            if !state.live || !state.ready_state.is_streaming() {
                trace!(source = %self.inner.id, status, "Progress after attempt ended, ignoring");
                return;
            }
        }

        if !(200..300).contains(&status) {
            warn!(source = %self.inner.id, status, "Non-success status");
            self.fail(text.to_string());
            return;
        }

        self.ingest(text);
    }

    /// The response body is complete.
    ///
    /// Parses what is left, including the pending tail, dispatches `load`
    /// and ends the attempt.
    pub fn handle_load(&self, text: &str) {
        {
            let state = self.inner.state.lock();
            if !state.live || state.ready_state == ReadyState::Initializing {
                trace!(source = %self.inner.id, "Load after attempt ended, ignoring");
                return;
            }
        }

        if !self.ingest(text) {
            return;
        }

        let tail = self.inner.state.lock().buffer.finish();
        self.dispatch_records(tail);
        if !self.is_live() {
            return;
        }

        debug!(source = %self.inner.id, "Stream complete");
        self.dispatch(Event::load());

        self.inner.state.lock().live = false;
        self.set_state_if(|_| true, ReadyState::Closed);
        self.resume_restart();
    }

    /// The request changed state. `done` closes the state but leaves the
    /// attempt live for a trailing load.
    pub fn handle_ready_state_change(&self, done: bool) {
        if done {
            self.set_state_if(ReadyState::is_streaming, ReadyState::Closed);
        }
    }

    /// Network failure.
    pub fn handle_error(&self, text: Option<&str>) {
        self.fail(text.unwrap_or_default().to_string());
    }

    /// The transport aborted the request.
    pub fn handle_abort(&self) {
        if !self.end_attempt() {
            return;
        }

        debug!(source = %self.inner.id, "Stream aborted");
        self.dispatch(Event::abort());
        self.set_state_if(|_| true, ReadyState::Closed);
        self.resume_restart();
    }

    /// Dispatches `error` and closes, once per attempt.
    fn fail(&self, data: String) {
        if !self.end_attempt() {
            return;
        }

        self.dispatch(Event::error(data));
        self.set_state_if(|_| true, ReadyState::Closed);
        self.resume_restart();
    }

    /// Starts a restart queued while the previous attempt was flushing.
    fn resume_restart(&self) {
        if !std::mem::take(&mut self.inner.state.lock().restart_pending) {
            return;
        }

        if let Err(e) = self.stream() {
            debug!(source = %self.inner.id, error = %e, "Queued restart failed");
        }
    }

    /// Feeds cumulative text into the buffer and dispatches what it
    /// completes. Returns `false` if the attempt ended meanwhile.
    fn ingest(&self, text: &str) -> bool {
        if self.ready_state() == ReadyState::Connecting {
            self.dispatch(Event::open());
            self.set_state_if(|state| state == ReadyState::Connecting, ReadyState::Open);
        }

        if !self.is_live() {
            return false;
        }

        let records = self.inner.state.lock().buffer.push(text);
        self.dispatch_records(records);
        self.is_live()
    }

    /// Parses and dispatches records until the attempt ends.
    fn dispatch_records(&self, records: impl IntoIterator<Item = String>) {
        for record in records {
            if !self.is_live() {
                break;
            }

            if self.inner.options.debug {
                debug!(source = %self.inner.id, record = %record, "Received record");
            } else {
                trace!(source = %self.inner.id, len = record.len(), "Received record");
            }

            let event = parse_record(&record).map(|parsed| {
                let last_event_id = self.remember_id(parsed.id.as_deref());
                parsed.into_event(last_event_id)
            });
            self.dispatch(event);
        }
    }

    /// Updates the last event id if the record carried one.
    fn remember_id(&self, id: Option<&str>) -> String {
        let mut state = self.inner.state.lock();
        if let Some(id) = id {
            state.last_event_id = id.to_string();
        }
        state.last_event_id.clone()
    }

    /// Marks the attempt ended. Returns `false` if it already was.
    fn end_attempt(&self) -> bool {
        std::mem::replace(&mut self.inner.state.lock().live, false)
    }

    /// Moves to `next` when `allowed` accepts the current state and the
    /// state actually changes, then dispatches `readystatechange`.
    fn set_state_if(&self, allowed: impl Fn(ReadyState) -> bool, next: ReadyState) -> bool {
        let previous = {
            let mut state = self.inner.state.lock();
            let previous = state.ready_state;
            if previous == next || !allowed(previous) {
                return false;
            }
            state.ready_state = next;
            previous
        };

        debug!(source = %self.inner.id, from = %previous, to = %next, "Ready state changed");
        self.dispatch(Event::ready_state_change(next));
        true
    }

    #[inline]
    fn dispatch(&self, event: impl Into<Option<Event>>) -> bool {
        self.inner.target.dispatch_event(event.into())
    }
}

// ============================================================================
// EventSource - Listeners
// ============================================================================

impl EventSource {
    /// Registers `listener` for `event_type` unless already registered.
    pub fn add_event_listener(&self, event_type: impl Into<EventType>, listener: &Listener) {
        self.inner.target.add_event_listener(event_type, listener);
    }

    /// Unregisters `listener` from `event_type`.
    pub fn remove_event_listener(&self, event_type: impl Into<EventType>, listener: &Listener) {
        self.inner.target.remove_event_listener(event_type, listener);
    }

    /// Dispatches `event` as if it came from this source.
    ///
    /// Returns `true` for `None` or when no callback cancelled the event.
    pub fn dispatch_event(&self, event: Option<Event>) -> bool {
        self.inner.target.dispatch_event(event)
    }

    /// Returns the number of listeners registered for `event_type`.
    #[must_use]
    pub fn listener_count(&self, event_type: impl Into<EventType>) -> usize {
        self.inner.target.listener_count(event_type)
    }

    /// Installs or clears a primary handler, returning the previous one.
    pub fn set_handler(&self, slot: HandlerSlot, handler: Option<Handler>) -> Option<Handler> {
        self.inner.target.set_handler(slot, handler)
    }

    /// Returns the primary handler in `slot`.
    #[must_use]
    pub fn handler(&self, slot: HandlerSlot) -> Option<Handler> {
        self.inner.target.handler(slot)
    }

    /// Sets the `open` handler.
    pub fn set_on_open(&self, handler: Option<Handler>) {
        self.set_handler(HandlerSlot::Open, handler);
    }

    /// Sets the `message` handler.
    pub fn set_on_message(&self, handler: Option<Handler>) {
        self.set_handler(HandlerSlot::Message, handler);
    }

    /// Sets the `load` handler.
    pub fn set_on_load(&self, handler: Option<Handler>) {
        self.set_handler(HandlerSlot::Load, handler);
    }

    /// Sets the `error` handler.
    pub fn set_on_error(&self, handler: Option<Handler>) {
        self.set_handler(HandlerSlot::Error, handler);
    }

    /// Sets the `abort` handler.
    pub fn set_on_abort(&self, handler: Option<Handler>) {
        self.set_handler(HandlerSlot::Abort, handler);
    }

    /// Sets the `readystatechange` handler.
    pub fn set_on_ready_state_change(&self, handler: Option<Handler>) {
        self.set_handler(HandlerSlot::ReadyStateChange, handler);
    }

    /// Sets the handler shared by all server-specified event types.
    pub fn set_on_custom(&self, handler: Option<Handler>) {
        self.set_handler(HandlerSlot::Custom, handler);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use crate::protocol::EventPayload;
    use crate::source::Payload;
    use crate::transport::{RecordingTransport, TransportCall};

    const URL: &str = "https://example.com/events";

    /// Records `(type, data)` of every event dispatched by a source.
    #[derive(Clone, Default)]
    struct Log(Arc<Mutex<Vec<(String, Option<String>)>>>);

    impl Log {
        fn attach(&self, source: &EventSource, types: &[&str]) {
            for event_type in types {
                let log = self.clone();
                source.add_event_listener(
                    *event_type,
                    &Listener::new(move |event| {
                        log.0.lock().push((
                            event.type_name().to_string(),
                            event.data().map(str::to_string),
                        ));
                    }),
                );
            }
        }

        fn types(&self) -> Vec<String> {
            self.0.lock().iter().map(|(t, _)| t.clone()).collect()
        }

        fn data_of(&self, event_type: &str) -> Vec<String> {
            self.0
                .lock()
                .iter()
                .filter(|(t, _)| t == event_type)
                .filter_map(|(_, d)| d.clone())
                .collect()
        }
    }

    fn idle_source() -> (EventSource, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::new());
        let source = EventSource::builder()
            .url(URL)
            .start(false)
            .build(transport.clone())
            .expect("build");
        (source, transport)
    }

    fn states(source: &EventSource) -> Arc<Mutex<Vec<ReadyState>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        source.add_event_listener(
            "readystatechange",
            &Listener::new(move |event| {
                if let Some(state) = event.ready_state() {
                    seen_clone.lock().push(state);
                }
            }),
        );
        seen
    }

    #[test]
    fn test_initial_state() {
        let (source, transport) = idle_source();
        assert_eq!(source.ready_state(), ReadyState::Initializing);
        assert!(!source.is_live());
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_stream_issues_request() {
        let transport = Arc::new(RecordingTransport::new());
        let source = EventSource::builder()
            .url(URL)
            .header("Authorization", "Bearer t")
            .payload(Payload::text("{}"))
            .with_credentials(true)
            .start(false)
            .build(transport.clone())
            .expect("build");

        source.stream().expect("stream");

        let url = Url::parse(URL).expect("url");
        assert_eq!(
            transport.calls(),
            vec![
                TransportCall::Open {
                    method: Method::Post,
                    url,
                },
                TransportCall::SetHeader {
                    name: "Authorization".into(),
                    value: "Bearer t".into(),
                },
                TransportCall::SetHeader {
                    name: "Content-Type".into(),
                    value: "text/plain;charset=UTF-8".into(),
                },
                TransportCall::SetCredentials(true),
                TransportCall::Send(Some(Payload::text("{}"))),
            ]
        );
    }

    #[test]
    fn test_stream_is_idempotent() {
        let (source, transport) = idle_source();
        let seen = states(&source);

        source.stream().expect("stream");
        source.stream().expect("stream");
        source.handle_progress("", 200);
        source.stream().expect("stream");

        assert_eq!(transport.send_count(), 1);
        assert_eq!(*seen.lock(), vec![ReadyState::Connecting, ReadyState::Open]);
    }

    #[test]
    fn test_full_lifecycle() {
        let (source, _transport) = idle_source();
        let log = Log::default();
        log.attach(&source, &["open", "message", "update", "load", "readystatechange"]);

        source.stream().expect("stream");
        source.handle_progress("data: hello\ndata: world\n\nid: 5\nevent: up", 200);
        source.handle_progress(
            "data: hello\ndata: world\n\nid: 5\nevent: update\ndata: hello\n\ndata: tail",
            200,
        );
        source.handle_load("data: hello\ndata: world\n\nid: 5\nevent: update\ndata: hello\n\ndata: tail");

        assert_eq!(
            log.types(),
            vec![
                "readystatechange",
                "open",
                "readystatechange",
                "message",
                "update",
                "message",
                "load",
                "readystatechange",
            ]
        );
        assert_eq!(log.data_of("message"), vec!["hello\nworld", "tail"]);
        assert_eq!(log.data_of("update"), vec!["hello"]);
        assert_eq!(source.ready_state(), ReadyState::Closed);
        assert_eq!(source.last_event_id(), "5");
    }

    #[test]
    fn test_message_event_fields() {
        let (source, _transport) = idle_source();
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);
        source.add_event_listener(
            "update",
            &Listener::new(move |event| *seen_clone.lock() = Some(event.clone())),
        );

        source.stream().expect("stream");
        source.handle_progress("id: 5\nevent: update\ndata: hello\n\n", 200);

        let event = seen.lock().clone().expect("update dispatched");
        assert_eq!(event.type_name(), "update");
        assert_eq!(event.id(), Some("5"));
        assert_eq!(event.data(), Some("hello"));
        assert_eq!(event.source(), Some(source.id()));
        assert!(matches!(event.payload(), EventPayload::Message { .. }));
    }

    #[test]
    fn test_non_success_first_progress() {
        let (source, _transport) = idle_source();
        let log = Log::default();
        log.attach(&source, &["open", "error", "message"]);
        let seen = states(&source);

        source.stream().expect("stream");
        source.handle_progress("Service Unavailable", 503);
        source.handle_progress("data: late\n\n", 200);

        assert_eq!(log.types(), vec!["error"]);
        assert_eq!(log.data_of("error"), vec!["Service Unavailable"]);
        assert_eq!(*seen.lock(), vec![ReadyState::Connecting, ReadyState::Closed]);
    }

    #[test]
    fn test_network_error() {
        let (source, _transport) = idle_source();
        let log = Log::default();
        log.attach(&source, &["error"]);

        source.stream().expect("stream");
        source.handle_progress("data: a\n\n", 200);
        source.handle_error(Some("data: a\n\n"));
        source.handle_error(None);

        assert_eq!(log.data_of("error"), vec!["data: a\n\n"]);
        assert_eq!(source.ready_state(), ReadyState::Closed);
    }

    #[test]
    fn test_abort() {
        let (source, _transport) = idle_source();
        let log = Log::default();
        log.attach(&source, &["abort", "readystatechange"]);

        source.stream().expect("stream");
        source.handle_abort();
        source.handle_abort();

        assert_eq!(log.types(), vec!["readystatechange", "abort", "readystatechange"]);
        assert_eq!(source.ready_state(), ReadyState::Closed);
    }

    #[test]
    fn test_close_before_start_is_noop() {
        let (source, transport) = idle_source();
        let seen = states(&source);

        source.close();

        assert_eq!(source.ready_state(), ReadyState::Initializing);
        assert!(seen.lock().is_empty());
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_close_is_idempotent() {
        let (source, transport) = idle_source();
        let seen = states(&source);

        source.stream().expect("stream");
        source.close();
        source.close();

        assert_eq!(transport.abort_count(), 1);
        assert_eq!(*seen.lock(), vec![ReadyState::Connecting, ReadyState::Closed]);
    }

    #[test]
    fn test_notifications_after_close_ignored() {
        let (source, _transport) = idle_source();
        let log = Log::default();
        log.attach(&source, &["open", "message", "error", "load", "abort"]);

        source.stream().expect("stream");
        source.close();
        source.handle_progress("data: x\n\n", 200);
        source.handle_load("data: x\n\ndata: y");
        source.handle_error(Some("x"));
        source.handle_abort();

        assert!(log.types().is_empty());
    }

    #[test]
    fn test_done_before_load_still_flushes() {
        let (source, _transport) = idle_source();
        let log = Log::default();
        log.attach(&source, &["message", "load"]);

        source.stream().expect("stream");
        source.handle_progress("data: a\n\ndata: b", 200);
        source.handle_ready_state_change(true);
        assert_eq!(source.ready_state(), ReadyState::Closed);

        source.handle_load("data: a\n\ndata: b");
        assert_eq!(log.types(), vec!["message", "message", "load"]);
        assert_eq!(log.data_of("message"), vec!["a", "b"]);
    }

    #[test]
    fn test_close_after_done_still_flushes() {
        let (source, transport) = idle_source();
        let log = Log::default();
        log.attach(&source, &["message", "load"]);

        source.stream().expect("stream");
        source.handle_progress("data: a\n\ndata: b", 200);
        source.handle_ready_state_change(true);
        source.close();
        source.handle_load("data: a\n\ndata: b");

        assert_eq!(log.types(), vec!["message", "message", "load"]);
        assert_eq!(log.data_of("message"), vec!["a", "b"]);
        assert_eq!(transport.abort_count(), 0);
        assert!(!source.is_live());
    }

    #[test]
    fn test_restart_from_closed_listener_waits_for_load() {
        let (source, transport) = idle_source();
        let log = Log::default();
        log.attach(&source, &["open", "message", "load"]);
        let seen = states(&source);

        let restarter = source.clone();
        source.add_event_listener(
            "readystatechange",
            &Listener::new(move |event| {
                if event.ready_state() == Some(ReadyState::Closed) {
                    restarter.stream().expect("restart");
                }
            }),
        );

        source.stream().expect("stream");
        source.handle_progress("data: a\n\ndata: b", 200);
        source.handle_ready_state_change(true);
        assert_eq!(transport.send_count(), 1);

        source.handle_load("data: a\n\ndata: b");
        assert_eq!(transport.send_count(), 2);
        assert_eq!(source.ready_state(), ReadyState::Connecting);
        assert!(source.is_live());

        source.handle_progress("data: fresh\n\n", 200);

        assert_eq!(
            log.types(),
            vec!["open", "message", "message", "load", "open", "message"]
        );
        assert_eq!(log.data_of("message"), vec!["a", "b", "fresh"]);
        assert_eq!(
            *seen.lock(),
            vec![
                ReadyState::Connecting,
                ReadyState::Open,
                ReadyState::Closed,
                ReadyState::Connecting,
                ReadyState::Open,
            ]
        );
    }

    #[test]
    fn test_close_drops_queued_restart() {
        let (source, transport) = idle_source();

        source.stream().expect("stream");
        source.handle_progress("data: a\n\n", 200);
        source.handle_ready_state_change(true);
        source.stream().expect("queued restart");
        source.close();
        source.handle_load("data: a\n\n");

        assert_eq!(transport.send_count(), 1);
        assert_eq!(source.ready_state(), ReadyState::Closed);
    }

    #[test]
    fn test_non_success_progress_after_open() {
        let (source, _transport) = idle_source();
        let log = Log::default();
        log.attach(&source, &["open", "message", "error"]);
        let seen = states(&source);

        source.stream().expect("stream");
        source.handle_progress("data: a\n\n", 200);
        source.handle_progress("data: a\n\nGateway Timeout", 504);
        source.handle_progress("data: a\n\nGateway Timeout\n\ndata: late\n\n", 200);

        assert_eq!(log.types(), vec!["open", "message", "error"]);
        assert_eq!(log.data_of("error"), vec!["data: a\n\nGateway Timeout"]);
        assert_eq!(
            *seen.lock(),
            vec![ReadyState::Connecting, ReadyState::Open, ReadyState::Closed]
        );
        assert!(!source.is_live());
    }

    #[test]
    fn test_ready_state_change_not_done() {
        let (source, _transport) = idle_source();
        source.stream().expect("stream");
        source.handle_ready_state_change(false);
        assert_eq!(source.ready_state(), ReadyState::Connecting);
    }

    #[test]
    fn test_restart_resets_buffer() {
        let (source, transport) = idle_source();
        let log = Log::default();
        log.attach(&source, &["message"]);

        source.stream().expect("stream");
        source.handle_progress("data: first\n\ndata: dangling", 200);
        source.close();

        source.stream().expect("restart");
        source.handle_progress("data: second\n\n", 200);

        assert_eq!(log.data_of("message"), vec!["first", "second"]);
        assert_eq!(transport.send_count(), 2);
    }

    #[test]
    fn test_restart_sends_last_event_id() {
        let (source, transport) = idle_source();

        source.stream().expect("stream");
        source.handle_progress("id: 41\ndata: a\n\nid: 42\ndata: b\n\n", 200);
        source.close();
        transport.clear();

        source.stream().expect("restart");
        assert!(
            transport
                .headers()
                .contains(&("Last-Event-ID".to_string(), "42".to_string()))
        );
    }

    #[test]
    fn test_byte_by_byte_delivery() {
        let (source, _transport) = idle_source();
        let log = Log::default();
        log.attach(&source, &["message", "tick"]);

        let text = "data: one\r\n\r\nevent: tick\r\ndata: two\r\n\r\n: note\r\rdata: three";
        source.stream().expect("stream");
        for end in 1..=text.len() {
            source.handle_progress(&text[..end], 200);
        }

        // the comment-only record still dispatches an empty message
        assert_eq!(log.types(), vec!["message", "tick", "message"]);

        source.handle_load(text);
        assert_eq!(log.types(), vec!["message", "tick", "message", "message"]);
        assert_eq!(log.data_of("message"), vec!["one", "", "three"]);
    }

    #[test]
    fn test_listener_can_close_during_dispatch() {
        let (source, transport) = idle_source();
        let log = Log::default();
        log.attach(&source, &["message"]);

        let closer = source.clone();
        source.add_event_listener("message", &Listener::new(move |_| closer.close()));

        source.stream().expect("stream");
        source.handle_progress("data: a\n\ndata: b\n\ndata: c\n\n", 200);

        assert_eq!(log.data_of("message"), vec!["a"]);
        assert_eq!(source.ready_state(), ReadyState::Closed);
        assert_eq!(transport.abort_count(), 1);
    }

    #[test]
    fn test_open_handler_closing_prevents_open_state() {
        let (source, _transport) = idle_source();
        let seen = states(&source);

        let closer = source.clone();
        source.set_on_open(Some(Listener::new(move |_| closer.close())));

        source.stream().expect("stream");
        source.handle_progress("data: a\n\n", 200);

        assert_eq!(*seen.lock(), vec![ReadyState::Connecting, ReadyState::Closed]);
    }

    #[test]
    fn test_primary_handlers() {
        let (source, _transport) = idle_source();
        let log = Log::default();

        let handled = Arc::new(Mutex::new(Vec::new()));
        for slot in HandlerSlot::ALL {
            let handled = Arc::clone(&handled);
            source.set_handler(
                slot,
                Some(Listener::new(move |event| {
                    handled.lock().push(event.type_name().to_string());
                })),
            );
        }
        log.attach(&source, &["message"]);

        source.stream().expect("stream");
        source.handle_progress("data: a\n\nevent: ping\ndata: b\n\n", 200);
        source.handle_load("data: a\n\nevent: ping\ndata: b\n\n");

        assert_eq!(
            *handled.lock(),
            vec![
                "readystatechange",
                "open",
                "readystatechange",
                "message",
                "ping",
                "load",
                "readystatechange",
            ]
        );
    }

    #[test]
    fn test_cancelling_message_handler_skips_listeners() {
        let (source, _transport) = idle_source();
        let log = Log::default();
        log.attach(&source, &["message"]);
        source.set_on_message(Some(Listener::new(Event::prevent_default)));

        source.stream().expect("stream");
        source.handle_progress("data: a\n\n", 200);

        assert!(log.types().is_empty());
    }

    #[test]
    fn test_dispatch_event_directly() {
        let (source, _transport) = idle_source();
        let log = Log::default();
        log.attach(&source, &["custom"]);

        assert!(source.dispatch_event(None));
        assert!(source.dispatch_event(Some(Event::message("custom", None, "x", ""))));
        assert_eq!(log.data_of("custom"), vec!["x"]);
    }

    #[test]
    fn test_send_failure_closes() {
        let (source, transport) = idle_source();
        transport.fail_sends("refused");
        let log = Log::default();
        log.attach(&source, &["error"]);

        assert!(source.stream().is_err());
        assert_eq!(log.data_of("error"), vec![""]);
        assert_eq!(source.ready_state(), ReadyState::Closed);
    }

    #[test]
    fn test_notify_routes() {
        let (source, _transport) = idle_source();
        let log = Log::default();
        log.attach(&source, &["message", "load"]);

        source.stream().expect("stream");
        source.notify(Notification::Progress {
            text: "data: a\n\n".into(),
            status: 204,
        });
        source.notify(Notification::Load {
            text: "data: a\n\ndata: b".into(),
        });

        assert_eq!(log.types(), vec!["message", "message", "load"]);
    }

    #[test]
    fn test_load_without_progress_opens() {
        let (source, _transport) = idle_source();
        let log = Log::default();
        log.attach(&source, &["open", "message", "load"]);

        source.stream().expect("stream");
        source.handle_load("data: only");

        assert_eq!(log.types(), vec!["open", "message", "load"]);
    }

    proptest! {
        #[test]
        fn test_fragmented_delivery_counts(
            count in 0usize..6,
            cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..16),
        ) {
            let mut text: String = (0..count).map(|i| format!("id: {i}\ndata: r{i}\n\n")).collect();
            text.push_str("data: tail");

            let mut ends: Vec<usize> = cuts.iter().map(|i| i.index(text.len())).collect();
            ends.push(text.len());
            ends.sort_unstable();
            ends.dedup();

            let (source, _transport) = idle_source();
            let log = Log::default();
            log.attach(&source, &["message"]);
            source.stream().expect("stream");

            for end in ends {
                source.handle_progress(&text[..end], 200);
            }
            prop_assert_eq!(log.types().len(), count);

            source.handle_load(&text);
            let data = log.data_of("message");
            prop_assert_eq!(data.len(), count + 1);
            prop_assert_eq!(data.last().map(String::as_str), Some("tail"));
        }
    }
}
