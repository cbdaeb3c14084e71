//! Builder pattern for source configuration.
//!
//! Provides a fluent API for configuring and creating [`EventSource`]
//! instances.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sse_source::{EventSource, Listener, Payload};
//!
//! let source = EventSource::builder()
//!     .url("https://example.com/stream")
//!     .header("Authorization", "Bearer token")
//!     .payload(Payload::text("{\"topic\":\"prices\"}"))
//!     .listener("message", Listener::new(|event| println!("{:?}", event.data())))
//!     .build(Arc::new(transport))?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use url::Url;

use crate::dispatch::Listener;
use crate::error::{Error, Result};
use crate::protocol::EventType;
use crate::transport::Transport;

use super::core::EventSource;
use super::options::{Method, Payload, SourceOptions};

// ============================================================================
// EventSourceBuilder
// ============================================================================

/// Builder for configuring an [`EventSource`].
///
/// Use [`EventSource::builder()`] to create a new builder.
#[derive(Debug, Clone)]
pub struct EventSourceBuilder {
    /// Target address, parsed at build time.
    url: Option<String>,
    /// Headers in insertion order.
    headers: Vec<(String, String)>,
    /// Request body.
    payload: Option<Payload>,
    /// Explicit method; derived from the payload when unset.
    method: Option<Method>,
    /// Include credentials.
    with_credentials: bool,
    /// Start on build.
    start: bool,
    /// Verbose logging.
    debug: bool,
    /// Listeners registered before the first attempt.
    listeners: Vec<(EventType, Listener)>,
}

impl Default for EventSourceBuilder {
    fn default() -> Self {
        Self {
            url: None,
            headers: Vec::new(),
            payload: None,
            method: None,
            with_credentials: false,
            start: true,
            debug: false,
            listeners: Vec::new(),
        }
    }
}

// ============================================================================
// EventSourceBuilder Implementation
// ============================================================================

impl EventSourceBuilder {
    /// Creates a builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target address.
    #[inline]
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets a request header, replacing any header with the same name.
    ///
    /// Names compare case-insensitively.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();

        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => *entry = (name, value),
            None => self.headers.push((name, value)),
        }
        self
    }

    /// Sets several request headers.
    #[must_use]
    pub fn headers<K, V>(self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        headers
            .into_iter()
            .fold(self, |builder, (name, value)| builder.header(name, value))
    }

    /// Sets the request body. The method defaults to `POST` when set.
    #[inline]
    #[must_use]
    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Sets the request method explicitly.
    #[inline]
    #[must_use]
    pub fn method(mut self, method: impl Into<Method>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Includes cross-origin credentials.
    #[inline]
    #[must_use]
    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = with_credentials;
        self
    }

    /// Controls whether `build` starts streaming immediately.
    ///
    /// Defaults to `true`.
    #[inline]
    #[must_use]
    pub fn start(mut self, start: bool) -> Self {
        self.start = start;
        self
    }

    /// Logs raw records and dispatched events at `debug` level.
    #[inline]
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Registers a listener before the first attempt starts.
    #[inline]
    #[must_use]
    pub fn listener(mut self, event_type: impl Into<EventType>, listener: Listener) -> Self {
        self.listeners.push((event_type.into(), listener));
        self
    }

    /// Validates the configuration into [`SourceOptions`].
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no URL was set
    /// - [`Error::Url`] if the URL does not parse
    /// - [`Error::InvalidArgument`] for a non-HTTP scheme, a malformed
    ///   header or an empty method
    pub fn options(&self) -> Result<SourceOptions> {
        let url = self.validate_url()?;
        self.validate_headers()?;
        let method = self.validate_method()?;

        Ok(SourceOptions {
            url,
            headers: self.headers.clone(),
            payload: self.payload.clone(),
            method,
            with_credentials: self.with_credentials,
            start: self.start,
            debug: self.debug,
        })
    }

    /// Builds the source on top of `transport`.
    ///
    /// Registers the builder's listeners, then starts streaming unless
    /// [`start(false)`](Self::start) was set.
    ///
    /// # Errors
    ///
    /// Any validation error from [`options`](Self::options), or the
    /// transport error that made the first attempt fail.
    pub fn build(self, transport: Arc<dyn Transport>) -> Result<EventSource> {
        let options = self.options()?;
        let start = options.start;

        let source = EventSource::from_options(options, transport);
        for (event_type, listener) in &self.listeners {
            source.add_event_listener(event_type.clone(), listener);
        }

        if start {
            source.stream()?;
        }

        Ok(source)
    }
}

// ============================================================================
// Validation
// ============================================================================

impl EventSourceBuilder {
    /// Validates the target address.
    fn validate_url(&self) -> Result<Url> {
        let raw = self.url.as_deref().ok_or_else(|| {
            Error::config(
                "Target URL is required. Use .url() to set it.\n\
                 Example: EventSource::builder().url(\"https://example.com/events\")",
            )
        })?;

        let url = Url::parse(raw)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_argument(format!(
                "Unsupported URL scheme: {}",
                url.scheme()
            )));
        }

        Ok(url)
    }

    /// Validates header names and values.
    fn validate_headers(&self) -> Result<()> {
        for (name, value) in &self.headers {
            let valid_name = !name.is_empty()
                && name
                    .bytes()
                    .all(|b| b.is_ascii_graphic() && b != b':');
            if !valid_name {
                return Err(Error::invalid_argument(format!(
                    "Invalid header name: {name:?}"
                )));
            }

            if value.contains(['\r', '\n']) {
                return Err(Error::invalid_argument(format!(
                    "Header {name} contains a line break"
                )));
            }
        }
        Ok(())
    }

    /// Resolves the method, defaulting on the payload.
    fn validate_method(&self) -> Result<Method> {
        let method = match &self.method {
            Some(method) => method.clone(),
            None if self.payload.is_some() => Method::Post,
            None => Method::Get,
        };

        let token = method.as_str();
        if token.is_empty() || !token.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(Error::invalid_argument(format!(
                "Invalid method: {token:?}"
            )));
        }

        Ok(method)
    }
}

// ============================================================================
// Tests
// ============================================================================
