//! Request configuration.
//!
//! # Example
//!
//! ```ignore
//! use sse_source::{Method, Payload};
//!
//! let payload = Payload::form([("topic", "prices"), ("depth", "10")]);
//! assert_eq!(payload.content_type(), Some("application/x-www-form-urlencoded"));
//! assert_eq!(Method::from("report"), Method::Custom("REPORT".into()));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Header carrying the last seen event id on restart.
pub const LAST_EVENT_ID_HEADER: &str = "Last-Event-ID";

/// Content type header name.
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

// ============================================================================
// Method
// ============================================================================

/// HTTP request method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
    /// Any other method token, upper-cased.
    Custom(String),
}

impl Method {
    /// Returns the method token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Custom(token) => token,
        }
    }
}

impl From<&str> for Method {
    fn from(token: &str) -> Self {
        let token = token.trim().to_ascii_uppercase();
        match token.as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            _ => Self::Custom(token),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Payload
// ============================================================================

/// Request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// JSON document.
    Json(Value),
    /// Form fields, sent `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
}

// ============================================================================
// Payload - Constructors
// ============================================================================

impl Payload {
    /// Creates a text body.
    #[inline]
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text(body.into())
    }

    /// Creates a binary body.
    #[inline]
    #[must_use]
    pub fn bytes(body: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(body.into())
    }

    /// Serializes `value` into a JSON body.
    ///
    /// # Errors
    ///
    /// [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// Creates a form body from name/value pairs.
    #[must_use]
    pub fn form<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Form(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }

    /// Decodes a base64 string into a binary body.
    ///
    /// # Errors
    ///
    /// [`Error::Base64`](crate::Error::Base64) if `data` is not valid base64.
    pub fn from_base64(data: &str) -> Result<Self> {
        Ok(Self::Bytes(Base64Standard.decode(data.trim())?))
    }
}

// ============================================================================
// Payload - Encoding
// ============================================================================

impl Payload {
    /// Returns the content type implied by the body shape.
    #[must_use]
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            Self::Text(_) => Some("text/plain;charset=UTF-8"),
            Self::Bytes(_) => None,
            Self::Json(_) => Some("application/json"),
            Self::Form(_) => Some("application/x-www-form-urlencoded"),
        }
    }

    /// Encodes the body into bytes.
    ///
    /// # Errors
    ///
    /// [`Error::Json`](crate::Error::Json) if a JSON body fails to serialize.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Self::Text(text) => Ok(text.as_bytes().to_vec()),
            Self::Bytes(bytes) => Ok(bytes.clone()),
            Self::Json(value) => Ok(serde_json::to_vec(value)?),
            Self::Form(fields) => Ok(encode_form(fields).into_bytes()),
        }
    }
}

/// Encodes form fields as `name=value&name=value`.
fn encode_form(fields: &[(String, String)]) -> String {
    fields
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                urlencoding::encode(name),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

// ============================================================================
// SourceOptions
// ============================================================================

/// Validated configuration of an [`EventSource`](crate::EventSource).
///
/// Built by [`EventSourceBuilder`](crate::EventSourceBuilder).
#[derive(Debug, Clone, PartialEq)]
pub struct SourceOptions {
    /// Target address.
    pub url: Url,
    /// Request headers in the order they were set.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub payload: Option<Payload>,
    /// Request method.
    pub method: Method,
    /// Include cross-origin credentials.
    pub with_credentials: bool,
    /// Start streaming on construction.
    pub start: bool,
    /// Log raw records and dispatched events at `debug` level.
    pub debug: bool,
}

impl SourceOptions {
    /// Creates options for `url` with defaults.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            url,
            headers: Vec::new(),
            payload: None,
            method: Method::Get,
            with_credentials: false,
            start: true,
            debug: false,
        }
    }

    /// Returns the value of header `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if header `name` is set.
    #[inline]
    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================
