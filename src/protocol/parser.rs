//! Record parsing.
//!
//! Turns one delimiter-free record into its fields. The wire format is
//! permissive: comments, unknown fields and stray colons are skipped without
//! complaint.
//!
//! # Line Format
//!
//! | Line | Field | Value |
//! |------|-------|-------|
//! | `data: hello` | `data` | `hello` |
//! | `data:hello` | `data` | `hello` |
//! | `data:  two` | `data` | ` two` (one space stripped) |
//! | `data` | `data` | empty |
//! | `: keepalive` | comment, ignored | |

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;

use super::event::Event;

// ============================================================================
// Constants
// ============================================================================

/// Line terminators inside a record.
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\n|\r").expect("valid regex"));

/// Type given to records without an `event` field.
pub const DEFAULT_EVENT_TYPE: &str = "message";

// ============================================================================
// Field
// ============================================================================

/// Recognized field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Event,
    Data,
    Retry,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "id" => Some(Self::Id),
            "event" => Some(Self::Event),
            "data" => Some(Self::Data),
            "retry" => Some(Self::Retry),
            _ => None,
        }
    }
}

// ============================================================================
// ParsedRecord
// ============================================================================

/// Fields extracted from one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRecord {
    /// Last `event` value, or `"message"` when absent or empty.
    pub event_type: String,
    /// Last `id` value.
    pub id: Option<String>,
    /// `data` values joined with `\n`, empty when none.
    pub data: String,
    /// Last raw `retry` value.
    pub retry: Option<String>,
}

impl ParsedRecord {
    /// Builds the message event for this record.
    ///
    /// `last_event_id` is the source's last seen id after this record has
    /// been taken into account.
    #[must_use]
    pub fn into_event(self, last_event_id: impl Into<String>) -> Event {
        Event::message(self.event_type, self.id, self.data, last_event_id).with_retry(self.retry)
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses one record.
///
/// Returns `None` for empty or whitespace-only input.
#[must_use]
pub fn parse_record(record: &str) -> Option<ParsedRecord> {
    if record.trim().is_empty() {
        return None;
    }

    let mut event_type: Option<&str> = None;
    let mut id: Option<&str> = None;
    let mut data: Option<String> = None;
    let mut retry: Option<&str> = None;

    for line in LINE_BREAK.split(record) {
        let Some((name, value)) = split_line(line) else {
            continue;
        };

        match Field::from_name(name) {
            Some(Field::Data) => match data.as_mut() {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => data = Some(value.to_string()),
            },
            Some(Field::Event) => event_type = Some(value),
            Some(Field::Id) => id = Some(value),
            Some(Field::Retry) => retry = Some(value),
            None => {}
        }
    }

    Some(ParsedRecord {
        event_type: event_type
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_EVENT_TYPE)
            .to_string(),
        id: id.map(str::to_string),
        data: data.unwrap_or_default(),
        retry: retry.map(str::to_string),
    })
}

/// Splits a line into field name and value. Comments yield `None`.
fn split_line(line: &str) -> Option<(&str, &str)> {
    match line.find(':') {
        Some(0) => None,
        Some(index) => {
            let value = &line[index + 1..];
            Some((&line[..index], value.strip_prefix(' ').unwrap_or(value)))
        }
        None => Some((line, "")),
    }
}

// ============================================================================
// Tests
// ============================================================================
