//! Chunk assembly.
//!
//! The transport reports the *cumulative* response text every time more of
//! it arrives. [`StreamBuffer`] turns those snapshots into complete records,
//! holding back the trailing fragment until its terminating blank line shows
//! up.
//!
//! The last segment of every split is kept even when it already looks
//! complete: transport fragment boundaries never reliably align with record
//! boundaries, so a record is only released once the next delimiter has been
//! seen or the stream has ended.

// ============================================================================
// Imports
// ============================================================================

use std::mem;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

// ============================================================================
// Constants
// ============================================================================

/// Blank line separating two records. Alternatives are tried left to right.
static RECORD_DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n\r\n|\r\r|\n\n").expect("valid regex"));

// ============================================================================
// StreamBuffer
// ============================================================================

/// Incremental record splitter for one connection attempt.
///
/// # Invariants
///
/// - `consumed` never decreases while an attempt is live and never exceeds
///   the length of the text received so far.
/// - `pending` always holds the most recent unterminated fragment.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StreamBuffer {
    /// Bytes of cumulative text already taken in.
    consumed: usize,
    /// Fragment not yet closed by a record delimiter.
    pending: String,
}

impl StreamBuffer {
    /// Creates an empty buffer.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes in the cumulative response text and returns the records it
    /// completes, in stream order.
    ///
    /// Whitespace-only records are dropped. Text that does not extend the
    /// previous snapshot is rejected and leaves the buffer untouched.
    pub fn push(&mut self, total: &str) -> Vec<String> {
        let Some(delta) = total.get(self.consumed..) else {
            warn!(
                consumed = self.consumed,
                total_len = total.len(),
                "Cumulative text does not extend the consumed prefix, ignoring"
            );
            return Vec::new();
        };

        self.consumed += delta.len();

        let mut combined = mem::take(&mut self.pending);
        combined.push_str(delta);

        let mut segments: Vec<&str> = RECORD_DELIMITER.split(&combined).collect();
        // split always yields at least one segment
        self.pending = segments.pop().unwrap_or_default().to_string();

        segments
            .into_iter()
            .filter(|segment| !segment.trim().is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Releases the pending fragment as a final record and clears it.
    ///
    /// Called once the transport reports the end of the stream.
    pub fn finish(&mut self) -> Option<String> {
        let tail = mem::take(&mut self.pending);
        (!tail.trim().is_empty()).then_some(tail)
    }

    /// Forgets everything received so far. Used when a new attempt starts.
    #[inline]
    pub fn reset(&mut self) {
        self.consumed = 0;
        self.pending.clear();
    }

    /// Returns the number of bytes of cumulative text taken in.
    #[inline]
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Returns the fragment waiting for its delimiter.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.pending
    }
}

// ============================================================================
// Tests
// ============================================================================
