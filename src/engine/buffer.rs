//! Reception buffer owned by the console engine.
//!
//! An append-only byte buffer: every read appends, consumers either peek
//! (leaving contents intact) or drain. Bytes are kept raw and decoded
//! lossily only on the way out, so a multibyte sequence split across two
//! transport chunks never produces a spurious replacement character and
//! byte-count deltas stay meaningful for quiet detection.

use std::borrow::Cow;

/// Append-only buffer of received bytes.
///
/// Invariant: contents never shrink or reorder between calls except
/// through an explicit drain, so repeated peeks observe a prefix-stable,
/// non-decreasing string.
#[derive(Debug, Default)]
pub struct ReceptionBuffer {
    data: Vec<u8>,
}

impl ReceptionBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(4096),
        }
    }

    /// Append newly received bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Current size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw view of the buffered bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Decode the buffer without consuming it.
    pub fn peek(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Decode and clear the whole buffer.
    pub fn drain(&mut self) -> String {
        let taken = std::mem::take(&mut self.data);
        String::from_utf8_lossy(&taken).into_owned()
    }

    /// Decode and remove the prefix up to `end` (exclusive); the remainder
    /// stays buffered for future reads.
    pub fn consume_to(&mut self, end: usize) -> String {
        let end = end.min(self.data.len());
        let rest = self.data.split_off(end);
        let taken = std::mem::replace(&mut self.data, rest);
        String::from_utf8_lossy(&taken).into_owned()
    }
}
