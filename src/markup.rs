//! ASS/SSA markup stripping.
//!
//! This module provides [`MarkupStripper`], which turns a cue payload that
//! may contain `{\...}` override blocks and `\N`, `\n`, `\h` escapes into
//! plain text, and [`BoundedWriter`], the fixed-capacity buffer it writes
//! into.
//!
//! The output never grows past the configured capacity. Anything that does
//! not fit is dropped without error, so callers must size the capacity for
//! the longest text they care about.
//!
//! # Example
//!
//! ```
//! use subcue::markup;
//!
//! assert_eq!(markup::strip(r"{\b1}Hello{\b0}\Nworld"), "Hello\nworld");
//! assert_eq!(markup::strip(r"x{\p1}m 0 0 l 10 0{\p0}y"), "xy");
//! ```

/// Default output capacity in bytes.
pub const DEFAULT_CAPACITY: usize = 511;

/// A fixed-capacity UTF-8 output buffer.
///
/// Writes that do not fit are dropped. A character is written completely or
/// not at all, and once one write has been dropped every later write is
/// dropped too, so the contents are always a prefix of what an unbounded
/// buffer would hold.
#[derive(Debug, Clone)]
pub struct BoundedWriter {
    buffer: String,
    capacity: usize,
    truncated: bool,
}

impl BoundedWriter {
    /// Create an empty writer holding at most `capacity` bytes.
    ///
    /// Nothing is allocated up front; the buffer grows as text is written.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: String::new(),
            capacity,
            truncated: false,
        }
    }

    /// Create a writer for stripping `input`, which never yields more bytes
    /// than it holds.
    fn for_input(capacity: usize, input: &str) -> Self {
        Self {
            buffer: String::with_capacity(capacity.min(input.len())),
            capacity,
            truncated: false,
        }
    }

    /// Append one character. Returns `false` if it was dropped.
    pub fn push(&mut self, c: char) -> bool {
        if self.truncated || self.buffer.len() + c.len_utf8() > self.capacity {
            self.truncated = true;
            return false;
        }
        self.buffer.push(c);
        true
    }

    /// Append a string, character by character. Returns `false` if any part
    /// of it was dropped.
    pub fn push_str(&mut self, s: &str) -> bool {
        s.chars().all(|c| self.push(c))
    }

    /// Whether any write has been dropped.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Maximum number of bytes this writer accepts.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The text written so far.
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Consume the writer and return its contents.
    pub fn into_string(self) -> String {
        self.buffer
    }
}

/// Strips ASS/SSA override tags from cue text.
///
/// The scan has two states. Outside a tag, `\N` and `\n` become a line
/// break, `\h` becomes a space, and `{` opens a tag. Inside a tag, `}`
/// closes it and `\p<digits>` switches drawing mode (on for a non-zero
/// number, off for zero or no digits). Text in drawing mode is invisible.
/// A `{` that is never closed is not a tag: everything from it to the end
/// of the input is emitted verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkupStripper {
    capacity: usize,
}

impl Default for MarkupStripper {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MarkupStripper {
    /// Create a stripper whose output holds at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// The output capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Strip `input` into a new string of at most [`capacity`](Self::capacity) bytes.
    pub fn strip(&self, input: &str) -> String {
        let mut writer = BoundedWriter::for_input(self.capacity, input);
        self.strip_into(input, &mut writer);
        if writer.is_truncated() {
            log::trace!(
                "Markup output truncated at {} bytes (input was {} bytes)",
                writer.capacity(),
                input.len()
            );
        }
        writer.into_string()
    }

    /// Strip `input`, appending the result to `writer`.
    pub fn strip_into(&self, input: &str, writer: &mut BoundedWriter) {
        let mut rest = input;
        let mut in_tag = false;
        let mut in_drawing = false;
        let mut open_tag_position = 0;

        while let Some(c) = rest.chars().next() {
            if in_tag {
                if c == '}' {
                    in_tag = false;
                    rest = &rest[1..];
                } else if let Some(after) = rest.strip_prefix("\\p") {
                    let digits = after.len() - after.trim_start_matches(|d: char| d.is_ascii_digit()).len();
                    in_drawing = after[..digits].bytes().any(|d| d != b'0');
                    rest = &after[digits..];
                } else {
                    rest = &rest[c.len_utf8()..];
                }
            } else if rest.starts_with("\\N") || rest.starts_with("\\n") {
                writer.push('\n');
                rest = &rest[2..];
            } else if rest.starts_with("\\h") {
                writer.push(' ');
                rest = &rest[2..];
            } else if c == '{' {
                open_tag_position = input.len() - rest.len();
                in_tag = true;
                rest = &rest[1..];
            } else {
                if !in_drawing {
                    writer.push(c);
                }
                rest = &rest[c.len_utf8()..];
            }
        }

        if in_tag {
            writer.push_str(&input[open_tag_position..]);
        }
    }
}

/// Strip markup from `input` using [`DEFAULT_CAPACITY`].
pub fn strip(input: &str) -> String {
    MarkupStripper::default().strip(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_drops_partial_multibyte_char() {
        let mut writer = BoundedWriter::new(4);
        assert!(writer.push_str("abc"));
        assert!(!writer.push('é'));
        assert!(!writer.push('d'));
        assert_eq!(writer.as_str(), "abc");
        assert!(writer.is_truncated());
    }

    #[test]
    fn zero_capacity_writer_holds_nothing() {
        let mut writer = BoundedWriter::new(0);
        assert!(!writer.push('a'));
        assert!(writer.is_empty());
    }

    #[test]
    fn drawing_flag_ignores_leading_zeros() {
        let stripper = MarkupStripper::default();
        assert_eq!(stripper.strip("a{\\p001}b{\\p}c"), "ac");
        assert_eq!(stripper.strip("a{\\p000}b"), "ab");
    }
}
