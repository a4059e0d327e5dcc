//! Dialogue record-line parsing.
//!
//! Decoders hand out ASS/SSA events as record lines such as
//!
//! ```text
//! Dialogue: 0,0:00:01.00,0:00:04.00,Default,,0,0,0,,Text here
//! Dialogue: Marked=0,0:00:01.00,0:00:04.00,Default,,0000,0000,0000,,Text here
//! ```
//!
//! Different decoder and muxer versions disagree on the exact shape, so
//! [`extract`] tries each known shape in turn and falls back through a fixed
//! chain of workarounds. It never fails: input that is not a record line at
//! all is returned unchanged.
//!
//! # Example
//!
//! ```
//! use subcue::dialogue;
//!
//! let line = "Dialogue: Marked=0,0:00:01.00,0:00:02.00,Default,,0,0,0,,Hello";
//! assert_eq!(dialogue::extract(line), "Hello");
//! assert_eq!(dialogue::extract("already plain"), "already plain");
//! ```

use crate::markup::MarkupStripper;

const DIALOGUE_PREFIX: &str = "Dialogue:";
const MARKED_PREFIX: &str = "Marked=";
const DEFAULT_STYLE: &str = "Default,";

/// Commas between the end of the second timestamp and the text, not
/// counting the comma that directly follows the timestamp.
const FIELDS_BEFORE_TEXT: usize = 6;

/// Extract the display text from an already markup-stripped record line.
///
/// The record's text ends at the first line break. When the text could be
/// located by field position or by the `Default,` style marker and the
/// input has a non-empty second physical line, that line is appended after
/// a `\n`.
pub fn extract(record_line: &str) -> String {
    let Some(rest) = record_rest(record_line) else {
        return record_line.to_string();
    };

    let Some(text) = locate_text(rest) else {
        // Some libav ASS decoders leave a stray comma in front of the text.
        return rest.strip_prefix(',').unwrap_or(rest).to_string();
    };

    match second_line(record_line) {
        Some(line) => format!("{text}\n{line}"),
        None => text.to_string(),
    }
}

/// Strip markup from a raw ASS payload with the given output capacity, then
/// extract its dialogue text.
pub fn plain_text_from_ass(raw: &str, capacity: usize) -> String {
    let stripped = MarkupStripper::new(capacity).strip(raw);
    extract(&stripped)
}

/// Match one of the known record shapes and return everything after the
/// second timestamp, up to the first line break.
///
/// `Marked=` is tried first. `None` means the line is not a record line, or
/// nothing follows the timestamps.
fn record_rest(line: &str) -> Option<&str> {
    let after_prefix = line.strip_prefix(DIALOGUE_PREFIX)?.trim_start();

    let after_layer = match after_prefix.strip_prefix(MARKED_PREFIX) {
        Some(marked) => skip_integer(marked)?.strip_prefix(',')?,
        None => skip_integer(after_prefix)?.strip_prefix(',')?,
    };

    let after_start = skip_timestamp(after_layer)?.strip_prefix(',')?;
    let after_end = skip_timestamp(after_start)?;

    let rest = match after_end.find(['\r', '\n']) {
        Some(position) => &after_end[..position],
        None => after_end,
    };
    (!rest.is_empty()).then_some(rest)
}

/// Find the text inside the part of a record following its timestamps.
///
/// Returns `None` when `rest` holds no comma at all, or holds too few
/// commas and no `Default,` style marker.
fn locate_text(rest: &str) -> Option<&str> {
    let first_comma = rest.find(',')?;
    let mut text_start = first_comma + 1;

    for _ in 0..FIELDS_BEFORE_TEXT {
        match rest[text_start..].find(',') {
            Some(offset) => text_start += offset + 1,
            None => {
                // Decoders that wrap SRT into ASS emit only a style field:
                // "Dialogue: 0,0:42:29.20,0:42:31.08,Default,Chinese\NEnglish"
                let marker = rest.find(DEFAULT_STYLE)?;
                return Some(&rest[marker + DEFAULT_STYLE.len()..]);
            }
        }
    }

    Some(&rest[text_start..])
}

/// Everything after the first `\r` or `\n`, if non-empty.
fn second_line(text: &str) -> Option<&str> {
    let position = text.find(['\r', '\n'])?;
    let line = &text[position + 1..];
    (!line.is_empty()).then_some(line)
}

/// Skip an optionally signed decimal integer.
fn skip_integer(input: &str) -> Option<&str> {
    let unsigned = input.strip_prefix(['-', '+']).unwrap_or(input);
    let digits = unsigned.trim_start_matches(|c: char| c.is_ascii_digit());
    (digits.len() < unsigned.len()).then_some(digits)
}

/// Skip an `H:MM:SS.CC` timestamp.
fn skip_timestamp(input: &str) -> Option<&str> {
    let hours = skip_integer(input)?.strip_prefix(':')?;
    let minutes = skip_integer(hours)?.strip_prefix(':')?;
    let seconds = skip_integer(minutes)?.strip_prefix('.')?;
    skip_integer(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_shape() {
        assert_eq!(skip_timestamp("0:00:01.00,x"), Some(",x"));
        assert_eq!(skip_timestamp("12:3:4.5"), Some(""));
        assert_eq!(skip_timestamp("0:00:01,00"), None);
        assert_eq!(skip_timestamp(":00:01.00"), None);
    }

    #[test]
    fn rest_stops_at_line_break() {
        assert_eq!(
            record_rest("Dialogue: 0,0:00:01.00,0:00:02.00,a,b\r\nsecond"),
            Some(",a,b")
        );
    }

    #[test]
    fn rest_requires_text_after_timestamps() {
        assert_eq!(record_rest("Dialogue: 0,0:00:01.00,0:00:02.00"), None);
        assert_eq!(record_rest("Dialogue: 0,0:00:01.00,0:00:02.00\nx"), None);
    }

    #[test]
    fn locate_by_field_count() {
        assert_eq!(locate_text(",Default,,0,0,0,,Hi, there"), Some("Hi, there"));
    }
}
