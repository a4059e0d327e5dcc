//! Subtitle cues and the per-session cue store.
//!
//! A [`Cue`] is one timed unit of plain text produced by the
//! [`SubtitleDecoder`](crate::SubtitleDecoder). The decoder appends cues to
//! its [`CueStore`] in decode order; the store is cleared at the start of
//! every [`process`](crate::SubtitleDecoder::process) call.
//!
//! # Example
//!
//! ```no_run
//! use subcue::{BackendRegistry, CueFormat, MemorySource, SubcueError, SubtitleDecoder};
//!
//! # fn source() -> MemorySource { unimplemented!() }
//! let registry = BackendRegistry::with_builtin();
//! let mut decoder = SubtitleDecoder::new(&registry);
//! decoder.process(&mut source())?;
//! for cue in decoder.frames().search("hello") {
//!     println!("[{:.3} → {:.3}] {}", cue.start, cue.end, cue.text);
//! }
//! decoder.frames().save("out.srt", CueFormat::Srt)?;
//! # Ok::<(), SubcueError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult, Write as _};
use std::ops::Index;
use std::path::Path;
use std::slice::Iter;

use crate::error::SubcueError;

/// One timed text unit of a subtitle track.
///
/// `end` is not guaranteed to be after `start`: source files contain zero-
/// and negative-duration cues, and they are kept as they are.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    /// Presentation start in seconds.
    pub start: f64,
    /// Presentation end in seconds.
    pub end: f64,
    /// Plain text. Lines are separated by `\n`.
    pub text: String,
    /// Serial of the packet stream the cue was decoded from.
    pub serial: i32,
}

impl Cue {
    /// The text, one line at a time.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    /// `end - start`, which may be zero or negative.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Output format for formatted cue text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueFormat {
    /// SubRip Text (.srt).
    Srt,
    /// Web Video Text Tracks (.vtt).
    WebVtt,
    /// Raw text, one entry per line with timestamps.
    Raw,
}

impl Display for CueFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            CueFormat::Srt => write!(f, "SRT"),
            CueFormat::WebVtt => write!(f, "WebVTT"),
            CueFormat::Raw => write!(f, "Raw"),
        }
    }
}

/// Ordered cues of one subtitle-track session, in decode order.
#[derive(Debug, Clone, Default)]
pub struct CueStore {
    cues: Vec<Cue>,
}

impl CueStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, cue: Cue) {
        self.cues.push(cue);
    }

    pub(crate) fn clear(&mut self) {
        self.cues.clear();
    }

    /// Number of cues.
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Whether the store holds no cues.
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Cue at `index`, in decode order.
    pub fn get(&self, index: usize) -> Option<&Cue> {
        self.cues.get(index)
    }

    /// Iterate over the cues in decode order.
    pub fn iter(&self) -> Iter<'_, Cue> {
        self.cues.iter()
    }

    /// The cues as a slice.
    pub fn as_slice(&self) -> &[Cue] {
        &self.cues
    }

    /// Cues whose text contains `query`, compared case-insensitively.
    pub fn search(&self, query: &str) -> Vec<&Cue> {
        let query_lower = query.to_lowercase();
        self.cues
            .iter()
            .filter(|cue| cue.text.to_lowercase().contains(&query_lower))
            .collect()
    }

    /// Cues whose text contains `query` exactly.
    pub fn search_exact(&self, query: &str) -> Vec<&Cue> {
        self.cues
            .iter()
            .filter(|cue| cue.text.contains(query))
            .collect()
    }

    /// Cues whose display interval overlaps `[start, end)`.
    ///
    /// A cue is included when it starts before `end` and ends after `start`.
    pub fn in_range(&self, start: f64, end: f64) -> Vec<&Cue> {
        self.cues
            .iter()
            .filter(|cue| cue.start < end && cue.end > start)
            .collect()
    }

    /// Format all cues as text.
    pub fn to_text(&self, format: CueFormat) -> String {
        format_cues(&self.cues, format)
    }

    /// Format all cues and write them to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SubcueError::IoError`] if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P, format: CueFormat) -> Result<(), SubcueError> {
        std::fs::write(path, self.to_text(format))?;
        Ok(())
    }
}

impl Index<usize> for CueStore {
    type Output = Cue;

    fn index(&self, index: usize) -> &Cue {
        &self.cues[index]
    }
}

impl<'a> IntoIterator for &'a CueStore {
    type Item = &'a Cue;
    type IntoIter = Iter<'a, Cue>;

    fn into_iter(self) -> Self::IntoIter {
        self.cues.iter()
    }
}

/// Format cues into a string in the given format.
///
/// Negative times are written as zero. The cues themselves are not changed.
pub fn format_cues(cues: &[Cue], format: CueFormat) -> String {
    let mut output = String::new();

    // Writing into a String cannot fail.
    match format {
        CueFormat::Srt => {
            for (i, cue) in cues.iter().enumerate() {
                let _ = writeln!(output, "{}", i + 1);
                let _ = writeln!(
                    output,
                    "{} --> {}",
                    format_timestamp(cue.start, ','),
                    format_timestamp(cue.end, ','),
                );
                let _ = writeln!(output, "{}\n", cue.text);
            }
        }
        CueFormat::WebVtt => {
            output.push_str("WEBVTT\n\n");
            for (i, cue) in cues.iter().enumerate() {
                let _ = writeln!(output, "{}", i + 1);
                let _ = writeln!(
                    output,
                    "{} --> {}",
                    format_timestamp(cue.start, '.'),
                    format_timestamp(cue.end, '.'),
                );
                let _ = writeln!(output, "{}\n", cue.text);
            }
        }
        CueFormat::Raw => {
            for cue in cues {
                let _ = writeln!(output, "[{:.3} → {:.3}] {}", cue.start, cue.end, cue.text);
            }
        }
    }

    output
}

/// Format seconds as `HH:MM:SS<separator>mmm`.
fn format_timestamp(seconds: f64, separator: char) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;
    format!("{hours:02}:{minutes:02}:{secs:02}{separator}{millis:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_rounds_to_millis() {
        assert_eq!(format_timestamp(3661.25, ','), "01:01:01,250");
        assert_eq!(format_timestamp(0.0, '.'), "00:00:00.000");
    }

    #[test]
    fn negative_timestamp_formats_as_zero() {
        assert_eq!(format_timestamp(-2.5, ','), "00:00:00,000");
    }
}
