//! Error types for the `subcue` crate.
//!
//! This module defines [`SubcueError`], the unified error type returned by all
//! fallible operations in the crate.
//!
//! Markup and record-line anomalies (unterminated tags, missing delimiters,
//! a missing style marker) are never errors: the stripper and the dialogue
//! parser are total and degrade to a documented fallback. Likewise, output
//! that exceeds the markup buffer capacity is truncated silently.

use std::io::Error as IoError;

use thiserror::Error;

/// The unified error type for all `subcue` operations.
///
/// Every public method that can fail returns `Result<T, SubcueError>`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubcueError {
    /// No registered backend matches the codec name, neither directly nor
    /// through its descriptor.
    #[error("No matching decoder for codec '{0}'")]
    NoDecoderFound(String),

    /// A codec backend or a packet source could not be opened.
    #[error("Failed to open {0}")]
    OpenFailed(String),

    /// The source does not contain a subtitle stream.
    #[error("No subtitle stream found in source")]
    NoSubtitleStream,

    /// The codec backend rejected a packet.
    #[error("Failed to decode subtitle: {0}")]
    DecodeFailed(String),

    /// A decode was attempted before a track header was loaded.
    #[error("Subtitle header not loaded")]
    HeaderNotLoaded,

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error originating from the FFmpeg libraries.
    #[cfg(feature = "ffmpeg")]
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),
}

#[cfg(feature = "ffmpeg")]
impl From<ffmpeg_next::Error> for SubcueError {
    fn from(error: ffmpeg_next::Error) -> Self {
        SubcueError::FfmpegError(error.to_string())
    }
}
