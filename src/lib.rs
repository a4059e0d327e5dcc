//! # subcue
//!
//! Extract timed plain-text cues from subtitle tracks.
//!
//! `subcue` decodes a subtitle track packet by packet, resolves each
//! subtitle's presentation interval, and normalizes ASS/SSA payloads into
//! display text: override tags, drawing commands, and escapes are stripped,
//! and the dialogue text is pulled out of the `Dialogue:` record line that
//! carries it. Cues can be searched, filtered by time, and written as SRT,
//! WebVTT, or raw text, or handed to consumer threads through a bounded
//! [`CueQueue`].
//!
//! ## Quick Start
//!
//! ### Decode a Track
//!
//! ```
//! use subcue::{
//!     BackendRegistry, CueFormat, MediaKind, MemorySource, Packet, SubtitleDecoder, TimeBase,
//!     TrackDescriptor,
//! };
//!
//! let mut source = MemorySource::new()
//!     .with_track(MediaKind::Subtitle, TrackDescriptor::new("ass", TimeBase::new(1, 1000)))
//!     .with_packet(Packet::new(0, r"0,0,Default,,0,0,0,,{\b1}Hi{\b0} there", 1.0, 1.5));
//!
//! let registry = BackendRegistry::with_builtin();
//! let mut decoder = SubtitleDecoder::new(&registry);
//! decoder.process(&mut source).unwrap();
//!
//! assert_eq!(
//!     decoder.frames().to_text(CueFormat::Srt),
//!     "1\n00:00:01,000 --> 00:00:02,500\nHi there\n\n"
//! );
//! ```
//!
//! ### Clean a Single Line
//!
//! ```
//! use subcue::{dialogue, markup};
//!
//! assert_eq!(markup::strip(r"{\i1}Hello{\i0}\hworld"), "Hello world");
//!
//! let record = r"Dialogue: 0,0:00:01.00,0:00:02.00,Default,,0,0,0,,{\an8}Top text";
//! assert_eq!(dialogue::plain_text_from_ass(record, 511), "Top text");
//! ```
//!
//! ## Features
//!
//! - **Markup stripping**: ASS override blocks, `\p` drawing mode, `\N`,
//!   `\n` and `\h` escapes, into a fixed-capacity buffer
//! - **Dialogue parsing**: tolerant of `Marked=` layers, short style-only
//!   records, and stray separators from older decoders
//! - **Timestamp resolution**: decoder timestamps in any time base, with
//!   packet-time fallback
//! - **Pluggable backends**: codec backends looked up by decoder name, then
//!   by codec descriptor, from an explicit [`BackendRegistry`]
//! - **Progress & cancellation**: cooperative callbacks and
//!   [`CancellationToken`] for long-running decodes
//! - **Cross-thread handoff**: a [`Semaphore`]-gated bounded [`CueQueue`]
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ffmpeg` | `FfmpegSource` and FFmpeg subtitle decoders via `ffmpeg-next` |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! The default build is pure Rust. The `ffmpeg` feature needs the FFmpeg
//! development libraries installed on your system.

pub mod backend;
pub mod builtin;
pub mod config;
pub mod cue;
pub mod decoder;
pub mod dialogue;
pub mod error;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
pub mod handoff;
pub mod markup;
pub mod progress;
pub mod queue;
pub mod source;
pub mod timing;

pub use backend::{
    BackendRegistry, CodecBackend, CodecProperties, DecodedSubtitle, SubtitleCodec, SubtitleRect,
    TrackDescriptor,
};
pub use builtin::{AssBackend, PlainTextBackend};
pub use config::ExtractionConfig;
pub use cue::{Cue, CueFormat, CueStore, format_cues};
pub use decoder::{DecoderState, SubtitleDecoder};
pub use error::SubcueError;
#[cfg(feature = "ffmpeg")]
pub use ffmpeg::{FfmpegCodecBackend, FfmpegSource, register_ffmpeg_backends, set_ffmpeg_log_level};
pub use handoff::Semaphore;
pub use markup::{BoundedWriter, MarkupStripper};
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use queue::CueQueue;
pub use source::{MediaKind, MemorySource, Packet, PacketSource};
pub use timing::{NO_PTS, RawTiming, TimeBase};
