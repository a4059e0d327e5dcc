//! The subtitle decode driver.
//!
//! [`SubtitleDecoder`] pulls packets from a [`PacketSource`], decodes them
//! with a codec backend chosen from a [`BackendRegistry`], and turns every
//! text subtitle into a [`Cue`]: timestamps are resolved first, then ASS
//! record lines are stripped of markup and reduced to their dialogue text.
//!
//! A decoder moves through [`DecoderState`]s:
//!
//! ```text
//! Idle ──process_header──▶ HeaderLoaded ──process──▶ Streaming ──▶ Closed
//! ```
//!
//! Any failure also ends in `Closed`. The codec handle and the source are
//! held by guards, so the codec is closed and the source unloaded on every
//! exit path, including errors and cancellation.
//!
//! # Example
//!
//! ```
//! use subcue::{BackendRegistry, MediaKind, MemorySource, Packet, SubtitleDecoder, TimeBase, TrackDescriptor};
//!
//! let track = TrackDescriptor::new("ass", TimeBase::new(1, 1000));
//! let mut source = MemorySource::new()
//!     .with_track(MediaKind::Subtitle, track)
//!     .with_packet(Packet::new(0, r"0,0,Default,,0,0,0,,{\i1}Hello{\i0}\Nthere", 1.0, 2.0));
//!
//! let registry = BackendRegistry::with_builtin();
//! let mut decoder = SubtitleDecoder::new(&registry);
//! decoder.process(&mut source).unwrap();
//!
//! let cue = &decoder.frames().as_slice()[0];
//! assert_eq!(cue.text, "Hello\nthere");
//! assert_eq!((cue.start, cue.end), (1.0, 3.0));
//! ```

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::backend::{BackendRegistry, CodecProperties, SubtitleCodec, SubtitleRect, TrackDescriptor};
use crate::config::ExtractionConfig;
use crate::cue::{Cue, CueStore};
use crate::dialogue::plain_text_from_ass;
use crate::error::SubcueError;
use crate::progress::{OperationType, ProgressTracker};
use crate::source::{MediaKind, Packet, PacketSource};
use crate::timing;

/// Lifecycle state of a [`SubtitleDecoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// No codec has been opened yet.
    Idle,
    /// A codec is open and ready for packets.
    HeaderLoaded,
    /// A [`process`](SubtitleDecoder::process) loop is running.
    Streaming,
    /// The codec has been released, after success or failure.
    Closed,
}

/// An open codec handle. Closed when dropped.
struct OpenCodec {
    backend_name: String,
    properties: CodecProperties,
    handle: Box<dyn SubtitleCodec>,
}

impl Drop for OpenCodec {
    fn drop(&mut self) {
        log::debug!("Closing subtitle codec '{}'", self.backend_name);
        self.handle.close();
    }
}

/// A source that is unloaded when dropped.
struct LoadedSource<'s, S: PacketSource + ?Sized> {
    source: &'s mut S,
}

impl<S: PacketSource + ?Sized> Deref for LoadedSource<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.source
    }
}

impl<S: PacketSource + ?Sized> DerefMut for LoadedSource<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.source
    }
}

impl<S: PacketSource + ?Sized> Drop for LoadedSource<'_, S> {
    fn drop(&mut self) {
        self.source.unload();
    }
}

/// Decodes one subtitle track into cues.
///
/// The decoder borrows its [`BackendRegistry`] and owns its codec handle and
/// [`CueStore`] exclusively. Consumers on other threads receive copies of
/// the cues through [`ExtractionConfig::with_queue`].
pub struct SubtitleDecoder<'r> {
    registry: &'r BackendRegistry,
    config: ExtractionConfig,
    state: DecoderState,
    codec: Option<OpenCodec>,
    cues: CueStore,
}

impl<'r> SubtitleDecoder<'r> {
    /// Create an idle decoder drawing backends from `registry`.
    pub fn new(registry: &'r BackendRegistry) -> Self {
        Self {
            registry,
            config: ExtractionConfig::default(),
            state: DecoderState::Idle,
            codec: None,
            cues: CueStore::new(),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    /// The current lifecycle state.
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Name of the backend behind the open codec, if any.
    pub fn backend_name(&self) -> Option<&str> {
        self.codec.as_ref().map(|codec| codec.backend_name.as_str())
    }

    /// The cues produced by the last [`process`](SubtitleDecoder::process) call.
    pub fn frames(&self) -> &CueStore {
        &self.cues
    }

    /// Open a codec for `track`.
    ///
    /// The backend is looked up by the track's codec name, falling back to
    /// the registry's descriptor table. A backend whose codec produces
    /// bitmaps is still opened, but its output never becomes a cue. Any
    /// previously open codec is closed first.
    ///
    /// # Errors
    ///
    /// - [`SubcueError::NoDecoderFound`] if no backend matches.
    /// - [`SubcueError::OpenFailed`] if the backend cannot open a codec.
    ///
    /// The decoder is `Closed` after a failure.
    pub fn process_header(&mut self, track: &TrackDescriptor) -> Result<(), SubcueError> {
        self.codec = None;
        match open_codec(self.registry, track) {
            Ok(codec) => {
                self.codec = Some(codec);
                self.state = DecoderState::HeaderLoaded;
                Ok(())
            }
            Err(error) => {
                self.state = DecoderState::Closed;
                Err(error)
            }
        }
    }

    /// Decode the subtitle stream of `source` into [`frames`](SubtitleDecoder::frames).
    ///
    /// The store is cleared first. The source is loaded and its best
    /// subtitle stream selected; unless a header is already loaded, the
    /// codec is opened from that stream's track descriptor. Packets of
    /// other streams are skipped, and packets that decode to no text are
    /// dropped. The source is unloaded exactly once and the codec closed
    /// before this returns, and the decoder ends `Closed`.
    ///
    /// # Errors
    ///
    /// - [`SubcueError::OpenFailed`] if the source cannot be loaded.
    /// - [`SubcueError::NoSubtitleStream`] if it has no subtitle stream.
    /// - [`SubcueError::NoDecoderFound`] if no backend matches the track.
    /// - [`SubcueError::DecodeFailed`] if the codec rejects a packet.
    /// - [`SubcueError::Cancelled`] if the configured token is cancelled.
    ///
    /// On failure the store keeps the cues decoded before the error.
    pub fn process<S: PacketSource + ?Sized>(&mut self, source: &mut S) -> Result<(), SubcueError> {
        self.cues.clear();
        let result = self.run(source);

        self.codec = None;
        self.state = DecoderState::Closed;
        if let Some(queue) = &self.config.queue {
            queue.close();
        }

        match &result {
            Ok(()) => log::debug!("Decoded {} subtitle cues", self.cues.len()),
            Err(error) => log::warn!(
                "Subtitle decoding stopped after {} cues: {error}",
                self.cues.len()
            ),
        }
        result
    }

    /// Decode a single packet with the open codec.
    ///
    /// For callers that pump packets themselves. The cue is returned, not
    /// stored. `Ok(None)` means the packet produced no text cue.
    ///
    /// # Errors
    ///
    /// - [`SubcueError::HeaderNotLoaded`] if no codec is open.
    /// - [`SubcueError::DecodeFailed`] if the codec rejects the packet.
    pub fn decode(&mut self, packet: &Packet) -> Result<Option<Cue>, SubcueError> {
        let codec = self.codec.as_mut().ok_or(SubcueError::HeaderNotLoaded)?;
        decode_packet(codec, packet, self.config.markup_capacity)
    }

    /// Close the open codec, if any.
    pub fn close(&mut self) {
        self.codec = None;
        self.state = DecoderState::Closed;
    }

    fn run<S: PacketSource + ?Sized>(&mut self, source: &mut S) -> Result<(), SubcueError> {
        let mut source = LoadedSource { source };
        source.load()?;

        let stream_index = source
            .stream_index(MediaKind::Subtitle)
            .ok_or(SubcueError::NoSubtitleStream)?;
        log::debug!("Decoding subtitle stream {stream_index}");

        if self.codec.is_none() {
            let track = source
                .track(stream_index)
                .ok_or(SubcueError::NoSubtitleStream)?;
            self.process_header(&track)?;
        }

        let mut codec = self.codec.take().ok_or(SubcueError::HeaderNotLoaded)?;
        self.state = DecoderState::Streaming;
        self.stream(&mut *source, stream_index, &mut codec)
    }

    fn stream<S: PacketSource + ?Sized>(
        &mut self,
        source: &mut S,
        stream_index: usize,
        codec: &mut OpenCodec,
    ) -> Result<(), SubcueError> {
        let mut tracker = ProgressTracker::new(
            Arc::clone(&self.config.progress),
            OperationType::SubtitleExtraction,
            source.packet_count(stream_index),
            self.config.batch_size,
        );

        while !source.at_end() {
            if self.config.is_cancelled() {
                return Err(SubcueError::Cancelled);
            }
            if !source.read_frame() {
                continue;
            }

            let packet = source.packet();
            if packet.stream_index != stream_index {
                log::trace!("Skipping packet of stream {}", packet.stream_index);
                continue;
            }

            if let Some(cue) = decode_packet(codec, packet, self.config.markup_capacity)? {
                if let Some(queue) = &self.config.queue {
                    if !queue.push(cue.clone()) {
                        log::debug!("Cue queue closed, dropping cue at {:.3}s", cue.start);
                    }
                }
                self.cues.push(cue);
            }
            tracker.advance(Some(packet.pts));
        }

        tracker.finish();
        Ok(())
    }
}

fn open_codec(registry: &BackendRegistry, track: &TrackDescriptor) -> Result<OpenCodec, SubcueError> {
    let backend = registry
        .resolve(&track.codec_name)
        .ok_or_else(|| SubcueError::NoDecoderFound(track.codec_name.clone()))?;

    let properties = backend.properties();
    if !properties.is_text_based() {
        log::debug!(
            "Codec '{}' does not produce text; its subtitles will be discarded",
            backend.name()
        );
    }

    let handle = backend.open(&track.extradata, track.time_base)?;
    log::debug!(
        "Opened subtitle codec '{}' for track '{}' ({} bytes of extradata)",
        backend.name(),
        track.codec_name,
        track.extradata.len()
    );

    Ok(OpenCodec {
        backend_name: backend.name().to_string(),
        properties,
        handle,
    })
}

/// Decode `packet` and build a cue from its text regions.
fn decode_packet(
    codec: &mut OpenCodec,
    packet: &Packet,
    markup_capacity: usize,
) -> Result<Option<Cue>, SubcueError> {
    let Some(decoded) = codec.handle.decode_one(packet)? else {
        return Ok(None);
    };

    if !codec.properties.is_text_based() {
        log::debug!(
            "Discarding subtitle from non-text codec '{}' at {:.3}s",
            codec.backend_name,
            packet.pts
        );
        return Ok(None);
    }

    let (start, end) = timing::resolve(&decoded.timing, packet.pts);

    let parts: Vec<String> = decoded
        .rects
        .iter()
        .filter_map(|rect| match rect {
            SubtitleRect::Text(text) => Some(text.clone()),
            SubtitleRect::Ass(record) => Some(plain_text_from_ass(record, markup_capacity)),
            SubtitleRect::Bitmap { .. } => None,
        })
        .filter(|part| !part.is_empty())
        .collect();

    let text = parts.join("\n");
    if text.trim().is_empty() {
        return Ok(None);
    }

    Ok(Some(Cue {
        start,
        end,
        text,
        serial: packet.serial,
    }))
}
