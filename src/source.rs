//! Packet sources.
//!
//! A [`PacketSource`] is the demuxer side of the pipeline: it opens a
//! container, reports its streams, and hands out one [`Packet`] at a time.
//! [`MemorySource`] is an in-memory implementation for externally driven
//! pumps and tests; the `ffmpeg` feature adds
//! [`FfmpegSource`](crate::ffmpeg::FfmpegSource).

use std::collections::VecDeque;

use crate::backend::TrackDescriptor;
use crate::error::SubcueError;

/// The kind of a container stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// A video stream.
    Video,
    /// An audio stream.
    Audio,
    /// A subtitle stream.
    Subtitle,
}

/// One demuxed packet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Packet {
    /// Compressed payload.
    pub data: Vec<u8>,
    /// Presentation timestamp in seconds.
    pub pts: f64,
    /// Duration in seconds, `0.0` if unknown.
    pub duration: f64,
    /// Serial of the packet stream; changes after a seek or source switch.
    pub serial: i32,
    /// Index of the stream the packet belongs to.
    pub stream_index: usize,
}

impl Packet {
    /// Create a packet for `stream_index` with the given payload and timing.
    pub fn new(stream_index: usize, data: impl Into<Vec<u8>>, pts: f64, duration: f64) -> Self {
        Self {
            data: data.into(),
            pts,
            duration,
            serial: 0,
            stream_index,
        }
    }

    /// Set the packet serial.
    #[must_use]
    pub fn with_serial(mut self, serial: i32) -> Self {
        self.serial = serial;
        self
    }
}

/// The demuxer collaborator of a [`SubtitleDecoder`](crate::SubtitleDecoder).
///
/// [`SubtitleDecoder::process`](crate::SubtitleDecoder::process) calls
/// [`unload`](PacketSource::unload) exactly once per call, whatever the
/// outcome, including when [`load`](PacketSource::load) fails.
pub trait PacketSource {
    /// Open the underlying container.
    fn load(&mut self) -> Result<(), SubcueError>;

    /// Index of the best stream of `kind`, if any.
    fn stream_index(&self, kind: MediaKind) -> Option<usize>;

    /// Header information of the stream at `index`.
    fn track(&self, index: usize) -> Option<TrackDescriptor>;

    /// Number of packets the stream at `index` holds, if known up front.
    /// Used as the progress total.
    fn packet_count(&self, _index: usize) -> Option<u64> {
        None
    }

    /// Whether the end of the container has been reached.
    fn at_end(&self) -> bool;

    /// Read the next packet. Returns `false` if no packet was read; the
    /// caller retries until [`at_end`](PacketSource::at_end) is `true`.
    fn read_frame(&mut self) -> bool;

    /// The packet most recently read by [`read_frame`](PacketSource::read_frame).
    fn packet(&self) -> &Packet;

    /// Close the underlying container.
    fn unload(&mut self);
}

/// An in-memory [`PacketSource`].
///
/// # Example
///
/// ```
/// use subcue::{BackendRegistry, MediaKind, MemorySource, Packet, SubtitleDecoder, TimeBase, TrackDescriptor};
///
/// let mut source = MemorySource::new()
///     .with_track(MediaKind::Subtitle, TrackDescriptor::new("text", TimeBase::new(1, 1000)))
///     .with_packet(Packet::new(0, "Hello", 1.0, 2.0));
///
/// let registry = BackendRegistry::with_builtin();
/// let mut decoder = SubtitleDecoder::new(&registry);
/// decoder.process(&mut source).unwrap();
/// assert_eq!(decoder.frames().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tracks: Vec<(MediaKind, TrackDescriptor)>,
    packets: Vec<Packet>,
    pending: VecDeque<Packet>,
    current: Packet,
    loaded: bool,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stream. Streams are indexed in insertion order.
    #[must_use]
    pub fn with_track(mut self, kind: MediaKind, track: TrackDescriptor) -> Self {
        self.tracks.push((kind, track));
        self
    }

    /// Append a packet.
    #[must_use]
    pub fn with_packet(mut self, packet: Packet) -> Self {
        self.packets.push(packet);
        self
    }

    /// Whether the source is currently loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

impl PacketSource for MemorySource {
    fn load(&mut self) -> Result<(), SubcueError> {
        self.pending = self.packets.iter().cloned().collect();
        self.current = Packet::default();
        self.loaded = true;
        Ok(())
    }

    fn stream_index(&self, kind: MediaKind) -> Option<usize> {
        self.tracks.iter().position(|(track_kind, _)| *track_kind == kind)
    }

    fn track(&self, index: usize) -> Option<TrackDescriptor> {
        self.tracks.get(index).map(|(_, track)| track.clone())
    }

    fn packet_count(&self, index: usize) -> Option<u64> {
        let count = self
            .packets
            .iter()
            .filter(|packet| packet.stream_index == index)
            .count();
        Some(count as u64)
    }

    fn at_end(&self) -> bool {
        self.pending.is_empty()
    }

    fn read_frame(&mut self) -> bool {
        match self.pending.pop_front() {
            Some(packet) => {
                self.current = packet;
                true
            }
            None => false,
        }
    }

    fn packet(&self) -> &Packet {
        &self.current
    }

    fn unload(&mut self) {
        self.pending.clear();
        self.loaded = false;
    }
}
