//! Codec backends and the backend registry.
//!
//! A [`CodecBackend`] knows how to open one kind of subtitle codec. Opening
//! it yields a [`SubtitleCodec`], a live decoder handle that turns packets
//! into [`DecodedSubtitle`] values. Backends are looked up through a
//! [`BackendRegistry`], first by decoder name and then by codec descriptor
//! name, so a track declaring `ssa` still finds the `ass` decoder.
//!
//! The registry is an ordinary value. Build it once at startup and pass it
//! by reference to every [`SubtitleDecoder`](crate::SubtitleDecoder).
//!
//! # Example
//!
//! ```
//! use subcue::BackendRegistry;
//!
//! let registry = BackendRegistry::with_builtin();
//! assert_eq!(registry.resolve("ssa").map(|b| b.name().to_string()), Some("ass".into()));
//! assert!(registry.resolve("dvd_subtitle").is_none());
//! ```

use std::collections::HashMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::builtin::{AssBackend, PlainTextBackend};
use crate::error::SubcueError;
use crate::source::Packet;
use crate::timing::{RawTiming, TimeBase};

/// One region of a decoded subtitle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleRect {
    /// Plain text, used as-is.
    Text(String),
    /// An ASS/SSA record line, stripped and parsed before use.
    Ass(String),
    /// A bitmap region. Bitmap subtitles are not turned into cues.
    Bitmap {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
}

/// What a codec produced for one packet.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSubtitle {
    /// The decoded regions, in display order. Empty means no cue.
    pub rects: Vec<SubtitleRect>,
    /// Raw timing fields, resolved with [`resolve`](crate::timing::resolve).
    pub timing: RawTiming,
}

/// Capability flags of a codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodecProperties {
    /// The codec produces text subtitles.
    pub text: bool,
    /// The codec produces bitmap subtitles.
    pub bitmap: bool,
}

impl CodecProperties {
    /// A text subtitle codec.
    pub const TEXT: Self = Self {
        text: true,
        bitmap: false,
    };

    /// A bitmap subtitle codec.
    pub const BITMAP: Self = Self {
        text: false,
        bitmap: true,
    };

    /// Whether cues may be built from this codec's output.
    pub fn is_text_based(&self) -> bool {
        self.text
    }
}

/// An open decoder handle.
///
/// Owned by a single decode loop; it is never shared between threads.
pub trait SubtitleCodec {
    /// Decode one packet. `Ok(None)` means the packet produced no subtitle.
    fn decode_one(&mut self, packet: &Packet) -> Result<Option<DecodedSubtitle>, SubcueError>;

    /// Release the decoder's resources. Called exactly once per handle.
    fn close(&mut self);
}

/// A factory for one kind of subtitle codec.
pub trait CodecBackend: Send + Sync {
    /// Decoder name, the primary lookup key.
    fn name(&self) -> &str;

    /// Codec descriptor name, the fallback lookup key.
    fn descriptor(&self) -> &str;

    /// Capability flags.
    fn properties(&self) -> CodecProperties;

    /// Open a decoder configured with the track's extra data and time base.
    fn open(
        &self,
        extradata: &[u8],
        time_base: TimeBase,
    ) -> Result<Box<dyn SubtitleCodec>, SubcueError>;
}

/// The header information of a subtitle track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDescriptor {
    /// Declared codec name.
    pub codec_name: String,
    /// Codec-specific configuration bytes (e.g. an ASS script header).
    pub extradata: Vec<u8>,
    /// Time base of the track's packets.
    pub time_base: TimeBase,
}

impl TrackDescriptor {
    /// Create a descriptor with no extra data.
    pub fn new(codec_name: impl Into<String>, time_base: TimeBase) -> Self {
        Self {
            codec_name: codec_name.into(),
            extradata: Vec::new(),
            time_base,
        }
    }

    /// Attach codec configuration bytes.
    #[must_use]
    pub fn with_extradata(mut self, extradata: impl Into<Vec<u8>>) -> Self {
        self.extradata = extradata.into();
        self
    }
}

/// Codec backends keyed by decoder name and by descriptor name.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    by_name: HashMap<String, Arc<dyn CodecBackend>>,
    by_descriptor: HashMap<String, Arc<dyn CodecBackend>>,
}

impl Debug for BackendRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("BackendRegistry")
            .field("names", &self.names())
            .field("descriptors", &self.by_descriptor.len())
            .finish()
    }
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the pure-Rust text backends.
    ///
    /// `text` handles `text`, `subrip`, `srt`, and `webvtt` tracks; `ass`
    /// handles `ass` and `ssa` tracks.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PlainTextBackend));
        registry.register(Arc::new(AssBackend));
        for descriptor in ["subrip", "srt", "webvtt"] {
            registry.alias(descriptor, "text");
        }
        registry.alias("ssa", "ass");
        registry
    }

    /// Add a backend.
    ///
    /// A later backend with the same name replaces the earlier one. The
    /// descriptor table keeps the first backend registered for a descriptor.
    pub fn register(&mut self, backend: Arc<dyn CodecBackend>) {
        log::debug!(
            "Registering subtitle backend '{}' (descriptor '{}')",
            backend.name(),
            backend.descriptor()
        );
        self.by_descriptor
            .entry(backend.descriptor().to_string())
            .or_insert_with(|| Arc::clone(&backend));
        self.by_name.insert(backend.name().to_string(), backend);
    }

    /// Make `descriptor` resolve to the backend named `backend_name`.
    ///
    /// Returns `false` if no such backend is registered.
    pub fn alias(&mut self, descriptor: &str, backend_name: &str) -> bool {
        match self.by_name.get(backend_name) {
            Some(backend) => {
                self.by_descriptor
                    .insert(descriptor.to_string(), Arc::clone(backend));
                true
            }
            None => false,
        }
    }

    /// Look a backend up by decoder name only.
    pub fn find_by_name(&self, name: &str) -> Option<Arc<dyn CodecBackend>> {
        self.by_name.get(name).cloned()
    }

    /// Look a backend up by descriptor name only.
    pub fn find_by_descriptor(&self, descriptor: &str) -> Option<Arc<dyn CodecBackend>> {
        self.by_descriptor.get(descriptor).cloned()
    }

    /// Look a backend up by decoder name, then by descriptor name.
    pub fn resolve(&self, codec_name: &str) -> Option<Arc<dyn CodecBackend>> {
        self.find_by_name(codec_name).or_else(|| {
            let backend = self.find_by_descriptor(codec_name)?;
            log::debug!(
                "No decoder named '{codec_name}', using '{}' via its descriptor",
                backend.name()
            );
            Some(backend)
        })
    }

    /// Registered decoder names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Whether no backend is registered.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
