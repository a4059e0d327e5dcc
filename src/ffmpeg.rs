//! FFmpeg-backed packet source and codec backends.
//!
//! Enabled by the `ffmpeg` feature. [`FfmpegSource`] demuxes any container
//! FFmpeg can open, and [`register_ffmpeg_backends`] adds FFmpeg's subtitle
//! decoders to a [`BackendRegistry`], so tracks the pure-Rust backends do
//! not handle (`mov_text`, `microdvd`, ...) can still be decoded.
//!
//! FFmpeg has its own console logging, separate from the [`log`] facade.
//! [`set_ffmpeg_log_level`] maps a [`log::LevelFilter`] onto it.
//!
//! # Example
//!
//! ```no_run
//! use subcue::ffmpeg::{FfmpegSource, register_ffmpeg_backends};
//! use subcue::{BackendRegistry, SubcueError, SubtitleDecoder};
//!
//! let mut registry = BackendRegistry::with_builtin();
//! register_ffmpeg_backends(&mut registry);
//!
//! let mut source = FfmpegSource::new("input.mkv");
//! let mut decoder = SubtitleDecoder::new(&registry);
//! decoder.process(&mut source)?;
//! println!("{} cues", decoder.frames().len());
//! # Ok::<(), SubcueError>(())
//! ```

use std::os::raw::c_int;
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::Arc;

use ffmpeg_next::codec::{self, Id};
use ffmpeg_next::format::context::Input;
use ffmpeg_next::media::Type;
use ffmpeg_next::subtitle::Rect;
use ffmpeg_next::util::log::Level;
use ffmpeg_next::{Error as FfmpegError, Rational};
use ffmpeg_sys_next::{
    AV_CODEC_PROP_BITMAP_SUB, AV_CODEC_PROP_TEXT_SUB, AV_INPUT_BUFFER_PADDING_SIZE, AVRational,
    av_mallocz, avcodec_descriptor_get,
};

use crate::backend::{
    BackendRegistry, CodecBackend, CodecProperties, DecodedSubtitle, SubtitleCodec, SubtitleRect,
    TrackDescriptor,
};
use crate::builtin::{is_legacy_ssa, record_line};
use crate::error::SubcueError;
use crate::source::{MediaKind, Packet, PacketSource};
use crate::timing::{NO_PTS, RawTiming, TimeBase};

/// Time base of the timestamps FFmpeg reports on decoded subtitles.
const SUBTITLE_TIME_BASE: TimeBase = TimeBase::new(1, 1_000_000);

/// Subtitle codecs offered by [`register_ffmpeg_backends`].
const SUBTITLE_CODECS: &[Id] = &[
    Id::ASS,
    Id::SSA,
    Id::SUBRIP,
    Id::SRT,
    Id::WEBVTT,
    Id::MOV_TEXT,
    Id::TEXT,
    Id::MICRODVD,
    Id::SAMI,
    Id::REALTEXT,
    Id::SUBVIEWER,
    Id::DVD_SUBTITLE,
    Id::DVB_SUBTITLE,
    Id::HDMV_PGS_SUBTITLE,
];

/// Set FFmpeg's own console verbosity.
///
/// This does not affect messages sent through the [`log`] facade.
pub fn set_ffmpeg_log_level(level: log::LevelFilter) {
    let level = match level {
        log::LevelFilter::Off => Level::Quiet,
        log::LevelFilter::Error => Level::Error,
        log::LevelFilter::Warn => Level::Warning,
        log::LevelFilter::Info => Level::Info,
        log::LevelFilter::Debug => Level::Debug,
        log::LevelFilter::Trace => Level::Trace,
    };
    ffmpeg_next::util::log::set_level(level);
}

/// A [`PacketSource`] reading a media file through FFmpeg.
///
/// Read errors other than end-of-file are logged and end the stream.
pub struct FfmpegSource {
    path: PathBuf,
    input: Option<Input>,
    time_bases: Vec<TimeBase>,
    current: Packet,
    finished: bool,
}

impl FfmpegSource {
    /// Create a source for `path`. Nothing is opened until
    /// [`load`](PacketSource::load).
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            input: None,
            time_bases: Vec::new(),
            current: Packet::default(),
            finished: true,
        }
    }

    /// The path this source reads.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PacketSource for FfmpegSource {
    fn load(&mut self) -> Result<(), SubcueError> {
        ffmpeg_next::init()
            .map_err(|error| SubcueError::OpenFailed(format!("FFmpeg: {error}")))?;

        let input = ffmpeg_next::format::input(&self.path)
            .map_err(|error| SubcueError::OpenFailed(format!("{}: {error}", self.path.display())))?;
        self.time_bases = input
            .streams()
            .map(|stream| to_time_base(stream.time_base()))
            .collect();
        log::debug!(
            "Opened '{}' with {} streams",
            self.path.display(),
            self.time_bases.len()
        );
        self.input = Some(input);
        self.current = Packet::default();
        self.finished = false;
        Ok(())
    }

    fn stream_index(&self, kind: MediaKind) -> Option<usize> {
        let media_type = match kind {
            MediaKind::Video => Type::Video,
            MediaKind::Audio => Type::Audio,
            MediaKind::Subtitle => Type::Subtitle,
        };
        self.input
            .as_ref()?
            .streams()
            .best(media_type)
            .map(|stream| stream.index())
    }

    fn track(&self, index: usize) -> Option<TrackDescriptor> {
        let stream = self.input.as_ref()?.stream(index)?;
        let parameters = stream.parameters();

        // Safety: the parameters belong to a stream of the open input, and
        // extradata holds extradata_size readable bytes when non-null.
        let extradata = unsafe {
            let raw = parameters.as_ptr();
            if (*raw).extradata.is_null() || (*raw).extradata_size <= 0 {
                Vec::new()
            } else {
                std::slice::from_raw_parts((*raw).extradata, (*raw).extradata_size as usize)
                    .to_vec()
            }
        };

        Some(
            TrackDescriptor::new(parameters.id().name(), to_time_base(stream.time_base()))
                .with_extradata(extradata),
        )
    }

    fn packet_count(&self, index: usize) -> Option<u64> {
        // Containers that do not index their packets report 0.
        let frames = self.input.as_ref()?.stream(index)?.frames();
        u64::try_from(frames).ok().filter(|&frames| frames > 0)
    }

    fn at_end(&self) -> bool {
        self.finished
    }

    fn read_frame(&mut self) -> bool {
        let Some(input) = self.input.as_mut() else {
            self.finished = true;
            return false;
        };

        let mut packet = ffmpeg_next::Packet::empty();
        match packet.read(input) {
            Ok(()) => {}
            Err(FfmpegError::Eof) => {
                self.finished = true;
                return false;
            }
            Err(error) => {
                log::warn!("Stopped reading '{}': {error}", self.path.display());
                self.finished = true;
                return false;
            }
        }

        let stream_index = packet.stream();
        let time_base = self
            .time_bases
            .get(stream_index)
            .copied()
            .unwrap_or_default();
        let seconds = |ticks: i64| time_base.ticks_to_seconds(ticks).unwrap_or(0.0);

        self.current = Packet {
            data: packet.data().map(<[u8]>::to_vec).unwrap_or_default(),
            pts: packet.pts().or(packet.dts()).map(seconds).unwrap_or(0.0),
            duration: seconds(packet.duration()),
            serial: 0,
            stream_index,
        };
        true
    }

    fn packet(&self) -> &Packet {
        &self.current
    }

    fn unload(&mut self) {
        if self.input.take().is_some() {
            log::debug!("Closed '{}'", self.path.display());
        }
        self.time_bases.clear();
        self.finished = true;
    }
}

/// A [`CodecBackend`] wrapping one FFmpeg subtitle decoder.
#[derive(Debug, Clone)]
pub struct FfmpegCodecBackend {
    name: String,
    descriptor: String,
    properties: CodecProperties,
}

impl FfmpegCodecBackend {
    /// Wrap FFmpeg's decoder for `id`, if this FFmpeg build has one.
    pub fn for_codec(id: Id) -> Option<Self> {
        let decoder = ffmpeg_next::decoder::find(id)?;
        Some(Self {
            name: decoder.name().to_string(),
            descriptor: id.name().to_string(),
            properties: descriptor_properties(id),
        })
    }
}

impl CodecBackend for FfmpegCodecBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn properties(&self) -> CodecProperties {
        self.properties
    }

    fn open(
        &self,
        extradata: &[u8],
        time_base: TimeBase,
    ) -> Result<Box<dyn SubtitleCodec>, SubcueError> {
        let codec = ffmpeg_next::decoder::find_by_name(&self.name)
            .ok_or_else(|| SubcueError::NoDecoderFound(self.name.clone()))?;

        let mut context = codec::Context::new_with_codec(codec);
        let rational = AVRational {
            num: time_base.numerator,
            den: time_base.denominator,
        };

        // Safety: the context is freshly allocated and exclusively owned.
        // Extradata is copied into an av_mallocz buffer, padded as libavcodec
        // requires, which the context frees when it is dropped.
        unsafe {
            let raw = context.as_mut_ptr();
            (*raw).time_base = rational;
            (*raw).pkt_timebase = rational;

            if !extradata.is_empty() {
                let buffer = av_mallocz(extradata.len() + AV_INPUT_BUFFER_PADDING_SIZE as usize)
                    as *mut u8;
                if buffer.is_null() {
                    return Err(SubcueError::OpenFailed(format!(
                        "subtitle codec '{}': out of memory for extradata",
                        self.name
                    )));
                }
                ptr::copy_nonoverlapping(extradata.as_ptr(), buffer, extradata.len());
                (*raw).extradata = buffer;
                (*raw).extradata_size = extradata.len() as c_int;
            }
        }

        let decoder = context
            .decoder()
            .open_as(codec)
            .and_then(|opened| opened.subtitle())
            .map_err(|error| {
                SubcueError::OpenFailed(format!("subtitle codec '{}': {error}", self.name))
            })?;

        let header = String::from_utf8_lossy(extradata);
        Ok(Box::new(FfmpegCodec {
            decoder: Some(decoder),
            time_base,
            marked: is_legacy_ssa(&header),
        }))
    }
}

struct FfmpegCodec {
    decoder: Option<ffmpeg_next::decoder::Subtitle>,
    time_base: TimeBase,
    marked: bool,
}

impl FfmpegCodec {
    fn ticks(&self, seconds: f64) -> i64 {
        let TimeBase {
            numerator,
            denominator,
        } = self.time_base;
        if numerator == 0 {
            return 0;
        }
        (seconds * denominator as f64 / numerator as f64).round() as i64
    }
}

impl SubtitleCodec for FfmpegCodec {
    fn decode_one(&mut self, packet: &Packet) -> Result<Option<DecodedSubtitle>, SubcueError> {
        let mut input = ffmpeg_next::Packet::copy(&packet.data);
        input.set_pts(Some(self.ticks(packet.pts)));
        input.set_duration(self.ticks(packet.duration));

        let decoder = self.decoder.as_mut().ok_or(SubcueError::HeaderNotLoaded)?;
        let mut subtitle = ffmpeg_next::Subtitle::new();
        let produced = decoder
            .decode(&input, &mut subtitle)
            .map_err(|error| SubcueError::DecodeFailed(error.to_string()))?;
        if !produced {
            return Ok(None);
        }

        let rects = subtitle
            .rects()
            .filter_map(|rect| match rect {
                Rect::Text(text) => Some(SubtitleRect::Text(text.get().to_string())),
                // libavcodec hands out Matroska-style events without times.
                Rect::Ass(ass) => Some(SubtitleRect::Ass(record_line(
                    ass.get(),
                    packet.pts,
                    packet.duration,
                    self.marked,
                ))),
                Rect::Bitmap(bitmap) => Some(SubtitleRect::Bitmap {
                    width: bitmap.width(),
                    height: bitmap.height(),
                }),
                Rect::None(_) => None,
            })
            .collect();

        Ok(Some(DecodedSubtitle {
            rects,
            timing: RawTiming::from_raw_pts(
                subtitle.pts().unwrap_or(NO_PTS),
                SUBTITLE_TIME_BASE,
                subtitle.start(),
                subtitle.end(),
            ),
        }))
    }

    fn close(&mut self) {
        self.decoder = None;
    }
}

/// Register FFmpeg's subtitle decoders with `registry`.
///
/// Decoders missing from the linked FFmpeg build are skipped. A decoder
/// sharing a name with an already registered backend replaces it. Returns
/// the number of backends registered.
pub fn register_ffmpeg_backends(registry: &mut BackendRegistry) -> usize {
    if let Err(error) = ffmpeg_next::init() {
        log::warn!("FFmpeg initialisation failed: {error}");
        return 0;
    }

    let mut registered = 0;
    for &id in SUBTITLE_CODECS {
        match FfmpegCodecBackend::for_codec(id) {
            Some(backend) => {
                registry.register(Arc::new(backend));
                registered += 1;
            }
            None => log::debug!("FFmpeg build has no decoder for '{}'", id.name()),
        }
    }
    registered
}

fn to_time_base(rational: Rational) -> TimeBase {
    TimeBase::new(rational.numerator(), rational.denominator())
}

/// Capability flags from FFmpeg's codec descriptor table.
fn descriptor_properties(id: Id) -> CodecProperties {
    // Safety: avcodec_descriptor_get returns null or a pointer into a static
    // table.
    let props = unsafe {
        let descriptor = avcodec_descriptor_get(id.into());
        if descriptor.is_null() {
            return CodecProperties::default();
        }
        (*descriptor).props as u32
    };

    CodecProperties {
        text: props & AV_CODEC_PROP_TEXT_SUB != 0,
        bitmap: props & AV_CODEC_PROP_BITMAP_SUB != 0,
    }
}
