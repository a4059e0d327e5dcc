//! Error handling integration tests.
//!
//! These tests verify that meaningful errors are returned for various
//! failure conditions.

use std::io::{Error as IoError, ErrorKind};

use subcue::{
    BackendRegistry, DecoderState, MediaKind, MemorySource, Packet, SubcueError,
    SubtitleDecoder, TimeBase, TrackDescriptor,
};

#[test]
fn error_messages() {
    assert_eq!(
        SubcueError::NoDecoderFound("dvd_subtitle".to_string()).to_string(),
        "No matching decoder for codec 'dvd_subtitle'"
    );
    assert_eq!(
        SubcueError::NoSubtitleStream.to_string(),
        "No subtitle stream found in source"
    );
    assert_eq!(
        SubcueError::OpenFailed("movie.mkv".to_string()).to_string(),
        "Failed to open movie.mkv"
    );
    assert_eq!(
        SubcueError::DecodeFailed("bad packet".to_string()).to_string(),
        "Failed to decode subtitle: bad packet"
    );
    assert_eq!(SubcueError::HeaderNotLoaded.to_string(), "Subtitle header not loaded");
    assert_eq!(SubcueError::Cancelled.to_string(), "Operation cancelled");
}

#[test]
fn io_errors_convert() {
    let error: SubcueError = IoError::new(ErrorKind::NotFound, "gone").into();
    assert!(matches!(error, SubcueError::IoError(_)));
    assert_eq!(error.to_string(), "I/O error: gone");
}

#[test]
fn source_without_subtitles() {
    let registry = BackendRegistry::with_builtin();
    let mut source = MemorySource::new()
        .with_track(MediaKind::Video, TrackDescriptor::new("h264", TimeBase::new(1, 90_000)));

    let mut decoder = SubtitleDecoder::new(&registry);
    let error = decoder.process(&mut source).unwrap_err();

    assert!(matches!(error, SubcueError::NoSubtitleStream));
    assert_eq!(decoder.state(), DecoderState::Closed);
}

#[test]
fn unknown_codec_is_named() {
    let registry = BackendRegistry::with_builtin();
    let mut source = MemorySource::new()
        .with_track(
            MediaKind::Subtitle,
            TrackDescriptor::new("hdmv_pgs_subtitle", TimeBase::default()),
        )
        .with_packet(Packet::new(0, "ignored", 0.0, 1.0));

    let mut decoder = SubtitleDecoder::new(&registry);
    let error = decoder.process(&mut source).unwrap_err();

    assert_eq!(error.to_string(), "No matching decoder for codec 'hdmv_pgs_subtitle'");
    assert!(decoder.frames().is_empty());
}

#[test]
fn decode_without_header() {
    let registry = BackendRegistry::with_builtin();
    let mut decoder = SubtitleDecoder::new(&registry);

    let result = decoder.decode(&Packet::new(0, "text", 0.0, 1.0));
    assert!(matches!(result, Err(SubcueError::HeaderNotLoaded)));
}

#[test]
fn empty_registry_finds_nothing() {
    let registry = BackendRegistry::new();
    let mut decoder = SubtitleDecoder::new(&registry);

    let result = decoder.process_header(&TrackDescriptor::new("ass", TimeBase::default()));
    assert!(matches!(result, Err(SubcueError::NoDecoderFound(name)) if name == "ass"));
    assert_eq!(decoder.state(), DecoderState::Closed);
}
