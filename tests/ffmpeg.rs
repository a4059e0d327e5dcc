//! FFmpeg-backed source and decoder tests.
//!
//! Fixture-based tests are skipped when `tests/fixtures/sample_with_subtitles.mkv`
//! is missing. Create it with, for example:
//!
//! ```text
//! ffmpeg -f lavfi -i color=c=black:s=64x64:d=5 -i subs.ass -c:s ass \
//!     tests/fixtures/sample_with_subtitles.mkv
//! ```

#![cfg(feature = "ffmpeg")]

use std::path::Path;

use subcue::{
    BackendRegistry, DecoderState, FfmpegSource, PacketSource, SubcueError, SubtitleDecoder,
    register_ffmpeg_backends,
};

const SAMPLE: &str = "tests/fixtures/sample_with_subtitles.mkv";

fn ffmpeg_registry() -> BackendRegistry {
    let mut registry = BackendRegistry::with_builtin();
    register_ffmpeg_backends(&mut registry);
    registry
}

#[test]
fn registers_text_decoders() {
    let mut registry = BackendRegistry::new();
    let count = register_ffmpeg_backends(&mut registry);
    assert!(count > 0);
    assert!(registry.resolve("subrip").is_some());
    assert!(registry.resolve("ass").is_some());
}

#[test]
fn open_nonexistent_file() {
    let mut source = FfmpegSource::new("this_file_does_not_exist.mkv");
    let result = source.load();
    assert!(matches!(result, Err(SubcueError::OpenFailed(_))));
}

#[test]
fn nonexistent_file_closes_the_decoder() {
    let registry = ffmpeg_registry();
    let mut decoder = SubtitleDecoder::new(&registry);
    let mut source = FfmpegSource::new("this_file_does_not_exist.mkv");

    assert!(decoder.process(&mut source).is_err());
    assert_eq!(decoder.state(), DecoderState::Closed);
}

#[test]
fn invalid_file_fails_to_open() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = directory.path().join("invalid.mkv");
    std::fs::write(&path, b"this is not a media file").expect("Failed to write invalid file");

    let mut source = FfmpegSource::new(&path);
    assert!(source.load().is_err());
}

#[test]
fn extracts_cues_from_sample() {
    if !Path::new(SAMPLE).exists() {
        return;
    }

    let registry = ffmpeg_registry();
    let mut decoder = SubtitleDecoder::new(&registry);
    let mut source = FfmpegSource::new(SAMPLE);
    decoder.process(&mut source).expect("Failed to decode sample subtitles");

    assert!(!decoder.frames().is_empty());
    for cue in decoder.frames() {
        assert!(!cue.text.trim().is_empty());
        assert!(!cue.text.contains("{\\"), "markup left in {:?}", cue.text);
        assert!(!cue.text.starts_with("Dialogue:"), "record left in {:?}", cue.text);
    }
}
