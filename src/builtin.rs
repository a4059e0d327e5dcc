//! Pure-Rust codec backends for text subtitle tracks.
//!
//! These cover tracks whose packets already carry readable text, so no
//! external decoder library is needed:
//!
//! - [`PlainTextBackend`] for SubRip, WebVTT and plain-text packets.
//! - [`AssBackend`] for ASS/SSA packets as stored in Matroska.
//!
//! Both report no decoder timestamp, so cues are timed from the packet's
//! presentation timestamp and duration.

use crate::backend::{CodecBackend, CodecProperties, DecodedSubtitle, SubtitleCodec, SubtitleRect};
use crate::error::SubcueError;
use crate::source::Packet;
use crate::timing::{RawTiming, TimeBase};

/// Fields of a Matroska ASS event, the last one being the text.
const MATROSKA_EVENT_FIELDS: usize = 9;

/// Backend for packets holding plain UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextBackend;

impl CodecBackend for PlainTextBackend {
    fn name(&self) -> &str {
        "text"
    }

    fn descriptor(&self) -> &str {
        "text"
    }

    fn properties(&self) -> CodecProperties {
        CodecProperties::TEXT
    }

    fn open(
        &self,
        _extradata: &[u8],
        _time_base: TimeBase,
    ) -> Result<Box<dyn SubtitleCodec>, SubcueError> {
        Ok(Box::new(PlainTextCodec))
    }
}

struct PlainTextCodec;

impl SubtitleCodec for PlainTextCodec {
    fn decode_one(&mut self, packet: &Packet) -> Result<Option<DecodedSubtitle>, SubcueError> {
        let text = String::from_utf8_lossy(&packet.data);
        let text = text.trim_end();
        if text.is_empty() {
            return Ok(None);
        }

        Ok(Some(DecodedSubtitle {
            rects: vec![SubtitleRect::Text(text.to_string())],
            timing: RawTiming::relative_to_packet(0, duration_millis(packet)),
        }))
    }

    fn close(&mut self) {}
}

/// Backend for ASS/SSA events.
///
/// Matroska stores each event without its timestamps, as
/// `ReadOrder,Layer,Style,Name,MarginL,MarginR,MarginV,Effect,Text`. The
/// codec rebuilds a full `Dialogue:` record line from it, with the start
/// and end taken from the packet. Scripts whose header declares
/// `ScriptType: v4.00` (SSA rather than ASS v4.00+) get the
/// `Dialogue: Marked=...` form.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssBackend;

impl CodecBackend for AssBackend {
    fn name(&self) -> &str {
        "ass"
    }

    fn descriptor(&self) -> &str {
        "ass"
    }

    fn properties(&self) -> CodecProperties {
        CodecProperties::TEXT
    }

    fn open(
        &self,
        extradata: &[u8],
        _time_base: TimeBase,
    ) -> Result<Box<dyn SubtitleCodec>, SubcueError> {
        let header = String::from_utf8_lossy(extradata);
        Ok(Box::new(AssCodec {
            marked: is_legacy_ssa(&header),
        }))
    }
}

struct AssCodec {
    marked: bool,
}

impl SubtitleCodec for AssCodec {
    fn decode_one(&mut self, packet: &Packet) -> Result<Option<DecodedSubtitle>, SubcueError> {
        let event = String::from_utf8_lossy(&packet.data);
        let event = event.trim_end_matches(['\r', '\n']);
        if event.is_empty() {
            return Ok(None);
        }

        let record = record_line(event, packet.pts, packet.duration, self.marked);

        Ok(Some(DecodedSubtitle {
            rects: vec![SubtitleRect::Ass(record)],
            timing: RawTiming::relative_to_packet(0, duration_millis(packet)),
        }))
    }

    fn close(&mut self) {}
}

/// Turn an ASS event into a `Dialogue:` record line.
///
/// Matroska-style events get `start`/`end` times from `pts` and `duration`;
/// events that already are record lines pass through. `marked` selects the
/// SSA `Marked=` layer key.
pub(crate) fn record_line(event: &str, pts: f64, duration: f64, marked: bool) -> String {
    if event.starts_with("Dialogue:") {
        return event.to_string();
    }

    let start = format_ass_time(pts);
    let end = format_ass_time(pts + duration);
    let layer_key = if marked { "Marked=" } else { "" };

    let fields: Vec<&str> = event.splitn(MATROSKA_EVENT_FIELDS, ',').collect();
    match fields.as_slice() {
        [_read_order, layer, style, name, margin_l, margin_r, margin_v, effect, text] => {
            format!(
                "Dialogue: {layer_key}{layer},{start},{end},{style},{name},{margin_l},{margin_r},{margin_v},{effect},{text}"
            )
        }
        _ => format!("Dialogue: {layer_key}0,{start},{end},Default,,0,0,0,,{event}"),
    }
}

/// Whether an ASS script header declares the SSA v4.00 script type.
pub(crate) fn is_legacy_ssa(header: &str) -> bool {
    header
        .lines()
        .filter_map(|line| line.trim().strip_prefix("ScriptType:"))
        .any(|script_type| script_type.trim().eq_ignore_ascii_case("v4.00"))
}

/// Format seconds as an ASS `H:MM:SS.CC` timestamp.
fn format_ass_time(seconds: f64) -> String {
    let centis = (seconds.max(0.0) * 100.0).round() as u64;
    let hours = centis / 360_000;
    let minutes = (centis / 6000) % 60;
    let secs = (centis / 100) % 60;
    let hundredths = centis % 100;
    format!("{hours}:{minutes:02}:{secs:02}.{hundredths:02}")
}

fn duration_millis(packet: &Packet) -> u32 {
    (packet.duration.max(0.0) * 1000.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ass_time_format() {
        assert_eq!(format_ass_time(0.0), "0:00:00.00");
        assert_eq!(format_ass_time(2549.2), "0:42:29.20");
        assert_eq!(format_ass_time(3723.456), "1:02:03.46");
    }

    #[test]
    fn detects_ssa_script_type() {
        assert!(is_legacy_ssa("[Script Info]\nScriptType: v4.00\n"));
        assert!(!is_legacy_ssa("[Script Info]\nScriptType: v4.00+\n"));
        assert!(!is_legacy_ssa(""));
    }

    #[test]
    fn rebuilds_matroska_event() {
        assert_eq!(
            record_line("3,0,Default,,0,0,0,,Hi, you", 1.0, 1.5, false),
            "Dialogue: 0,0:00:01.00,0:00:02.50,Default,,0,0,0,,Hi, you"
        );
        assert_eq!(
            record_line("short event", 0.0, 1.0, true),
            "Dialogue: Marked=0,0:00:00.00,0:00:01.00,Default,,0,0,0,,short event"
        );
    }

    #[test]
    fn record_lines_pass_through() {
        let line = "Dialogue: 0,0:00:01.00,0:00:02.00,Default,,0,0,0,,Hi";
        assert_eq!(record_line(line, 5.0, 1.0, false), line);
    }
}
