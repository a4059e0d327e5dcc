//! Presentation timestamp resolution.
//!
//! A decoded subtitle carries its own presentation timestamp (in some
//! [`TimeBase`]) plus display offsets in milliseconds. When the decoder has
//! no timestamp, the packet's timestamp is used instead. See [`resolve`].

/// Producer sentinel meaning "no timestamp".
pub const NO_PTS: i64 = i64::MIN;

/// A rational scale converting integer ticks into seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBase {
    /// Numerator.
    pub numerator: i32,
    /// Denominator.
    pub denominator: i32,
}

impl TimeBase {
    /// Create a time base of `numerator / denominator` seconds per tick.
    pub const fn new(numerator: i32, denominator: i32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Whether ticks can be converted, i.e. neither term is zero.
    pub fn is_valid(&self) -> bool {
        self.numerator != 0 && self.denominator != 0
    }

    /// Convert `ticks` into seconds, or `None` for an invalid time base.
    pub fn ticks_to_seconds(&self, ticks: i64) -> Option<f64> {
        self.is_valid().then(|| {
            let ticks_per_second = self.denominator as f64 / self.numerator as f64;
            ticks as f64 / ticks_per_second
        })
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::new(1, 1000)
    }
}

/// Timing fields reported by a codec backend for one decoded subtitle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawTiming {
    /// Decoder presentation timestamp in `time_base` ticks.
    pub pts: Option<i64>,
    /// Scale of `pts`.
    pub time_base: TimeBase,
    /// Display start, relative to `pts`, in milliseconds.
    pub start_display_ms: u32,
    /// Display end, relative to `pts`, in milliseconds.
    pub end_display_ms: u32,
}

impl RawTiming {
    /// Build timing from a raw producer timestamp, mapping [`NO_PTS`] to `None`.
    pub fn from_raw_pts(
        pts_raw: i64,
        time_base: TimeBase,
        start_display_ms: u32,
        end_display_ms: u32,
    ) -> Self {
        Self {
            pts: (pts_raw != NO_PTS).then_some(pts_raw),
            time_base,
            start_display_ms,
            end_display_ms,
        }
    }

    /// Timing with no decoder timestamp, so the packet timestamp applies.
    pub fn relative_to_packet(start_display_ms: u32, end_display_ms: u32) -> Self {
        Self {
            pts: None,
            time_base: TimeBase::default(),
            start_display_ms,
            end_display_ms,
        }
    }
}

/// Compute a cue's `(start, end)` in seconds.
///
/// The base is the decoder timestamp converted through its time base, or
/// `packet_pts` when there is none or the time base is invalid. The display
/// offsets are added as-is: nothing is clamped or rounded, so an end before
/// the start passes through unchanged.
pub fn resolve(raw: &RawTiming, packet_pts: f64) -> (f64, f64) {
    let pts = raw
        .pts
        .and_then(|ticks| raw.time_base.ticks_to_seconds(ticks))
        .unwrap_or(packet_pts);

    let start = pts + raw.start_display_ms as f64 / 1000.0;
    let end = pts + raw.end_display_ms as f64 / 1000.0;
    (start, end)
}
