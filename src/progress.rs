//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for monitoring a decode loop,
//! [`CancellationToken`] for cooperative cancellation, and [`ProgressInfo`]
//! for progress snapshots.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use subcue::{
//!     BackendRegistry, ExtractionConfig, MemorySource, ProgressCallback, ProgressInfo,
//!     SubcueError, SubtitleDecoder,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("[{:?}] {} packets", info.operation, info.current);
//!     }
//! }
//!
//! # fn source() -> MemorySource { unimplemented!() }
//! let registry = BackendRegistry::with_builtin();
//! let config = ExtractionConfig::new().with_progress(Arc::new(PrintProgress));
//! let mut decoder = SubtitleDecoder::new(&registry).with_config(config);
//! decoder.process(&mut source())?;
//! # Ok::<(), SubcueError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Decoding a subtitle track into cues.
    SubtitleExtraction,
}

/// A snapshot of decode progress.
///
/// Delivered to [`ProgressCallback::on_progress`] every
/// [`batch_size`](crate::ExtractionConfig::with_batch_size) packets.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// How many subtitle packets have been processed so far.
    pub current: u64,
    /// Packets in the subtitle stream, when the source reports a count
    /// through [`PacketSource::packet_count`](crate::PacketSource::packet_count).
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the operation started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// Presentation timestamp of the packet just processed, in seconds.
    pub current_timestamp: Option<f64>,
}

/// Trait for receiving progress updates during a decode loop.
///
/// Implementations must be [`Send`] and [`Sync`] because the decode loop
/// may run on a worker thread.
///
/// Progress callbacks observe but cannot halt the operation. Use
/// [`CancellationToken`] for cooperative cancellation.
pub trait ProgressCallback: Send + Sync {
    /// Called at regular intervals during decoding.
    fn on_progress(&self, info: &ProgressInfo);
}

/// The default callback, which discards all notifications.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to stop the
/// associated decode loop before its next packet.
///
/// # Example
///
/// ```
/// use subcue::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. All clones of this token observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts processed packets and reports every `batch_size` of them.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    started: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total: total.filter(|&total| total > 0),
            current: 0,
            batch_size: batch_size.max(1),
            started: Instant::now(),
        }
    }

    /// Record one processed packet, reporting when a batch is complete.
    pub(crate) fn advance(&mut self, timestamp: Option<f64>) {
        self.current += 1;
        if self.current % self.batch_size == 0 {
            self.report(timestamp);
        }
    }

    /// Emit the closing report.
    pub(crate) fn finish(&mut self) {
        self.report(None);
    }

    fn report(&self, timestamp: Option<f64>) {
        let elapsed = self.started.elapsed();
        // Container packet counts can be estimates, so the fraction is capped.
        let done = self
            .total
            .map(|total| (self.current as f64 / total as f64).min(1.0));

        self.callback.on_progress(&ProgressInfo {
            operation: self.operation,
            current: self.current,
            total: self.total,
            percentage: done.map(|fraction| (fraction * 100.0) as f32),
            elapsed,
            estimated_remaining: done
                .filter(|&fraction| fraction > 0.0)
                .map(|fraction| elapsed.mul_f64((1.0 - fraction) / fraction)),
            current_timestamp: timestamp,
        });
    }
}
