//! Decode configuration.
//!
//! [`ExtractionConfig`] is a builder that threads progress callbacks,
//! cancellation tokens, the markup buffer capacity, and an optional
//! cross-thread [`CueQueue`] into a [`SubtitleDecoder`](crate::SubtitleDecoder)
//! without widening every method signature.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use subcue::{CancellationToken, CueQueue, ExtractionConfig, ProgressCallback, ProgressInfo};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{:?}: {} done", info.operation, info.current);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let config = ExtractionConfig::new()
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone())
//!     .with_batch_size(10)
//!     .with_markup_capacity(1023)
//!     .with_queue(Arc::new(CueQueue::new(64)));
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::markup::DEFAULT_CAPACITY;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};
use crate::queue::CueQueue;

/// Configuration for a [`SubtitleDecoder`](crate::SubtitleDecoder).
///
/// A default-constructed config reports nothing, never cancels, strips
/// markup into a [`DEFAULT_CAPACITY`]-byte buffer, and keeps cues only in
/// the decoder's own store.
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Cancellation token. `None` means never cancelled.
    pub(crate) cancellation: Option<CancellationToken>,
    /// How often to fire the progress callback (every N packets).
    pub(crate) batch_size: u64,
    /// Output capacity of the markup stripper, in bytes.
    pub(crate) markup_capacity: usize,
    /// Queue receiving a copy of every stored cue.
    pub(crate) queue: Option<Arc<CueQueue>>,
}

impl Debug for ExtractionConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractionConfig")
            .field("has_progress", &true)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("markup_capacity", &self.markup_capacity)
            .field("has_queue", &self.queue.is_some())
            .finish()
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionConfig {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            markup_capacity: DEFAULT_CAPACITY,
            queue: None,
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled, the decode loop stops before its next
    /// packet and returns [`SubcueError::Cancelled`](crate::SubcueError::Cancelled).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set the markup stripper's output capacity in bytes. Clamped to a
    /// minimum of 1. Longer cue text is truncated.
    #[must_use]
    pub fn with_markup_capacity(mut self, capacity: usize) -> Self {
        self.markup_capacity = capacity.max(1);
        self
    }

    /// Push a copy of every stored cue into `queue`.
    ///
    /// The decoder closes the queue when [`process`](crate::SubtitleDecoder::process)
    /// returns, so one queue serves one `process` call.
    #[must_use]
    pub fn with_queue(mut self, queue: Arc<CueQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// The markup stripper's output capacity in bytes.
    pub fn markup_capacity(&self) -> usize {
        self.markup_capacity
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
