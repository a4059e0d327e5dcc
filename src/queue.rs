//! Bounded cue handoff between threads.
//!
//! [`CueQueue`] carries copies of decoded cues from the decode thread to
//! any number of consumer threads. A full queue blocks the producer, an
//! empty one blocks consumers, and after [`close`](CueQueue::close) every
//! consumer drains the remaining cues and then sees `None`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use subcue::{Cue, CueQueue};
//!
//! let queue = Arc::new(CueQueue::new(4));
//! let consumer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || {
//!         let mut texts = Vec::new();
//!         while let Some(cue) = queue.pop() {
//!             texts.push(cue.text);
//!         }
//!         texts
//!     })
//! };
//!
//! for text in ["one", "two"] {
//!     queue.push(Cue { start: 0.0, end: 1.0, text: text.into(), serial: 0 });
//! }
//! queue.close();
//! assert_eq!(consumer.join().unwrap(), ["one", "two"]);
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::cue::Cue;
use crate::handoff::Semaphore;

/// A bounded multi-consumer cue queue gated by two [`Semaphore`]s.
#[derive(Debug)]
pub struct CueQueue {
    free_slots: Semaphore,
    filled_slots: Semaphore,
    cues: Mutex<VecDeque<Cue>>,
    capacity: usize,
    closed: AtomicBool,
}

impl CueQueue {
    /// Create a queue holding at most `capacity` cues (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            free_slots: Semaphore::new(capacity),
            filled_slots: Semaphore::new(0),
            cues: Mutex::new(VecDeque::new()),
            capacity,
            closed: AtomicBool::new(false),
        }
    }

    /// Append a cue, blocking while the queue is full.
    ///
    /// Returns `false` and drops the cue if the queue is closed.
    pub fn push(&self, cue: Cue) -> bool {
        if self.is_closed() {
            return false;
        }
        self.free_slots.acquire(1);
        self.cues.lock().push_back(cue);
        self.filled_slots.release(1);
        true
    }

    /// Take the oldest cue, blocking while the queue is empty and open.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub fn pop(&self) -> Option<Cue> {
        self.filled_slots.acquire(1);
        self.take()
    }

    /// Take the oldest cue without blocking.
    pub fn try_pop(&self) -> Option<Cue> {
        if !self.filled_slots.try_acquire(1) {
            return None;
        }
        self.take()
    }

    /// Stop accepting cues and wake consumers once the rest is drained.
    ///
    /// Closing twice has no further effect.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            // One extra unit with no cue behind it marks the end.
            self.filled_slots.release(1);
        }
    }

    /// Whether [`close`](CueQueue::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of queued cues.
    pub fn len(&self) -> usize {
        self.cues.lock().len()
    }

    /// Whether no cue is queued.
    pub fn is_empty(&self) -> bool {
        self.cues.lock().is_empty()
    }

    /// Maximum number of queued cues.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn take(&self) -> Option<Cue> {
        match self.cues.lock().pop_front() {
            Some(cue) => {
                self.free_slots.release(1);
                Some(cue)
            }
            None => {
                // Closed and drained: hand the end marker on to the next consumer.
                self.filled_slots.release(1);
                None
            }
        }
    }
}
