//! A counting semaphore for producer/consumer backpressure.
//!
//! [`Semaphore`] guards a count of available units with one mutex. It is
//! independent of subtitles; [`CueQueue`](crate::CueQueue) uses two of them
//! to bound the cues in flight between a decode thread and its consumers.
//!
//! [`acquire`](Semaphore::acquire) blocks without a timeout and cannot be
//! cancelled. A caller that needs to give up should check its own flag (for
//! example a [`CancellationToken`](crate::CancellationToken)) after each
//! wakeup.
//!
//! # Example
//!
//! ```
//! use subcue::Semaphore;
//!
//! let semaphore = Semaphore::new(0);
//! semaphore.release(3);
//! assert!(!semaphore.try_acquire(5));
//! assert!(semaphore.try_acquire(2));
//! assert_eq!(semaphore.available(), 1);
//! ```

use parking_lot::{Condvar, Mutex};

/// A counting semaphore.
#[derive(Debug, Default)]
pub struct Semaphore {
    available: Mutex<usize>,
    released: Condvar,
}

impl Semaphore {
    /// Create a semaphore holding `initial` units.
    pub fn new(initial: usize) -> Self {
        Self {
            available: Mutex::new(initial),
            released: Condvar::new(),
        }
    }

    /// Take `n` units if that many are available, without blocking.
    ///
    /// Returns `false` and changes nothing otherwise.
    pub fn try_acquire(&self, n: usize) -> bool {
        let mut available = self.available.lock();
        if *available < n {
            return false;
        }
        *available -= n;
        true
    }

    /// Take `n` units, blocking until that many are available.
    pub fn acquire(&self, n: usize) {
        let mut available = self.available.lock();
        while *available < n {
            self.released.wait(&mut available);
        }
        *available -= n;
    }

    /// Return `n` units and wake every waiter.
    pub fn release(&self, n: usize) {
        let mut available = self.available.lock();
        *available += n;
        self.released.notify_all();
    }

    /// The number of units available at this instant.
    pub fn available(&self) -> usize {
        *self.available.lock()
    }
}
