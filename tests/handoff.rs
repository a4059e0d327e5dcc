//! Semaphore and cue queue integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use subcue::{Cue, CueQueue, Semaphore};

fn cue(text: &str) -> Cue {
    Cue {
        start: 0.0,
        end: 1.0,
        text: text.to_string(),
        serial: 0,
    }
}

// ── Semaphore ──────────────────────────────────────────────────────

#[test]
fn try_acquire_takes_only_what_is_available() {
    let semaphore = Semaphore::new(0);
    semaphore.release(3);

    assert!(!semaphore.try_acquire(5));
    assert_eq!(semaphore.available(), 3);

    assert!(semaphore.try_acquire(2));
    assert_eq!(semaphore.available(), 1);
}

#[test]
fn try_acquire_zero_always_succeeds() {
    let semaphore = Semaphore::default();
    assert!(semaphore.try_acquire(0));
    assert_eq!(semaphore.available(), 0);
}

#[test]
fn acquire_returns_immediately_when_units_are_available() {
    let semaphore = Semaphore::new(4);
    semaphore.acquire(3);
    assert_eq!(semaphore.available(), 1);
}

#[test]
fn acquire_blocks_until_released() {
    let semaphore = Arc::new(Semaphore::new(0));
    let acquired = Arc::new(AtomicUsize::new(0));

    let waiter = {
        let semaphore = Arc::clone(&semaphore);
        let acquired = Arc::clone(&acquired);
        thread::spawn(move || {
            semaphore.acquire(1);
            acquired.fetch_add(1, Ordering::SeqCst);
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert_eq!(acquired.load(Ordering::SeqCst), 0);

    semaphore.release(1);
    waiter.join().unwrap();
    assert_eq!(acquired.load(Ordering::SeqCst), 1);
    assert_eq!(semaphore.available(), 0);
}

#[test]
fn acquire_waits_for_the_full_amount() {
    let semaphore = Arc::new(Semaphore::new(1));

    let waiter = {
        let semaphore = Arc::clone(&semaphore);
        thread::spawn(move || semaphore.acquire(3))
    };

    thread::sleep(Duration::from_millis(20));
    semaphore.release(1);
    thread::sleep(Duration::from_millis(20));
    assert!(!waiter.is_finished());

    semaphore.release(1);
    waiter.join().unwrap();
    assert_eq!(semaphore.available(), 0);
}

#[test]
fn release_wakes_every_waiter() {
    let semaphore = Arc::new(Semaphore::new(0));
    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let semaphore = Arc::clone(&semaphore);
            thread::spawn(move || semaphore.acquire(1))
        })
        .collect();

    thread::sleep(Duration::from_millis(20));
    semaphore.release(4);
    for waiter in waiters {
        waiter.join().unwrap();
    }
    assert_eq!(semaphore.available(), 0);
}

// ── CueQueue ───────────────────────────────────────────────────────

#[test]
fn queue_preserves_order() {
    let queue = CueQueue::new(4);
    assert!(queue.push(cue("a")));
    assert!(queue.push(cue("b")));
    assert_eq!(queue.len(), 2);

    assert_eq!(queue.try_pop().map(|c| c.text), Some("a".to_string()));
    assert_eq!(queue.try_pop().map(|c| c.text), Some("b".to_string()));
    assert_eq!(queue.try_pop(), None);
    assert!(queue.is_empty());
}

#[test]
fn queue_capacity_is_at_least_one() {
    assert_eq!(CueQueue::new(0).capacity(), 1);
    assert_eq!(CueQueue::new(8).capacity(), 8);

    let unbounded = CueQueue::new(usize::MAX);
    assert!(unbounded.push(cue("fits")));
    assert_eq!(unbounded.capacity(), usize::MAX);
}

#[test]
fn closed_queue_rejects_pushes() {
    let queue = CueQueue::new(2);
    queue.close();
    assert!(queue.is_closed());
    assert!(!queue.push(cue("late")));
    assert_eq!(queue.pop(), None);
}

#[test]
fn close_drains_remaining_cues_first() {
    let queue = CueQueue::new(4);
    queue.push(cue("left"));
    queue.close();
    queue.close();

    assert_eq!(queue.pop().map(|c| c.text), Some("left".to_string()));
    assert_eq!(queue.pop(), None);
    assert_eq!(queue.pop(), None);
}

#[test]
fn full_queue_blocks_the_producer() {
    let queue = Arc::new(CueQueue::new(1));
    queue.push(cue("first"));

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.push(cue("second")))
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!producer.is_finished());

    assert_eq!(queue.pop().map(|c| c.text), Some("first".to_string()));
    assert!(producer.join().unwrap());
    assert_eq!(queue.pop().map(|c| c.text), Some("second".to_string()));
}

#[test]
fn every_consumer_sees_the_end() {
    let queue = Arc::new(CueQueue::new(2));
    let consumers: Vec<_> = (0..3)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut received = 0;
                while queue.pop().is_some() {
                    received += 1;
                }
                received
            })
        })
        .collect();

    for index in 0..10 {
        queue.push(cue(&index.to_string()));
    }
    queue.close();

    let total: usize = consumers.into_iter().map(|c| c.join().unwrap()).sum();
    assert_eq!(total, 10);
}
