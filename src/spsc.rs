//! Bounded lock-free single-producer/single-consumer ring buffer.
//!
//! [`channel`] splits the ring into a [`Producer`] and a [`Consumer`].
//! Neither half can be cloned and both take `&mut self`, so exactly one
//! thread pushes and exactly one thread pops.
//!
//! # Memory ordering
//!
//! ```text
//! producer:  write slot[head]  --> head.store(next, Release)
//! consumer:  head.load(Acquire) --> read slot[tail] --> tail.store(next, Release)
//! producer:  tail.load(Acquire) --> reuse slot
//! ```
//!
//! One slot is left unused so that `head == tail` always means empty and
//! `head + 1 == tail` (mod capacity) always means full.

use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_utils::CachePadded;
use thiserror::Error;

/// Returned by [`Producer::push`] when there is no free slot.
///
/// The rejected item is handed back to the caller.
#[derive(Error, Clone, Copy, PartialEq, Eq)]
pub enum PushError<T> {
    #[error("queue is full")]
    Full(T),
}

impl<T> PushError<T> {
    /// Recover the item that could not be enqueued.
    pub fn into_inner(self) -> T {
        match self {
            PushError::Full(item) => item,
        }
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Full(..)")
    }
}

struct Ring<T> {
    /// Next slot the producer writes. Only the producer stores it.
    head: CachePadded<AtomicUsize>,
    /// Next slot the consumer reads. Only the consumer stores it.
    tail: CachePadded<AtomicUsize>,
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// SAFETY: a slot is only ever accessed by one side at a time; ownership of a
// slot is transferred through the Release/Acquire pairs on `head` and `tail`.
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> Ring<T> {
    #[inline]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn next(&self, index: usize) -> usize {
        let next = index + 1;
        if next == self.capacity() {
            0
        } else {
            next
        }
    }

    #[inline]
    fn distance(&self, head: usize, tail: usize) -> usize {
        if head >= tail {
            head - tail
        } else {
            self.capacity() - tail + head
        }
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        // Both halves are gone: we have exclusive access.
        let head = *self.head.get_mut();
        let mut tail = *self.tail.get_mut();
        while tail != head {
            // SAFETY: slots in [tail, head) were written and never read.
            unsafe { self.slots[tail].get_mut().assume_init_drop() };
            tail = self.next(tail);
        }
    }
}

/// Smallest ring that can hold one item.
pub const MIN_CAPACITY: usize = 2;

/// Create a ring with `capacity` slots, of which `capacity - 1` are usable.
///
/// # Panics
/// If `capacity < MIN_CAPACITY`.
pub fn channel<T: Send>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    assert!(
        capacity >= MIN_CAPACITY,
        "SPSC capacity must be at least {MIN_CAPACITY}, got {capacity}"
    );

    let slots = (0..capacity)
        .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
        .collect::<Vec<_>>()
        .into_boxed_slice();

    let ring = Arc::new(Ring {
        head: CachePadded::new(AtomicUsize::new(0)),
        tail: CachePadded::new(AtomicUsize::new(0)),
        slots,
    });

    (
        Producer { ring: ring.clone() },
        Consumer { ring },
    )
}

/// The writing half. Owned by the ingest thread.
pub struct Producer<T> {
    ring: Arc<Ring<T>>,
}

impl<T> Producer<T> {
    /// Enqueue `item` if a slot is free. Never blocks.
    ///
    /// On a full queue nothing is modified and the item is returned in
    /// [`PushError::Full`].
    #[inline]
    pub fn push(&mut self, item: T) -> Result<(), PushError<T>> {
        let ring = &*self.ring;
        let head = ring.head.load(Ordering::Relaxed);
        let next = ring.next(head);

        if next == ring.tail.load(Ordering::Acquire) {
            return Err(PushError::Full(item));
        }

        // SAFETY: `head` is not in [tail, head), so the consumer does not
        // touch this slot until we publish `next` below.
        unsafe { (*ring.slots[head].get()).write(item) };

        ring.head.store(next, Ordering::Release);
        Ok(())
    }

    /// Usable slots (one less than the ring size).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity() - 1
    }

    /// Items currently queued. Exact for the producer's own pushes; the
    /// consumer may have drained more by the time this returns.
    pub fn len(&self) -> usize {
        let head = self.ring.head.load(Ordering::Relaxed);
        let tail = self.ring.tail.load(Ordering::Acquire);
        self.ring.distance(head, tail)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// True once the consumer has been dropped.
    pub fn is_abandoned(&self) -> bool {
        Arc::strong_count(&self.ring) < 2
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}

/// The reading half. Owned by the processing thread.
pub struct Consumer<T> {
    ring: Arc<Ring<T>>,
}

impl<T> Consumer<T> {
    /// Dequeue the oldest item, or `None` if the queue is empty. Never blocks.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        let ring = &*self.ring;
        let tail = ring.tail.load(Ordering::Relaxed);

        if tail == ring.head.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: the Acquire load above synchronizes with the producer's
        // Release store, so the slot at `tail` is fully written.
        let item = unsafe { (*ring.slots[tail].get()).assume_init_read() };

        ring.tail.store(ring.next(tail), Ordering::Release);
        Some(item)
    }

    /// Usable slots (one less than the ring size).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity() - 1
    }

    pub fn len(&self) -> usize {
        let head = self.ring.head.load(Ordering::Acquire);
        let tail = self.ring.tail.load(Ordering::Relaxed);
        self.ring.distance(head, tail)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once the producer has been dropped.
    pub fn is_abandoned(&self) -> bool {
        Arc::strong_count(&self.ring) < 2
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}
