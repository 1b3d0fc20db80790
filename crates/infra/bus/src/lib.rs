//! Bounded lock-free SPSC ring for market-data transport
//!
//! The pipeline has a natural producer/consumer topology: the matching
//! thread publishes feed records, one downstream thread drains them. A
//! single-producer single-consumer ring is the right primitive: no locks,
//! no CAS loops, bounded memory, wait-free push and pop.
//!
//! The classic two-counter formulation: the write position is only modified
//! by the producer and the read position only by the consumer, each stored
//! release and loaded acquire by the other side (relaxed when reading one's
//! own). One slot is reserved to disambiguate full from empty, so the
//! effective capacity is `N - 1`. The counters live on separate cache lines
//! to prevent false sharing.
//!
//! The producer/consumer contract is enforced in the type system: [`split`]
//! consumes the ring and hands out one non-clonable handle per role.
//!
//! [`split`]: SpscRing::split

#![deny(missing_docs)]

use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Bounded SPSC ring with power-of-two capacity `N`.
///
/// Construct with [`SpscRing::new`], then [`SpscRing::split`] into the two
/// role handles. `N` must be a power of two and at least 2; one slot is
/// reserved, so `N` slots hold at most `N - 1` items.
pub struct SpscRing<T, const N: usize> {
    write_pos: CachePadded<AtomicUsize>,
    read_pos: CachePadded<AtomicUsize>,
    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// The ring is shared between exactly one producer and one consumer; slot
// access is serialized by the acquire/release index protocol.
unsafe impl<T: Send, const N: usize> Send for SpscRing<T, N> {}
unsafe impl<T: Send, const N: usize> Sync for SpscRing<T, N> {}

const fn mask<const N: usize>() -> usize {
    N - 1
}

impl<T, const N: usize> SpscRing<T, N> {
    /// Create an empty ring.
    ///
    /// # Panics
    /// Panics if `N` is not a power of two, or is smaller than 2.
    #[must_use]
    pub fn new() -> Self {
        assert!(N.is_power_of_two(), "ring capacity must be a power of two");
        assert!(N >= 2, "ring needs at least one usable slot");

        let buffer = (0..N)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            write_pos: CachePadded::new(AtomicUsize::new(0)),
            read_pos: CachePadded::new(AtomicUsize::new(0)),
            buffer,
        }
    }

    /// Split into the producer and consumer handles.
    #[must_use]
    pub fn split(self) -> (Producer<T, N>, Consumer<T, N>) {
        let ring = Arc::new(self);
        (
            Producer {
                ring: Arc::clone(&ring),
            },
            Consumer { ring },
        )
    }

    /// Usable capacity: one slot is reserved for full/empty disambiguation.
    #[must_use]
    pub const fn capacity() -> usize {
        N - 1
    }

    fn len(&self) -> usize {
        let w = self.write_pos.load(Ordering::Acquire);
        let r = self.read_pos.load(Ordering::Acquire);
        w.wrapping_sub(r) & mask::<N>()
    }
}

impl<T, const N: usize> Default for SpscRing<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Drop for SpscRing<T, N> {
    fn drop(&mut self) {
        // Sole owner at this point; drop any items still queued.
        let mut read = *self.read_pos.get_mut();
        let write = *self.write_pos.get_mut();
        while read != write {
            unsafe { (*self.buffer[read].get()).assume_init_drop() };
            read = (read + 1) & mask::<N>();
        }
    }
}

/// Producer handle. Exactly one exists per ring; it is not clonable.
pub struct Producer<T, const N: usize> {
    ring: Arc<SpscRing<T, N>>,
}

impl<T, const N: usize> Producer<T, N> {
    /// Push an item. A full ring is the back-pressure signal: the item is
    /// handed back in `Err` and the caller decides whether to retry or
    /// drop.
    #[inline]
    pub fn push(&mut self, item: T) -> Result<(), T> {
        let ring = &*self.ring;
        let write = ring.write_pos.load(Ordering::Relaxed);
        let next = (write + 1) & mask::<N>();

        if next == ring.read_pos.load(Ordering::Acquire) {
            return Err(item);
        }

        unsafe { (*ring.buffer[write].get()).write(item) };
        ring.write_pos.store(next, Ordering::Release);
        Ok(())
    }

    /// Number of items currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Whether the ring is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Consumer handle. Exactly one exists per ring; it is not clonable.
pub struct Consumer<T, const N: usize> {
    ring: Arc<SpscRing<T, N>>,
}

impl<T, const N: usize> Consumer<T, N> {
    /// Pop the oldest item, or `None` if the ring is empty.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        let ring = &*self.ring;
        let read = ring.read_pos.load(Ordering::Relaxed);

        if read == ring.write_pos.load(Ordering::Acquire) {
            return None;
        }

        let item = unsafe { (*ring.buffer[read].get()).assume_init_read() };
        ring.read_pos.store((read + 1) & mask::<N>(), Ordering::Release);
        Some(item)
    }

    /// Peek at the oldest item without consuming it.
    #[inline]
    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        let ring = &*self.ring;
        let read = ring.read_pos.load(Ordering::Relaxed);

        if read == ring.write_pos.load(Ordering::Acquire) {
            return None;
        }

        Some(unsafe { (*ring.buffer[read].get()).assume_init_ref() })
    }

    /// Number of items currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Whether the ring is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
