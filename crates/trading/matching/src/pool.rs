//! Slab-backed order pool with stable handles
//!
//! Pre-allocates order slots and recycles them through a free list threaded
//! through the orders' own link field. Allocation is a free-list pop;
//! growth doubles the slot count. Handles are indices, so they stay valid
//! across growth — no relocation, no per-order heap traffic on the hot
//! path.
//!
//! The pool does not track slot aliveness: callers must not use a handle
//! after releasing it, and must not release twice. The book never releases
//! mid-run — filled and cancelled orders are retained for post-mortem
//! inspection and dropped with the pool. A long-running venue would need a
//! reclamation policy on top; this pool is scoped to bounded sessions.

use crate::order::Order;

/// Initial slot count; doubles on exhaustion.
pub const INITIAL_CAPACITY: usize = 65_536;

/// Stable handle to a pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderHandle(u32);

impl OrderHandle {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Typed slab allocator for [`Order`] records.
pub struct OrderPool {
    slots: Vec<Order>,
    free_head: Option<OrderHandle>,
    allocated: usize,
}

impl OrderPool {
    /// Pool with the default initial capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Pool with an explicit initial capacity (at least one slot).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut pool = Self {
            slots: Vec::new(),
            free_head: None,
            allocated: 0,
        };
        pool.grow(capacity.max(1));
        pool
    }

    /// Take a slot off the free list, growing the pool if exhausted.
    ///
    /// The returned slot holds stale contents; the caller initializes it.
    pub fn allocate(&mut self) -> OrderHandle {
        let handle = loop {
            if let Some(handle) = self.free_head {
                break handle;
            }
            let current = self.slots.len();
            self.grow(current);
        };
        self.free_head = self.slots[handle.index()].next;
        self.allocated += 1;
        handle
    }

    /// Return a slot to the free list.
    ///
    /// The handle must not be used afterwards; releasing twice corrupts the
    /// free list.
    pub fn release(&mut self, handle: OrderHandle) {
        debug_assert!(self.allocated > 0, "release with nothing allocated");
        let free_head = self.free_head;
        let slot = &mut self.slots[handle.index()];
        slot.prev = None;
        slot.next = free_head;
        self.free_head = Some(handle);
        self.allocated -= 1;
    }

    /// Resolve a handle.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: OrderHandle) -> &Order {
        &self.slots[handle.index()]
    }

    /// Resolve a handle mutably.
    #[inline]
    pub fn get_mut(&mut self, handle: OrderHandle) -> &mut Order {
        &mut self.slots[handle.index()]
    }

    /// Number of slots currently handed out.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// Total slot count across all growth steps.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Append `count` fresh slots and thread them onto the free list.
    fn grow(&mut self, count: usize) {
        let start = self.slots.len();
        assert!(
            start + count <= u32::MAX as usize,
            "order pool exceeds handle range"
        );
        self.slots.reserve_exact(count);
        for i in 0..count {
            let mut slot = Order::default();
            slot.next = if i + 1 < count {
                Some(OrderHandle((start + i + 1) as u32))
            } else {
                self.free_head
            };
            self.slots.push(slot);
        }
        self.free_head = Some(OrderHandle(start as u32));
    }
}

impl Default for OrderPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Qty;
    use rstest::rstest;

    #[test]
    fn allocate_and_release_reuses_slots() {
        let mut pool = OrderPool::with_capacity(4);
        let a = pool.allocate();
        let b = pool.allocate();
        assert_ne!(a, b);
        assert_eq!(pool.allocated(), 2);

        pool.release(a);
        assert_eq!(pool.allocated(), 1);

        // Free list is LIFO: the released slot comes back first.
        let c = pool.allocate();
        assert_eq!(c, a);
        assert_eq!(pool.allocated(), 2);
    }

    #[test]
    fn growth_preserves_handles() {
        let mut pool = OrderPool::with_capacity(2);
        let first = pool.allocate();
        pool.get_mut(first).quantity = Qty::new(777);

        // Exhaust the initial slab and force growth.
        let mut handles = vec![first];
        for _ in 0..20 {
            handles.push(pool.allocate());
        }
        assert!(pool.capacity() >= 21);
        assert_eq!(pool.allocated(), 21);

        // The pre-growth handle still resolves to the same record.
        assert_eq!(pool.get(first).quantity, Qty::new(777));

        // All handles are distinct.
        let mut sorted = handles.clone();
        sorted.sort_by_key(|h| h.0);
        sorted.dedup();
        assert_eq!(sorted.len(), handles.len());
    }

    #[rstest]
    #[case(2)]
    #[case(8)]
    #[case(64)]
    fn capacity_doubles_on_exhaustion(#[case] initial: usize) {
        let mut pool = OrderPool::with_capacity(initial);
        for _ in 0..initial {
            pool.allocate();
        }
        assert_eq!(pool.capacity(), initial);
        pool.allocate();
        assert_eq!(pool.capacity(), initial * 2);
    }
}
