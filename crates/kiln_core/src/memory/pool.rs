//! # Slot Pool
//!
//! Free-list generator of reusable integer handles.

use super::handle::Handle;

/// A pool of reusable handles with O(1) acquire, dispose and validity check.
///
/// Each slot either holds its own index (occupied) or the index of the next
/// free slot (free). Free slots form an intrusive singly linked list headed
/// by `disposed` and terminated by [`Handle::NULL`], so the only bookkeeping
/// is one integer array.
///
/// The free list is LIFO: the most recently disposed handle is the next one
/// reissued. A pool with no associated payload is the identifier-only form
/// of [`Arena`](super::Arena), e.g. for entity ids.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. Use one pool per thread or wrap in a mutex.
///
/// # Example
///
/// ```rust
/// use kiln_core::SlotPool;
///
/// let mut pool = SlotPool::new();
/// let a = pool.acquire();
/// pool.dispose(a);
/// assert_eq!(pool.acquire(), a); // recycled
/// ```
#[derive(Clone, Debug)]
pub struct SlotPool {
    /// Slot values: own index when occupied, next free slot when free.
    slots: Vec<Handle>,
    /// Head of the free list.
    disposed: Handle,
    /// Number of occupied slots.
    live: usize,
}

impl SlotPool {
    /// Creates an empty pool.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            disposed: Handle::NULL,
            live: 0,
        }
    }

    /// Creates an empty pool with room for `capacity` slots before growing.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            disposed: Handle::NULL,
            live: 0,
        }
    }

    /// Issues a handle.
    ///
    /// Pops the free list if it is non-empty, otherwise appends a new slot.
    /// This is an amortized **O(1)** operation.
    #[inline]
    pub fn acquire(&mut self) -> Handle {
        self.live += 1;

        if self.disposed.is_null() {
            debug_assert!(
                self.slots.len() < Handle::NULL.index(),
                "slot pool exhausted the handle space"
            );
            #[allow(clippy::cast_possible_truncation)]
            let handle = Handle::from_raw(self.slots.len() as u32);
            self.slots.push(handle);
            return handle;
        }

        let recycled = self.disposed;
        self.disposed = self.slots[recycled.index()];
        self.slots[recycled.index()] = recycled;
        recycled
    }

    /// Returns a handle to the free list.
    ///
    /// The caller must pass a live handle from this pool. Disposing a null,
    /// foreign or already disposed handle is a contract violation, asserted
    /// in debug builds only.
    #[inline]
    pub fn dispose(&mut self, handle: Handle) {
        debug_assert!(self.valid(handle), "dispose of invalid handle {handle}");

        self.slots[handle.index()] = self.disposed;
        self.disposed = handle;
        self.live -= 1;
    }

    /// Checks whether `handle` is currently occupied.
    ///
    /// Always safe to call, including with null or out-of-range handles.
    #[inline]
    #[must_use]
    pub fn valid(&self, handle: Handle) -> bool {
        self.slots
            .get(handle.index())
            .is_some_and(|&slot| slot == handle)
    }

    /// Calls `visit` once per occupied handle, in ascending order.
    #[inline]
    pub fn each<F>(&self, mut visit: F)
    where
        F: FnMut(Handle),
    {
        for handle in self.iter() {
            visit(handle);
        }
    }

    /// Iterates over occupied handles in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Handle> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|&(index, slot)| slot.index() == index)
            .map(|(_, &slot)| slot)
    }

    /// Returns the number of occupied slots.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if no slot is occupied.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Returns the number of slots ever created (occupied plus free).
    ///
    /// This is the minimum length any storage indexed by these handles
    /// must have.
    #[inline]
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Drops every slot. Previously issued handles become invalid and
    /// numbering restarts at zero. Memory is kept for reuse.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.disposed = Handle::NULL;
        self.live = 0;
    }
}

impl Default for SlotPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_pool_acquire_dispose() {
        let mut pool = SlotPool::new();

        let h1 = pool.acquire();
        assert!(pool.valid(h1));
        assert_eq!(pool.len(), 1);

        pool.dispose(h1);
        assert!(!pool.valid(h1));
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn test_pool_reuse() {
        let mut pool = SlotPool::new();

        let h1 = pool.acquire();
        pool.dispose(h1);

        let h2 = pool.acquire();
        assert_eq!(h1, h2); // Same slot reused
        assert_eq!(pool.slot_count(), 1);
    }

    #[test]
    fn test_free_list_is_lifo() {
        let mut pool = SlotPool::new();
        let a = pool.acquire();
        let b = pool.acquire();
        let c = pool.acquire();

        pool.dispose(a);
        pool.dispose(c);

        assert_eq!(pool.acquire(), c);
        assert_eq!(pool.acquire(), a);
        // Free list exhausted, a fresh slot is appended.
        assert_eq!(pool.acquire(), Handle::from_raw(3));
        assert!(pool.valid(b));
    }

    #[test]
    fn test_valid_rejects_foreign_handles() {
        let mut pool = SlotPool::new();
        let _ = pool.acquire();

        assert!(!pool.valid(Handle::NULL));
        assert!(!pool.valid(Handle::from_raw(1)));
        assert!(!pool.valid(Handle::from_raw(10_000)));
    }

    #[test]
    fn test_each_visits_live_in_order() {
        let mut pool = SlotPool::new();
        let handles: Vec<Handle> = (0..6).map(|_| pool.acquire()).collect();
        pool.dispose(handles[1]);
        pool.dispose(handles[4]);

        let mut seen = Vec::new();
        pool.each(|h| seen.push(h));

        assert_eq!(seen, vec![handles[0], handles[2], handles[3], handles[5]]);
    }

    #[test]
    fn test_clear_restarts_numbering() {
        let mut pool = SlotPool::with_capacity(4);
        let a = pool.acquire();
        let _ = pool.acquire();
        pool.dispose(a);

        pool.clear();
        assert!(pool.is_empty());
        assert_eq!(pool.slot_count(), 0);
        assert_eq!(pool.acquire(), Handle::from_raw(0));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "dispose of invalid handle")]
    fn test_double_dispose_asserts_in_debug() {
        let mut pool = SlotPool::new();
        let h = pool.acquire();
        pool.dispose(h);
        pool.dispose(h);
    }

    proptest! {
        /// Live handles are unique, valid, and exactly what `each` visits.
        #[test]
        fn prop_live_handles_unique(ops in proptest::collection::vec(any::<(bool, usize)>(), 0..256)) {
            let mut pool = SlotPool::new();
            let mut live: BTreeSet<Handle> = BTreeSet::new();

            for (acquire, pick) in ops {
                if acquire || live.is_empty() {
                    let h = pool.acquire();
                    prop_assert!(pool.valid(h));
                    prop_assert!(live.insert(h), "handle {} issued twice", h);
                } else {
                    let h = *live.iter().nth(pick % live.len()).unwrap();
                    live.remove(&h);
                    pool.dispose(h);
                    prop_assert!(!pool.valid(h));
                }
            }

            prop_assert_eq!(pool.len(), live.len());
            let visited: Vec<Handle> = pool.iter().collect();
            let expected: Vec<Handle> = live.into_iter().collect();
            prop_assert_eq!(visited, expected);
        }
    }
}
