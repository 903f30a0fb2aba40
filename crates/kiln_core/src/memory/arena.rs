//! # Typed Arena
//!
//! A slot pool with one payload per live handle. This is the resource table
//! every subsystem keeps for its textures, sprites, bodies and shapes.

use std::ops::{Index, IndexMut};

use super::handle::Handle;
use super::pool::SlotPool;

/// Handle-addressed storage for values of type `T`.
///
/// Storage grows in lockstep with the embedded [`SlotPool`]: a new slot and
/// a new cell are appended together, so `storage[handle]` is addressable
/// whenever `valid(handle)` holds. A cell holds a value iff its slot is
/// occupied.
///
/// Lookups come in two flavours:
/// - `arena[handle]` is the hot path. An invalid handle is a contract
///   violation and panics.
/// - [`get`](Self::get) / [`get_mut`](Self::get_mut) check validity and
///   return `None` instead.
///
/// # Thread Safety
///
/// This arena is NOT thread-safe. Subsystems shared across threads wrap it
/// in a mutex held for the whole operation.
///
/// # Example
///
/// ```rust
/// use kiln_core::Arena;
///
/// let mut arena: Arena<u32> = Arena::new();
/// let h = arena.create(42);
/// assert_eq!(arena[h], 42);
///
/// arena[h] = 7;
/// assert_eq!(arena[h], 7);
///
/// arena.destroy(h);
/// assert!(!arena.valid(h));
/// ```
#[derive(Clone, Debug)]
pub struct Arena<T> {
    /// Handle bookkeeping.
    pool: SlotPool,
    /// Payload cells, parallel to the pool's slots.
    storage: Vec<Option<T>>,
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pool: SlotPool::new(),
            storage: Vec::new(),
        }
    }

    /// Creates an empty arena with room for `capacity` entries before
    /// growing. The capacity is a reservation, not a limit.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pool: SlotPool::with_capacity(capacity),
            storage: Vec::with_capacity(capacity),
        }
    }

    /// Stores `value` and returns its handle.
    ///
    /// This is an amortized **O(1)** operation.
    #[inline]
    pub fn create(&mut self, value: T) -> Handle {
        self.create_with(|_| value)
    }

    /// Stores the value built by `init`, which receives the issued handle.
    ///
    /// Useful for payloads that record their own handle.
    #[inline]
    pub fn create_with<F>(&mut self, init: F) -> Handle
    where
        F: FnOnce(Handle) -> T,
    {
        let handle = self.pool.acquire();
        let value = Some(init(handle));

        if handle.index() == self.storage.len() {
            self.storage.push(value);
        } else {
            self.storage[handle.index()] = value;
        }

        debug_assert_eq!(self.storage.len(), self.pool.slot_count());
        handle
    }

    /// Stores `T::default()` and returns its handle.
    #[inline]
    pub fn create_default(&mut self) -> Handle
    where
        T: Default,
    {
        self.create_with(|_| T::default())
    }

    /// Drops the value behind `handle` and frees its slot.
    ///
    /// The caller must pass a live handle. Afterwards the handle is invalid
    /// until a later `create` reissues it.
    #[inline]
    pub fn destroy(&mut self, handle: Handle) {
        drop(self.remove(handle));
    }

    /// Frees the slot behind `handle` and returns the value it held.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is not live in this arena.
    pub fn remove(&mut self, handle: Handle) -> T {
        debug_assert!(self.valid(handle), "destroy of invalid handle {handle}");

        let Some(value) = self.storage[handle.index()].take() else {
            panic!("destroy of invalid handle {handle}");
        };
        self.pool.dispose(handle);
        value
    }

    /// Checks whether `handle` refers to a live value.
    #[inline]
    #[must_use]
    pub fn valid(&self, handle: Handle) -> bool {
        self.pool.valid(handle)
    }

    /// Returns the value behind `handle`, or `None` if it is not live.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.storage.get(handle.index())?.as_ref()
    }

    /// Returns the value behind `handle` mutably, or `None` if it is not live.
    #[inline]
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.storage.get_mut(handle.index())?.as_mut()
    }

    /// Calls `visit` for every live entry, in ascending handle order.
    pub fn each<F>(&self, mut visit: F)
    where
        F: FnMut(Handle, &T),
    {
        for (handle, value) in self.iter() {
            visit(handle, value);
        }
    }

    /// Calls `visit` for every live entry mutably, in ascending handle order.
    pub fn each_mut<F>(&mut self, mut visit: F)
    where
        F: FnMut(Handle, &mut T),
    {
        for (handle, value) in self.iter_mut() {
            visit(handle, value);
        }
    }

    /// Iterates over live entries in ascending handle order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.storage
            .iter()
            .zip(0u32..)
            .filter_map(|(cell, raw)| cell.as_ref().map(|v| (Handle::from_raw(raw), v)))
    }

    /// Iterates mutably over live entries in ascending handle order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.storage
            .iter_mut()
            .zip(0u32..)
            .filter_map(|(cell, raw)| cell.as_mut().map(|v| (Handle::from_raw(raw), v)))
    }

    /// Iterates over live handles in ascending order.
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.pool.iter()
    }

    /// Returns the number of live entries.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.pool.len()
    }

    /// Returns `true` if the arena holds no live entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Drops every live value and resets handle numbering.
    pub fn clear(&mut self) {
        self.storage.clear();
        self.pool.clear();
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<Handle> for Arena<T> {
    type Output = T;

    #[inline]
    fn index(&self, handle: Handle) -> &T {
        match self.get(handle) {
            Some(value) => value,
            None => panic!("arena lookup of invalid handle {handle}"),
        }
    }
}

impl<T> IndexMut<Handle> for Arena<T> {
    #[inline]
    fn index_mut(&mut self, handle: Handle) -> &mut T {
        match self.get_mut(handle) {
            Some(value) => value,
            None => panic!("arena lookup of invalid handle {handle}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Payload that counts its drops.
    struct DropCounter(Rc<Cell<usize>>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_arena_payload_integrity() {
        let mut arena: Arena<i32> = Arena::new();

        let h = arena.create(42);
        assert_eq!(arena[h], 42);

        arena[h] = 7;
        assert_eq!(arena[h], 7);
        assert_eq!(arena.get(h), Some(&7));
    }

    #[test]
    fn test_arena_reuse_replaces_payload() {
        let mut arena: Arena<&str> = Arena::new();

        let h1 = arena.create("first");
        arena.destroy(h1);
        assert!(arena.get(h1).is_none());

        let h2 = arena.create("second");
        assert_eq!(h1, h2);
        assert_eq!(arena[h2], "second");
    }

    #[test]
    fn test_create_with_sees_own_handle() {
        let mut arena: Arena<Handle> = Arena::new();
        let _ = arena.create_default();
        let h = arena.create_with(|me| me);
        assert_eq!(arena[h], h);
    }

    #[test]
    fn test_remove_returns_value() {
        let mut arena = Arena::with_capacity(2);
        let h = arena.create(String::from("texture"));
        assert_eq!(arena.remove(h), "texture");
        assert!(arena.is_empty());
    }

    #[test]
    fn test_destructor_runs_once_per_entry() {
        let drops = Rc::new(Cell::new(0));
        let mut arena = Arena::new();

        let handles: Vec<Handle> = (0..10)
            .map(|_| arena.create(DropCounter(Rc::clone(&drops))))
            .collect();

        // Interleave destroys with fresh creates.
        for &h in handles.iter().step_by(2) {
            arena.destroy(h);
        }
        assert_eq!(drops.get(), 5);

        let extra: Vec<Handle> = (0..3)
            .map(|_| arena.create(DropCounter(Rc::clone(&drops))))
            .collect();
        for h in extra {
            arena.destroy(h);
        }
        for &h in handles.iter().skip(1).step_by(2) {
            arena.destroy(h);
        }

        assert_eq!(drops.get(), 13);
        assert!(arena.is_empty());
    }

    #[test]
    fn test_clear_drops_live_values() {
        let drops = Rc::new(Cell::new(0));
        let mut arena = Arena::new();
        for _ in 0..4 {
            let _ = arena.create(DropCounter(Rc::clone(&drops)));
        }

        arena.clear();
        assert_eq!(drops.get(), 4);
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn test_each_after_destroying_half() {
        let mut arena = Arena::new();
        let handles: Vec<Handle> = (0..10u32).map(|i| arena.create(i)).collect();
        for &h in handles.iter().step_by(2) {
            arena.destroy(h);
        }

        let mut visited = Vec::new();
        arena.each(|h, &v| visited.push((h, v)));

        let expected: Vec<(Handle, u32)> = handles
            .iter()
            .copied()
            .zip(0u32..)
            .skip(1)
            .step_by(2)
            .collect();
        assert_eq!(visited, expected);
    }

    #[test]
    fn test_each_mut_updates_all() {
        let mut arena = Arena::new();
        let a = arena.create(1);
        let b = arena.create(2);

        arena.each_mut(|_, v| *v *= 10);

        assert_eq!(arena[a], 10);
        assert_eq!(arena[b], 20);
    }

    #[test]
    #[should_panic(expected = "invalid handle")]
    fn test_index_invalid_handle_panics() {
        let arena: Arena<u8> = Arena::new();
        let value = arena[Handle::from_raw(3)];
        assert_eq!(value, 0);
    }

    #[test]
    #[should_panic(expected = "destroy of invalid handle")]
    fn test_destroy_stale_handle_panics() {
        let mut arena = Arena::new();
        let h = arena.create(1u8);
        let _live = arena.create(2u8);
        arena.destroy(h);
        arena.destroy(h);
    }

    proptest! {
        /// `iter` visits exactly the live handles, each once, ascending,
        /// and every value matches what was stored.
        #[test]
        fn prop_iter_matches_model(ops in proptest::collection::vec(any::<(bool, u16)>(), 0..200)) {
            let mut arena: Arena<u16> = Arena::new();
            let mut model = std::collections::BTreeMap::new();

            for (create, value) in ops {
                if create || model.is_empty() {
                    let h = arena.create(value);
                    prop_assert!(model.insert(h, value).is_none());
                } else {
                    let h = *model.keys().nth(usize::from(value) % model.len()).unwrap();
                    model.remove(&h);
                    arena.destroy(h);
                }
            }

            let visited: Vec<(Handle, u16)> = arena.iter().map(|(h, &v)| (h, v)).collect();
            let expected: Vec<(Handle, u16)> = model.into_iter().collect();
            prop_assert_eq!(visited, expected);
        }
    }
}
