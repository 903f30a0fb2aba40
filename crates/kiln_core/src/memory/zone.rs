//! # Zone
//!
//! Monotonic placement of byte ranges inside one logical, unbounded buffer.
//!
//! The zone never touches the buffer. It only hands out offsets; the owner
//! of the backing memory (usually a GPU buffer) resizes it whenever
//! [`Zone::watermark`] grows past its current length.

use super::arena::Arena;
use super::handle::Handle;

/// One placement inside a zone's buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Region {
    /// Byte offset of the range.
    pub offset: u64,
    /// Bytes in use.
    pub size: u64,
    /// Bytes reserved. Always a power of two and `>= size`.
    pub capacity: u64,
}

impl Region {
    /// One past the last reserved byte.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.offset + self.capacity
    }
}

/// A non-compacting region allocator.
///
/// Regions are placed at the watermark and the watermark only moves
/// forward. Byte ranges abandoned by [`destroy`](Self::destroy) or by a
/// relocating [`assign`](Self::assign) are never reused within the zone's
/// lifetime, so live regions never overlap.
///
/// # Example
///
/// ```rust
/// use kiln_core::Zone;
///
/// let mut zone = Zone::new();
/// let h = zone.create(16);
/// let region = zone.assign(h, 20);
/// assert_eq!((region.offset, region.capacity), (0, 32)); // grown in place
/// ```
#[derive(Clone, Debug, Default)]
pub struct Zone {
    /// Region records.
    regions: Arena<Region>,
    /// Next unused byte offset.
    next_offset: u64,
}

impl Zone {
    /// Creates an empty zone with the watermark at 0.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            regions: Arena::new(),
            next_offset: 0,
        }
    }

    /// Places an empty region at the watermark.
    ///
    /// Capacity is `capacity_hint` rounded up to a power of two. A zero hint
    /// reserves one byte. Hints whose power of two overflows `u64` are out
    /// of contract.
    pub fn create(&mut self, capacity_hint: u64) -> Handle {
        let region = Region {
            offset: self.next_offset,
            size: 0,
            capacity: capacity_hint.next_power_of_two(),
        };
        self.next_offset += region.capacity;
        self.regions.create(region)
    }

    /// Sets the used size of a region, growing its reservation if needed.
    ///
    /// When `new_size` exceeds the capacity:
    /// - the last-placed region (ending at the watermark) grows in place and
    ///   the watermark advances by the capacity delta;
    /// - any other region is relocated to the watermark. Its old bytes are
    ///   abandoned and the caller must copy live data to the new offset.
    ///
    /// The caller must pass a live handle.
    pub fn assign(&mut self, handle: Handle, new_size: u64) -> &Region {
        let next_offset = &mut self.next_offset;
        let region = &mut self.regions[handle];

        if new_size > region.capacity {
            let capacity = new_size.next_power_of_two();

            if region.end() == *next_offset {
                *next_offset += capacity - region.capacity;
            } else {
                region.offset = *next_offset;
                *next_offset += capacity;
            }
            region.capacity = capacity;
        }

        region.size = new_size;
        region
    }

    /// Forgets a region. Its bytes are not reclaimed.
    ///
    /// The caller must pass a live handle.
    #[inline]
    pub fn destroy(&mut self, handle: Handle) {
        self.regions.destroy(handle);
    }

    /// Checks whether `handle` refers to a live region.
    #[inline]
    #[must_use]
    pub fn valid(&self, handle: Handle) -> bool {
        self.regions.valid(handle)
    }

    /// Returns the region behind `handle`, or `None` if it is not live.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&Region> {
        self.regions.get(handle)
    }

    /// Iterates over live regions in ascending handle order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &Region)> {
        self.regions.iter()
    }

    /// Returns the number of live regions.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns `true` if the zone holds no live regions.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Returns the next unused byte offset, i.e. the minimum length of the
    /// backing buffer.
    #[inline]
    #[must_use]
    pub const fn watermark(&self) -> u64 {
        self.next_offset
    }

    /// Sum of the capacities of live regions.
    ///
    /// `watermark() - live_capacity()` is the space lost to destroyed and
    /// relocated regions.
    #[must_use]
    pub fn live_capacity(&self) -> u64 {
        self.regions.iter().map(|(_, region)| region.capacity).sum()
    }

    /// Drops every region and resets the watermark to 0.
    ///
    /// Only valid once the backing buffer has been recreated, since new
    /// regions will reuse old offsets.
    pub fn clear(&mut self) {
        self.regions.clear();
        self.next_offset = 0;
    }
}

impl std::ops::Index<Handle> for Zone {
    type Output = Region;

    #[inline]
    fn index(&self, handle: Handle) -> &Region {
        &self.regions[handle]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_create_rounds_to_power_of_two() {
        let mut zone = Zone::new();
        let a = zone.create(10);
        let b = zone.create(64);

        assert_eq!(zone[a], Region { offset: 0, size: 0, capacity: 16 });
        assert_eq!(zone[b], Region { offset: 16, size: 0, capacity: 64 });
        assert_eq!(zone.watermark(), 80);
    }

    #[test]
    fn test_zero_hint_reserves_one_byte() {
        let mut zone = Zone::new();
        let h = zone.create(0);
        assert_eq!(zone[h].capacity, 1);
        assert_eq!(zone.watermark(), 1);
    }

    #[test]
    fn test_assign_within_capacity() {
        let mut zone = Zone::new();
        let h = zone.create(16);

        let region = *zone.assign(h, 12);
        assert_eq!(region, Region { offset: 0, size: 12, capacity: 16 });
        assert_eq!(zone.watermark(), 16);

        // Shrinking keeps the reservation.
        assert_eq!(zone.assign(h, 3).capacity, 16);
    }

    #[test]
    fn test_assign_grows_last_region_in_place() {
        let mut zone = Zone::new();
        let _first = zone.create(8);
        let h = zone.create(16);
        let before = zone.watermark();

        let region = *zone.assign(h, 20);

        assert_eq!(region.offset, 8);
        assert_eq!(region.capacity, 32);
        assert_eq!(region.size, 20);
        assert_eq!(zone.watermark() - before, 16);
    }

    #[test]
    fn test_assign_relocates_earlier_region() {
        let mut zone = Zone::new();
        let a = zone.create(16);
        let b = zone.create(16);
        let b_before = zone[b];
        let watermark = zone.watermark();

        let region = *zone.assign(a, 100);

        assert!(region.offset >= watermark);
        assert_eq!(region.offset, 32);
        assert_eq!(region.capacity, 128);
        assert_eq!(zone[b], b_before);
        assert_eq!(zone.watermark(), 160);
    }

    #[test]
    fn test_destroy_does_not_reclaim() {
        let mut zone = Zone::new();
        let a = zone.create(32);
        zone.destroy(a);
        assert!(!zone.valid(a));

        let b = zone.create(32);
        assert_eq!(a, b); // Record slot is reused...
        assert_eq!(zone[b].offset, 32); // ...but the bytes are not.
        assert_eq!(zone.live_capacity(), 32);
        assert_eq!(zone.watermark(), 64);
    }

    #[test]
    fn test_clear_resets_watermark() {
        let mut zone = Zone::new();
        let _ = zone.create(1024);
        zone.clear();

        assert!(zone.is_empty());
        assert_eq!(zone.watermark(), 0);
        let h = zone.create(4);
        assert_eq!(zone[h].offset, 0);
    }

    #[test]
    #[should_panic(expected = "invalid handle")]
    fn test_assign_destroyed_region_panics() {
        let mut zone = Zone::new();
        let a = zone.create(16);
        let _b = zone.create(16);
        zone.destroy(a);
        let _ = zone.assign(a, 8);
    }

    #[test]
    #[should_panic(expected = "invalid handle")]
    fn test_destroy_twice_panics() {
        let mut zone = Zone::new();
        let a = zone.create(16);
        zone.destroy(a);
        zone.destroy(a);
    }

    proptest! {
        /// Regions placed back to back are disjoint and ordered by creation.
        #[test]
        fn prop_monotonic_placement(hints in proptest::collection::vec(1u64..4096, 1..64)) {
            let mut zone = Zone::new();
            let handles: Vec<Handle> = hints.iter().map(|&c| zone.create(c)).collect();

            for pair in handles.windows(2) {
                let (a, b) = (zone[pair[0]], zone[pair[1]]);
                prop_assert!(a.end() <= b.offset);
            }
            for (&h, &hint) in handles.iter().zip(&hints) {
                let r = zone[h];
                prop_assert!(r.capacity.is_power_of_two());
                prop_assert!(r.capacity >= hint);
            }
            prop_assert_eq!(zone.watermark(), zone.live_capacity());
        }

        /// Live regions never overlap, whatever the grow/destroy sequence.
        #[test]
        fn prop_live_regions_disjoint(ops in proptest::collection::vec((0u8..3, 1u64..512, any::<usize>()), 1..128)) {
            let mut zone = Zone::new();
            let mut live: Vec<Handle> = Vec::new();

            for (kind, size, pick) in ops {
                match kind {
                    0 => live.push(zone.create(size)),
                    1 if !live.is_empty() => {
                        let h = live[pick % live.len()];
                        let r = *zone.assign(h, size);
                        prop_assert!(r.size <= r.capacity);
                    }
                    2 if !live.is_empty() => {
                        let h = live.swap_remove(pick % live.len());
                        zone.destroy(h);
                    }
                    _ => {}
                }
            }

            let mut regions: Vec<Region> = zone.iter().map(|(_, r)| *r).collect();
            regions.sort_by_key(|r| r.offset);
            for pair in regions.windows(2) {
                prop_assert!(pair[0].end() <= pair[1].offset);
            }
            prop_assert!(regions.iter().all(|r| r.end() <= zone.watermark()));
        }
    }
}
