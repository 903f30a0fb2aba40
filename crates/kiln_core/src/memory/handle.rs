//! # Handles
//!
//! Opaque identifiers issued by a [`SlotPool`](super::SlotPool) and every
//! table built on top of one.

use std::fmt;

/// Opaque identifier for a resource in one table.
///
/// A handle is the slot index in the issuing pool. It carries no type
/// information and no generation: it is only meaningful for the table
/// that issued it, and a disposed handle is reissued verbatim by the next
/// `acquire`. Holders of a stale handle observe the new occupant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Handle(u32);

impl Handle {
    /// Null/invalid handle. Never issued by a pool.
    pub const NULL: Self = Self(u32::MAX);

    /// Creates a handle from a raw slot index.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw slot index.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the slot index as a `usize` for direct array indexing.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Checks if this handle is the null sentinel.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u32::MAX
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}
