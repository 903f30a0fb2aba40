//! # Memory Management
//!
//! Handle tables and placement for every subsystem's resources.
//!
//! ## Design Philosophy
//!
//! - Callers hold [`Handle`]s, never indices or pointers
//! - create/destroy/lookup are O(1)
//! - Contract violations (stale or foreign handles) are caller bugs,
//!   checked with `debug_assert!` only; `valid()` is the opt-in check

mod arena;
mod handle;
mod pool;
mod zone;

pub use arena::Arena;
pub use handle::Handle;
pub use pool::SlotPool;
pub use zone::{Region, Zone};
