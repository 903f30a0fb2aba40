//! # KILN Core
//!
//! Handle-based resource tables shared by every KILN subsystem:
//! - [`SlotPool`]: O(1) reusable integer handles
//! - [`Arena`]: one typed payload per live handle
//! - [`Zone`]: monotonic byte-range placement inside an externally owned
//!   buffer
//!
//! ## Architecture Rules
//!
//! 1. **Handles cross boundaries, pointers do not** - subsystems hand out
//!    [`Handle`]s and never expose indices or references into storage
//! 2. **No failure path in the tables** - misuse is a caller contract
//!   violation, asserted in debug builds
//! 3. **No locking** - tables are single-threaded; shared subsystems wrap
//!    them in a mutex
//!
//! ## Example
//!
//! ```rust
//! use kiln_core::{Arena, Zone};
//!
//! let mut textures: Arena<[u32; 2]> = Arena::new();
//! let t = textures.create([64, 64]);
//! assert_eq!(textures[t], [64, 64]);
//!
//! let mut zone = Zone::new();
//! let r = zone.create(256);
//! assert_eq!(zone.assign(r, 100).offset, 0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod memory;

pub use config::{ArenaConfig, EngineConfig, InstanceConfig, PhysicsConfig};
pub use error::{ConfigError, ConfigResult};
pub use memory::{Arena, Handle, Region, SlotPool, Zone};
