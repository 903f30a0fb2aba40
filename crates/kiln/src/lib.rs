//! # KILN
//!
//! Engine facade over the KILN subsystems.
//!
//! ```text
//! EngineConfig (TOML) ─→ Engine ─┬─→ Renderer<B: GpuBackend>  (textures, sprites, instances)
//!                                └─→ PhysicsWorld             (bodies, shapes)
//!
//! Engine::tick(dt): physics.step ─→ bound sprites follow bodies ─→ prepare_frame
//! ```
//!
//! Every resource is addressed by a [`Handle`]. A destroyed handle may be
//! handed out again by the next create call on the same table, so callers
//! must drop handles they destroy.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use kiln::{Engine, EngineConfig, FilterMode, HeadlessBackend, TextureFormat};
//!
//! let backend = Arc::new(HeadlessBackend::new());
//! let mut engine = Engine::new(backend, EngineConfig::default()).unwrap();
//!
//! let texture = engine
//!     .renderer()
//!     .textures()
//!     .create_texture([16, 16], FilterMode::Linear, TextureFormat::Rgba8Unorm)
//!     .unwrap();
//! let _sprite = engine.renderer().create_sprite(texture).unwrap();
//!
//! let batches = engine.tick(1.0 / 60.0).unwrap();
//! assert_eq!(batches[0].instance_count, 1);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod engine;
pub mod error;
pub mod logging;

pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use logging::init_logging;

pub use kiln_core::{Arena, ConfigError, EngineConfig, Handle, Region, SlotPool, Zone};
pub use kiln_physics::{Aabb, BodyType, PhysicsError, PhysicsWorld, ShapeDesc};
pub use kiln_rendering::{
    DrawBatch, FilterMode, GpuBackend, HeadlessBackend, RenderError, Renderer, Sprite,
    TextureFormat,
};
