//! # KILN Rendering
//!
//! Resource tables for the GPU layer. Callers get opaque handles for
//! textures and sprites; device objects and storage indices never leave
//! this crate.
//!
//! ## Architecture
//!
//! ```text
//! create_texture ─→ Textures ─→ Arena<TextureData> ─→ GpuBackend::create_image
//! create_sprite  ─→ Sprites  ─→ Arena<Sprite>
//!
//! prepare_frame: sprites grouped by texture
//!      ↓
//! InstanceBuffer (Zone regions, one per texture) ─→ flush ─→ GpuBackend::write_buffer
//!      ↓
//! Vec<DrawBatch>
//! ```
//!
//! The texture and sprite tables each hold one mutex for the duration of a
//! call, so they can be shared across threads. Frame preparation takes
//! `&mut Renderer`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod backend;
pub mod error;
pub mod instancing;
pub mod renderer;
pub mod sprite;
pub mod texture;

pub use backend::{BufferId, GpuBackend, HeadlessBackend, HeadlessImage, ImageDesc, ImageId};
pub use error::{BackendError, RenderError, RenderResult};
pub use instancing::{InstanceBuffer, SpriteInstance};
pub use renderer::{DrawBatch, Renderer};
pub use sprite::{Sprite, Sprites};
pub use texture::{FilterMode, TextureData, TextureFormat, Textures};
