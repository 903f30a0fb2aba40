//! # Instancing
//!
//! Per-sprite GPU data, packed into one instance buffer. Each texture batch
//! owns a region of the buffer, placed by a [`Zone`](kiln_core::Zone).

mod buffer;
mod instance_data;

pub use buffer::InstanceBuffer;
pub use instance_data::SpriteInstance;
