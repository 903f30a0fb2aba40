//! Instance data structures for GPU upload.

use bytemuck::{Pod, Zeroable};

/// Per-instance data sent to the GPU.
///
/// Consumed by the sprite vertex shader. The struct is 64 bytes, so every
/// power-of-two byte region of at least one instance starts on an instance
/// boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SpriteInstance {
    /// Center (xy), rotation in radians (z), layer (w).
    pub position_rotation: [f32; 4],
    /// Width and height (xy); zw unused.
    pub size: [f32; 4],
    /// UV offset in xy, UV scale in zw.
    pub uv_offset_scale: [f32; 4],
    /// RGBA tint.
    pub color: [f32; 4],
}

impl SpriteInstance {
    /// Size in bytes.
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;
}
