//! # Sprite Table
//!
//! Textured quads, keyed by handle. Sprites reference their texture by
//! handle too; the renderer resolves it when building a frame.

use kiln_core::{Arena, Handle};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{RenderError, RenderResult};
use crate::instancing::SpriteInstance;

/// One textured quad.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sprite {
    /// Texture handle in the renderer's texture table.
    pub texture: Handle,
    /// Center position in world units.
    pub position: [f32; 2],
    /// Width and height in world units.
    pub size: [f32; 2],
    /// Rotation in radians, counter-clockwise.
    pub rotation: f32,
    /// UV offset (xy) and scale (zw) into the texture.
    pub uv: [f32; 4],
    /// RGBA tint.
    pub color: [f32; 4],
    /// Draw order within a texture batch; lower layers draw first.
    pub layer: i32,
}

impl Sprite {
    /// A unit quad showing the whole of `texture`, untinted.
    #[must_use]
    pub const fn new(texture: Handle) -> Self {
        Self {
            texture,
            position: [0.0, 0.0],
            size: [1.0, 1.0],
            rotation: 0.0,
            uv: [0.0, 0.0, 1.0, 1.0],
            color: [1.0, 1.0, 1.0, 1.0],
            layer: 0,
        }
    }

    /// Packs this sprite for the instance buffer.
    #[must_use]
    pub fn instance(&self) -> SpriteInstance {
        #[allow(clippy::cast_precision_loss)]
        let layer = self.layer as f32;
        SpriteInstance {
            position_rotation: [self.position[0], self.position[1], self.rotation, layer],
            size: [self.size[0], self.size[1], 0.0, 0.0],
            uv_offset_scale: self.uv,
            color: self.color,
        }
    }
}

/// Thread-safe sprite table.
pub struct Sprites {
    table: Mutex<Arena<Sprite>>,
}

impl Sprites {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty table with `capacity` reserved entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: Mutex::new(Arena::with_capacity(capacity)),
        }
    }

    /// Adds a default sprite showing `texture`.
    ///
    /// The texture handle is not checked here; see
    /// `Renderer::create_sprite` for the checked path.
    pub fn create_sprite(&self, texture: Handle) -> Handle {
        let handle = self.table.lock().create(Sprite::new(texture));
        debug!(%handle, %texture, "sprite created");
        handle
    }

    /// Removes a sprite.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidHandle`] if `handle` is not live.
    pub fn destroy_sprite(&self, handle: Handle) -> RenderResult<()> {
        let mut table = self.table.lock();
        if !table.valid(handle) {
            return Err(RenderError::InvalidHandle(handle));
        }
        table.destroy(handle);
        debug!(%handle, "sprite destroyed");
        Ok(())
    }

    /// Applies `edit` to a live sprite under the lock.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidHandle`] if `handle` is not live.
    pub fn modify<F>(&self, handle: Handle, edit: F) -> RenderResult<()>
    where
        F: FnOnce(&mut Sprite),
    {
        let mut table = self.table.lock();
        let sprite = table
            .get_mut(handle)
            .ok_or(RenderError::InvalidHandle(handle))?;
        edit(sprite);
        Ok(())
    }

    /// Moves a sprite.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidHandle`] if `handle` is not live.
    pub fn set_sprite_position(&self, handle: Handle, position: [f32; 2]) -> RenderResult<()> {
        self.modify(handle, |s| s.position = position)
    }

    /// Resizes a sprite.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidHandle`] if `handle` is not live.
    pub fn set_sprite_size(&self, handle: Handle, size: [f32; 2]) -> RenderResult<()> {
        self.modify(handle, |s| s.size = size)
    }

    /// Rotates a sprite.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidHandle`] if `handle` is not live.
    pub fn set_sprite_rotation(&self, handle: Handle, rotation: f32) -> RenderResult<()> {
        self.modify(handle, |s| s.rotation = rotation)
    }

    /// Tints a sprite.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidHandle`] if `handle` is not live.
    pub fn set_sprite_color(&self, handle: Handle, color: [f32; 4]) -> RenderResult<()> {
        self.modify(handle, |s| s.color = color)
    }

    /// Selects a sub-rectangle of the texture.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidHandle`] if `handle` is not live.
    pub fn set_sprite_uv(&self, handle: Handle, uv: [f32; 4]) -> RenderResult<()> {
        self.modify(handle, |s| s.uv = uv)
    }

    /// Sets the draw order within the sprite's texture batch.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidHandle`] if `handle` is not live.
    pub fn set_sprite_layer(&self, handle: Handle, layer: i32) -> RenderResult<()> {
        self.modify(handle, |s| s.layer = layer)
    }

    /// Copy of a live sprite.
    #[must_use]
    pub fn get_sprite(&self, handle: Handle) -> Option<Sprite> {
        self.table.lock().get(handle).copied()
    }

    /// Checks whether `handle` names a live sprite.
    #[must_use]
    pub fn is_sprite_valid(&self, handle: Handle) -> bool {
        self.table.lock().valid(handle)
    }

    /// Number of live sprites.
    #[must_use]
    pub fn sprite_count(&self) -> usize {
        self.table.lock().len()
    }

    /// Visits every live sprite in ascending handle order, under the lock.
    pub fn for_each_sprite<F>(&self, visit: F)
    where
        F: FnMut(Handle, &Sprite),
    {
        self.table.lock().each(visit);
    }
}

impl Default for Sprites {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprite_setters() {
        let sprites = Sprites::new();
        let texture = Handle::from_raw(3);
        let s = sprites.create_sprite(texture);

        sprites.set_sprite_position(s, [4.0, 5.0]).unwrap();
        sprites.set_sprite_size(s, [2.0, 3.0]).unwrap();
        sprites.set_sprite_color(s, [1.0, 0.0, 0.0, 0.5]).unwrap();
        sprites.set_sprite_uv(s, [0.5, 0.0, 0.5, 1.0]).unwrap();
        sprites.set_sprite_layer(s, -2).unwrap();
        sprites.set_sprite_rotation(s, 1.5).unwrap();

        let sprite = sprites.get_sprite(s).unwrap();
        assert_eq!(sprite.texture, texture);
        assert_eq!(sprite.position, [4.0, 5.0]);
        assert_eq!(sprite.size, [2.0, 3.0]);
        assert_eq!(sprite.layer, -2);

        let instance = sprite.instance();
        assert_eq!(instance.position_rotation, [4.0, 5.0, 1.5, -2.0]);
        assert_eq!(instance.uv_offset_scale, [0.5, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_destroyed_sprite_rejects_edits() {
        let sprites = Sprites::default();
        let s = sprites.create_sprite(Handle::from_raw(0));
        sprites.destroy_sprite(s).unwrap();

        assert!(!sprites.is_sprite_valid(s));
        assert_eq!(
            sprites.set_sprite_position(s, [0.0, 0.0]),
            Err(RenderError::InvalidHandle(s))
        );
        assert_eq!(sprites.destroy_sprite(s), Err(RenderError::InvalidHandle(s)));
        assert_eq!(sprites.sprite_count(), 0);
    }
}
