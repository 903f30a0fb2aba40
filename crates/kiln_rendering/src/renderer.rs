//! # Renderer
//!
//! Ties the texture and sprite tables to the instance buffer. Each frame,
//! live sprites are grouped by texture and written into one instance
//! region per texture; the result is a list of instanced draws.

use std::collections::BTreeMap;
use std::sync::Arc;

use kiln_core::{EngineConfig, Handle};
use tracing::{debug, warn};

use crate::backend::{GpuBackend, ImageId};
use crate::error::{RenderError, RenderResult};
use crate::instancing::{InstanceBuffer, SpriteInstance};
use crate::sprite::Sprites;
use crate::texture::Textures;

/// Abandoned instance bytes tolerated before the buffer is repacked.
const REPACK_THRESHOLD: u64 = 64 * 1024;

/// One instanced draw: every sprite of one texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawBatch {
    /// Texture handle.
    pub texture: Handle,
    /// Device image to bind.
    pub image: ImageId,
    /// First instance in the instance buffer.
    pub first_instance: u32,
    /// Number of instances.
    pub instance_count: u32,
}

/// Sprite renderer over a [`GpuBackend`].
pub struct Renderer<B: GpuBackend> {
    backend: Arc<B>,
    textures: Textures<B>,
    sprites: Sprites,
    instances: InstanceBuffer,
    /// Instance region of each texture that had sprites last frame.
    regions: BTreeMap<Handle, Handle>,
    batch_hint: u32,
    frame: u64,
}

impl<B: GpuBackend> Renderer<B> {
    /// Creates a renderer with table reservations from `config`.
    #[must_use]
    pub fn new(backend: Arc<B>, config: &EngineConfig) -> Self {
        Self {
            textures: Textures::with_capacity(Arc::clone(&backend), config.arenas.textures),
            sprites: Sprites::with_capacity(config.arenas.sprites),
            instances: InstanceBuffer::new(),
            regions: BTreeMap::new(),
            batch_hint: config.instances.batch_hint,
            frame: 0,
            backend,
        }
    }

    /// Texture table.
    #[must_use]
    pub const fn textures(&self) -> &Textures<B> {
        &self.textures
    }

    /// Sprite table.
    #[must_use]
    pub const fn sprites(&self) -> &Sprites {
        &self.sprites
    }

    /// Instance buffer as of the last frame.
    #[must_use]
    pub const fn instances(&self) -> &InstanceBuffer {
        &self.instances
    }

    /// Device backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Frames prepared so far.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Adds a sprite for a live texture.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidHandle`] if `texture` is not live.
    pub fn create_sprite(&self, texture: Handle) -> RenderResult<Handle> {
        if !self.textures.is_texture_valid(texture) {
            return Err(RenderError::InvalidHandle(texture));
        }
        Ok(self.sprites.create_sprite(texture))
    }

    /// Builds this frame's draw list and uploads instance data.
    ///
    /// Batches come out in ascending texture-handle order; within a batch,
    /// sprites are ordered by layer, then by handle. Sprites whose texture
    /// has been destroyed are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Backend`] if the instance upload fails.
    pub fn prepare_frame(&mut self) -> RenderResult<Vec<DrawBatch>> {
        let mut groups: BTreeMap<Handle, Vec<(i32, SpriteInstance)>> = BTreeMap::new();
        self.sprites.for_each_sprite(|_, sprite| {
            groups
                .entry(sprite.texture)
                .or_default()
                .push((sprite.layer, sprite.instance()));
        });

        self.repack_if_fragmented();

        // Textures that lost all their sprites give their region back.
        let idle: Vec<Handle> = self
            .regions
            .keys()
            .filter(|texture| !groups.contains_key(texture))
            .copied()
            .collect();
        for texture in idle {
            if let Some(region) = self.regions.remove(&texture) {
                self.instances.release(region)?;
            }
        }

        let mut batches = Vec::with_capacity(groups.len());
        for (texture, mut group) in groups {
            let Some(data) = self.textures.get_texture(texture) else {
                warn!(%texture, sprites = group.len(), "skipping sprites of destroyed texture");
                if let Some(region) = self.regions.remove(&texture) {
                    self.instances.release(region)?;
                }
                continue;
            };

            group.sort_by_key(|&(layer, _)| layer);
            let packed: Vec<SpriteInstance> = group.into_iter().map(|(_, i)| i).collect();

            let instances = &mut self.instances;
            let hint = self.batch_hint.max(u32::try_from(packed.len()).unwrap_or(u32::MAX));
            let region = *self
                .regions
                .entry(texture)
                .or_insert_with(|| instances.reserve(hint));
            let first_instance = instances.write(region, &packed)?;

            batches.push(DrawBatch {
                texture,
                image: data.image,
                first_instance,
                instance_count: u32::try_from(packed.len()).unwrap_or(u32::MAX),
            });
        }

        self.instances.flush(self.backend.as_ref())?;
        self.frame += 1;
        Ok(batches)
    }

    /// Drops all regions once too much of the buffer is abandoned, so the
    /// next frame packs batches from offset 0.
    fn repack_if_fragmented(&mut self) {
        let wasted = self.instances.wasted_bytes();
        let live = self.instances.watermark() - wasted;
        if wasted > REPACK_THRESHOLD && wasted > live {
            debug!(wasted, live, "repacking instance buffer");
            self.regions.clear();
            self.instances.reset();
        }
    }
}

impl<B: GpuBackend> Drop for Renderer<B> {
    fn drop(&mut self) {
        self.instances.destroy_device_buffer(self.backend.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::texture::{FilterMode, TextureFormat};

    fn renderer() -> Renderer<HeadlessBackend> {
        Renderer::new(Arc::new(HeadlessBackend::new()), &EngineConfig::default())
    }

    fn texture(renderer: &Renderer<HeadlessBackend>) -> Handle {
        renderer
            .textures()
            .create_texture([4, 4], FilterMode::Nearest, TextureFormat::Rgba8Unorm)
            .unwrap()
    }

    #[test]
    fn test_create_sprite_checks_texture() {
        let renderer = renderer();
        let bogus = Handle::from_raw(9);
        assert_eq!(renderer.create_sprite(bogus), Err(RenderError::InvalidHandle(bogus)));

        let t = texture(&renderer);
        let s = renderer.create_sprite(t).unwrap();
        assert_eq!(renderer.sprites().get_sprite(s).unwrap().texture, t);
    }

    #[test]
    fn test_prepare_frame_batches_by_texture() {
        let mut renderer = renderer();
        let t0 = texture(&renderer);
        let t1 = texture(&renderer);

        let a = renderer.create_sprite(t1).unwrap();
        let _b = renderer.create_sprite(t0).unwrap();
        let c = renderer.create_sprite(t1).unwrap();
        renderer.sprites().set_sprite_layer(a, 5).unwrap();
        renderer.sprites().set_sprite_position(c, [9.0, 9.0]).unwrap();

        let batches = renderer.prepare_frame().unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].texture, t0);
        assert_eq!(batches[0].instance_count, 1);
        assert_eq!(batches[1].texture, t1);
        assert_eq!(batches[1].instance_count, 2);
        assert_eq!(batches[1].first_instance, 64); // default batch hint

        // Layer ordering: `c` (layer 0) draws before `a` (layer 5).
        let region = renderer.regions[&t1];
        let stored = renderer.instances().read(region).unwrap();
        assert_eq!(stored[0].position_rotation[0], 9.0);
        assert_eq!(stored[1].position_rotation[3], 5.0);

        let device = renderer.instances().device_buffer().unwrap();
        let staged = renderer.instances().as_bytes();
        let contents = renderer.backend().buffer_contents(device).unwrap();
        assert_eq!(&contents[..staged.len()], staged);
        assert_eq!(renderer.frame(), 1);
    }

    #[test]
    fn test_destroyed_texture_is_skipped() {
        let mut renderer = renderer();
        let t = texture(&renderer);
        let _s = renderer.create_sprite(t).unwrap();
        renderer.prepare_frame().unwrap();
        assert_eq!(renderer.instances().region_count(), 1);

        renderer.textures().destroy_texture(t).unwrap();
        let batches = renderer.prepare_frame().unwrap();
        assert!(batches.is_empty());
        assert_eq!(renderer.instances().region_count(), 0);
    }

    #[test]
    fn test_idle_texture_releases_region() {
        let mut renderer = renderer();
        let t = texture(&renderer);
        let s = renderer.create_sprite(t).unwrap();
        renderer.prepare_frame().unwrap();

        renderer.sprites().destroy_sprite(s).unwrap();
        assert!(renderer.prepare_frame().unwrap().is_empty());
        assert_eq!(renderer.instances().region_count(), 0);
    }

    #[test]
    fn test_regions_are_stable_across_frames() {
        let mut renderer = renderer();
        let t = texture(&renderer);
        for _ in 0..3 {
            let _ = renderer.create_sprite(t).unwrap();
        }

        let first = renderer.prepare_frame().unwrap();
        let watermark = renderer.instances().watermark();
        let second = renderer.prepare_frame().unwrap();

        assert_eq!(first, second);
        assert_eq!(renderer.instances().watermark(), watermark);
    }

    #[test]
    fn test_fragmented_buffer_is_repacked() {
        let mut renderer = renderer();
        let textures: Vec<Handle> = (0..3).map(|_| texture(&renderer)).collect();
        for &t in &textures {
            let _ = renderer.create_sprite(t).unwrap();
        }
        renderer.prepare_frame().unwrap();

        // Grow the first batch far past its region so it relocates.
        for _ in 0..2000 {
            let _ = renderer.create_sprite(textures[0]).unwrap();
        }
        renderer.prepare_frame().unwrap();
        renderer.textures().destroy_texture(textures[0]).unwrap();
        renderer.prepare_frame().unwrap();
        assert!(renderer.instances().wasted_bytes() > REPACK_THRESHOLD);

        let batches = renderer.prepare_frame().unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].first_instance, 0);
        assert_eq!(renderer.instances().wasted_bytes(), 0);
    }

    #[test]
    fn test_drop_releases_device_buffer() {
        let backend = Arc::new(HeadlessBackend::new());
        {
            let mut renderer = Renderer::new(Arc::clone(&backend), &EngineConfig::default());
            let t = renderer
                .textures()
                .create_texture([1, 1], FilterMode::Nearest, TextureFormat::R8Unorm)
                .unwrap();
            let _ = renderer.create_sprite(t).unwrap();
            renderer.prepare_frame().unwrap();
            assert_eq!(backend.buffer_count(), 1);
        }
        assert_eq!(backend.buffer_count(), 0);
        assert_eq!(backend.image_count(), 0);
    }
}
