//! # Texture Table
//!
//! Textures are handed out as opaque [`Handle`]s. The table keeps the
//! CPU-side record (size, format, filter, device image) in an [`Arena`]
//! and forwards pixel data to the [`GpuBackend`].

use std::sync::Arc;

use kiln_core::{Arena, Handle};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::backend::{GpuBackend, ImageDesc, ImageId};
use crate::error::{RenderError, RenderResult};

/// Texel formats supported for sampled textures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Single 8-bit channel (font atlases, masks).
    R8Unorm,
    /// 8-bit RGBA, linear.
    Rgba8Unorm,
    /// 8-bit RGBA, sRGB encoded.
    Rgba8UnormSrgb,
    /// 8-bit BGRA, linear.
    Bgra8Unorm,
}

impl TextureFormat {
    /// Bytes per texel.
    #[inline]
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::R8Unorm => 1,
            Self::Rgba8Unorm | Self::Rgba8UnormSrgb | Self::Bgra8Unorm => 4,
        }
    }

    /// The device format.
    #[must_use]
    pub const fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            Self::R8Unorm => wgpu::TextureFormat::R8Unorm,
            Self::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            Self::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            Self::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
        }
    }
}

/// Sampler filtering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Nearest texel (pixel art).
    #[default]
    Nearest,
    /// Bilinear.
    Linear,
}

impl FilterMode {
    /// The device filter mode.
    #[must_use]
    pub const fn to_wgpu(self) -> wgpu::FilterMode {
        match self {
            Self::Nearest => wgpu::FilterMode::Nearest,
            Self::Linear => wgpu::FilterMode::Linear,
        }
    }
}

/// CPU-side record of one texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureData {
    /// Width and height in texels.
    pub size: [u32; 2],
    /// Texel format.
    pub format: TextureFormat,
    /// Sampler filter.
    pub filter: FilterMode,
    /// Device image.
    pub image: ImageId,
    /// Number of pixel uploads since creation.
    pub revision: u64,
}

impl TextureData {
    /// Bytes in one full upload.
    #[inline]
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        self.size[0] as usize * self.size[1] as usize * self.format.bytes_per_pixel()
    }
}

/// Thread-safe texture table.
///
/// Every public call holds the table lock for its whole duration,
/// including the backend call it makes.
pub struct Textures<B: GpuBackend> {
    backend: Arc<B>,
    table: Mutex<Arena<TextureData>>,
}

impl<B: GpuBackend> Textures<B> {
    /// Creates an empty table that allocates images on `backend`.
    #[must_use]
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_capacity(backend, 0)
    }

    /// Creates an empty table with `capacity` reserved entries.
    #[must_use]
    pub fn with_capacity(backend: Arc<B>, capacity: usize) -> Self {
        Self {
            backend,
            table: Mutex::new(Arena::with_capacity(capacity)),
        }
    }

    /// Allocates a texture. Contents are zeroed until the first
    /// [`update_texture_data`](Self::update_texture_data).
    ///
    /// # Errors
    ///
    /// - [`RenderError::ZeroExtent`] if either dimension is zero
    /// - [`RenderError::Backend`] if the device allocation fails; no handle
    ///   is consumed in that case
    pub fn create_texture(
        &self,
        size: [u32; 2],
        filter: FilterMode,
        format: TextureFormat,
    ) -> RenderResult<Handle> {
        let [width, height] = size;
        if width == 0 || height == 0 {
            return Err(RenderError::ZeroExtent { width, height });
        }

        let mut table = self.table.lock();

        let desc = ImageDesc {
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            format: format.to_wgpu(),
            filter: filter.to_wgpu(),
            byte_len: width as usize * height as usize * format.bytes_per_pixel(),
        };
        let image = self.backend.create_image(&desc)?;

        let handle = table.create(TextureData {
            size,
            format,
            filter,
            image,
            revision: 0,
        });

        debug!(%handle, width, height, ?format, ?filter, "texture created");
        Ok(handle)
    }

    /// Destroys a texture and releases its device image.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidHandle`] if `handle` is not live.
    pub fn destroy_texture(&self, handle: Handle) -> RenderResult<()> {
        let mut table = self.table.lock();
        if !table.valid(handle) {
            warn!(%handle, "destroy of unknown texture");
            return Err(RenderError::InvalidHandle(handle));
        }

        let texture = table.remove(handle);
        self.backend.destroy_image(texture.image);

        debug!(%handle, "texture destroyed");
        Ok(())
    }

    /// Replaces a texture's full contents.
    ///
    /// # Errors
    ///
    /// - [`RenderError::InvalidHandle`] if `handle` is not live
    /// - [`RenderError::DataSizeMismatch`] unless
    ///   `pixels.len() == width * height * bytes_per_pixel`
    /// - [`RenderError::Backend`] if the upload fails
    pub fn update_texture_data(&self, handle: Handle, pixels: &[u8]) -> RenderResult<()> {
        let mut table = self.table.lock();
        let texture = table
            .get_mut(handle)
            .ok_or(RenderError::InvalidHandle(handle))?;

        let expected = texture.byte_len();
        if pixels.len() != expected {
            warn!(%handle, expected, actual = pixels.len(), "texture upload size mismatch");
            return Err(RenderError::DataSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        self.backend.upload_image(texture.image, pixels)?;
        texture.revision += 1;
        Ok(())
    }

    /// Width and height of a live texture.
    #[must_use]
    pub fn get_texture_size(&self, handle: Handle) -> Option<[u32; 2]> {
        self.table.lock().get(handle).map(|t| t.size)
    }

    /// Format of a live texture.
    #[must_use]
    pub fn get_texture_format(&self, handle: Handle) -> Option<TextureFormat> {
        self.table.lock().get(handle).map(|t| t.format)
    }

    /// Filter of a live texture.
    #[must_use]
    pub fn get_texture_filter(&self, handle: Handle) -> Option<FilterMode> {
        self.table.lock().get(handle).map(|t| t.filter)
    }

    /// Full record of a live texture.
    #[must_use]
    pub fn get_texture(&self, handle: Handle) -> Option<TextureData> {
        self.table.lock().get(handle).copied()
    }

    /// Checks whether `handle` names a live texture.
    ///
    /// Handles are reused: after destroy + create this reports the new
    /// texture behind the same handle.
    #[must_use]
    pub fn is_texture_valid(&self, handle: Handle) -> bool {
        self.table.lock().valid(handle)
    }

    /// Number of live textures.
    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.table.lock().len()
    }

    /// Visits every live texture in ascending handle order, under the lock.
    pub fn for_each_texture<F>(&self, visit: F)
    where
        F: FnMut(Handle, &TextureData),
    {
        self.table.lock().each(visit);
    }
}

impl<B: GpuBackend> Drop for Textures<B> {
    fn drop(&mut self) {
        let table = self.table.get_mut();
        for (_, texture) in table.iter() {
            self.backend.destroy_image(texture.image);
        }
        table.clear();
    }
}
