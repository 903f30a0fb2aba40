//! # GPU Backend
//!
//! The device seam. Swapchain, pipelines and physical device selection live
//! behind this trait; the rendering tables only create, fill and destroy
//! images and buffers through it.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use kiln_core::{Arena, Handle};
use parking_lot::Mutex;

use crate::error::BackendError;

/// Device-side image identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageId(pub Handle);

/// Device-side buffer identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub Handle);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image{}", self.0)
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer{}", self.0)
    }
}

/// Parameters for a 2D sampled image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageDesc {
    /// Image extent (depth is always 1).
    pub size: wgpu::Extent3d,
    /// Texel format.
    pub format: wgpu::TextureFormat,
    /// Sampler filter for minification and magnification.
    pub filter: wgpu::FilterMode,
    /// Bytes in one full upload of the image.
    pub byte_len: usize,
}

/// Device operations the rendering tables depend on.
///
/// Implementations synchronize internally; every method takes `&self`.
pub trait GpuBackend: Send + Sync {
    /// Allocates an image.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::OutOfMemory`] if the device is exhausted.
    fn create_image(&self, desc: &ImageDesc) -> Result<ImageId, BackendError>;

    /// Replaces the full contents of an image.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is unknown or `pixels` has the wrong size.
    fn upload_image(&self, image: ImageId, pixels: &[u8]) -> Result<(), BackendError>;

    /// Releases an image. Unknown ids are ignored.
    fn destroy_image(&self, image: ImageId);

    /// Allocates a buffer of `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::OutOfMemory`] if the device is exhausted.
    fn create_buffer(&self, size: u64) -> Result<BufferId, BackendError>;

    /// Writes `bytes` into a buffer at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is unknown or the write overflows it.
    fn write_buffer(&self, buffer: BufferId, offset: u64, bytes: &[u8]) -> Result<(), BackendError>;

    /// Releases a buffer. Unknown ids are ignored.
    fn destroy_buffer(&self, buffer: BufferId);
}

/// An image held by [`HeadlessBackend`].
#[derive(Clone, Debug)]
pub struct HeadlessImage {
    /// Creation parameters.
    pub desc: ImageDesc,
    /// Last uploaded contents (zeroed at creation).
    pub pixels: Vec<u8>,
}

#[derive(Default)]
struct HeadlessState {
    images: Arena<HeadlessImage>,
    buffers: Arena<Vec<u8>>,
    bytes_uploaded: u64,
}

/// In-memory backend for servers, tools and tests.
///
/// Images and buffers live in host memory, addressed through their own
/// arenas. [`fail_next_allocation`](Self::fail_next_allocation) simulates
/// device exhaustion and [`fail_next_write`](Self::fail_next_write) a
/// dropped transfer.
#[derive(Default)]
pub struct HeadlessBackend {
    state: Mutex<HeadlessState>,
    fail_next: AtomicBool,
    fail_write: AtomicBool,
}

impl HeadlessBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next image or buffer allocation fail with
    /// [`BackendError::OutOfMemory`].
    pub fn fail_next_allocation(&self) {
        self.fail_next.store(true, Ordering::Release);
    }

    /// Makes the next buffer write fail with
    /// [`BackendError::TransferFailed`], leaving the buffer untouched.
    pub fn fail_next_write(&self) {
        self.fail_write.store(true, Ordering::Release);
    }

    /// Number of live images.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.state.lock().images.len()
    }

    /// Number of live buffers.
    #[must_use]
    pub fn buffer_count(&self) -> usize {
        self.state.lock().buffers.len()
    }

    /// Copy of an image's current contents.
    #[must_use]
    pub fn image(&self, image: ImageId) -> Option<HeadlessImage> {
        self.state.lock().images.get(image.0).cloned()
    }

    /// Copy of a buffer's current contents.
    #[must_use]
    pub fn buffer_contents(&self, buffer: BufferId) -> Option<Vec<u8>> {
        self.state.lock().buffers.get(buffer.0).cloned()
    }

    /// Total bytes written through `upload_image` and `write_buffer`.
    #[must_use]
    pub fn bytes_uploaded(&self) -> u64 {
        self.state.lock().bytes_uploaded
    }

    fn check_allocation(&self, requested: u64) -> Result<(), BackendError> {
        if self.fail_next.swap(false, Ordering::AcqRel) {
            return Err(BackendError::OutOfMemory { requested });
        }
        Ok(())
    }
}

impl GpuBackend for HeadlessBackend {
    fn create_image(&self, desc: &ImageDesc) -> Result<ImageId, BackendError> {
        self.check_allocation(desc.byte_len as u64)?;
        let image = HeadlessImage {
            desc: *desc,
            pixels: vec![0; desc.byte_len],
        };
        Ok(ImageId(self.state.lock().images.create(image)))
    }

    fn upload_image(&self, image: ImageId, pixels: &[u8]) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        let target = state
            .images
            .get_mut(image.0)
            .ok_or(BackendError::UnknownImage(image))?;

        if pixels.len() != target.pixels.len() {
            return Err(BackendError::OutOfBounds {
                offset: 0,
                len: pixels.len() as u64,
                size: target.pixels.len() as u64,
            });
        }
        target.pixels.copy_from_slice(pixels);
        state.bytes_uploaded += pixels.len() as u64;
        Ok(())
    }

    fn destroy_image(&self, image: ImageId) {
        let mut state = self.state.lock();
        if state.images.valid(image.0) {
            state.images.destroy(image.0);
        }
    }

    fn create_buffer(&self, size: u64) -> Result<BufferId, BackendError> {
        self.check_allocation(size)?;
        let len = usize::try_from(size).map_err(|_| BackendError::OutOfMemory { requested: size })?;
        Ok(BufferId(self.state.lock().buffers.create(vec![0; len])))
    }

    fn write_buffer(&self, buffer: BufferId, offset: u64, bytes: &[u8]) -> Result<(), BackendError> {
        if self.fail_write.swap(false, Ordering::AcqRel) {
            return Err(BackendError::TransferFailed(buffer));
        }
        let mut state = self.state.lock();
        let target = state
            .buffers
            .get_mut(buffer.0)
            .ok_or(BackendError::UnknownBuffer(buffer))?;

        let size = target.len() as u64;
        let len = bytes.len() as u64;
        if offset.checked_add(len).map_or(true, |end| end > size) {
            return Err(BackendError::OutOfBounds { offset, len, size });
        }

        #[allow(clippy::cast_possible_truncation)]
        let start = offset as usize;
        target[start..start + bytes.len()].copy_from_slice(bytes);
        state.bytes_uploaded += len;
        Ok(())
    }

    fn destroy_buffer(&self, buffer: BufferId) {
        let mut state = self.state.lock();
        if state.buffers.valid(buffer.0) {
            state.buffers.destroy(buffer.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(width: u32, height: u32) -> ImageDesc {
        ImageDesc {
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            format: wgpu::TextureFormat::Rgba8Unorm,
            filter: wgpu::FilterMode::Nearest,
            byte_len: (width * height * 4) as usize,
        }
    }

    #[test]
    fn test_image_lifecycle() {
        let backend = HeadlessBackend::new();
        let image = backend.create_image(&desc(2, 2)).unwrap();
        assert_eq!(backend.image_count(), 1);

        backend.upload_image(image, &[7; 16]).unwrap();
        assert_eq!(backend.image(image).unwrap().pixels, vec![7; 16]);
        assert_eq!(backend.bytes_uploaded(), 16);

        backend.destroy_image(image);
        assert_eq!(backend.image_count(), 0);
        assert_eq!(
            backend.upload_image(image, &[0; 16]),
            Err(BackendError::UnknownImage(image))
        );
    }

    #[test]
    fn test_fail_next_allocation_is_one_shot() {
        let backend = HeadlessBackend::new();
        backend.fail_next_allocation();

        assert_eq!(
            backend.create_buffer(64),
            Err(BackendError::OutOfMemory { requested: 64 })
        );
        assert!(backend.create_buffer(64).is_ok());
    }

    #[test]
    fn test_fail_next_write_is_one_shot() {
        let backend = HeadlessBackend::new();
        let buffer = backend.create_buffer(4).unwrap();
        backend.fail_next_write();

        assert_eq!(
            backend.write_buffer(buffer, 0, &[9; 4]),
            Err(BackendError::TransferFailed(buffer))
        );
        assert_eq!(backend.buffer_contents(buffer).unwrap(), vec![0; 4]);
        backend.write_buffer(buffer, 0, &[9; 4]).unwrap();
        assert_eq!(backend.buffer_contents(buffer).unwrap(), vec![9; 4]);
    }

    #[test]
    fn test_buffer_write_bounds() {
        let backend = HeadlessBackend::new();
        let buffer = backend.create_buffer(8).unwrap();

        backend.write_buffer(buffer, 4, &[1, 2, 3, 4]).unwrap();
        assert_eq!(backend.buffer_contents(buffer).unwrap(), vec![0, 0, 0, 0, 1, 2, 3, 4]);

        assert!(matches!(
            backend.write_buffer(buffer, 6, &[0; 4]),
            Err(BackendError::OutOfBounds { offset: 6, len: 4, size: 8 })
        ));
    }
}
