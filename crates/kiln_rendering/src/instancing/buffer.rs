//! Zone-placed instance buffer.
//!
//! The staging bytes mirror the device buffer. A [`Zone`] decides where each
//! batch lives; this type grows the staging copy to the zone watermark,
//! moves bytes when a region relocates, and uploads the dirty span.

use std::ops::Range;

use kiln_core::{Handle, Region, Zone};
use tracing::debug;

use super::instance_data::SpriteInstance;
use crate::backend::{BufferId, GpuBackend};
use crate::error::{RenderError, RenderResult};

#[derive(Clone, Copy, Debug)]
struct DeviceBuffer {
    id: BufferId,
    size: u64,
}

#[allow(clippy::cast_possible_truncation)]
#[inline]
const fn to_usize(bytes: u64) -> usize {
    bytes as usize
}

/// Instance data for all sprite batches, one zone region per batch.
///
/// Regions are never compacted in place. Once enough space has been
/// abandoned, the owner calls [`reset`](Self::reset) and re-reserves.
#[derive(Debug, Default)]
pub struct InstanceBuffer {
    /// Region placement, in bytes.
    zone: Zone,
    /// Host copy of the device buffer.
    staging: Vec<u8>,
    /// Bytes written since the last flush.
    dirty: Option<Range<u64>>,
    /// Device buffer, created on first flush.
    device: Option<DeviceBuffer>,
}

impl InstanceBuffer {
    /// Creates an empty buffer. No device memory is allocated until the
    /// first [`flush`](Self::flush).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a region for about `instances` instances.
    pub fn reserve(&mut self, instances: u32) -> Handle {
        self.zone.create(u64::from(instances.max(1)) * SpriteInstance::SIZE)
    }

    /// Replaces the contents of a region and returns the index of its first
    /// instance in the device buffer.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidHandle`] if `handle` is not a live region.
    pub fn write(&mut self, handle: Handle, instances: &[SpriteInstance]) -> RenderResult<u32> {
        if !self.zone.valid(handle) {
            return Err(RenderError::InvalidHandle(handle));
        }

        let bytes: &[u8] = bytemuck::cast_slice(instances);
        let region = *self.zone.assign(handle, bytes.len() as u64);
        self.fit_staging();

        let start = to_usize(region.offset);
        self.staging[start..start + bytes.len()].copy_from_slice(bytes);
        self.mark_dirty(region.offset, region.size);

        Ok(Self::first_instance(&region))
    }

    /// Resizes a region to `instances` instances, keeping existing contents.
    ///
    /// If the region relocates, its old bytes are copied to the new offset.
    /// Growth is zero-filled.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidHandle`] if `handle` is not a live region.
    pub fn resize(&mut self, handle: Handle, instances: u32) -> RenderResult<Region> {
        let old = *self
            .zone
            .get(handle)
            .ok_or(RenderError::InvalidHandle(handle))?;

        let new_size = u64::from(instances) * SpriteInstance::SIZE;
        let region = *self.zone.assign(handle, new_size);
        self.fit_staging();

        let keep = old.size.min(new_size);
        if region.offset != old.offset {
            let from = to_usize(old.offset)..to_usize(old.offset + keep);
            self.staging.copy_within(from, to_usize(region.offset));
        }
        if new_size > keep {
            let tail = to_usize(region.offset + keep)..to_usize(region.offset + new_size);
            self.staging[tail].fill(0);
        }

        if region.offset == old.offset {
            self.mark_dirty(region.offset + keep, new_size - keep);
        } else {
            self.mark_dirty(region.offset, new_size);
        }
        Ok(region)
    }

    /// Forgets a region. Its bytes stay in the buffer until [`reset`](Self::reset).
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidHandle`] if `handle` is not a live region.
    pub fn release(&mut self, handle: Handle) -> RenderResult<()> {
        if !self.zone.valid(handle) {
            return Err(RenderError::InvalidHandle(handle));
        }
        self.zone.destroy(handle);
        Ok(())
    }

    /// Placement of a live region.
    #[must_use]
    pub fn region(&self, handle: Handle) -> Option<Region> {
        self.zone.get(handle).copied()
    }

    /// Reads back the instances currently stored in a region.
    #[must_use]
    pub fn read(&self, handle: Handle) -> Option<Vec<SpriteInstance>> {
        let region = self.zone.get(handle)?;
        let start = to_usize(region.offset);
        let bytes = self.staging.get(start..start + to_usize(region.size))?;
        Some(
            bytes
                .chunks_exact(to_usize(SpriteInstance::SIZE))
                .map(bytemuck::pod_read_unaligned)
                .collect(),
        )
    }

    /// Number of live regions.
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.zone.len()
    }

    /// Bytes the device buffer must hold.
    #[must_use]
    pub const fn watermark(&self) -> u64 {
        self.zone.watermark()
    }

    /// Bytes lost to released and relocated regions.
    #[must_use]
    pub fn wasted_bytes(&self) -> u64 {
        self.zone.watermark() - self.zone.live_capacity()
    }

    /// Host copy of the device buffer.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.staging
    }

    /// Device buffer created by the last successful flush.
    #[must_use]
    pub fn device_buffer(&self) -> Option<BufferId> {
        self.device.map(|d| d.id)
    }

    /// Drops every region and restarts placement at offset 0.
    ///
    /// All region handles become invalid. The device buffer is kept.
    pub fn reset(&mut self) {
        self.zone.clear();
        self.staging.clear();
        self.dirty = None;
    }

    /// Uploads bytes written since the last flush.
    ///
    /// Reallocates the device buffer (rounded up to a power of two) when
    /// the staging copy has outgrown it, uploading everything. The old
    /// buffer is kept until the new one holds the full staging copy.
    ///
    /// The device buffer may be longer than [`as_bytes`](Self::as_bytes);
    /// bytes past the staging length are unspecified.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Backend`] if allocation or upload fails. The
    /// dirty span is kept so a later flush retries it.
    pub fn flush<B: GpuBackend + ?Sized>(&mut self, backend: &B) -> RenderResult<()> {
        let Some(dirty) = self.dirty.clone() else {
            return Ok(());
        };
        let needed = self.staging.len() as u64;

        match self.device {
            Some(device) if device.size >= needed => {
                let span = to_usize(dirty.start)..to_usize(dirty.end);
                backend.write_buffer(device.id, dirty.start, &self.staging[span])?;
            }
            _ => {
                let size = needed.next_power_of_two();
                let id = backend.create_buffer(size)?;
                if let Err(err) = backend.write_buffer(id, 0, &self.staging) {
                    backend.destroy_buffer(id);
                    return Err(err.into());
                }
                if let Some(old) = self.device.replace(DeviceBuffer { id, size }) {
                    backend.destroy_buffer(old.id);
                }
                debug!(size, "instance buffer reallocated");
            }
        }

        self.dirty = None;
        Ok(())
    }

    /// Releases the device buffer, if any.
    pub fn destroy_device_buffer<B: GpuBackend + ?Sized>(&mut self, backend: &B) {
        if let Some(device) = self.device.take() {
            backend.destroy_buffer(device.id);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn first_instance(region: &Region) -> u32 {
        debug_assert_eq!(region.offset % SpriteInstance::SIZE, 0);
        (region.offset / SpriteInstance::SIZE) as u32
    }

    fn fit_staging(&mut self) {
        let watermark = to_usize(self.zone.watermark());
        if self.staging.len() < watermark {
            self.staging.resize(watermark, 0);
        }
    }

    fn mark_dirty(&mut self, offset: u64, len: u64) {
        if len == 0 {
            return;
        }
        let end = offset + len;
        self.dirty = Some(match self.dirty.take() {
            Some(span) => span.start.min(offset)..span.end.max(end),
            None => offset..end,
        });
    }
}
