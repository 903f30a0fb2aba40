//! # Rendering Error Types
//!
//! Recoverable failures of the rendering tables. Handle misuse inside the
//! core arena is a contract violation; at this layer it is checked and
//! reported as [`RenderError::InvalidHandle`].

use kiln_core::Handle;
use thiserror::Error;

use crate::backend::{BufferId, ImageId};

/// Failures reported by a [`GpuBackend`](crate::GpuBackend).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The device could not satisfy an allocation.
    #[error("out of device memory: requested {requested} bytes")]
    OutOfMemory {
        /// Bytes requested.
        requested: u64,
    },

    /// The image id is not known to the device.
    #[error("unknown image {0}")]
    UnknownImage(ImageId),

    /// The buffer id is not known to the device.
    #[error("unknown buffer {0}")]
    UnknownBuffer(BufferId),

    /// The device dropped a transfer.
    #[error("device lost during transfer to {0}")]
    TransferFailed(BufferId),

    /// A write does not fit the target resource.
    #[error("write of {len} bytes at offset {offset} exceeds resource size {size}")]
    OutOfBounds {
        /// Write offset in bytes.
        offset: u64,
        /// Write length in bytes.
        len: u64,
        /// Resource size in bytes.
        size: u64,
    },
}

/// Errors that can occur in the rendering tables.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The handle is not live in the table it was passed to.
    #[error("invalid handle {0}")]
    InvalidHandle(Handle),

    /// Textures must have a non-zero width and height.
    #[error("texture extent must be non-zero, got {width}x{height}")]
    ZeroExtent {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Pixel data does not match the texture's size and format.
    #[error("pixel data size mismatch: expected {expected} bytes, got {actual}")]
    DataSizeMismatch {
        /// `width * height * bytes_per_pixel`.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },

    /// The device rejected the operation.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;
