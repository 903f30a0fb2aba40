//! # Physics Error Types

use kiln_core::Handle;
use thiserror::Error;

/// Errors that can occur in the physics tables.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// The handle is not a live body.
    #[error("invalid body {0}")]
    InvalidBody(Handle),

    /// The handle is not a live shape.
    #[error("invalid shape {0}")]
    InvalidShape(Handle),

    /// Shape dimensions must be positive and finite.
    #[error("invalid shape description: {0}")]
    InvalidShapeDesc(String),

    /// The shape is still attached to bodies.
    #[error("shape {shape} is attached to {users} bodies")]
    ShapeInUse {
        /// The shape.
        shape: Handle,
        /// Bodies still using it.
        users: u32,
    },
}

/// Result type for physics operations.
pub type PhysicsResult<T> = Result<T, PhysicsError>;
