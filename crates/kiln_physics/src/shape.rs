//! # Shapes
//!
//! Collision geometry. A shape is created once and can be attached to any
//! number of bodies.

use crate::error::{PhysicsError, PhysicsResult};

/// Collision geometry, in body-local units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShapeDesc {
    /// Circle centered on the body origin.
    Circle {
        /// Radius.
        radius: f32,
    },
    /// Box centered on the body origin.
    Box {
        /// Half width and half height.
        half_extents: [f32; 2],
    },
}

impl ShapeDesc {
    /// Checks that every dimension is positive and finite.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidShapeDesc`] describing the bad value.
    pub fn validate(&self) -> PhysicsResult<()> {
        let ok = |v: f32| v.is_finite() && v > 0.0;
        match *self {
            Self::Circle { radius } if !ok(radius) => Err(PhysicsError::InvalidShapeDesc(
                format!("circle radius must be positive and finite, got {radius}"),
            )),
            Self::Box { half_extents } if !half_extents.iter().all(|&e| ok(e)) => {
                Err(PhysicsError::InvalidShapeDesc(format!(
                    "box half extents must be positive and finite, got {half_extents:?}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Half extents of the world-space bounding box at `rotation` radians.
    #[must_use]
    pub fn rotated_half_extents(&self, rotation: f32) -> [f32; 2] {
        match *self {
            Self::Circle { radius } => [radius, radius],
            Self::Box { half_extents: [hx, hy] } => {
                let (sin, cos) = rotation.sin_cos();
                let (sin, cos) = (sin.abs(), cos.abs());
                [cos * hx + sin * hy, sin * hx + cos * hy]
            }
        }
    }
}

/// Table entry for a shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeData {
    /// Geometry.
    pub desc: ShapeDesc,
    /// Number of bodies this shape is attached to.
    pub users: u32,
}
