//! # AABB
//!
//! Axis-aligned bounding boxes for broad-phase queries.

/// Axis-aligned bounding box in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner (x, y).
    pub min: [f32; 2],
    /// Maximum corner (x, y).
    pub max: [f32; 2],
}

impl Aabb {
    /// Creates a new AABB.
    #[must_use]
    pub const fn new(min: [f32; 2], max: [f32; 2]) -> Self {
        Self { min, max }
    }

    /// Creates an AABB centered at `center` with the given half extents.
    #[must_use]
    pub fn from_center(center: [f32; 2], half_extents: [f32; 2]) -> Self {
        Self {
            min: [center[0] - half_extents[0], center[1] - half_extents[1]],
            max: [center[0] + half_extents[0], center[1] + half_extents[1]],
        }
    }

    /// Checks if this AABB intersects another. Touching edges count.
    #[must_use]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min[0] <= other.max[0]
            && self.max[0] >= other.min[0]
            && self.min[1] <= other.max[1]
            && self.max[1] >= other.min[1]
    }

    /// Checks if `point` lies inside or on the boundary.
    #[must_use]
    pub fn contains(&self, point: [f32; 2]) -> bool {
        (self.min[0]..=self.max[0]).contains(&point[0])
            && (self.min[1]..=self.max[1]).contains(&point[1])
    }

    /// Moves the AABB by delta.
    #[must_use]
    pub fn translate(&self, delta: [f32; 2]) -> Self {
        Self {
            min: [self.min[0] + delta[0], self.min[1] + delta[1]],
            max: [self.max[0] + delta[0], self.max[1] + delta[1]],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_intersection() {
        let a = Aabb::new([0.0, 0.0], [1.0, 1.0]);
        let b = Aabb::new([0.5, 0.5], [1.5, 1.5]);
        let c = Aabb::new([2.0, 2.0], [3.0, 3.0]);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.translate([1.0, 1.0]).intersects(&c));
    }

    #[test]
    fn test_contains() {
        let a = Aabb::from_center([0.0, 0.0], [1.0, 2.0]);
        assert!(a.contains([1.0, -2.0]));
        assert!(!a.contains([1.1, 0.0]));
    }
}
