//! # Physics World
//!
//! Body and shape tables plus stepping. Bodies and shapes are addressed by
//! opaque handles from two separate arenas; a body handle passed as a shape
//! (or the reverse) is simply whatever lives in that slot of the other table.

use kiln_core::{Arena, EngineConfig, Handle};
use tracing::{debug, warn};

use crate::aabb::Aabb;
use crate::body::{BodyData, BodyType};
use crate::error::{PhysicsError, PhysicsResult};
use crate::shape::{ShapeData, ShapeDesc};

/// Single-threaded rigid body world.
///
/// # Example
///
/// ```rust
/// use kiln_physics::{BodyType, PhysicsWorld, ShapeDesc};
///
/// let mut world = PhysicsWorld::new([0.0, -10.0]);
/// let ball = world.create_body(BodyType::Dynamic);
/// let circle = world.create_shape(ShapeDesc::Circle { radius: 0.5 }).unwrap();
/// world.set_body_shape(ball, circle).unwrap();
///
/// world.step(0.5);
/// assert!(world.get_body_position(ball).unwrap()[1] < 0.0);
/// ```
#[derive(Debug)]
pub struct PhysicsWorld {
    bodies: Arena<BodyData>,
    shapes: Arena<ShapeData>,
    gravity: [f32; 2],
}

impl PhysicsWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new(gravity: [f32; 2]) -> Self {
        Self {
            bodies: Arena::new(),
            shapes: Arena::new(),
            gravity,
        }
    }

    /// Creates an empty world with gravity and table reservations from `config`.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            bodies: Arena::with_capacity(config.arenas.bodies),
            shapes: Arena::with_capacity(config.arenas.shapes),
            gravity: config.physics.gravity,
        }
    }

    /// Current gravity.
    #[must_use]
    pub const fn gravity(&self) -> [f32; 2] {
        self.gravity
    }

    /// Replaces gravity.
    pub fn set_gravity(&mut self, gravity: [f32; 2]) {
        self.gravity = gravity;
    }

    // =========================================================================
    // Bodies
    // =========================================================================

    /// Adds a body at rest at the origin, with no shape.
    pub fn create_body(&mut self, body_type: BodyType) -> Handle {
        let handle = self.bodies.create(BodyData::new(body_type));
        debug!(%handle, ?body_type, "body created");
        handle
    }

    /// Removes a body, detaching its shape.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBody`] if `body` is not live.
    pub fn destroy_body(&mut self, body: Handle) -> PhysicsResult<()> {
        if !self.bodies.valid(body) {
            warn!(handle = %body, "destroy of unknown body");
            return Err(PhysicsError::InvalidBody(body));
        }

        let data = self.bodies.remove(body);
        if let Some(shape) = data.shape {
            self.release_shape(shape);
        }
        debug!(handle = %body, "body destroyed");
        Ok(())
    }

    /// Attaches `shape` to `body`, replacing any previous shape.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBody`] or [`PhysicsError::InvalidShape`]
    /// for handles that are not live.
    pub fn set_body_shape(&mut self, body: Handle, shape: Handle) -> PhysicsResult<()> {
        if !self.shapes.valid(shape) {
            return Err(PhysicsError::InvalidShape(shape));
        }
        let data = self
            .bodies
            .get_mut(body)
            .ok_or(PhysicsError::InvalidBody(body))?;

        let previous = data.shape.replace(shape);
        self.shapes[shape].users += 1;
        if let Some(previous) = previous {
            self.release_shape(previous);
        }
        Ok(())
    }

    /// Detaches the body's shape, if any.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBody`] if `body` is not live.
    pub fn clear_body_shape(&mut self, body: Handle) -> PhysicsResult<()> {
        let data = self
            .bodies
            .get_mut(body)
            .ok_or(PhysicsError::InvalidBody(body))?;
        if let Some(shape) = data.shape.take() {
            self.release_shape(shape);
        }
        Ok(())
    }

    /// Teleports a body.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBody`] if `body` is not live.
    pub fn set_body_position(&mut self, body: Handle, position: [f32; 2]) -> PhysicsResult<()> {
        self.body_mut(body)?.position = position;
        Ok(())
    }

    /// Sets a body's rotation in radians.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBody`] if `body` is not live.
    pub fn set_body_rotation(&mut self, body: Handle, rotation: f32) -> PhysicsResult<()> {
        self.body_mut(body)?.rotation = rotation;
        Ok(())
    }

    /// Sets a body's linear velocity.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBody`] if `body` is not live.
    pub fn set_body_velocity(&mut self, body: Handle, velocity: [f32; 2]) -> PhysicsResult<()> {
        self.body_mut(body)?.linear_velocity = velocity;
        Ok(())
    }

    /// Sets a body's angular velocity in radians per second.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBody`] if `body` is not live.
    pub fn set_body_angular_velocity(&mut self, body: Handle, velocity: f32) -> PhysicsResult<()> {
        self.body_mut(body)?.angular_velocity = velocity;
        Ok(())
    }

    /// Position of a live body.
    #[must_use]
    pub fn get_body_position(&self, body: Handle) -> Option<[f32; 2]> {
        self.bodies.get(body).map(|b| b.position)
    }

    /// Rotation of a live body.
    #[must_use]
    pub fn get_body_rotation(&self, body: Handle) -> Option<f32> {
        self.bodies.get(body).map(|b| b.rotation)
    }

    /// Linear velocity of a live body.
    #[must_use]
    pub fn get_body_velocity(&self, body: Handle) -> Option<[f32; 2]> {
        self.bodies.get(body).map(|b| b.linear_velocity)
    }

    /// Motion type of a live body.
    #[must_use]
    pub fn get_body_type(&self, body: Handle) -> Option<BodyType> {
        self.bodies.get(body).map(|b| b.body_type)
    }

    /// Shape attached to a live body.
    #[must_use]
    pub fn get_body_shape(&self, body: Handle) -> Option<Handle> {
        self.bodies.get(body)?.shape
    }

    /// Checks whether `body` names a live body.
    #[must_use]
    pub fn is_body_valid(&self, body: Handle) -> bool {
        self.bodies.valid(body)
    }

    /// Number of live bodies.
    #[must_use]
    pub const fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Iterates over live bodies in ascending handle order.
    pub fn bodies(&self) -> impl Iterator<Item = (Handle, &BodyData)> {
        self.bodies.iter()
    }

    // =========================================================================
    // Shapes
    // =========================================================================

    /// Adds a shape.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidShapeDesc`] for non-positive or
    /// non-finite dimensions.
    pub fn create_shape(&mut self, desc: ShapeDesc) -> PhysicsResult<Handle> {
        desc.validate()?;
        let handle = self.shapes.create(ShapeData { desc, users: 0 });
        debug!(%handle, ?desc, "shape created");
        Ok(handle)
    }

    /// Removes a shape that no body uses.
    ///
    /// # Errors
    ///
    /// - [`PhysicsError::InvalidShape`] if `shape` is not live
    /// - [`PhysicsError::ShapeInUse`] if bodies still reference it
    pub fn destroy_shape(&mut self, shape: Handle) -> PhysicsResult<()> {
        let data = self
            .shapes
            .get(shape)
            .ok_or(PhysicsError::InvalidShape(shape))?;
        if data.users > 0 {
            warn!(handle = %shape, users = data.users, "destroy of shape still in use");
            return Err(PhysicsError::ShapeInUse {
                shape,
                users: data.users,
            });
        }

        self.shapes.destroy(shape);
        debug!(handle = %shape, "shape destroyed");
        Ok(())
    }

    /// Geometry of a live shape.
    #[must_use]
    pub fn get_shape(&self, shape: Handle) -> Option<ShapeDesc> {
        self.shapes.get(shape).map(|s| s.desc)
    }

    /// Checks whether `shape` names a live shape.
    #[must_use]
    pub fn is_shape_valid(&self, shape: Handle) -> bool {
        self.shapes.valid(shape)
    }

    /// Number of live shapes.
    #[must_use]
    pub const fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    /// World-space bounds of a live body with a shape.
    #[must_use]
    pub fn body_aabb(&self, body: Handle) -> Option<Aabb> {
        let data = self.bodies.get(body)?;
        self.bounds_of(data)
    }

    /// Bodies whose bounds intersect `area`, in ascending handle order.
    /// Bodies without a shape are never reported.
    #[must_use]
    pub fn query_aabb(&self, area: &Aabb) -> Vec<Handle> {
        self.bodies
            .iter()
            .filter(|(_, data)| self.bounds_of(data).is_some_and(|b| b.intersects(area)))
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Advances every body by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        let gravity = self.gravity;
        self.bodies.each_mut(|_, body| body.integrate(gravity, dt));
    }

    fn bounds_of(&self, data: &BodyData) -> Option<Aabb> {
        let shape = self.shapes.get(data.shape?)?;
        let half = shape.desc.rotated_half_extents(data.rotation);
        Some(Aabb::from_center(data.position, half))
    }

    fn body_mut(&mut self, body: Handle) -> PhysicsResult<&mut BodyData> {
        self.bodies
            .get_mut(body)
            .ok_or(PhysicsError::InvalidBody(body))
    }

    fn release_shape(&mut self, shape: Handle) {
        if let Some(data) = self.shapes.get_mut(shape) {
            debug_assert!(data.users > 0, "shape {shape} user count underflow");
            data.users = data.users.saturating_sub(1);
        }
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
