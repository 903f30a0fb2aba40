//! # Bodies

use kiln_core::Handle;

/// How a body responds to `step`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BodyType {
    /// Never moves.
    #[default]
    Static,
    /// Moves by its velocity only; ignores gravity.
    Kinematic,
    /// Moves by its velocity and accelerates under gravity.
    Dynamic,
}

/// Table entry for a body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyData {
    /// Motion type.
    pub body_type: BodyType,
    /// Origin in world units.
    pub position: [f32; 2],
    /// Rotation in radians, counter-clockwise.
    pub rotation: f32,
    /// Linear velocity in units per second.
    pub linear_velocity: [f32; 2],
    /// Angular velocity in radians per second.
    pub angular_velocity: f32,
    /// Attached shape, if any.
    pub shape: Option<Handle>,
}

impl BodyData {
    /// A body of `body_type` at rest at the origin.
    #[must_use]
    pub const fn new(body_type: BodyType) -> Self {
        Self {
            body_type,
            position: [0.0, 0.0],
            rotation: 0.0,
            linear_velocity: [0.0, 0.0],
            angular_velocity: 0.0,
            shape: None,
        }
    }

    /// Advances this body by `dt` seconds (semi-implicit Euler).
    pub fn integrate(&mut self, gravity: [f32; 2], dt: f32) {
        match self.body_type {
            BodyType::Static => return,
            BodyType::Kinematic => {}
            BodyType::Dynamic => {
                self.linear_velocity[0] += gravity[0] * dt;
                self.linear_velocity[1] += gravity[1] * dt;
            }
        }

        self.position[0] += self.linear_velocity[0] * dt;
        self.position[1] += self.linear_velocity[1] * dt;
        self.rotation += self.angular_velocity * dt;
    }
}
