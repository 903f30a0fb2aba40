//! # KILN Physics
//!
//! Rigid bodies and collision shapes as handle-addressed resource tables.
//!
//! - [`PhysicsWorld::create_body`] / [`PhysicsWorld::create_shape`] hand out
//!   opaque [`Handle`](kiln_core::Handle)s backed by two
//!   [`Arena`](kiln_core::Arena)s
//! - shapes are shared between bodies and reference counted, so a shape
//!   cannot be destroyed out from under a body
//! - [`PhysicsWorld::step`] integrates kinematic and dynamic bodies;
//!   contact resolution belongs to the simulation backend
//!
//! The world is single-threaded and takes `&mut self` for every mutation.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod aabb;
pub mod body;
pub mod error;
pub mod shape;
pub mod world;

pub use aabb::Aabb;
pub use body::{BodyData, BodyType};
pub use error::{PhysicsError, PhysicsResult};
pub use shape::{ShapeData, ShapeDesc};
pub use world::PhysicsWorld;
