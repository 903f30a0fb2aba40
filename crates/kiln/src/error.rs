//! # Engine Error Types

use kiln_core::ConfigError;
use kiln_physics::PhysicsError;
use kiln_rendering::RenderError;
use thiserror::Error;

/// Errors surfaced by the engine facade.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A rendering operation failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// A physics operation failed.
    #[error(transparent)]
    Physics(#[from] PhysicsError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
