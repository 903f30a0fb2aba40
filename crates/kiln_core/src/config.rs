//! # Engine Configuration
//!
//! Loaded once at startup from TOML. Every section is optional and falls
//! back to its defaults.
//!
//! ```toml
//! [arenas]
//! textures = 256
//! sprites = 4096
//!
//! [instances]
//! batch_hint = 64
//!
//! [physics]
//! gravity = [0.0, -9.81]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Initial slot reservations for each resource table.
///
/// These pre-size storage to avoid early growth. They are not limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Texture table.
    pub textures: usize,
    /// Sprite table.
    pub sprites: usize,
    /// Physics body table.
    pub bodies: usize,
    /// Physics shape table.
    pub shapes: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            textures: 256,
            sprites: 4096,
            bodies: 1024,
            shapes: 1024,
        }
    }
}

/// Per-frame instance buffer settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Instances reserved for a new sprite batch region.
    pub batch_hint: u32,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self { batch_hint: 64 }
    }
}

/// Physics world settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity applied to dynamic bodies, in units per second squared.
    pub gravity: [f32; 2],
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.81],
        }
    }
}

/// Top-level engine configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Resource table reservations.
    pub arenas: ArenaConfig,
    /// Instance buffer settings.
    pub instances: InstanceConfig,
    /// Physics settings.
    pub physics: PhysicsConfig,
}

impl EngineConfig {
    /// Parses and validates a config from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// errors of [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.instances.batch_hint == 0 {
            return Err(ConfigError::Invalid {
                field: "instances.batch_hint",
                reason: "must be greater than zero".to_owned(),
            });
        }

        if !self.physics.gravity.iter().all(|g| g.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "physics.gravity",
                reason: format!("must be finite, got {:?}", self.physics.gravity),
            });
        }

        Ok(())
    }
}
