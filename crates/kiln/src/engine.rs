//! # Engine
//!
//! Owns the renderer and the physics world, built from one
//! [`EngineConfig`]. Sprites can be bound to bodies so they follow the
//! simulation each tick.

use std::path::Path;
use std::sync::Arc;

use kiln_core::{Arena, EngineConfig, Handle};
use kiln_physics::{PhysicsError, PhysicsWorld};
use kiln_rendering::{DrawBatch, GpuBackend, RenderError, Renderer};
use tracing::{debug, info};

use crate::error::EngineResult;

/// A sprite that mirrors a body's position and rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Binding {
    sprite: Handle,
    body: Handle,
}

/// Renderer + physics, stepped together.
pub struct Engine<B: GpuBackend> {
    config: EngineConfig,
    renderer: Renderer<B>,
    physics: PhysicsWorld,
    bindings: Arena<Binding>,
    ticks: u64,
}

impl<B: GpuBackend> Engine<B> {
    /// Builds an engine on `backend`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`](crate::EngineError::Config) if
    /// `config` fails validation.
    pub fn new(backend: Arc<B>, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        info!(
            textures = config.arenas.textures,
            sprites = config.arenas.sprites,
            bodies = config.arenas.bodies,
            "engine initialized"
        );

        Ok(Self {
            renderer: Renderer::new(backend, &config),
            physics: PhysicsWorld::from_config(&config),
            bindings: Arena::new(),
            ticks: 0,
            config,
        })
    }

    /// Builds an engine from a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`](crate::EngineError::Config) if the
    /// file cannot be read, parsed or validated.
    pub fn from_config_file(backend: Arc<B>, path: impl AsRef<Path>) -> EngineResult<Self> {
        let config = EngineConfig::load(path)?;
        Self::new(backend, config)
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Renderer.
    #[must_use]
    pub const fn renderer(&self) -> &Renderer<B> {
        &self.renderer
    }

    /// Physics world.
    #[must_use]
    pub const fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    /// Physics world, mutably.
    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Makes `sprite` follow `body` from the next tick on.
    ///
    /// [`destroy_sprite`](Self::destroy_sprite) and
    /// [`destroy_body`](Self::destroy_body) end the binding immediately.
    /// A side destroyed directly on its subsystem only lapses at the next
    /// tick if its handle is still free by then; handles are reused, so a
    /// reissued handle keeps the binding.
    ///
    /// # Errors
    ///
    /// - [`RenderError::InvalidHandle`] if `sprite` is not live
    /// - [`PhysicsError::InvalidBody`] if `body` is not live
    pub fn bind_sprite(&mut self, sprite: Handle, body: Handle) -> EngineResult<Handle> {
        if !self.renderer.sprites().is_sprite_valid(sprite) {
            return Err(RenderError::InvalidHandle(sprite).into());
        }
        if !self.physics.is_body_valid(body) {
            return Err(PhysicsError::InvalidBody(body).into());
        }
        Ok(self.bindings.create(Binding { sprite, body }))
    }

    /// Removes a binding. Returns `false` if it was not live.
    pub fn unbind(&mut self, binding: Handle) -> bool {
        if !self.bindings.valid(binding) {
            return false;
        }
        self.bindings.destroy(binding);
        true
    }

    /// Destroys a sprite along with every binding that moves it.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidHandle`] if `sprite` is not live.
    pub fn destroy_sprite(&mut self, sprite: Handle) -> EngineResult<()> {
        self.renderer.sprites().destroy_sprite(sprite)?;
        self.drop_bindings(|binding| binding.sprite == sprite);
        Ok(())
    }

    /// Destroys a body along with every binding that follows it.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBody`] if `body` is not live.
    pub fn destroy_body(&mut self, body: Handle) -> EngineResult<()> {
        self.physics.destroy_body(body)?;
        self.drop_bindings(|binding| binding.body == body);
        Ok(())
    }

    /// Number of live bindings.
    #[must_use]
    pub const fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Steps physics by `dt`, moves bound sprites, then prepares a frame.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Render`](crate::EngineError::Render) if the
    /// frame upload fails.
    pub fn tick(&mut self, dt: f32) -> EngineResult<Vec<DrawBatch>> {
        self.physics.step(dt);
        self.sync_bindings();

        let batches = self.renderer.prepare_frame()?;
        self.ticks += 1;
        Ok(batches)
    }

    fn drop_bindings<F>(&mut self, matches: F)
    where
        F: Fn(&Binding) -> bool,
    {
        let dropped: Vec<Handle> = self
            .bindings
            .iter()
            .filter(|(_, binding)| matches(binding))
            .map(|(handle, _)| handle)
            .collect();
        for handle in dropped {
            debug!(binding = %handle, "binding dropped");
            self.bindings.destroy(handle);
        }
    }

    fn sync_bindings(&mut self) {
        let sprites = self.renderer.sprites();
        let mut lapsed = Vec::new();

        for (handle, binding) in self.bindings.iter() {
            let (Some(position), Some(rotation)) = (
                self.physics.get_body_position(binding.body),
                self.physics.get_body_rotation(binding.body),
            ) else {
                lapsed.push(handle);
                continue;
            };

            let moved = sprites.modify(binding.sprite, |sprite| {
                sprite.position = position;
                sprite.rotation = rotation;
            });
            if moved.is_err() {
                lapsed.push(handle);
            }
        }

        for handle in lapsed {
            debug!(binding = %handle, "binding lapsed");
            self.bindings.destroy(handle);
        }
    }
}
