//! Fixed-timestep driver tying models to a world.

use crate::error::{Result, TensegrityError};
use crate::model::TensegrityModel;
use crate::world::PhysicsWorld;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Settings for [`Simulation`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Physics timestep in seconds.
    pub timestep: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { timestep: 0.001 }
    }
}

/// Steps every model, then integrates the world once per tick.
pub struct Simulation<W: PhysicsWorld> {
    world: W,
    config: SimulationConfig,
    models: Vec<TensegrityModel>,
    steps: u64,
}

impl<W: PhysicsWorld> Simulation<W> {
    pub fn new(world: W, config: SimulationConfig) -> Result<Self> {
        if !(config.timestep.is_finite() && config.timestep > 0.0) {
            return Err(TensegrityError::NonPositiveTimestep { dt: config.timestep });
        }
        Ok(Self {
            world,
            config,
            models: Vec::new(),
            steps: 0,
        })
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn models(&self) -> &[TensegrityModel] {
        &self.models
    }

    pub fn model_mut(&mut self, index: usize) -> Option<&mut TensegrityModel> {
        self.models.get_mut(index)
    }

    /// Ticks taken since creation or the last reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Sets the model up in this world and takes ownership of it.
    ///
    /// On failure the model is dropped and the world is left as it was.
    pub fn add_model(&mut self, mut model: TensegrityModel) -> Result<usize> {
        if let Err(e) = model.setup(&mut self.world) {
            if let Err(teardown) = model.teardown(&mut self.world) {
                warn!("teardown after failed setup also failed: {teardown}");
            }
            return Err(e);
        }
        self.models.push(model);
        Ok(self.models.len() - 1)
    }

    /// One tick: every model steps, then the world integrates.
    pub fn step(&mut self) -> Result<()> {
        let dt = self.config.timestep;
        for model in &mut self.models {
            model.step(&mut self.world, dt)?;
        }
        self.world.step(dt);
        self.steps += 1;
        Ok(())
    }

    pub fn run(&mut self, steps: u64) -> Result<()> {
        for _ in 0..steps {
            self.step()?;
        }
        Ok(())
    }

    /// Rebuilds every model for a fresh episode.
    pub fn reset(&mut self) -> Result<()> {
        for model in &mut self.models {
            model.reset(&mut self.world)?;
        }
        info!("simulation reset after {} steps", self.steps);
        self.steps = 0;
        Ok(())
    }

    /// Tears down every model, reporting the first failure.
    pub fn teardown(&mut self) -> Result<()> {
        let mut first_error = None;
        for model in &mut self.models {
            if let Err(e) = model.teardown(&mut self.world) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl<W: PhysicsWorld> Drop for Simulation<W> {
    fn drop(&mut self) {
        // Teardown is idempotent, so models already torn down are untouched.
        if let Err(e) = self.teardown() {
            warn!("teardown on drop failed: {e}");
        }
    }
}
