//! Periodic target generator: drives every cable with its own sine wave.
//!
//! Targets are recomputed at `updateFrequency` Hz from
//! `target[i] = sin_position_offset[i] + sin_amplitude[i] * sin(t * sin_frequency[i] + sin_phase_offset[i])`
//! and handed to one [`ActuatorController`] per cable.

use crate::controller::{ActuatorController, ControlMode};
use crate::error::{Result, TensegrityError};
use crate::observer::ModelObserver;
use crate::tree::ModelTree;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Sine wave parameters, one entry per cable.
///
/// Deserialised from JSON with the keys `sin_amplitude`, `sin_frequency`,
/// `sin_phase_offset`, `sin_position_offset` and `updateFrequency`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SineWaveConfig {
    #[serde(rename = "sin_amplitude")]
    pub amplitude: Vec<f32>,
    /// Angular frequencies (radians / sec).
    #[serde(rename = "sin_frequency")]
    pub frequency: Vec<f32>,
    /// Phase offsets (radians).
    #[serde(rename = "sin_phase_offset")]
    pub phase_offset: Vec<f32>,
    #[serde(rename = "sin_position_offset")]
    pub position_offset: Vec<f32>,
    /// How often targets are recomputed (Hz).
    #[serde(rename = "updateFrequency")]
    pub update_frequency: f32,
}

impl SineWaveConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates JSON from `reader`.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates the JSON file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// All four sequences must have the same length and hold finite numbers;
    /// `updateFrequency` must be positive.
    pub fn validate(&self) -> Result<()> {
        let n = self.amplitude.len();
        let columns = [
            ("sin_frequency", &self.frequency),
            ("sin_phase_offset", &self.phase_offset),
            ("sin_position_offset", &self.position_offset),
        ];
        for (name, column) in columns {
            if column.len() != n {
                return Err(TensegrityError::control_config(format!(
                    "{name} has {} entries, sin_amplitude has {n}",
                    column.len()
                )));
            }
        }
        let all = self
            .amplitude
            .iter()
            .chain(&self.frequency)
            .chain(&self.phase_offset)
            .chain(&self.position_offset);
        if let Some(bad) = all.copied().find(|v| !v.is_finite()) {
            return Err(TensegrityError::control_config(format!("non-finite entry {bad}")));
        }
        if !(self.update_frequency.is_finite() && self.update_frequency > 0.0) {
            return Err(TensegrityError::control_config(format!(
                "updateFrequency must be positive, got {}",
                self.update_frequency
            )));
        }
        Ok(())
    }

    /// Number of cables this config drives.
    pub fn channels(&self) -> usize {
        self.amplitude.len()
    }

    /// Target for channel `i` at simulated time `time`.
    pub fn target_at(&self, i: usize, time: f32) -> Option<f32> {
        let cycle = (time * *self.frequency.get(i)? + *self.phase_offset.get(i)?).sin();
        Some(*self.position_offset.get(i)? + *self.amplitude.get(i)? * cycle)
    }
}

/// Observer that drives each cable along its configured sine wave.
#[derive(Clone, Debug)]
pub struct SineWaveController {
    config: SineWaveConfig,
    mode: ControlMode,
    sim_time: f32,
    update_time: f32,
    since_control: f32,
    targets: Vec<f32>,
    controllers: Vec<ActuatorController>,
}

impl SineWaveController {
    /// Creates a controller whose targets are cable tensions.
    pub fn new(config: SineWaveConfig) -> Self {
        Self::with_mode(config, ControlMode::Tension)
    }

    /// Creates a controller whose targets are interpreted according to `mode`.
    pub fn with_mode(config: SineWaveConfig, mode: ControlMode) -> Self {
        Self {
            config,
            mode,
            sim_time: 0.0,
            update_time: 0.0,
            since_control: 0.0,
            targets: Vec::new(),
            controllers: Vec::new(),
        }
    }

    /// Loads the config from a JSON file. Fails before any simulation starts.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        SineWaveConfig::from_path(path).map(Self::new)
    }

    pub fn config(&self) -> &SineWaveConfig {
        &self.config
    }

    /// Simulated seconds seen since setup.
    pub fn sim_time(&self) -> f32 {
        self.sim_time
    }

    /// Targets from the most recent update.
    pub fn targets(&self) -> &[f32] {
        &self.targets
    }

    /// Number of per-cable controllers currently alive.
    pub fn controlled(&self) -> usize {
        self.controllers.len()
    }

    fn update_period(&self) -> f32 {
        self.config.update_frequency.recip()
    }

    fn compute_targets(&mut self) {
        let time = self.sim_time;
        self.targets = (0..self.controllers.len())
            .filter_map(|i| self.config.target_at(i, time))
            .collect();
    }
}

impl ModelObserver for SineWaveController {
    fn on_setup(&mut self, model: &mut ModelTree) -> Result<()> {
        let actuators = model.actuator_count();
        if self.config.channels() < actuators {
            return Err(TensegrityError::ActuatorCountMismatch {
                configured: self.config.channels(),
                actuators,
            });
        }
        if self.config.channels() > actuators {
            warn!(
                "sine wave config has {} channels, model has {actuators} actuators; extra channels unused",
                self.config.channels()
            );
        }

        self.sim_time = 0.0;
        self.update_time = 0.0;
        self.since_control = 0.0;
        let mode = self.mode;
        self.controllers = model
            .actuators()
            .iter()
            .map(|a| match mode {
                ControlMode::Tension => ActuatorController::tension(a.tension()),
                ControlMode::RestLength => ActuatorController::rest_length(a.rest_length()),
            })
            .collect();
        self.compute_targets();
        debug!("sine wave controller driving {actuators} actuators");
        Ok(())
    }

    fn on_step(&mut self, model: &mut ModelTree, dt: f32) -> Result<()> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(TensegrityError::NonPositiveTimestep { dt });
        }

        self.sim_time += dt;
        self.update_time += dt;
        self.since_control += dt;

        let period = self.update_period();
        if self.update_time < period {
            return Ok(());
        }
        // Keep the remainder so updates stay on the configured grid.
        self.update_time -= period;
        self.compute_targets();

        let elapsed = std::mem::take(&mut self.since_control);
        for ((controller, actuator), target) in self
            .controllers
            .iter_mut()
            .zip(model.actuators_mut())
            .zip(&self.targets)
        {
            controller.control(actuator, elapsed, *target)?;
        }
        Ok(())
    }

    fn on_teardown(&mut self, _model: &mut ModelTree) -> Result<()> {
        debug!("releasing {} sine wave controllers", self.controllers.len());
        self.controllers.clear();
        self.targets.clear();
        Ok(())
    }
}
