//! Bounded feedback control of a single cable.

use crate::entity::CableActuator;
use crate::error::{Result, TensegrityError};
use crate::observer::ModelObserver;
use crate::tree::ModelTree;
use log::debug;
use serde::{Deserialize, Serialize};

/// What a controller's target means.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMode {
    /// Target is a cable tension (force).
    Tension,
    /// Target is a rest length.
    RestLength,
}

/// Per-cable control law.
///
/// Each call to [`control`](Self::control) moves the cable's rest length
/// toward the one that meets the target, by at most
/// `target_velocity * dt`. The goal itself is capped so that the static
/// tension would not exceed `max_tension`; a cable already past that cap
/// is let out at the same bounded rate. The only state carried between
/// calls is the last target, kept for inspection.
#[derive(Clone, Debug, PartialEq)]
pub struct ActuatorController {
    mode: ControlMode,
    target: f32,
}

impl ActuatorController {
    /// Creates a controller for `mode`, starting at `target`.
    pub fn new(mode: ControlMode, target: f32) -> Self {
        Self { mode, target }
    }

    /// Controller whose targets are tensions.
    pub fn tension(target: f32) -> Self {
        Self::new(ControlMode::Tension, target)
    }

    /// Controller whose targets are rest lengths.
    pub fn rest_length(target: f32) -> Self {
        Self::new(ControlMode::RestLength, target)
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// The target passed to the most recent [`control`](Self::control).
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Applies one bounded command to `actuator` and returns its new rest length.
    ///
    /// `dt` must be positive.
    pub fn control(&mut self, actuator: &mut CableActuator, dt: f32, target: f32) -> Result<f32> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(TensegrityError::NonPositiveTimestep { dt });
        }
        self.target = target;
        let config = actuator.config();
        let length = actuator.current_length();

        let desired = match self.mode {
            ControlMode::Tension => length - target / config.stiffness,
            ControlMode::RestLength => target,
        };
        // Never aim for more tension than the motor can hold.
        let desired = desired.max(length - config.max_tension / config.stiffness);

        let max_step = config.target_velocity * dt;
        let current = actuator.rest_length();
        let rest = current + (desired - current).clamp(-max_step, max_step);
        let rest = rest.max(config.min_rest_length);

        actuator.set_rest_length(rest);
        Ok(actuator.rest_length())
    }
}

/// Holds every cable of a model at one tension setpoint.
#[derive(Clone, Debug)]
pub struct ConstantTensionController {
    tension: f32,
    controllers: Vec<ActuatorController>,
}

impl ConstantTensionController {
    /// `tension` must be non-negative.
    pub fn new(tension: f32) -> Result<Self> {
        if !(tension.is_finite() && tension >= 0.0) {
            return Err(TensegrityError::InvalidParameter {
                name: "tension",
                value: tension,
            });
        }
        Ok(Self {
            tension,
            controllers: Vec::new(),
        })
    }

    /// The setpoint every cable is held at.
    pub fn tension(&self) -> f32 {
        self.tension
    }

    /// Number of cables currently under control.
    pub fn controlled(&self) -> usize {
        self.controllers.len()
    }
}

impl ModelObserver for ConstantTensionController {
    fn on_setup(&mut self, model: &mut ModelTree) -> Result<()> {
        self.controllers = (0..model.actuator_count())
            .map(|_| ActuatorController::tension(self.tension))
            .collect();
        debug!("holding {} cables at tension {}", self.controllers.len(), self.tension);
        Ok(())
    }

    fn on_step(&mut self, model: &mut ModelTree, dt: f32) -> Result<()> {
        for (controller, actuator) in self.controllers.iter_mut().zip(model.actuators_mut()) {
            controller.control(actuator, dt, self.tension)?;
        }
        Ok(())
    }

    fn on_teardown(&mut self, _model: &mut ModelTree) -> Result<()> {
        self.controllers.clear();
        Ok(())
    }
}
