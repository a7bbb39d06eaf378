//! Physical parameter records bound to tags through a [`BuildSpec`](crate::build_spec::BuildSpec).
//!
//! Both records are plain values. They are validated when registered and
//! never mutated afterwards; the compiler copies them into the entities it
//! creates.

use crate::error::{Result, TensegrityError};
use serde::{Deserialize, Serialize};

/// Parameters for a rigid strut.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RodConfig {
    /// Cylinder radius (length).
    pub radius: f32,
    /// Density (mass / length^3) used to derive mass properties.
    pub density: f32,
    /// Sliding friction coefficient (unitless).
    pub friction: f32,
    /// Rolling friction coefficient (unitless).
    pub roll_friction: f32,
    /// Coefficient of restitution (unitless).
    pub restitution: f32,
}

impl Default for RodConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            density: 1.0,
            friction: 1.0,
            roll_friction: 0.0,
            restitution: 0.0,
        }
    }
}

impl RodConfig {
    /// Rod of the given radius and density with default surface properties.
    pub fn new(radius: f32, density: f32) -> Self {
        Self {
            radius,
            density,
            ..Self::default()
        }
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_roll_friction(mut self, roll_friction: f32) -> Self {
        self.roll_friction = roll_friction;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    /// Radius and density must be positive; the friction terms non-negative.
    pub fn validate(&self) -> Result<()> {
        positive("radius", self.radius)?;
        positive("density", self.density)?;
        non_negative("friction", self.friction)?;
        non_negative("roll_friction", self.roll_friction)?;
        non_negative("restitution", self.restitution)
    }
}

/// Parameters for a tensioned, variable-length cable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CableConfig {
    /// Spring constant (mass / sec^2).
    pub stiffness: f32,
    /// Damping constant (mass / sec).
    pub damping: f32,
    /// Tension baked in at construction; sets the initial rest length.
    pub pretension: f32,
    /// Record (length, rest length, tension) every step.
    pub history: bool,
    /// Largest tension the motor will hold (force).
    pub max_tension: f32,
    /// Fastest the motor changes rest length (length / sec).
    pub target_velocity: f32,
    /// Length below which the cable is considered collapsed.
    pub min_actual_length: f32,
    /// Floor for the commanded rest length.
    pub min_rest_length: f32,
    /// Shift the first anchor from the rod axis to its surface.
    pub move_anchor_a_to_edge: bool,
    /// Shift the second anchor from the rod axis to its surface.
    pub move_anchor_b_to_edge: bool,
}

impl Default for CableConfig {
    fn default() -> Self {
        Self {
            stiffness: 1000.0,
            damping: 10.0,
            pretension: 0.0,
            history: false,
            max_tension: 1000.0,
            target_velocity: 100.0,
            min_actual_length: 0.1,
            min_rest_length: 0.1,
            move_anchor_a_to_edge: false,
            move_anchor_b_to_edge: false,
        }
    }
}

impl CableConfig {
    /// Cable with default motor limits and minimum lengths.
    pub fn new(stiffness: f32, damping: f32, pretension: f32) -> Self {
        Self {
            stiffness,
            damping,
            pretension,
            ..Self::default()
        }
    }

    /// Records a [`CableSample`](crate::entity::CableSample) every step when enabled.
    pub fn with_history(mut self, history: bool) -> Self {
        self.history = history;
        self
    }

    /// Sets the force and velocity limits of the motor.
    pub fn with_limits(mut self, max_tension: f32, target_velocity: f32) -> Self {
        self.max_tension = max_tension;
        self.target_velocity = target_velocity;
        self
    }

    /// Sets the lengths below which a cable goes limp and can not be shortened.
    pub fn with_min_lengths(mut self, min_actual_length: f32, min_rest_length: f32) -> Self {
        self.min_actual_length = min_actual_length;
        self.min_rest_length = min_rest_length;
        self
    }

    /// Moves the first and/or second anchor from the rod axis to its surface.
    pub fn with_anchors_on_edge(mut self, a: bool, b: bool) -> Self {
        self.move_anchor_a_to_edge = a;
        self.move_anchor_b_to_edge = b;
        self
    }

    /// Stiffness, force limit and velocity limit must be positive; the rest
    /// non-negative.
    pub fn validate(&self) -> Result<()> {
        positive("stiffness", self.stiffness)?;
        non_negative("damping", self.damping)?;
        non_negative("pretension", self.pretension)?;
        positive("max_tension", self.max_tension)?;
        positive("target_velocity", self.target_velocity)?;
        non_negative("min_actual_length", self.min_actual_length)?;
        non_negative("min_rest_length", self.min_rest_length)
    }

    /// Rest length that produces the configured pretension at `start_length`.
    pub fn initial_rest_length(&self, start_length: f32) -> f32 {
        (start_length - self.pretension / self.stiffness).max(self.min_rest_length)
    }
}

fn positive(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TensegrityError::InvalidParameter { name, value })
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TensegrityError::InvalidParameter { name, value })
    }
}
