//! Error types for structure compilation, model lifecycle and control.

use crate::model::ModelState;
use crate::world::{ActuatorHandle, BodyHandle};
use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, TensegrityError>;

/// Failures reported by a [`PhysicsWorld`](crate::world::PhysicsWorld) implementation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorldError {
    /// The engine cannot hold any more entities.
    #[error("physics world capacity of {limit} entities exhausted")]
    CapacityExceeded {
        /// Maximum number of live entities.
        limit: usize,
    },

    /// The engine rejected a rigid body description.
    #[error("invalid rigid body: {0}")]
    InvalidBody(String),

    /// An actuator referenced a body the engine does not know.
    #[error("unknown rigid body {0:?}")]
    UnknownBody(BodyHandle),

    /// The engine rejected an actuator description.
    #[error("invalid actuator {handle:?}: {reason}")]
    InvalidActuator {
        /// Handle the engine would have assigned, if any.
        handle: Option<ActuatorHandle>,
        /// Engine supplied reason.
        reason: String,
    },
}

/// Everything that can go wrong while building or driving a tensegrity model.
#[derive(Debug, Error)]
pub enum TensegrityError {
    // --- Configuration errors ---
    /// A pair referenced a point that does not exist.
    #[error("point index {index} out of range (structure has {count} points)")]
    PointOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of points in the structure.
        count: usize,
    },

    /// A builder was registered under an empty tag.
    #[error("builder tags must be non-empty")]
    EmptyTag,

    /// A second builder was registered under an existing tag.
    #[error("a builder is already registered for tag '{tag}'")]
    DuplicateBuilder {
        /// The contested tag.
        tag: String,
    },

    /// No registered builder matches any of the pair's tags.
    #[error("pair {pair} with tags [{tags}] matches no registered builder")]
    UnresolvedTag {
        /// Index of the pair in its structure.
        pair: usize,
        /// The pair's tags, space separated.
        tags: String,
    },

    /// More than one registered builder matches the pair's tags.
    #[error("pair {pair} matches several builders: {matches:?}")]
    AmbiguousTag {
        /// Index of the pair in its structure.
        pair: usize,
        /// Every matching registered tag, sorted.
        matches: Vec<String>,
    },

    /// A rigid link whose endpoints coincide has no defined mass or axis.
    #[error("rigid link pair {pair} has zero length")]
    DegenerateRod {
        /// Index of the pair in its structure.
        pair: usize,
    },

    /// A physical parameter failed validation.
    #[error("invalid parameter {name} = {value}")]
    InvalidParameter {
        /// Field name.
        name: &'static str,
        /// Rejected value.
        value: f32,
    },

    /// A controller configuration file is malformed.
    #[error("invalid control configuration: {0}")]
    ControlConfig(String),

    /// A controller has fewer configured channels than the model has actuators.
    #[error("controller configures {configured} actuators but the model has {actuators}")]
    ActuatorCountMismatch {
        /// Channels present in the configuration.
        configured: usize,
        /// Actuators present in the model.
        actuators: usize,
    },

    // --- Resource errors ---
    /// The physics world refused an entity.
    #[error(transparent)]
    World(#[from] WorldError),

    // --- Precondition violations ---
    /// `dt` was zero, negative or not finite.
    #[error("dt is not positive: {dt}")]
    NonPositiveTimestep {
        /// The rejected timestep.
        dt: f32,
    },

    /// A lifecycle operation was called in the wrong state.
    #[error("cannot {operation} a model in state {state:?}")]
    InvalidState {
        /// The attempted operation.
        operation: &'static str,
        /// The model's state at the time.
        state: ModelState,
    },

    /// An observer was notified while already borrowed (re-entrant notification).
    #[error("observer is already borrowed")]
    ObserverBusy,

    // --- External I/O ---
    /// Reading a configuration file or writing a log failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A configuration file is not valid JSON for the expected schema.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TensegrityError {
    /// Create an invalid control configuration error.
    pub fn control_config(msg: impl Into<String>) -> Self {
        Self::ControlConfig(msg.into())
    }

    /// True for the configuration class of errors (fatal at compile/setup time).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::PointOutOfRange { .. }
                | Self::EmptyTag
                | Self::DuplicateBuilder { .. }
                | Self::UnresolvedTag { .. }
                | Self::AmbiguousTag { .. }
                | Self::DegenerateRod { .. }
                | Self::InvalidParameter { .. }
                | Self::ControlConfig(_)
                | Self::ActuatorCountMismatch { .. }
                | Self::Json(_)
        )
    }
}
