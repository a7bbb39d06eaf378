//! # tensegrity-robot
//!
//! An engine-agnostic construction and control layer for tensegrity robots.
//!
//! A structure is described as an abstract graph of points joined by tagged
//! pairs ([`Structure`]). A [`BuildSpec`] says what each tag means (rigid
//! strut or tensioned cable), and the [`StructureCompiler`] turns the pair
//! into rigid bodies and cable actuators inside any [`PhysicsWorld`].
//!
//! A [`TensegrityModel`] wraps that pipeline in a setup/step/teardown
//! lifecycle and forwards each phase to attached [`ModelObserver`]s, such as
//! the [`SineWaveController`] or a [`SimpleLogger`], which command cables
//! through bounded [`ActuatorController`]s.

pub mod build_spec;
pub mod compiler;
pub mod config;
pub mod controller;
pub mod entity;
pub mod error;
pub mod logger;
pub mod model;
pub mod observer;
pub mod presets;
pub mod simulation;
pub mod sine_waves;
pub mod structure;
pub mod tree;
pub mod world;

pub use build_spec::{ActuatorBuilder, BuildSpec, Builder, RigidLinkBuilder, RodSegment};
pub use compiler::StructureCompiler;
pub use config::{CableConfig, RodConfig};
pub use controller::{ActuatorController, ConstantTensionController, ControlMode};
pub use entity::{CableActuator, CableSample, RigidBody};
pub use error::{Result, TensegrityError, WorldError};
pub use logger::{LogRecord, SimpleLogger};
pub use model::{ModelState, TensegrityModel};
pub use observer::{ModelObserver, NoOpObserver, ObserverHandle, SharedObserver};
pub use simulation::{Simulation, SimulationConfig};
pub use sine_waves::{SineWaveConfig, SineWaveController};
pub use structure::{PairDefinition, Structure, Tags};
pub use tree::ModelTree;
pub use world::{
    ActuatorDesc, ActuatorHandle, Anchor, BodyHandle, PhysicsWorld, PointMassWorld, Pose,
    RigidBodyDesc, RodShape, WorldConfig,
};
