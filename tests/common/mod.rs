// tests/common/mod.rs
#![allow(dead_code)]

use glam::Vec3;
use std::collections::BTreeMap;
use tensegrity_robot::{
    ActuatorDesc, ActuatorHandle, BodyHandle, PhysicsWorld, PointMassWorld, Pose, RigidBodyDesc,
    WorldConfig, WorldError,
};

/// Wraps a [`PointMassWorld`] and records every add/remove call.
///
/// `fail_after` makes the n-th allocation (bodies and actuators counted
/// together, zero based) fail with a capacity error.
pub struct RecordingWorld {
    pub inner: PointMassWorld,
    pub fail_after: Option<usize>,
    pub allocations: usize,
    pub body_removals: BTreeMap<BodyHandle, usize>,
    pub actuator_removals: BTreeMap<ActuatorHandle, usize>,
    pub added_bodies: Vec<BodyHandle>,
    pub added_actuators: Vec<ActuatorHandle>,
    pub steps: usize,
}

impl RecordingWorld {
    pub fn new() -> Self {
        Self {
            inner: PointMassWorld::new(WorldConfig {
                gravity: Vec3::ZERO,
                ..WorldConfig::default()
            }),
            fail_after: None,
            allocations: 0,
            body_removals: BTreeMap::new(),
            actuator_removals: BTreeMap::new(),
            added_bodies: Vec::new(),
            added_actuators: Vec::new(),
            steps: 0,
        }
    }

    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::new()
        }
    }

    pub fn live_bodies(&self) -> usize {
        self.inner.body_count()
    }

    pub fn live_actuators(&self) -> usize {
        self.inner.actuator_count()
    }

    fn allocate(&mut self) -> Result<(), WorldError> {
        if self.fail_after == Some(self.allocations) {
            return Err(WorldError::CapacityExceeded { limit: self.allocations });
        }
        self.allocations += 1;
        Ok(())
    }
}

impl PhysicsWorld for RecordingWorld {
    fn add_rigid_body(&mut self, desc: &RigidBodyDesc) -> Result<BodyHandle, WorldError> {
        self.allocate()?;
        let handle = self.inner.add_rigid_body(desc)?;
        self.added_bodies.push(handle);
        Ok(handle)
    }

    fn remove_rigid_body(&mut self, handle: BodyHandle) {
        *self.body_removals.entry(handle).or_default() += 1;
        self.inner.remove_rigid_body(handle);
    }

    fn add_actuator(&mut self, desc: &ActuatorDesc) -> Result<ActuatorHandle, WorldError> {
        self.allocate()?;
        let handle = self.inner.add_actuator(desc)?;
        self.added_actuators.push(handle);
        Ok(handle)
    }

    fn remove_actuator(&mut self, handle: ActuatorHandle) {
        *self.actuator_removals.entry(handle).or_default() += 1;
        self.inner.remove_actuator(handle);
    }

    fn body_pose(&self, handle: BodyHandle) -> Option<Pose> {
        self.inner.body_pose(handle)
    }

    fn apply_force(&mut self, handle: BodyHandle, force: Vec3, at: Vec3) {
        self.inner.apply_force(handle, force, at);
    }

    fn step(&mut self, dt: f32) {
        self.steps += 1;
        self.inner.step(dt);
    }
}
