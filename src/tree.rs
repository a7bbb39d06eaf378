//! The compiled model: a rooted tree of bodies, cables and child nodes.

use crate::entity::{CableActuator, RigidBody};
use crate::structure::Tags;
use crate::world::PhysicsWorld;
use glam::Vec3;
use log::debug;

/// One node of the compiled model.
///
/// Entities are stored in creation order: bodies by their first rigid-link
/// pair, cables by pair index. Iteration helpers walk the node before its
/// children, depth first, so the order is stable for a given input.
#[derive(Debug, Default)]
pub struct ModelTree {
    tags: Tags,
    bodies: Vec<RigidBody>,
    actuators: Vec<CableActuator>,
    children: Vec<ModelTree>,
}

impl ModelTree {
    /// Creates an empty node carrying `tags`.
    pub fn new(tags: Tags) -> Self {
        Self {
            tags,
            ..Self::default()
        }
    }

    pub(crate) fn push_body(&mut self, body: RigidBody) {
        self.bodies.push(body);
    }

    pub(crate) fn push_actuator(&mut self, actuator: CableActuator) {
        self.actuators.push(actuator);
    }

    pub(crate) fn push_child(&mut self, child: ModelTree) {
        self.children.push(child);
    }

    /// Tags of the structure this node was compiled from.
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Bodies of this node only.
    pub fn own_bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    /// Cables of this node only.
    pub fn own_actuators(&self) -> &[CableActuator] {
        &self.actuators
    }

    /// Child nodes, one per child structure.
    pub fn children(&self) -> &[ModelTree] {
        &self.children
    }

    /// Every body in the tree, depth first.
    pub fn bodies(&self) -> Vec<&RigidBody> {
        let mut out = Vec::new();
        self.collect_bodies(&mut out);
        out
    }

    fn collect_bodies<'a>(&'a self, out: &mut Vec<&'a RigidBody>) {
        out.extend(self.bodies.iter());
        for child in &self.children {
            child.collect_bodies(out);
        }
    }

    /// Every cable in the tree, depth first.
    pub fn actuators(&self) -> Vec<&CableActuator> {
        let mut out = Vec::new();
        self.collect_actuators(&mut out);
        out
    }

    fn collect_actuators<'a>(&'a self, out: &mut Vec<&'a CableActuator>) {
        out.extend(self.actuators.iter());
        for child in &self.children {
            child.collect_actuators(out);
        }
    }

    /// Mutable view of every cable, in the same order as [`actuators`](Self::actuators).
    pub fn actuators_mut(&mut self) -> Vec<&mut CableActuator> {
        let mut out = Vec::new();
        self.collect_actuators_mut(&mut out);
        out
    }

    fn collect_actuators_mut<'a>(&'a mut self, out: &mut Vec<&'a mut CableActuator>) {
        out.extend(self.actuators.iter_mut());
        for child in &mut self.children {
            child.collect_actuators_mut(out);
        }
    }

    /// Number of bodies in this node and all children.
    pub fn body_count(&self) -> usize {
        self.bodies.len() + self.children.iter().map(ModelTree::body_count).sum::<usize>()
    }

    /// Number of cables in this node and all children.
    pub fn actuator_count(&self) -> usize {
        self.actuators.len() + self.children.iter().map(ModelTree::actuator_count).sum::<usize>()
    }

    /// Bodies carrying `tag`, depth first.
    pub fn find_bodies(&self, tag: &str) -> Vec<&RigidBody> {
        self.bodies().into_iter().filter(|b| b.tags().contains(tag)).collect()
    }

    /// Cables carrying `tag`, depth first.
    pub fn find_actuators(&self, tag: &str) -> Vec<&CableActuator> {
        self.actuators().into_iter().filter(|a| a.tags().contains(tag)).collect()
    }

    /// Mass-weighted centre of all bodies, or `None` for a tree without mass.
    pub fn center_of_mass(&self) -> Option<Vec3> {
        let (weighted, mass) = self
            .bodies()
            .iter()
            .fold((Vec3::ZERO, 0.0), |(sum, m), b| (sum + b.center_of_mass() * b.mass(), m + b.mass()));
        (mass > 0.0).then(|| weighted / mass)
    }

    /// Refreshes cached body poses and cable lengths from the world.
    pub fn sense<W: PhysicsWorld + ?Sized>(&mut self, world: &W) {
        for body in &mut self.bodies {
            body.sense(world);
        }
        for actuator in &mut self.actuators {
            actuator.sense(world);
        }
        for child in &mut self.children {
            child.sense(world);
        }
    }

    /// Per-entity step hook: every cable computes and applies its tension.
    pub fn step<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, dt: f32) {
        for actuator in &mut self.actuators {
            actuator.step(world, dt);
        }
        for child in &mut self.children {
            child.step(world, dt);
        }
    }

    /// Removes every entity from the world and from the tree.
    ///
    /// Entities are drained as they are released, so a second call finds
    /// nothing left and releases nothing. Cables go first since they
    /// reference bodies.
    pub fn release<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        for child in &mut self.children {
            child.release(world);
        }
        self.children.clear();

        for actuator in self.actuators.drain(..).rev() {
            world.remove_actuator(actuator.handle());
        }
        for body in self.bodies.drain(..).rev() {
            world.remove_rigid_body(body.handle());
        }
        debug!("released model node [{}]", self.tags);
    }
}
