//! The narrow interface to the physics engine, plus a small reference world.
//!
//! The crate never integrates rigid-body dynamics itself. Everything it
//! needs from an engine goes through [`PhysicsWorld`]: registering and
//! releasing bodies and cables, reading body poses, applying cable forces,
//! and advancing time.

use crate::error::WorldError;
use glam::{Mat3, Quat, Vec3};
use log::warn;
use serde::{Deserialize, Serialize};

/// World-space position and orientation of a body.
pub type Pose = (Vec3, Quat);

/// Engine-assigned identifier of a rigid body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// Engine-assigned identifier of a registered cable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActuatorHandle(pub u32);

/// A cylindrical collision shape in the owning body's local frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RodShape {
    /// First endpoint, relative to the body's centre of mass.
    pub from: Vec3,
    /// Second endpoint, relative to the body's centre of mass.
    pub to: Vec3,
    /// Cylinder radius.
    pub radius: f32,
}

/// Everything an engine needs to create one rigid body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RigidBodyDesc {
    /// Initial centre of mass in world space.
    pub position: Vec3,
    /// Initial orientation.
    pub rotation: Quat,
    /// Total mass.
    pub mass: f32,
    /// Inertia tensor about the centre of mass, in the body frame.
    pub inertia: Mat3,
    /// Collision geometry, one cylinder per rod segment.
    pub shapes: Vec<RodShape>,
    /// Sliding friction coefficient.
    pub friction: f32,
    /// Rolling friction coefficient.
    pub roll_friction: f32,
    /// Coefficient of restitution.
    pub restitution: f32,
}

/// Where one end of a cable is attached.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Anchor {
    /// A point fixed in the body's local frame.
    Body { body: BodyHandle, local: Vec3 },
    /// A point fixed in world space (an endpoint no rigid link covers).
    Fixed(Vec3),
}

impl Anchor {
    /// Current world position of the anchor, or `None` if its body is gone.
    pub fn world_position<W: PhysicsWorld + ?Sized>(&self, world: &W) -> Option<Vec3> {
        match *self {
            Anchor::Body { body, local } => {
                world.body_pose(body).map(|(pos, rot)| pos + rot * local)
            }
            Anchor::Fixed(p) => Some(p),
        }
    }

    /// The body this anchor rides on, if any.
    pub fn body(&self) -> Option<BodyHandle> {
        match *self {
            Anchor::Body { body, .. } => Some(body),
            Anchor::Fixed(_) => None,
        }
    }
}

/// Everything an engine needs to register one cable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActuatorDesc {
    /// Where the first end is attached.
    pub anchor_a: Anchor,
    /// Where the second end is attached.
    pub anchor_b: Anchor,
    /// Length at which the cable carries no tension.
    pub rest_length: f32,
    /// Spring constant (force / length).
    pub stiffness: f32,
    /// Damping coefficient (force / velocity).
    pub damping: f32,
}

/// The physics engine collaborator.
///
/// Implementations own the actual simulation state. Handles returned by the
/// `add_*` calls stay valid until the matching `remove_*` call.
pub trait PhysicsWorld {
    /// Creates a rigid body and returns its handle.
    fn add_rigid_body(&mut self, desc: &RigidBodyDesc) -> Result<BodyHandle, WorldError>;

    /// Releases a rigid body. Unknown handles are ignored.
    fn remove_rigid_body(&mut self, handle: BodyHandle);

    /// Registers a cable between two anchors and returns its handle.
    fn add_actuator(&mut self, desc: &ActuatorDesc) -> Result<ActuatorHandle, WorldError>;

    /// Releases a cable. Unknown handles are ignored.
    fn remove_actuator(&mut self, handle: ActuatorHandle);

    /// Current pose of a body.
    fn body_pose(&self, handle: BodyHandle) -> Option<Pose>;

    /// Applies `force` at world point `at` for the next integration step.
    fn apply_force(&mut self, handle: BodyHandle, force: Vec3, at: Vec3);

    /// Advances the world by `dt` seconds.
    fn step(&mut self, dt: f32);
}

/// Settings for [`PointMassWorld`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Constant acceleration applied to every body.
    pub gravity: Vec3,
    /// Fraction of velocity removed per second.
    pub linear_damping: f32,
    /// Maximum number of live bodies plus actuators; `None` for unbounded.
    pub capacity: Option<usize>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            linear_damping: 0.0,
            capacity: None,
        }
    }
}

#[derive(Clone, Debug)]
struct PointBody {
    position: Vec3,
    rotation: Quat,
    velocity: Vec3,
    inv_mass: f32,
    force: Vec3,
}

/// A deterministic, translation-only reference world.
///
/// Bodies are integrated as point masses at their centre of mass
/// (semi-implicit Euler); orientation never changes. Handles are never
/// reused, so a stale handle can not alias a newer body.
#[derive(Clone, Debug, Default)]
pub struct PointMassWorld {
    config: WorldConfig,
    bodies: Vec<Option<PointBody>>,
    actuators: Vec<Option<ActuatorDesc>>,
    time: f32,
}

impl PointMassWorld {
    /// Creates an empty world with the given settings.
    pub fn new(config: WorldConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Number of live rigid bodies.
    pub fn body_count(&self) -> usize {
        self.bodies.iter().flatten().count()
    }

    /// Number of live cables.
    pub fn actuator_count(&self) -> usize {
        self.actuators.iter().flatten().count()
    }

    /// Simulated seconds since creation.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Current linear velocity of a body.
    pub fn body_velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        self.body(handle).map(|b| b.velocity)
    }

    /// Registered description of a live cable.
    pub fn actuator(&self, handle: ActuatorHandle) -> Option<&ActuatorDesc> {
        self.actuators.get(handle.0 as usize).and_then(Option::as_ref)
    }

    fn body(&self, handle: BodyHandle) -> Option<&PointBody> {
        self.bodies.get(handle.0 as usize).and_then(Option::as_ref)
    }

    fn check_capacity(&self) -> Result<(), WorldError> {
        match self.config.capacity {
            Some(limit) if self.body_count() + self.actuator_count() >= limit => {
                Err(WorldError::CapacityExceeded { limit })
            }
            _ => Ok(()),
        }
    }
}

impl PhysicsWorld for PointMassWorld {
    fn add_rigid_body(&mut self, desc: &RigidBodyDesc) -> Result<BodyHandle, WorldError> {
        self.check_capacity()?;
        if !(desc.mass.is_finite() && desc.mass > 0.0) {
            return Err(WorldError::InvalidBody(format!("mass {}", desc.mass)));
        }
        let handle = BodyHandle(self.bodies.len() as u32);
        self.bodies.push(Some(PointBody {
            position: desc.position,
            rotation: desc.rotation,
            velocity: Vec3::ZERO,
            inv_mass: desc.mass.recip(),
            force: Vec3::ZERO,
        }));
        Ok(handle)
    }

    fn remove_rigid_body(&mut self, handle: BodyHandle) {
        if self.bodies.get_mut(handle.0 as usize).and_then(Option::take).is_none() {
            warn!("removing unknown rigid body {handle:?}");
        }
    }

    fn add_actuator(&mut self, desc: &ActuatorDesc) -> Result<ActuatorHandle, WorldError> {
        self.check_capacity()?;
        for body in [desc.anchor_a.body(), desc.anchor_b.body()].into_iter().flatten() {
            if self.body(body).is_none() {
                return Err(WorldError::UnknownBody(body));
            }
        }
        let handle = ActuatorHandle(self.actuators.len() as u32);
        self.actuators.push(Some(desc.clone()));
        Ok(handle)
    }

    fn remove_actuator(&mut self, handle: ActuatorHandle) {
        if self.actuators.get_mut(handle.0 as usize).and_then(Option::take).is_none() {
            warn!("removing unknown actuator {handle:?}");
        }
    }

    fn body_pose(&self, handle: BodyHandle) -> Option<Pose> {
        self.body(handle).map(|b| (b.position, b.rotation))
    }

    fn apply_force(&mut self, handle: BodyHandle, force: Vec3, _at: Vec3) {
        if let Some(Some(body)) = self.bodies.get_mut(handle.0 as usize) {
            body.force += force;
        }
    }

    fn step(&mut self, dt: f32) {
        let damping = (1.0 - self.config.linear_damping * dt).max(0.0);
        for body in self.bodies.iter_mut().flatten() {
            let accel = body.force * body.inv_mass + self.config.gravity;
            body.velocity = body.velocity * damping + accel * dt;
            body.position += body.velocity * dt;
            body.force = Vec3::ZERO;
        }
        self.time += dt;
    }
}
