//! Live physical entities owned by a model tree.

use crate::build_spec::RodSegment;
use crate::config::CableConfig;
use crate::structure::Tags;
use crate::world::{ActuatorDesc, ActuatorHandle, Anchor, BodyHandle, PhysicsWorld, Pose, RigidBodyDesc, RodShape};
use glam::{Mat3, Quat, Vec3};

/// A rigid body made of one or more rod segments that share points.
#[derive(Clone, Debug)]
pub struct RigidBody {
    handle: BodyHandle,
    tags: Tags,
    segments: Vec<RodSegment>,
    points: Vec<usize>,
    mass: f32,
    inertia: Mat3,
    pose: Pose,
}

impl RigidBody {
    /// Describes the compound body formed by `segments`.
    ///
    /// The body sits at the combined centre of mass with identity
    /// orientation; segment inertias are shifted with the parallel-axis
    /// theorem. `segments` must be non-empty.
    pub(crate) fn describe(segments: &[RodSegment]) -> RigidBodyDesc {
        let mass: f32 = segments.iter().map(|s| s.mass).sum();
        let com = segments.iter().map(|s| s.center() * s.mass).sum::<Vec3>() / mass;

        let inertia = segments.iter().fold(Mat3::ZERO, |acc, s| {
            let d = s.center() - com;
            let outer = Mat3::from_cols(d * d.x, d * d.y, d * d.z);
            let shift = Mat3::from_diagonal(Vec3::splat(d.length_squared())) - outer;
            acc + s.inertia + shift * s.mass
        });

        let shapes = segments
            .iter()
            .map(|s| RodShape {
                from: s.from - com,
                to: s.to - com,
                radius: s.radius,
            })
            .collect();

        // Surface properties come from the first segment of the cluster.
        let surface = &segments[0].config;
        RigidBodyDesc {
            position: com,
            rotation: Quat::IDENTITY,
            mass,
            inertia,
            shapes,
            friction: surface.friction,
            roll_friction: surface.roll_friction,
            restitution: surface.restitution,
        }
    }

    pub(crate) fn new(
        handle: BodyHandle,
        tags: Tags,
        desc: &RigidBodyDesc,
        segments: Vec<RodSegment>,
        points: Vec<usize>,
    ) -> Self {
        Self {
            handle,
            tags,
            segments,
            points,
            mass: desc.mass,
            inertia: desc.inertia,
            pose: (desc.position, desc.rotation),
        }
    }

    /// Handle of this body in the physics world.
    pub fn handle(&self) -> BodyHandle {
        self.handle
    }

    /// Union of the tags of every rod in this body.
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Total mass of all segments.
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Inertia tensor about the centre of mass, body frame.
    pub fn inertia(&self) -> Mat3 {
        self.inertia
    }

    /// Pose as of the last [`sense`](Self::sense).
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Centre of mass as of the last [`sense`](Self::sense).
    pub fn center_of_mass(&self) -> Vec3 {
        self.pose.0
    }

    /// Rod segments in their construction-time world positions.
    pub fn segments(&self) -> &[RodSegment] {
        &self.segments
    }

    /// Structure point indices this body spans, ascending.
    pub fn points(&self) -> &[usize] {
        &self.points
    }

    /// True if `point` is an endpoint of one of this body's segments.
    pub fn spans(&self, point: usize) -> bool {
        self.points.binary_search(&point).is_ok()
    }

    /// Refreshes the cached pose from the world.
    pub fn sense<W: PhysicsWorld + ?Sized>(&mut self, world: &W) {
        if let Some(pose) = world.body_pose(self.handle) {
            self.pose = pose;
        }
    }
}

/// One recorded step of a cable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CableSample {
    /// Distance between the anchors.
    pub length: f32,
    /// Commanded rest length.
    pub rest_length: f32,
    /// Tension applied this step.
    pub tension: f32,
}

/// A tensioned cable with a motor that changes its rest length.
#[derive(Clone, Debug)]
pub struct CableActuator {
    handle: ActuatorHandle,
    tags: Tags,
    pair: usize,
    config: CableConfig,
    anchor_a: Anchor,
    anchor_b: Anchor,
    ends: (Vec3, Vec3),
    rest_length: f32,
    length: f32,
    previous_length: f32,
    tension: f32,
    history: Vec<CableSample>,
}

impl CableActuator {
    pub(crate) fn new(
        handle: ActuatorHandle,
        tags: Tags,
        pair: usize,
        config: CableConfig,
        desc: &ActuatorDesc,
        ends: (Vec3, Vec3),
    ) -> Self {
        let length = ends.0.distance(ends.1);
        let tension = (config.stiffness * (length - desc.rest_length)).clamp(0.0, config.max_tension);
        Self {
            handle,
            tags,
            pair,
            config,
            anchor_a: desc.anchor_a,
            anchor_b: desc.anchor_b,
            ends,
            rest_length: desc.rest_length,
            length,
            previous_length: length,
            tension,
            history: Vec::new(),
        }
    }

    /// Handle of this cable in the physics world.
    pub fn handle(&self) -> ActuatorHandle {
        self.handle
    }

    /// Tags of the pair this cable was built from.
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Index of the pair this cable was built from.
    pub fn pair(&self) -> usize {
        self.pair
    }

    /// Parameters this cable was built with.
    pub fn config(&self) -> &CableConfig {
        &self.config
    }

    /// Both anchors, in pair order.
    pub fn anchors(&self) -> (Anchor, Anchor) {
        (self.anchor_a, self.anchor_b)
    }

    /// World positions of both anchors as of the last [`sense`](Self::sense).
    pub fn ends(&self) -> (Vec3, Vec3) {
        self.ends
    }

    /// Length at which the cable goes slack.
    pub fn rest_length(&self) -> f32 {
        self.rest_length
    }

    /// Anchor distance as of the last [`sense`](Self::sense).
    pub fn current_length(&self) -> f32 {
        self.length
    }

    /// Tension computed in the last [`step`](Self::step).
    pub fn tension(&self) -> f32 {
        self.tension
    }

    /// Recorded samples, empty unless `history` is enabled.
    pub fn history(&self) -> &[CableSample] {
        &self.history
    }

    /// Sets the rest length directly, floored at `min_rest_length`.
    ///
    /// No rate limit applies; use an
    /// [`ActuatorController`](crate::controller::ActuatorController) for
    /// bounded commands.
    pub fn set_rest_length(&mut self, rest_length: f32) {
        self.rest_length = rest_length.max(self.config.min_rest_length);
    }

    /// Refreshes anchor positions and length from the world.
    pub fn sense<W: PhysicsWorld + ?Sized>(&mut self, world: &W) {
        let a = self.anchor_a.world_position(world).unwrap_or(self.ends.0);
        let b = self.anchor_b.world_position(world).unwrap_or(self.ends.1);
        self.ends = (a, b);
        self.previous_length = self.length;
        self.length = a.distance(b);
    }

    /// Computes this step's tension and applies it to both anchors.
    ///
    /// Cables only pull: a slack or collapsed cable carries no tension.
    /// Tension never exceeds `max_tension`.
    pub fn step<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, dt: f32) {
        let stretch = self.length - self.rest_length;
        self.tension = if stretch <= 0.0 || self.length < self.config.min_actual_length {
            0.0
        } else {
            let velocity = (self.length - self.previous_length) / dt;
            (self.config.stiffness * stretch + self.config.damping * velocity)
                .clamp(0.0, self.config.max_tension)
        };

        if self.tension > 0.0 {
            let (a, b) = self.ends;
            let dir = (b - a).normalize_or_zero();
            if let Some(body) = self.anchor_a.body() {
                world.apply_force(body, dir * self.tension, a);
            }
            if let Some(body) = self.anchor_b.body() {
                world.apply_force(body, -dir * self.tension, b);
            }
        }

        if self.config.history {
            self.history.push(CableSample {
                length: self.length,
                rest_length: self.rest_length,
                tension: self.tension,
            });
        }
    }
}
