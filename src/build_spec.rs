//! Tag-keyed builders that turn pairs into physical entities.
//!
//! A [`BuildSpec`] maps a tag to exactly one [`Builder`]. During compilation
//! each pair's tags are intersected with the registered keys; exactly one
//! key must match.

use crate::config::{CableConfig, RodConfig};
use crate::error::{Result, TensegrityError};
use crate::structure::PairDefinition;
use crate::world::{ActuatorDesc, Anchor};
use bevy_heavy::ComputeMassProperties3d as _;
use bevy_math::primitives::Cylinder;
use glam::{Mat3, Quat, Vec3};
use std::collections::BTreeMap;

/// One rod materialised in world space, before it is merged into a body.
#[derive(Clone, Debug, PartialEq)]
pub struct RodSegment {
    /// World position of the first endpoint.
    pub from: Vec3,
    /// World position of the second endpoint.
    pub to: Vec3,
    /// Cylinder radius.
    pub radius: f32,
    /// Mass derived from radius, length and density.
    pub mass: f32,
    /// Inertia tensor about the segment's own centre, in world axes.
    pub inertia: Mat3,
    /// The rod parameters this segment was built with.
    pub config: RodConfig,
}

impl RodSegment {
    /// Midpoint of the segment, which is also its centre of mass.
    pub fn center(&self) -> Vec3 {
        (self.from + self.to) * 0.5
    }

    /// Distance between the two endpoints.
    pub fn length(&self) -> f32 {
        self.from.distance(self.to)
    }

    /// Unit vector from `from` to `to`.
    pub fn axis(&self) -> Vec3 {
        (self.to - self.from).normalize_or_zero()
    }
}

/// Produces a rigid strut between two points.
#[derive(Clone, Debug, PartialEq)]
pub struct RigidLinkBuilder {
    config: RodConfig,
}

impl RigidLinkBuilder {
    /// Creates a builder for rods with the given parameters.
    pub fn new(config: RodConfig) -> Self {
        Self { config }
    }

    /// Parameters applied to every rod this builder creates.
    pub fn config(&self) -> &RodConfig {
        &self.config
    }

    /// Builds the cylinder spanning `from`..`to`, or `None` when the two
    /// points coincide.
    pub fn build(&self, from: Vec3, to: Vec3) -> Option<RodSegment> {
        let axis = (to - from).try_normalize()?;
        let length = from.distance(to);
        let cylinder = Cylinder::new(self.config.radius, length);
        let mass = cylinder.mass(self.config.density);

        // bevy's cylinder grows along +Y; rotate its principal frame onto the rod.
        let principal = cylinder.unit_principal_angular_inertia() * mass;
        let rot = Mat3::from_quat(Quat::from_rotation_arc(Vec3::Y, axis));
        let inertia = rot * Mat3::from_diagonal(principal) * rot.transpose();

        Some(RodSegment {
            from,
            to,
            radius: self.config.radius,
            mass,
            inertia,
            config: self.config.clone(),
        })
    }
}

/// Produces a tensioned cable between two anchors.
#[derive(Clone, Debug, PartialEq)]
pub struct ActuatorBuilder {
    config: CableConfig,
}

impl ActuatorBuilder {
    /// Creates a builder for cables with the given parameters.
    pub fn new(config: CableConfig) -> Self {
        Self { config }
    }

    /// Parameters applied to every cable this builder creates.
    pub fn config(&self) -> &CableConfig {
        &self.config
    }

    /// Describes a cable of current length `start_length`, pre-tensioned
    /// according to the config.
    pub fn build(&self, anchor_a: Anchor, anchor_b: Anchor, start_length: f32) -> ActuatorDesc {
        ActuatorDesc {
            anchor_a,
            anchor_b,
            rest_length: self.config.initial_rest_length(start_length),
            stiffness: self.config.stiffness,
            damping: self.config.damping,
        }
    }
}

/// The closed set of entity factories.
#[derive(Clone, Debug, PartialEq)]
pub enum Builder {
    /// Rigid strut; endpoints become (part of) a rigid body.
    RigidLink(RigidLinkBuilder),
    /// Variable-length cable attached to existing bodies or world anchors.
    Actuator(ActuatorBuilder),
}

impl Builder {
    /// Shorthand for a [`Builder::RigidLink`] with `config`.
    pub fn rod(config: RodConfig) -> Self {
        Self::RigidLink(RigidLinkBuilder::new(config))
    }

    /// Shorthand for a [`Builder::Actuator`] with `config`.
    pub fn cable(config: CableConfig) -> Self {
        Self::Actuator(ActuatorBuilder::new(config))
    }

    /// True for rigid links, false for cables.
    pub fn is_rigid_link(&self) -> bool {
        matches!(self, Self::RigidLink(_))
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::RigidLink(b) => b.config.validate(),
            Self::Actuator(b) => b.config.validate(),
        }
    }
}

/// Mapping from tag to builder.
#[derive(Clone, Debug, Default)]
pub struct BuildSpec {
    builders: BTreeMap<String, Builder>,
}

impl BuildSpec {
    /// Creates an empty spec with no bound tags.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `builder` to `tag`.
    ///
    /// The builder's config is validated here and is immutable afterwards.
    /// Each tag may be bound once.
    pub fn add_builder(&mut self, tag: &str, builder: Builder) -> Result<()> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(TensegrityError::EmptyTag);
        }
        if self.builders.contains_key(tag) {
            return Err(TensegrityError::DuplicateBuilder {
                tag: tag.to_owned(),
            });
        }
        builder.validate()?;
        self.builders.insert(tag.to_owned(), builder);
        Ok(())
    }

    /// Chained form of [`add_builder`](Self::add_builder).
    pub fn with_builder(mut self, tag: &str, builder: Builder) -> Result<Self> {
        self.add_builder(tag, builder)?;
        Ok(self)
    }

    /// The builder bound to `tag`, if any.
    pub fn builder(&self, tag: &str) -> Option<&Builder> {
        self.builders.get(tag)
    }

    /// Bound tags in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }

    /// Number of bound tags.
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    /// True if no tag is bound.
    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Resolves the single builder for `pair` (the `index`-th pair of its structure).
    ///
    /// Zero matching tags is [`TensegrityError::UnresolvedTag`], more than one
    /// is [`TensegrityError::AmbiguousTag`].
    pub fn resolve(&self, index: usize, pair: &PairDefinition) -> Result<(&str, &Builder)> {
        let mut matches = pair
            .tags
            .iter()
            .filter_map(|tag| self.builders.get_key_value(tag));

        let Some((tag, builder)) = matches.next() else {
            return Err(TensegrityError::UnresolvedTag {
                pair: index,
                tags: pair.tags.to_string(),
            });
        };

        let rest: Vec<String> = matches.map(|(t, _)| t.clone()).collect();
        if !rest.is_empty() {
            let mut all = vec![tag.clone()];
            all.extend(rest);
            return Err(TensegrityError::AmbiguousTag {
                pair: index,
                matches: all,
            });
        }

        Ok((tag.as_str(), builder))
    }
}
