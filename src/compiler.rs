//! Compiles a [`Structure`] and a [`BuildSpec`] into a [`ModelTree`].
//!
//! Compilation runs in two passes:
//!
//! 1. **Resolve** (pure): every pair of every (sub-)structure gets its builder,
//!    rod segments are built and grouped into rigid-body clusters. All
//!    configuration errors surface here, before the world is touched.
//! 2. **Register**: bodies, then cables, are added to the world and the tree
//!    in pair-insertion order. A world failure releases everything already
//!    registered, so a failed compile leaves nothing behind.

use crate::build_spec::{ActuatorBuilder, BuildSpec, Builder, RodSegment};
use crate::entity::{CableActuator, RigidBody};
use crate::error::{Result, TensegrityError};
use crate::structure::{PairDefinition, Structure, Tags};
use crate::tree::ModelTree;
use crate::world::{Anchor, BodyHandle, PhysicsWorld};
use glam::Vec3;
use log::{debug, info};
use std::collections::BTreeMap;

/// Turns a geometry graph into live bodies and cables.
pub struct StructureCompiler<'a> {
    structure: &'a Structure,
    spec: &'a BuildSpec,
}

impl<'a> StructureCompiler<'a> {
    pub fn new(structure: &'a Structure, spec: &'a BuildSpec) -> Self {
        Self { structure, spec }
    }

    /// Builds the whole model into `world`.
    ///
    /// Either every entity is registered and the tree is returned, or the
    /// first error is returned and the world holds none of this model's
    /// entities.
    pub fn compile<W: PhysicsWorld + ?Sized>(&self, world: &mut W) -> Result<ModelTree> {
        let plan = NodePlan::resolve(self.structure, self.spec)?;

        let mut tree = ModelTree::new(self.structure.tags.clone());
        match plan.register(&mut tree, world) {
            Ok(()) => {
                info!(
                    "compiled structure [{}]: {} bodies, {} actuators",
                    tree.tags(),
                    tree.body_count(),
                    tree.actuator_count()
                );
                Ok(tree)
            }
            Err(e) => {
                tree.release(world);
                Err(e)
            }
        }
    }
}

/// Rod segments that share points and therefore form one body.
struct Cluster {
    tags: Tags,
    /// Segment with the endpoint indices of its pair.
    segments: Vec<(usize, usize, RodSegment)>,
}

impl Cluster {
    fn points(&self) -> Vec<usize> {
        let mut points: Vec<usize> = self.segments.iter().flat_map(|(a, b, _)| [*a, *b]).collect();
        points.sort_unstable();
        points.dedup();
        points
    }

    /// The segment that has `point` as an endpoint.
    fn segment_at(&self, point: usize) -> Option<&RodSegment> {
        self.segments
            .iter()
            .find(|(a, b, _)| *a == point || *b == point)
            .map(|(_, _, s)| s)
    }
}

struct CablePlan<'a> {
    index: usize,
    pair: &'a PairDefinition,
    builder: &'a ActuatorBuilder,
}

/// The resolved, world-independent form of one structure node.
struct NodePlan<'a> {
    structure: &'a Structure,
    clusters: Vec<Cluster>,
    point_to_cluster: BTreeMap<usize, usize>,
    cables: Vec<CablePlan<'a>>,
    children: Vec<NodePlan<'a>>,
}

impl<'a> NodePlan<'a> {
    fn resolve(structure: &'a Structure, spec: &'a BuildSpec) -> Result<Self> {
        let count = structure.points().len();
        let mut rods = Vec::new();
        let mut cables = Vec::new();
        let mut sets = PointSets::default();

        for (index, pair) in structure.pairs().iter().enumerate() {
            let (Some(from), Some(to)) = (structure.point(pair.from), structure.point(pair.to)) else {
                let bad = if pair.from >= count { pair.from } else { pair.to };
                return Err(TensegrityError::PointOutOfRange { index: bad, count });
            };

            let (tag, builder) = spec.resolve(index, pair)?;
            debug!("pair {index} ({} -> {}) resolved to '{tag}'", pair.from, pair.to);

            match builder {
                Builder::RigidLink(b) => {
                    let segment = b
                        .build(from, to)
                        .ok_or(TensegrityError::DegenerateRod { pair: index })?;
                    sets.union(pair.from, pair.to);
                    rods.push((pair, segment));
                }
                Builder::Actuator(b) => cables.push(CablePlan {
                    index,
                    pair,
                    builder: b,
                }),
            }
        }

        // Group rods by connected component; a cluster is ordered by its first rod.
        let mut clusters: Vec<Cluster> = Vec::new();
        let mut root_to_cluster = BTreeMap::new();
        for (pair, segment) in rods {
            let root = sets.find(pair.from);
            let slot = *root_to_cluster.entry(root).or_insert_with(|| {
                clusters.push(Cluster {
                    tags: Tags::new(),
                    segments: Vec::new(),
                });
                clusters.len() - 1
            });
            let cluster = &mut clusters[slot];
            cluster.tags.extend(&pair.tags);
            cluster.segments.push((pair.from, pair.to, segment));
        }

        let mut point_to_cluster = BTreeMap::new();
        for (slot, cluster) in clusters.iter().enumerate() {
            for point in cluster.points() {
                point_to_cluster.insert(point, slot);
            }
        }

        let children = structure
            .children()
            .iter()
            .map(|child| NodePlan::resolve(child, spec))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            structure,
            clusters,
            point_to_cluster,
            cables,
            children,
        })
    }

    fn register<W: PhysicsWorld + ?Sized>(self, tree: &mut ModelTree, world: &mut W) -> Result<()> {
        // 1. Bodies, one per cluster.
        let mut frames: Vec<(BodyHandle, Vec3)> = Vec::with_capacity(self.clusters.len());
        for cluster in &self.clusters {
            let segments: Vec<RodSegment> = cluster.segments.iter().map(|(_, _, s)| s.clone()).collect();
            let desc = RigidBody::describe(&segments);
            let handle = world.add_rigid_body(&desc)?;
            frames.push((handle, desc.position));
            tree.push_body(RigidBody::new(
                handle,
                cluster.tags.clone(),
                &desc,
                segments,
                cluster.points(),
            ));
        }

        // 2. Cables, attached to the bodies above or to the world.
        for cable in &self.cables {
            let config = cable.builder.config();
            let (anchor_a, end_a) = self.anchor(&frames, cable.pair.from, cable.pair.to, config.move_anchor_a_to_edge);
            let (anchor_b, end_b) = self.anchor(&frames, cable.pair.to, cable.pair.from, config.move_anchor_b_to_edge);

            let desc = cable.builder.build(anchor_a, anchor_b, end_a.distance(end_b));
            let handle = world.add_actuator(&desc)?;
            tree.push_actuator(CableActuator::new(
                handle,
                cable.pair.tags.clone(),
                cable.index,
                config.clone(),
                &desc,
                (end_a, end_b),
            ));
        }

        // 3. Children. Each partial child stays in the tree so a failure
        //    further down is still released by the caller.
        for child in self.children {
            let mut node = ModelTree::new(child.structure.tags.clone());
            let result = child.register(&mut node, world);
            tree.push_child(node);
            result?;
        }

        Ok(())
    }

    /// Anchor for `point`, and its world position.
    ///
    /// Points covered by a rigid link attach in that body's local frame;
    /// anything else is a fixed world anchor.
    fn anchor(&self, frames: &[(BodyHandle, Vec3)], point: usize, other: usize, to_edge: bool) -> (Anchor, Vec3) {
        let pos = self.structure.point(point).unwrap_or(Vec3::ZERO);
        let Some(&slot) = self.point_to_cluster.get(&point) else {
            return (Anchor::Fixed(pos), pos);
        };
        let (body, com) = frames[slot];

        let mut pos = pos;
        if to_edge
            && let Some(segment) = self.clusters[slot].segment_at(point)
            && let Some(other_pos) = self.structure.point(other)
        {
            // Project the cable direction off the rod axis and step out by the radius.
            let axis = segment.axis();
            let toward = other_pos - pos;
            if let Some(radial) = (toward - axis * toward.dot(axis)).try_normalize() {
                pos += radial * segment.radius;
            }
        }

        (Anchor::Body { body, local: pos - com }, pos)
    }
}

/// Union-find over point indices, used to group rods that share endpoints.
#[derive(Default)]
struct PointSets {
    parent: BTreeMap<usize, usize>,
}

impl PointSets {
    fn find(&mut self, point: usize) -> usize {
        let parent = *self.parent.entry(point).or_insert(point);
        if parent == point {
            return point;
        }
        let root = self.find(parent);
        self.parent.insert(point, root);
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Each set is rooted at its lowest point index.
            let (keep, drop) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent.insert(drop, keep);
        }
    }
}
