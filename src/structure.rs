//! The abstract geometry graph: labelled points joined by tagged pairs.
//!
//! A [`Structure`] is purely descriptive. Nothing here touches a physics
//! world; the [`StructureCompiler`](crate::compiler::StructureCompiler)
//! turns it into bodies and actuators once a [`BuildSpec`](crate::build_spec::BuildSpec)
//! says what each tag means.

use crate::error::{Result, TensegrityError};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A set of string labels attached to a pair, structure or built entity.
///
/// Parsed from a whitespace separated label, so `"r1 rod"` carries both
/// `r1` and `rod`. Iteration order is sorted, which keeps error messages
/// and lookups deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags(BTreeSet<String>);

impl Tags {
    /// Creates an empty tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits `label` on whitespace into individual tags.
    pub fn parse(label: &str) -> Self {
        Self(label.split_whitespace().map(str::to_owned).collect())
    }

    /// True if `tag` is in the set.
    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    /// Adds a single tag.
    pub fn insert(&mut self, tag: impl Into<String>) {
        self.0.insert(tag.into());
    }

    /// Adds every tag of `other` to `self`.
    pub fn extend(&mut self, other: &Tags) {
        self.0.extend(other.0.iter().cloned());
    }

    /// Tags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// True if the set holds no tags.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct tags.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<&str> for Tags {
    fn from(label: &str) -> Self {
        Self::parse(label)
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for tag in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(tag)?;
            first = false;
        }
        Ok(())
    }
}

/// An unordered connection between two points of the same structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairDefinition {
    /// Index of the first endpoint.
    pub from: usize,
    /// Index of the second endpoint.
    pub to: usize,
    /// Labels used to pick a builder.
    pub tags: Tags,
}

impl PairDefinition {
    /// True if `point` is one of the two endpoints.
    pub fn touches(&self, point: usize) -> bool {
        self.from == point || self.to == point
    }
}

/// The geometry graph for one (sub-)structure.
///
/// Points are identified by insertion index. Pairs must reference points
/// of the same structure; child structures keep their own index space.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Structure {
    /// Labels copied onto the compiled model node.
    pub tags: Tags,
    points: Vec<Vec3>,
    pairs: Vec<PairDefinition>,
    children: Vec<Structure>,
}

impl Structure {
    /// Creates an empty, untagged structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty structure carrying `tags`.
    pub fn with_tags(tags: impl Into<Tags>) -> Self {
        Self {
            tags: tags.into(),
            ..Self::default()
        }
    }

    /// Appends a point and returns its index.
    pub fn add_point(&mut self, x: f32, y: f32, z: f32) -> usize {
        self.points.push(Vec3::new(x, y, z));
        self.points.len() - 1
    }

    /// Appends a pair between two existing points.
    ///
    /// Fails with [`TensegrityError::PointOutOfRange`] and leaves the
    /// structure untouched if either index is invalid.
    pub fn add_pair(&mut self, from: usize, to: usize, tags: impl Into<Tags>) -> Result<usize> {
        let count = self.points.len();
        for index in [from, to] {
            if index >= count {
                return Err(TensegrityError::PointOutOfRange { index, count });
            }
        }
        self.pairs.push(PairDefinition {
            from,
            to,
            tags: tags.into(),
        });
        Ok(self.pairs.len() - 1)
    }

    /// Nests `child` under this structure. It compiles into a child model node.
    pub fn add_child(&mut self, child: Structure) {
        self.children.push(child);
    }

    /// All points, indexed by insertion order.
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// The point at `index`, if it exists.
    pub fn point(&self, index: usize) -> Option<Vec3> {
        self.points.get(index).copied()
    }

    /// All pairs, indexed by insertion order.
    pub fn pairs(&self) -> &[PairDefinition] {
        &self.pairs
    }

    /// Child structures, in the order they were added.
    pub fn children(&self) -> &[Structure] {
        &self.children
    }

    /// Pairs carrying `tag`, in insertion order.
    pub fn find_pairs<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a PairDefinition> + 'a {
        self.pairs.iter().filter(move |p| p.tags.contains(tag))
    }

    /// Translates every point, including those of children.
    pub fn move_by(&mut self, offset: Vec3) {
        for p in &mut self.points {
            *p += offset;
        }
        for child in &mut self.children {
            child.move_by(offset);
        }
    }

    /// Rotates every point by `angle` radians around `axis` through `fixed_point`.
    ///
    /// A zero axis leaves the structure unchanged.
    pub fn rotate_about(&mut self, fixed_point: Vec3, axis: Vec3, angle: f32) {
        let Some(axis) = axis.try_normalize() else {
            return;
        };
        self.rotate(fixed_point, Quat::from_axis_angle(axis, angle));
    }

    /// Applies `rotation` around `fixed_point` to every point, including children.
    pub fn rotate(&mut self, fixed_point: Vec3, rotation: Quat) {
        for p in &mut self.points {
            *p = fixed_point + rotation * (*p - fixed_point);
        }
        for child in &mut self.children {
            child.rotate(fixed_point, rotation);
        }
    }

    /// Appends `other`'s points (shifted by `offset`), its pairs re-indexed
    /// into this structure, and its children.
    pub fn merge(&mut self, other: &Structure, offset: Vec3) {
        let base = self.points.len();
        self.points.extend(other.points.iter().map(|p| *p + offset));
        self.pairs.extend(other.pairs.iter().map(|pair| PairDefinition {
            from: pair.from + base,
            to: pair.to + base,
            tags: pair.tags.clone(),
        }));
        for child in &other.children {
            let mut child = child.clone();
            child.move_by(offset);
            self.children.push(child);
        }
    }

    /// Mean of all points of this structure (children excluded).
    pub fn centroid(&self) -> Option<Vec3> {
        if self.points.is_empty() {
            return None;
        }
        let sum: Vec3 = self.points.iter().copied().sum();
        Some(sum / self.points.len() as f32)
    }
}
