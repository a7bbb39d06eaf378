//! Ready-made structures and build specs for common tensegrity test articles.
//!
//! Every preset tags rods `"rod"` and cables `"muscle"` and returns the
//! structure together with a build spec binding those two tags.

use crate::build_spec::{BuildSpec, Builder};
use crate::config::{CableConfig, RodConfig};
use crate::error::Result;
use crate::structure::Structure;
use glam::Vec3;

/// Tag bound to the rod builder in every preset.
pub const ROD_TAG: &str = "rod";
/// Tag bound to the cable builder in every preset.
pub const MUSCLE_TAG: &str = "muscle";

fn spec(rod: RodConfig, muscle: CableConfig) -> Result<BuildSpec> {
    BuildSpec::new()
        .with_builder(ROD_TAG, Builder::rod(rod))?
        .with_builder(MUSCLE_TAG, Builder::cable(muscle))
}

/// Planar two-bar structure on the XZ plane: 4 nodes, 2 crossing rods, 4 edge cables.
///
/// Density 0.2, stiffness 1000, lifted 10 units so it starts above ground.
pub fn planar_two_bar() -> Result<(Structure, BuildSpec)> {
    const LENGTH: f32 = 40.0;
    const WIDTH: f32 = 20.0;

    let mut s = Structure::with_tags("planar");
    s.add_point(0.0, 0.0, 0.0);
    s.add_point(LENGTH, 0.0, 0.0);
    s.add_point(LENGTH, 0.0, WIDTH);
    s.add_point(0.0, 0.0, WIDTH);

    s.add_pair(0, 2, ROD_TAG)?;
    s.add_pair(1, 3, ROD_TAG)?;

    s.add_pair(0, 1, MUSCLE_TAG)?;
    s.add_pair(1, 2, MUSCLE_TAG)?;
    s.add_pair(2, 3, MUSCLE_TAG)?;
    s.add_pair(3, 0, MUSCLE_TAG)?;

    s.move_by(Vec3::new(0.0, 10.0, 0.0));

    let rod = RodConfig::new(0.31, 0.2)
        .with_friction(0.99)
        .with_roll_friction(0.01);
    let muscle = CableConfig::new(1000.0, 10.0, 0.0).with_limits(100_000.0, 10_000.0);
    Ok((s, spec(rod, muscle)?))
}

/// Three-strut triangular prism: 6 nodes, 3 rods, 9 cables.
pub fn prism() -> Result<(Structure, BuildSpec)> {
    const EDGE: f32 = 10.0;
    const WIDTH: f32 = 10.0;
    const HEIGHT: f32 = 20.0;

    let mut s = Structure::with_tags("prism");
    // Bottom triangle, then top triangle.
    for y in [0.0, HEIGHT] {
        s.add_point(-EDGE / 2.0, y, 0.0);
        s.add_point(EDGE / 2.0, y, 0.0);
        s.add_point(0.0, y, WIDTH);
    }

    s.add_pair(0, 4, "r1 rod")?;
    s.add_pair(1, 5, "r2 rod")?;
    s.add_pair(2, 3, "r3 rod")?;

    for (a, b) in [(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3), (0, 3), (1, 4), (2, 5)] {
        s.add_pair(a, b, MUSCLE_TAG)?;
    }

    let muscle = CableConfig::new(1000.0, 10.0, 500.0);
    Ok((s, spec(RodConfig::new(0.31, 0.2), muscle)?))
}

/// Six-bar icosahedral tensegrity (T6): 12 nodes, 6 rods, 24 cables.
///
/// Parameters match a 6 dm strut robot with cable anchors on the strut surface.
pub fn six_bar() -> Result<(Structure, BuildSpec)> {
    const ROD_LENGTH: f32 = 6.0;
    const ROD_SPACE: f32 = 1.5;
    let half = ROD_LENGTH / 2.0;

    let mut s = Structure::with_tags("six_bar");
    let nodes = [
        (-ROD_SPACE, -half, 0.0),
        (-ROD_SPACE, half, 0.0),
        (ROD_SPACE, -half, 0.0),
        (ROD_SPACE, half, 0.0),
        (0.0, -ROD_SPACE, -half),
        (0.0, -ROD_SPACE, half),
        (0.0, ROD_SPACE, -half),
        (0.0, ROD_SPACE, half),
        (-half, 0.0, ROD_SPACE),
        (half, 0.0, ROD_SPACE),
        (-half, 0.0, -ROD_SPACE),
        (half, 0.0, -ROD_SPACE),
    ];
    for (x, y, z) in nodes {
        s.add_point(x, y, z);
    }

    for (i, (a, b)) in [(0, 1), (2, 3), (4, 5), (6, 7), (8, 9), (10, 11)].into_iter().enumerate() {
        s.add_pair(a, b, format!("r{} rod", i + 1).as_str())?;
    }

    let muscles = [
        (0, 4), (0, 5), (0, 8), (0, 10),
        (1, 6), (1, 7), (1, 8), (1, 10),
        (2, 4), (2, 5), (2, 9), (2, 11),
        (3, 7), (3, 6), (3, 9), (3, 11),
        (4, 10), (4, 11),
        (5, 8), (5, 9),
        (6, 10), (6, 11),
        (7, 8), (7, 9),
    ];
    for (a, b) in muscles {
        s.add_pair(a, b, MUSCLE_TAG)?;
    }

    let rod = RodConfig::new(0.1, 2.855)
        .with_friction(0.99)
        .with_roll_friction(0.01);
    let muscle = CableConfig::new(206.19, 100.0, 206.19)
        .with_limits(100_000.0, 10_000.0)
        .with_anchors_on_edge(true, true);
    Ok((s, spec(rod, muscle)?))
}
