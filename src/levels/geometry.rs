//! Turning level definitions into collision geometry

use bevy::prelude::*;

use crate::levels::database::{GeometryDef, LevelData};
use crate::world::LevelGeometry;

/// Add stairs rising to the right from `origin`.
///
/// Step `i` is a solid box from its own left edge to the end of the flight,
/// so every tread is backed by solid geometry down to `origin.y`.
pub fn add_stairs(geometry: &mut LevelGeometry, origin: Vec2, count: usize, step: Vec2) {
    if count == 0 {
        return;
    }
    let right = origin.x + step.x * count as f32;
    for i in 0..count {
        let left = origin.x + step.x * i as f32;
        let top = origin.y + step.y * (i + 1) as f32;
        let min = Vec2::new(left, origin.y);
        let max = Vec2::new(right, top);
        geometry.add_box((min + max) / 2.0, max - min);
    }
}

impl LevelData {
    /// Collision geometry for this level
    pub fn build_geometry(&self) -> LevelGeometry {
        let mut geometry = LevelGeometry::new();
        for def in &self.geometry {
            match *def {
                GeometryDef::Box { center, size } => geometry.add_box(center, size),
                GeometryDef::Edge { a, b } => geometry.add_edge(a, b),
                GeometryDef::Stairs { origin, count, step } => add_stairs(&mut geometry, origin, count, step),
            }
        }
        geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::LevelDatabase;
    use crate::world::CollisionProbe;

    #[test]
    fn test_stairs_treads_at_each_height() {
        let mut geometry = LevelGeometry::new();
        add_stairs(&mut geometry, Vec2::ZERO, 3, Vec2::new(1.5, 0.4));
        assert_eq!(geometry.edges.len(), 12);
        for (i, x) in [0.75f32, 2.25, 3.75].into_iter().enumerate() {
            let hit = geometry.cast_down(Vec2::new(x, 5.0), 10.0).unwrap();
            assert!((hit.point.y - 0.4 * (i + 1) as f32).abs() < 1e-5);
        }
    }

    #[test]
    fn test_default_levels_have_ground_under_start() {
        for level in &LevelDatabase::default_levels().levels {
            let geometry = level.build_geometry();
            assert!(!geometry.is_empty(), "{}", level.name);
            let hit = geometry.cast_down(level.start, 5.0);
            assert!(hit.is_some(), "{} has no ground under the start", level.name);
        }
    }
}
