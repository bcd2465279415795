//! Agent shapes the collision probe can sweep
//!
//! Shapes come in through configuration as a [`ShapeDef`] and are validated
//! into a concrete [`Shape`] before any simulation starts.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ProfilerError;
use crate::helpers::{closest_points_between_segments, sweep_point_vs_rounded_segment};

/// Capability interface for a sweepable agent shape
pub trait Shape: Send + Sync {
    /// Distance from the shape's center to its lowest point
    fn half_height(&self) -> f32;

    /// Axis-aligned bounds of the shape centered at `center`
    fn bounds(&self, center: Vec2) -> Rect;

    /// Earliest contact when moving from `origin` by `displacement` against
    /// the edge `a..b`: `(fraction, normal)` with the normal pointing from the
    /// edge toward the shape.
    fn sweep_edge(&self, origin: Vec2, displacement: Vec2, a: Vec2, b: Vec2) -> Option<(f32, Vec2)>;
}

/// Serializable shape description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeDef {
    /// Vertical capsule; `height` includes both caps
    Capsule { radius: f32, height: f32 },
    Box { width: f32, height: f32 },
    Polygon { points: Vec<[f32; 2]> },
}

impl Default for ShapeDef {
    fn default() -> Self {
        ShapeDef::Capsule {
            radius: AGENT_RADIUS,
            height: AGENT_HEIGHT,
        }
    }
}

impl ShapeDef {
    /// Validate and build the sweepable shape
    pub fn build(&self) -> Result<Box<dyn Shape>, ProfilerError> {
        match self {
            ShapeDef::Capsule { radius, height } => Ok(Box::new(Capsule::new(*radius, *height)?)),
            ShapeDef::Box { .. } => Err(ProfilerError::UnsupportedShape("box".to_string())),
            ShapeDef::Polygon { .. } => Err(ProfilerError::UnsupportedShape("polygon".to_string())),
        }
    }
}

/// Vertical capsule: a core segment inflated by `radius`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capsule {
    pub radius: f32,
    /// Half length of the core segment (0 for a circle)
    pub core_half: f32,
}

impl Capsule {
    pub fn new(radius: f32, height: f32) -> Result<Self, ProfilerError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(ProfilerError::invalid("shape.radius", format!("must be positive, got {radius}")));
        }
        if !(height.is_finite() && height >= radius * 2.0) {
            return Err(ProfilerError::invalid(
                "shape.height",
                format!("must be at least twice the radius ({}), got {height}", radius * 2.0),
            ));
        }
        Ok(Self {
            radius,
            core_half: height / 2.0 - radius,
        })
    }

    fn core(&self, center: Vec2) -> (Vec2, Vec2) {
        let offset = Vec2::new(0.0, self.core_half);
        (center - offset, center + offset)
    }
}

impl Shape for Capsule {
    fn half_height(&self) -> f32 {
        self.core_half + self.radius
    }

    fn bounds(&self, center: Vec2) -> Rect {
        let half = Vec2::new(self.radius, self.half_height());
        Rect::from_center_half_size(center, half)
    }

    fn sweep_edge(&self, origin: Vec2, displacement: Vec2, a: Vec2, b: Vec2) -> Option<(f32, Vec2)> {
        let (bottom, top) = self.core(origin);

        // Core endpoints against the rounded edge, edge endpoints against the
        // rounded core (moving the other way). Segment distance is always
        // realised at one of these four endpoint pairs.
        let fraction = [
            sweep_point_vs_rounded_segment(bottom, displacement, a, b, self.radius),
            sweep_point_vs_rounded_segment(top, displacement, a, b, self.radius),
            sweep_point_vs_rounded_segment(a, -displacement, bottom, top, self.radius),
            sweep_point_vs_rounded_segment(b, -displacement, bottom, top, self.radius),
        ]
        .into_iter()
        .flatten()
        .min_by(f32::total_cmp)?;

        let (moved_bottom, moved_top) = self.core(origin + displacement * fraction);
        let (on_core, on_edge) = closest_points_between_segments(moved_bottom, moved_top, a, b);
        let normal = (on_core - on_edge)
            .try_normalize()
            .or_else(|| (-displacement).try_normalize())
            .unwrap_or(Vec2::Y);
        Some((fraction, normal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capsule_is_default_shape() {
        let shape = ShapeDef::default().build().unwrap();
        assert_eq!(shape.half_height(), AGENT_HEIGHT / 2.0);
    }

    #[test]
    fn test_box_shape_is_rejected() {
        let def = ShapeDef::Box {
            width: 1.0,
            height: 2.0,
        };
        assert!(matches!(def.build(), Err(ProfilerError::UnsupportedShape(_))));
    }

    #[test]
    fn test_capsule_rejects_short_height() {
        assert!(Capsule::new(0.5, 0.5).is_err());
        assert!(Capsule::new(0.0, 2.0).is_err());
    }

    #[test]
    fn test_capsule_lands_on_floor() {
        let capsule = Capsule::new(0.5, 2.0).unwrap();
        // Feet at y=1, floor at y=0, dropping 2
        let (fraction, normal) = capsule
            .sweep_edge(
                Vec2::new(0.0, 2.0),
                Vec2::new(0.0, -2.0),
                Vec2::new(-5.0, 0.0),
                Vec2::new(5.0, 0.0),
            )
            .unwrap();
        assert!((fraction - 0.5).abs() < 1e-5);
        assert!((normal - Vec2::Y).length() < 1e-5);
    }

    #[test]
    fn test_capsule_side_hits_wall() {
        let capsule = Capsule::new(0.5, 2.0).unwrap();
        let (fraction, normal) = capsule
            .sweep_edge(
                Vec2::new(0.0, 1.0),
                Vec2::new(2.0, 0.0),
                Vec2::new(1.5, -5.0),
                Vec2::new(1.5, 5.0),
            )
            .unwrap();
        assert!((fraction - 0.5).abs() < 1e-5);
        assert!((normal - Vec2::NEG_X).length() < 1e-5);
    }

    #[test]
    fn test_capsule_corner_touches_core_side() {
        let capsule = Capsule::new(0.5, 3.0).unwrap();
        // A short ledge tip sitting between the caps
        let hit = capsule.sweep_edge(
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(3.0, 0.0),
        );
        let (fraction, _) = hit.unwrap();
        assert!((fraction - 0.25).abs() < 1e-5);
    }
}
