//! Static level geometry and the collision probe interface
//!
//! The search engine only talks to [`CollisionProbe`]. [`LevelGeometry`] is a
//! minimal edge-soup implementation so levels can be profiled standalone.

pub mod shape;

pub use shape::{Capsule, Shape, ShapeDef};

use bevy::prelude::*;

use crate::constants::*;
use crate::helpers::ray_segment_distance;

/// First blocking contact found by a shape sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    /// Contact point on the surface
    pub point: Vec2,
    /// Surface normal at the contact, pointing toward the agent
    pub normal: Vec2,
    /// Fraction of the displacement travelled before contact (0..=1)
    pub fraction: f32,
}

/// First surface found by a ray cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec2,
    pub normal: Vec2,
    pub distance: f32,
}

/// Read-only queries against level geometry
pub trait CollisionProbe: Sync {
    /// Sweep `shape` centered at `origin` along `displacement`
    fn sweep(&self, origin: Vec2, shape: &dyn Shape, displacement: Vec2) -> Option<SweepHit>;

    /// Cast a ray; `direction` need not be normalized
    fn cast_ray(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<RayHit>;

    /// Cast straight down
    fn cast_down(&self, origin: Vec2, max_distance: f32) -> Option<RayHit> {
        self.cast_ray(origin, Vec2::NEG_Y, max_distance)
    }
}

/// A solid line segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub a: Vec2,
    pub b: Vec2,
}

impl Edge {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_corners(self.a, self.b)
    }
}

/// Level collision made of edges
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelGeometry {
    pub edges: Vec<Edge>,
}

impl LevelGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, a: Vec2, b: Vec2) {
        self.edges.push(Edge::new(a, b));
    }

    /// Add a solid axis-aligned box as its four sides
    pub fn add_box(&mut self, center: Vec2, size: Vec2) {
        let half = size / 2.0;
        let min = center - half;
        let max = center + half;
        let corners = [
            Vec2::new(min.x, max.y),
            Vec2::new(max.x, max.y),
            Vec2::new(max.x, min.y),
            Vec2::new(min.x, min.y),
        ];
        for i in 0..corners.len() {
            self.add_edge(corners[i], corners[(i + 1) % corners.len()]);
        }
    }

    pub fn with_box(mut self, center: Vec2, size: Vec2) -> Self {
        self.add_box(center, size);
        self
    }

    pub fn with_edge(mut self, a: Vec2, b: Vec2) -> Self {
        self.add_edge(a, b);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    a.min.x <= b.max.x && b.min.x <= a.max.x && a.min.y <= b.max.y && b.min.y <= a.max.y
}

impl CollisionProbe for LevelGeometry {
    fn sweep(&self, origin: Vec2, shape: &dyn Shape, displacement: Vec2) -> Option<SweepHit> {
        let swept = shape
            .bounds(origin)
            .union(shape.bounds(origin + displacement))
            .inflate(BROADPHASE_MARGIN);

        let mut best: Option<(f32, Vec2, &Edge)> = None;
        for edge in &self.edges {
            if !rects_overlap(&swept, &edge.bounds()) {
                continue;
            }
            if let Some((fraction, normal)) = shape.sweep_edge(origin, displacement, edge.a, edge.b) {
                if best.is_none_or(|(f, _, _)| fraction < f) {
                    best = Some((fraction, normal, edge));
                }
            }
        }

        best.map(|(fraction, normal, edge)| {
            let center = origin + displacement * fraction;
            SweepHit {
                point: crate::helpers::closest_point_on_segment(center, edge.a, edge.b),
                normal,
                fraction,
            }
        })
    }

    fn cast_ray(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<RayHit> {
        let dir = direction.try_normalize()?;
        self.edges
            .iter()
            .filter_map(|edge| {
                ray_segment_distance(origin, dir, max_distance, edge.a, edge.b)
                    .map(|distance| (distance, edge))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(distance, edge)| {
                let mut normal = (edge.b - edge.a).perp().normalize_or_zero();
                if normal.dot(dir) > 0.0 {
                    normal = -normal;
                }
                RayHit {
                    point: origin + dir * distance,
                    normal,
                    distance,
                }
            })
    }
}
