//! Ledge detection by comparing ground clearance now and one step ahead

use crate::constants::*;
use crate::physics::frame::{Frame, LedgeType};
use crate::world::CollisionProbe;

/// Heuristic rising/falling terrain classifier.
///
/// Near slopes right at the threshold it can flip either way; callers treat
/// its output as a hint.
pub struct LedgeDetector<'w> {
    pub probe: &'w dyn CollisionProbe,
    pub probe_distance: f32,
    pub threshold: f32,
    pub half_height: f32,
    pub delta: f32,
}

impl<'w> LedgeDetector<'w> {
    fn clearance(&self, origin: bevy::math::Vec2) -> f32 {
        self.probe
            .cast_down(origin, self.probe_distance + self.half_height)
            .map(|hit| hit.distance)
            .unwrap_or(LEDGE_PROBE_MISS)
    }

    pub fn detect(&self, frame: &Frame) -> LedgeType {
        let here = self.clearance(frame.position);
        let there = self.clearance(frame.position + frame.velocity * self.delta);
        let dy = here - there;
        if dy.abs() <= self.threshold {
            LedgeType::None
        } else if dy > 0.0 {
            LedgeType::Rising
        } else {
            LedgeType::Falling
        }
    }
}
