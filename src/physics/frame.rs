//! Frames, segments and the per-segment simulation context

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ProfilerError;

/// Heuristic terrain classification one step ahead
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgeType {
    #[default]
    None,
    /// Ground gets closer ahead (step up, or about to land)
    Rising,
    /// Ground recedes ahead (drop-off)
    Falling,
}

/// One simulated instant of agent state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub position: Vec2,
    pub velocity: Vec2,
    pub time: f32,
    pub grounded: bool,
    pub ledge: LedgeType,
}

impl Frame {
    /// Agent standing still at `position` at time zero
    pub fn at_rest(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            time: 0.0,
            grounded: false,
            ledge: LedgeType::None,
        }
    }
}

/// Non-empty, strictly time-ordered run of frames owned by one tree node
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    frames: Vec<Frame>,
}

impl Segment {
    pub fn new(frames: Vec<Frame>) -> Result<Self, ProfilerError> {
        if frames.is_empty() {
            return Err(ProfilerError::EmptySegment);
        }
        for (index, pair) in frames.windows(2).enumerate() {
            if pair[1].time <= pair[0].time {
                return Err(ProfilerError::NonMonotonicSegment {
                    index: index + 1,
                    previous: pair[0].time,
                    current: pair[1].time,
                });
            }
        }
        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// The inherited branch point
    pub fn first(&self) -> &Frame {
        &self.frames[0]
    }

    pub fn last(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn duration(&self) -> f32 {
        self.last().time - self.first().time
    }

    /// Index of the frame whose position is closest to `target`
    pub fn closest_index(&self, target: Vec2) -> usize {
        self.frames
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.position
                    .distance_squared(target)
                    .total_cmp(&b.position.distance_squared(target))
            })
            .map(|(i, _)| i)
            .unwrap_or(0)
    }
}

/// Mutable state threaded through one segment simulation.
///
/// Each segment owns its own copy seeded from its start frame, so branches
/// never alias each other's timers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationContext {
    /// Stable time cursor (time of the last produced frame)
    pub time: f32,
    pub delta: f32,
    /// Axis input chosen by the movement rule for the current step
    pub input: Vec2,
    /// Pre-collision velocity computed from the input, before gravity
    pub desired_velocity: Vec2,
    /// Time of the last upward-facing contact (ground forgiveness)
    pub last_grounded_time: f32,
    /// Normal of the last upward-facing contact
    pub ground_normal: Vec2,
}

impl SimulationContext {
    pub fn seeded(frame: &Frame, delta: f32) -> Self {
        Self {
            time: frame.time,
            delta,
            input: Vec2::ZERO,
            desired_velocity: frame.velocity,
            last_grounded_time: if frame.grounded {
                frame.time
            } else {
                f32::NEG_INFINITY
            },
            ground_normal: Vec2::Y,
        }
    }

    /// Grounded now or within `window` seconds of the last contact
    pub fn within_forgiveness(&self, window: f32) -> bool {
        self.time - self.last_grounded_time <= window
    }

    /// Spend the forgiveness window (after a jump)
    pub fn consume_forgiveness(&mut self) {
        self.last_grounded_time = f32::NEG_INFINITY;
    }

    /// Standing on a surface steeper than `max_slope_degrees`
    pub fn on_steep_slope(&self, grounded: bool, max_slope_degrees: f32) -> bool {
        grounded && self.ground_normal.y < max_slope_degrees.to_radians().cos()
    }
}
