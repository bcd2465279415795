//! Segment simulation: step + classify + append until a stop condition fires

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ProfilerError;
use crate::helpers::crossed_x;
use crate::physics::{
    Frame, LedgeDetector, LedgeType, MotionStepper, MovementRule, Segment, SimulationContext,
    apply_input, input_requests_jump,
};
use crate::search::params::SearchParams;
use crate::tuning::MovementTuning;
use crate::world::{CollisionProbe, Shape};

/// Why a segment stopped growing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Took off or touched down
    GroundedChanged,
    /// Passed the goal's x coordinate; solves the search
    GoalCrossed,
    /// Branch re-simulation touched down
    Landed,
    /// Branch re-simulation ran past its own time bound
    BranchTimeout,
    /// Branch re-simulation dropped below its target while descending
    FallingAway,
    /// Hit the global simulated time bound
    TimeBudget,
}

impl StopReason {
    pub fn name(&self) -> &'static str {
        match self {
            StopReason::GroundedChanged => "grounded changed",
            StopReason::GoalCrossed => "goal crossed",
            StopReason::Landed => "landed",
            StopReason::BranchTimeout => "branch timeout",
            StopReason::FallingAway => "falling away",
            StopReason::TimeBudget => "time budget",
        }
    }
}

/// Output of one [`SegmentSimulator::simulate`] call
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRun {
    pub segment: Segment,
    pub stop: StopReason,
    /// Context after the last step
    pub context: SimulationContext,
    pub jumps: u32,
}

impl SegmentRun {
    pub fn tail(&self) -> &Frame {
        self.segment.last()
    }
}

/// Forward simulator shared by the driver and branch search
pub struct SegmentSimulator<'a> {
    pub probe: &'a dyn CollisionProbe,
    pub shape: &'a dyn Shape,
    pub rule: &'a dyn MovementRule,
    pub params: &'a SearchParams,
    pub tuning: &'a MovementTuning,
}

impl<'a> SegmentSimulator<'a> {
    pub fn stepper(&self) -> MotionStepper<'a> {
        MotionStepper {
            probe: self.probe,
            shape: self.shape,
            gravity: self.tuning.gravity(),
            max_fall_speed: self.tuning.max_fall_speed,
            micro_steps: self.params.micro_steps,
            epsilon: self.params.ground_epsilon,
        }
    }

    pub fn ledge_detector(&self) -> LedgeDetector<'a> {
        LedgeDetector {
            probe: self.probe,
            probe_distance: self.params.ledge_probe_distance,
            threshold: self.params.ledge_threshold,
            half_height: self.shape.half_height(),
            delta: self.params.time_step,
        }
    }

    /// Initial query frame: zero velocity at time zero, grounded when a
    /// surface sits right under the shape, ledge classified in place.
    pub fn root_frame(&self, start: Vec2) -> Frame {
        let mut frame = Frame::at_rest(start);
        frame.grounded = self
            .probe
            .cast_down(start, self.shape.half_height() + GROUND_CHECK_DISTANCE)
            .is_some();
        frame.ledge = self.ledge_detector().detect(&frame);
        frame
    }

    /// Fresh context for a segment starting at `frame`
    pub fn context_for(&self, frame: &Frame) -> SimulationContext {
        SimulationContext::seeded(frame, self.params.time_step)
    }

    fn wants_jump(
        &self,
        frame: &Frame,
        input: Vec2,
        ctx: &SimulationContext,
        extra: &dyn Fn(&Frame, &SimulationContext) -> bool,
    ) -> bool {
        input_requests_jump(input)
            || (self.params.jump_on_ledge && frame.ledge != LedgeType::None)
            || (self.params.jump_on_steep_slope
                && ctx.on_steep_slope(frame.grounded, self.params.max_slope_angle))
            || extra(frame, ctx)
    }

    /// Simulate from `start` until `stop(previous, current)` returns a reason
    /// or the frame time reaches `max_simulation_time`.
    ///
    /// `start` becomes the segment's first frame. `extra_jump` is consulted
    /// every step alongside the input, ledge and slope triggers.
    pub fn simulate(
        &self,
        start: Frame,
        mut ctx: SimulationContext,
        stop: &mut dyn FnMut(&Frame, &Frame) -> Option<StopReason>,
        extra_jump: &dyn Fn(&Frame, &SimulationContext) -> bool,
    ) -> Result<SegmentRun, ProfilerError> {
        let stepper = self.stepper();
        let detector = self.ledge_detector();
        let max_steps = self.params.max_steps();

        let mut frames = vec![start];
        let mut current = start;
        let mut jumps = 0;
        let mut reason = StopReason::TimeBudget;

        for _ in 0..max_steps {
            if current.time >= self.params.max_simulation_time {
                break;
            }

            let input = self.rule.axis_input(current.position);
            let wants_jump = self.wants_jump(&current, input, &ctx, extra_jump);
            if apply_input(self.tuning, &current, input, wants_jump, &mut ctx) {
                jumps += 1;
            }

            let mut next = stepper.step(&current, &mut ctx);
            next.ledge = detector.detect(&next);
            frames.push(next);

            let previous = current;
            current = next;
            if let Some(fired) = stop(&previous, &current) {
                reason = fired;
                break;
            }
        }

        trace!(
            "segment from t={:.3} stopped ({}) after {} frames",
            start.time,
            reason.name(),
            frames.len()
        );

        Ok(SegmentRun {
            segment: Segment::new(frames)?,
            stop: reason,
            context: ctx,
            jumps,
        })
    }
}

/// Stop predicate for top-level segments: goal crossing first, then a
/// grounded transition that has held for `hysteresis` seconds.
///
/// Contact that flickers for less than the window (stair lips, seams between
/// boxes) stays inside the current segment.
pub fn top_level_stop(goal_x: f32, hysteresis: f32) -> impl FnMut(&Frame, &Frame) -> Option<StopReason> {
    let mut settled: Option<bool> = None;
    let mut changed_at: Option<f32> = None;
    move |previous, current| {
        if crossed_x(previous.position.x, current.position.x, goal_x) {
            return Some(StopReason::GoalCrossed);
        }
        let grounded = *settled.get_or_insert(previous.grounded);
        if current.grounded == grounded {
            changed_at = None;
            return None;
        }
        let since = *changed_at.get_or_insert(previous.time);
        (current.time - since >= hysteresis).then_some(StopReason::GroundedChanged)
    }
}

/// Stop predicate for branch re-simulation toward `target`
pub fn branch_stop(
    start_time: f32,
    max_branch_time: f32,
    target: Vec2,
) -> impl FnMut(&Frame, &Frame) -> Option<StopReason> {
    move |previous, current| {
        if !previous.grounded && current.grounded {
            Some(StopReason::Landed)
        } else if current.time - start_time >= max_branch_time {
            Some(StopReason::BranchTimeout)
        } else if current.velocity.y < 0.0 && current.position.y < target.y {
            Some(StopReason::FallingAway)
        } else {
            None
        }
    }
}

/// Never adds a jump trigger
pub fn no_extra_jump(_: &Frame, _: &SimulationContext) -> bool {
    false
}

/// Always asks for a jump; the ground/forgiveness gate still applies
pub fn forced_jump(_: &Frame, _: &SimulationContext) -> bool {
    true
}
