//! Movement rules: axis input shaping and input-to-velocity
//!
//! A movement rule is a pure function from position to axis input in
//! `[-1, 1]²`. [`GoalAim`] provides the four default policies that steer at a
//! fixed goal.

use std::f32::consts::FRAC_PI_4;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::helpers::move_toward;
use crate::physics::frame::{Frame, SimulationContext};
use crate::tuning::MovementTuning;

/// How axis input is derived from the direction to the goal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Normalized direction, small components dropped
    Direct,
    /// Direction snapped to the nearest of eight compass angles
    #[default]
    EightWay,
    /// Horizontal sign only
    XOnly,
    /// Vertical sign only
    YOnly,
}

impl InputMode {
    pub fn name(&self) -> &'static str {
        match self {
            InputMode::Direct => "direct",
            InputMode::EightWay => "eight_way",
            InputMode::XOnly => "x_only",
            InputMode::YOnly => "y_only",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "direct" => Some(InputMode::Direct),
            "eight_way" | "8way" | "8_way" => Some(InputMode::EightWay),
            "x_only" | "x" => Some(InputMode::XOnly),
            "y_only" | "y" => Some(InputMode::YOnly),
            _ => None,
        }
    }
}

/// Pure `(position) -> axis input` callback
pub trait MovementRule: Sync {
    fn axis_input(&self, position: Vec2) -> Vec2;
}

impl<F> MovementRule for F
where
    F: Fn(Vec2) -> Vec2 + Sync,
{
    fn axis_input(&self, position: Vec2) -> Vec2 {
        self(position).clamp(Vec2::NEG_ONE, Vec2::ONE)
    }
}

/// Steer toward a fixed goal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalAim {
    pub goal: Vec2,
    pub mode: InputMode,
    /// Deadzone: components (or distances) at or below this become zero
    pub snap_threshold: f32,
    /// A goal at most this far below the agent's center counts as level
    /// with it, so goals placed at floor height are walked to
    pub vertical_slack: f32,
}

impl GoalAim {
    pub fn new(goal: Vec2, mode: InputMode, snap_threshold: f32) -> Self {
        Self {
            goal,
            mode,
            snap_threshold,
            vertical_slack: 0.0,
        }
    }

    pub fn with_vertical_slack(mut self, slack: f32) -> Self {
        self.vertical_slack = slack;
        self
    }

    fn offset_to_goal(&self, position: Vec2) -> Vec2 {
        let mut to_goal = self.goal - position;
        if to_goal.y < 0.0 && -to_goal.y <= self.vertical_slack {
            to_goal.y = 0.0;
        }
        to_goal
    }

    fn deadzone(&self, value: f32) -> f32 {
        if value.abs() <= self.snap_threshold {
            0.0
        } else {
            value
        }
    }

    fn sign_or_zero(&self, delta: f32) -> f32 {
        if delta.abs() <= self.snap_threshold {
            0.0
        } else {
            delta.signum()
        }
    }
}

impl MovementRule for GoalAim {
    fn axis_input(&self, position: Vec2) -> Vec2 {
        let to_goal = self.offset_to_goal(position);
        match self.mode {
            InputMode::Direct | InputMode::EightWay if to_goal.length() <= self.snap_threshold => {
                Vec2::ZERO
            }
            InputMode::Direct => {
                let dir = to_goal.normalize_or_zero();
                Vec2::new(self.deadzone(dir.x), self.deadzone(dir.y))
            }
            InputMode::EightWay => {
                let angle = to_goal.y.atan2(to_goal.x);
                let snapped = (angle / FRAC_PI_4).round() * FRAC_PI_4;
                let dir = Vec2::from_angle(snapped);
                Vec2::new(self.deadzone(dir.x), self.deadzone(dir.y))
            }
            InputMode::XOnly => Vec2::new(self.sign_or_zero(to_goal.x), 0.0),
            InputMode::YOnly => Vec2::new(0.0, self.sign_or_zero(to_goal.y)),
        }
    }
}

/// Turn axis input into the pre-collision velocity for the next step.
///
/// Horizontal speed accelerates toward `input.x * move_speed`. A requested
/// jump fires when grounded or inside the forgiveness window and spends it.
/// Returns whether a jump was issued.
pub fn apply_input(
    tuning: &MovementTuning,
    frame: &Frame,
    input: Vec2,
    wants_jump: bool,
    ctx: &mut SimulationContext,
) -> bool {
    let target_speed = input.x * tuning.move_speed;
    let rate = if frame.grounded {
        tuning.ground_accel
    } else {
        tuning.air_accel
    };

    let mut velocity = frame.velocity;
    velocity.x = move_toward(velocity.x, target_speed, rate * ctx.delta);

    let can_jump = frame.grounded || ctx.within_forgiveness(tuning.coyote_time);
    let jumped = wants_jump && can_jump;
    if jumped {
        velocity.y = tuning.jump_velocity;
        ctx.consume_forgiveness();
    }

    ctx.input = input;
    ctx.desired_velocity = velocity;
    jumped
}

/// Upward input counts as pressing jump
pub fn input_requests_jump(input: Vec2) -> bool {
    input.y > JUMP_INPUT_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grounded_frame() -> Frame {
        Frame {
            grounded: true,
            ..Frame::at_rest(Vec2::ZERO)
        }
    }

    #[test]
    fn test_eight_way_snaps_shallow_angle_to_horizontal() {
        let aim = GoalAim::new(Vec2::new(5.0, 0.0), InputMode::EightWay, 0.05);
        assert_eq!(aim.axis_input(Vec2::new(-5.0, 1.0)), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_floor_level_goal_is_walked_to() {
        // Goal on the floor, agent center one half height above it
        let plain = GoalAim::new(Vec2::new(5.0, 0.0), InputMode::EightWay, 0.05);
        assert_eq!(plain.axis_input(Vec2::new(4.8, 1.0)).x, 0.0);

        let aim = plain.with_vertical_slack(1.05);
        assert_eq!(aim.axis_input(Vec2::new(4.8, 1.001)), Vec2::new(1.0, 0.0));
        let back = aim.axis_input(Vec2::new(5.2, 1.0));
        assert!(back.x < -0.99);
        assert_eq!(back.y, 0.0);
        // Deeper drops and goals above are still aimed at
        assert!(aim.axis_input(Vec2::new(4.8, 3.0)).y < 0.0);
        assert!(aim.axis_input(Vec2::new(4.8, -1.0)).y > 0.0);
    }

    #[test]
    fn test_eight_way_diagonal() {
        let aim = GoalAim::new(Vec2::new(3.0, 3.2), InputMode::EightWay, 0.05);
        let input = aim.axis_input(Vec2::ZERO);
        assert!((input.x - input.y).abs() < 1e-6);
        assert!((input.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_direct_drops_small_components() {
        let aim = GoalAim::new(Vec2::new(100.0, 1.0), InputMode::Direct, 0.05);
        let input = aim.axis_input(Vec2::ZERO);
        assert_eq!(input.y, 0.0);
        assert!(input.x > 0.99);
    }

    #[test]
    fn test_axis_only_modes() {
        let x_only = GoalAim::new(Vec2::new(-4.0, 9.0), InputMode::XOnly, 0.05);
        assert_eq!(x_only.axis_input(Vec2::ZERO), Vec2::new(-1.0, 0.0));
        let y_only = GoalAim::new(Vec2::new(-4.0, 9.0), InputMode::YOnly, 0.05);
        assert_eq!(y_only.axis_input(Vec2::ZERO), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_at_goal_inside_deadzone() {
        let aim = GoalAim::new(Vec2::new(0.01, 0.0), InputMode::XOnly, 0.05);
        assert_eq!(aim.axis_input(Vec2::ZERO), Vec2::ZERO);
    }

    #[test]
    fn test_closure_rule_is_clamped() {
        let rule = |_: Vec2| Vec2::new(3.0, -2.0);
        assert_eq!(rule.axis_input(Vec2::ZERO), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_apply_input_accelerates_and_jumps() {
        let tuning = MovementTuning::default();
        let frame = grounded_frame();
        let mut ctx = SimulationContext::seeded(&frame, 0.1);
        let jumped = apply_input(&tuning, &frame, Vec2::X, true, &mut ctx);
        assert!(jumped);
        assert_eq!(ctx.desired_velocity.x, tuning.ground_accel * 0.1);
        assert_eq!(ctx.desired_velocity.y, tuning.jump_velocity);
        // Forgiveness is spent; an airborne frame cannot jump again
        let airborne = Frame::at_rest(Vec2::ZERO);
        assert!(!apply_input(&tuning, &airborne, Vec2::X, true, &mut ctx));
    }
}
