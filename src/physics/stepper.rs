//! Single-frame motion integration with sweep-and-project collision

use bevy::prelude::*;

use crate::constants::*;
use crate::helpers::{project_onto, surface_tangent};
use crate::physics::frame::{Frame, LedgeType, SimulationContext};
use crate::world::{CollisionProbe, Shape};

/// Advances an agent frame by one time step
pub struct MotionStepper<'w> {
    pub probe: &'w dyn CollisionProbe,
    pub shape: &'w dyn Shape,
    pub gravity: Vec2,
    pub max_fall_speed: f32,
    /// Sub-steps per frame, each re-probing (at least 1)
    pub micro_steps: u32,
    /// Separation kept from a surface after contact
    pub epsilon: f32,
}

impl<'w> MotionStepper<'w> {
    /// Integrate `ctx.desired_velocity` plus gravity over `ctx.delta`.
    ///
    /// The returned frame has its ledge left as `None`; classification is the
    /// ledge detector's job. Upward-facing contacts set `grounded` and update
    /// the context's forgiveness timer and ground normal.
    pub fn step(&self, frame: &Frame, ctx: &mut SimulationContext) -> Frame {
        let dt = ctx.delta;
        let mut velocity = ctx.desired_velocity + self.gravity * dt;
        velocity.y = velocity.y.max(-self.max_fall_speed);

        let mut position = frame.position;
        let mut grounded = false;
        let micro_steps = self.micro_steps.max(1);
        let sub_dt = dt / micro_steps as f32;

        for _ in 0..micro_steps {
            let mut remaining = sub_dt;
            for _ in 0..MAX_SLIDE_PASSES {
                let displacement = velocity * remaining;
                if displacement.length_squared() <= f32::EPSILON * f32::EPSILON {
                    break;
                }
                let Some(hit) = self.probe.sweep(position, self.shape, displacement) else {
                    // Free flight for the rest of this sub-step
                    position += displacement;
                    break;
                };

                position += displacement * hit.fraction + hit.normal * self.epsilon;
                velocity = project_onto(velocity, surface_tangent(hit.normal));
                remaining *= 1.0 - hit.fraction;

                if hit.normal.y > 0.0 {
                    grounded = true;
                    ctx.ground_normal = hit.normal;
                }
            }
        }

        ctx.time += dt;
        if grounded {
            ctx.last_grounded_time = ctx.time;
        }

        Frame {
            position,
            velocity,
            time: ctx.time,
            grounded,
            ledge: LedgeType::None,
        }
    }
}
