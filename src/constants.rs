//! Tunable constants for the profiler
//!
//! Default movement and search values live here for easy tweaking.
//! Units are world units (meters) and seconds.

use bevy::prelude::*;

// =============================================================================
// AGENT SHAPE
// =============================================================================

pub const AGENT_RADIUS: f32 = 0.5;
pub const AGENT_HEIGHT: f32 = 2.0; // Total capsule height, caps included

// =============================================================================
// MOVEMENT
// =============================================================================

pub const GRAVITY: Vec2 = Vec2::new(0.0, -9.8);
pub const MOVE_SPEED: f32 = 4.0;
pub const GROUND_ACCEL: f32 = 30.0; // Snappy start on the ground
pub const AIR_ACCEL: f32 = 15.0; // Committed but adjustable jumps
pub const JUMP_VELOCITY: f32 = 6.0;
pub const MAX_FALL_SPEED: f32 = 20.0; // Clamp to keep sweeps short
pub const COYOTE_TIME: f32 = 0.1; // Seconds after leaving ground you can still jump
pub const JUMP_INPUT_THRESHOLD: f32 = 0.5; // Upward axis input above this requests a jump

// =============================================================================
// SEARCH
// =============================================================================

pub const TIME_STEP: f32 = 1.0 / 60.0;
pub const MAX_SIMULATION_TIME: f32 = 10.0;
pub const MAX_BRANCH_TIME: f32 = 3.0;
pub const LEDGE_PROBE_DISTANCE: f32 = 5.0;
pub const LEDGE_THRESHOLD: f32 = 0.1;
pub const MICRO_STEPS: u32 = 4;
pub const GROUND_EPSILON: f32 = 0.001; // Backpedal along the contact normal after a hit
pub const MAX_SLOPE_ANGLE: f32 = 50.0; // Degrees
pub const SNAP_THRESHOLD: f32 = 0.05;
pub const MAX_NODES: usize = 256;
pub const GROUNDED_HYSTERESIS: f32 = 0.05; // Seconds a grounded change must hold before a segment ends

// =============================================================================
// PROBING
// =============================================================================

pub const LEDGE_PROBE_MISS: f32 = 1.0e6; // Distance reported when a ledge ray hits nothing
pub const GROUND_CHECK_DISTANCE: f32 = 0.05; // Extra reach when classifying the start frame
pub const MAX_SLIDE_PASSES: u32 = 3; // Sweep/project passes per micro-step
pub const BROADPHASE_MARGIN: f32 = 0.01;

// =============================================================================
// FILES
// =============================================================================

pub const LEVELS_FILE: &str = "config/levels.txt";
