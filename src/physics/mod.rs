//! Deterministic trajectory physics: frames, stepping, ledges, movement rules

pub mod frame;
pub mod ledge;
pub mod movement;
pub mod stepper;

pub use frame::{Frame, LedgeType, Segment, SimulationContext};
pub use ledge::LedgeDetector;
pub use movement::{GoalAim, InputMode, MovementRule, apply_input, input_requests_jump};
pub use stepper::MotionStepper;
