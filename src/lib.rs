//! Platforming Profiler - design-time trajectory analysis for a 2D platformer
//!
//! Given a start and a goal, the profiler forward-simulates the character
//! under its own movement rules, forks at detected ledges, and bisects for
//! the frame a jump has to be issued on to make an observed landing. The
//! result is a tree of candidate paths for level and ability designers.

// Core modules
pub mod constants;
pub mod error;
pub mod helpers;
pub mod physics;
pub mod search;
pub mod tuning;
pub mod world;

// Tooling
pub mod config;
pub mod levels;
pub mod profile;
pub mod report;
pub mod sweep;
pub mod testing;

pub use config::ProfilerConfig;
pub use constants::*;
pub use error::ProfilerError;
pub use levels::{GeometryDef, LevelData, LevelDatabase};
pub use physics::{Frame, GoalAim, InputMode, LedgeDetector, LedgeType, MotionStepper, MovementRule, Segment, SimulationContext};
pub use report::{ProfileExport, ProfileSummary};
pub use search::{
    BranchReport, BranchSearch, NodeId, NodeKind, PathNode, PathTree, SearchParams, SearchResult, SearchStatus,
    SegmentSimulator, StopReason, TreeSearchDriver, find_paths, find_paths_with,
};
pub use sweep::{SweepConfig, SweepResult, run_sweep};
pub use tuning::MovementTuning;
pub use world::{Capsule, CollisionProbe, LevelGeometry, RayHit, Shape, ShapeDef, SweepHit};
