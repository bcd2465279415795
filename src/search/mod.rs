//! Branching path search over simulated segments
//!
//! The driver pops frontier entries in FIFO order, simulates a segment from
//! each, records it in the [`PathTree`] and asks [`BranchSearch`] whether a
//! better-timed jump from the parent segment reproduces an observed landing.

pub mod branch;
pub mod driver;
pub mod params;
pub mod segment;
pub mod tree;

pub use branch::{Bisection, BranchPlan, BranchReport, BranchSearch, LandingSide, bisect, rising_ledges};
pub use driver::{FrontierEntry, SearchResult, SearchStatus, TreeSearchDriver, find_paths, find_paths_with};
pub use params::SearchParams;
pub use segment::{SegmentRun, SegmentSimulator, StopReason, branch_stop, top_level_stop};
pub use tree::{NodeId, NodeKind, PathNode, PathTree};
