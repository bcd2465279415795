//! Frontier-driven tree search

use std::collections::VecDeque;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::GROUND_CHECK_DISTANCE;
use crate::error::ProfilerError;
use crate::physics::{Frame, GoalAim, MovementRule};
use crate::search::branch::{BranchReport, BranchSearch};
use crate::search::params::SearchParams;
use crate::search::segment::{SegmentSimulator, StopReason, no_extra_jump, top_level_stop};
use crate::search::tree::{NodeId, NodeKind, PathTree};
use crate::tuning::MovementTuning;
use crate::world::CollisionProbe;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    #[default]
    Idle,
    Running,
    /// A segment crossed the goal
    Solved,
    /// Frontier emptied (or node cap hit) without a goal crossing
    Exhausted,
}

impl SearchStatus {
    pub fn name(&self) -> &'static str {
        match self {
            SearchStatus::Idle => "idle",
            SearchStatus::Running => "running",
            SearchStatus::Solved => "solved",
            SearchStatus::Exhausted => "exhausted",
        }
    }
}

/// Pending continuation point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontierEntry {
    /// Node whose tail this is; `None` for the search root
    pub owner: Option<NodeId>,
    pub frame: Frame,
}

/// Everything one search produced
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub status: SearchStatus,
    pub tree: PathTree,
    /// Node whose segment crossed the goal
    pub solution: Option<NodeId>,
    pub branches: Vec<BranchReport>,
    /// Node cap reached before the frontier emptied
    pub truncated: bool,
    /// Frontier entries dropped for starting past the time budget
    pub skipped: usize,
    pub start: Vec2,
    pub goal: Vec2,
}

impl SearchResult {
    pub fn solved(&self) -> bool {
        self.status == SearchStatus::Solved
    }

    /// Root-to-solution node ids, empty when unsolved
    pub fn solution_path(&self) -> Vec<NodeId> {
        self.solution
            .map(|id| self.tree.path_to(id))
            .unwrap_or_default()
    }

    /// Time of the frame that crossed the goal
    pub fn solution_time(&self) -> Option<f32> {
        self.solution
            .and_then(|id| self.tree.get(id))
            .map(|node| node.segment.last().time)
    }
}

/// Owns one search run: tree, frontier and status
pub struct TreeSearchDriver<'a> {
    sim: SegmentSimulator<'a>,
    goal: Vec2,
    status: SearchStatus,
    frontier: VecDeque<FrontierEntry>,
    tree: PathTree,
    solution: Option<NodeId>,
    branches: Vec<BranchReport>,
    truncated: bool,
    skipped: usize,
}

impl<'a> TreeSearchDriver<'a> {
    pub fn new(sim: SegmentSimulator<'a>, goal: Vec2) -> Self {
        Self {
            sim,
            goal,
            status: SearchStatus::Idle,
            frontier: VecDeque::new(),
            tree: PathTree::new(),
            solution: None,
            branches: Vec::new(),
            truncated: false,
            skipped: 0,
        }
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    pub fn tree(&self) -> &PathTree {
        &self.tree
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    /// Seed the frontier with the root frame and start running
    pub fn start(&mut self, start: Vec2) {
        let frame = self.sim.root_frame(start);
        self.frontier.push_back(FrontierEntry { owner: None, frame });
        self.status = SearchStatus::Running;
    }

    fn at_capacity(&self) -> bool {
        self.tree.len() >= self.sim.params.max_nodes
    }

    /// Process one frontier entry. Returns the status afterwards.
    pub fn step(&mut self) -> Result<SearchStatus, ProfilerError> {
        if self.status != SearchStatus::Running {
            return Ok(self.status);
        }
        let Some(entry) = self.frontier.pop_front() else {
            self.status = SearchStatus::Exhausted;
            return Ok(self.status);
        };
        if entry.frame.time >= self.sim.params.max_simulation_time {
            self.skipped += 1;
            return Ok(self.status);
        }
        if self.at_capacity() {
            self.truncate();
            return Ok(self.status);
        }

        let mut stop = top_level_stop(self.goal.x, self.sim.params.grounded_hysteresis);
        let run = self.sim.simulate(
            entry.frame,
            self.sim.context_for(&entry.frame),
            &mut stop,
            &no_extra_jump,
        )?;
        let tail = *run.tail();
        let id = match entry.owner {
            None => self.tree.insert_root(run.segment, run.stop),
            Some(parent) => self.tree.insert_child(parent, NodeKind::Continuation, run.segment, run.stop),
        };
        debug!(
            "node {} ({} frames) stopped: {} at ({:.2}, {:.2}) t={:.3}",
            id,
            self.tree.get(id).map_or(0, |node| node.segment.len()),
            run.stop.name(),
            tail.position.x,
            tail.position.y,
            tail.time
        );

        if run.stop == StopReason::GoalCrossed {
            self.solution = Some(id);
            self.status = SearchStatus::Solved;
            return Ok(self.status);
        }

        self.frontier.push_back(FrontierEntry {
            owner: Some(id),
            frame: tail,
        });

        self.graft_branches(id)?;
        Ok(self.status)
    }

    /// Refine rising ledges in `child` against its parent, then graft
    fn graft_branches(&mut self, child: NodeId) -> Result<(), ProfilerError> {
        let plans = BranchSearch { sim: &self.sim }.plan(&self.tree, child)?;
        for plan in plans {
            if self.at_capacity() {
                self.truncate();
                return Ok(());
            }
            let kind = plan.kind();
            let tail = *plan.run.tail();
            let mut report = plan.report;
            let id = self
                .tree
                .insert_child(report.parent, kind, plan.run.segment, plan.run.stop);
            report.node = Some(id);
            info!(
                "branch {} grafted on node {} at frame {} after {} iterations ({})",
                id,
                report.parent,
                report.pivot,
                report.iterations,
                report.stop.name()
            );
            self.branches.push(report);

            if self.sim.params.explore_branches {
                self.frontier.push_back(FrontierEntry {
                    owner: Some(id),
                    frame: tail,
                });
            }
        }
        Ok(())
    }

    fn truncate(&mut self) {
        if !self.truncated {
            warn!(
                "node cap of {} reached with {} frontier entries left",
                self.sim.params.max_nodes,
                self.frontier.len()
            );
        }
        self.truncated = true;
        self.frontier.clear();
        self.status = SearchStatus::Exhausted;
    }

    /// Step until solved or exhausted
    pub fn run(&mut self) -> Result<SearchStatus, ProfilerError> {
        while self.step()? == SearchStatus::Running {}
        Ok(self.status)
    }

    pub fn finish(self, start: Vec2) -> SearchResult {
        SearchResult {
            status: self.status,
            tree: self.tree,
            solution: self.solution,
            branches: self.branches,
            truncated: self.truncated,
            skipped: self.skipped,
            start,
            goal: self.goal,
        }
    }
}

/// Search with the default goal-aiming movement rule
pub fn find_paths(
    probe: &dyn CollisionProbe,
    start: Vec2,
    goal: Vec2,
    params: &SearchParams,
    tuning: &MovementTuning,
) -> Result<SearchResult, ProfilerError> {
    let half_height = tuning.shape.build()?.half_height();
    let aim = GoalAim::new(goal, params.input_mode, params.snap_threshold)
        .with_vertical_slack(half_height + GROUND_CHECK_DISTANCE);
    find_paths_with(probe, &aim, start, goal, params, tuning)
}

/// Search with a caller-supplied movement rule.
///
/// Parameters and shape are validated before anything is simulated.
pub fn find_paths_with(
    probe: &dyn CollisionProbe,
    rule: &dyn MovementRule,
    start: Vec2,
    goal: Vec2,
    params: &SearchParams,
    tuning: &MovementTuning,
) -> Result<SearchResult, ProfilerError> {
    params.validate()?;
    tuning.validate()?;
    let shape = tuning.shape.build()?;
    if !start.is_finite() || !goal.is_finite() {
        return Err(ProfilerError::invalid("start/goal", "must be finite"));
    }

    let sim = SegmentSimulator {
        probe,
        shape: shape.as_ref(),
        rule,
        params,
        tuning,
    };
    let mut driver = TreeSearchDriver::new(sim, goal);
    driver.start(start);
    let status = driver.run()?;
    let result = driver.finish(start);
    info!(
        "search {} with {} nodes ({} branches, {} frames)",
        status.name(),
        result.tree.len(),
        result.branches.len(),
        result.tree.frame_count()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{InputMode, LedgeType, Segment};
    use crate::world::{Capsule, LevelGeometry, ShapeDef};
    use proptest::prelude::*;

    fn flat_floor() -> LevelGeometry {
        LevelGeometry::new().with_box(Vec2::new(0.0, -1.0), Vec2::new(200.0, 2.0))
    }

    /// Upper floor ends at x=0 (top y=0); lower floor continues at y=-3
    fn step_down() -> LevelGeometry {
        LevelGeometry::new()
            .with_box(Vec2::new(-10.0, -1.5), Vec2::new(20.0, 3.0))
            .with_box(Vec2::new(15.0, -4.0), Vec2::new(30.0, 2.0))
    }

    #[test]
    fn test_flat_run_is_a_single_node() {
        let params = SearchParams {
            input_mode: InputMode::EightWay,
            snap_threshold: 0.05,
            ..Default::default()
        };
        let result = find_paths(
            &flat_floor(),
            Vec2::new(-5.0, 1.0),
            Vec2::new(5.0, 1.0),
            &params,
            &MovementTuning::default(),
        )
        .unwrap();
        assert_eq!(result.status, SearchStatus::Solved);
        assert_eq!(result.tree.len(), 1);
        assert!(result.branches.is_empty());
        let tail = result.tree.root().unwrap().segment.last();
        assert!(tail.position.x >= 5.0);
        assert!(tail.time < 5.0);
        assert_eq!(result.solution_path(), vec![NodeId(0)]);
    }

    #[test]
    fn test_flat_run_to_goal_on_the_floor() {
        let params = SearchParams {
            input_mode: InputMode::EightWay,
            snap_threshold: 0.05,
            ..Default::default()
        };
        let result = find_paths(
            &flat_floor(),
            Vec2::new(-5.0, 1.0),
            Vec2::new(5.0, 0.0),
            &params,
            &MovementTuning::default(),
        )
        .unwrap();
        assert_eq!(result.status, SearchStatus::Solved);
        assert_eq!(result.tree.len(), 1);
        let tail = result.tree.root().unwrap().segment.last();
        assert!(tail.position.x >= 5.0);
        assert!(tail.time < 5.0);
    }

    #[test]
    fn test_first_frame_pivot_is_grafted_as_degenerate() {
        let floor = flat_floor();
        let capsule = Capsule::new(0.5, 2.0).unwrap();
        let params = SearchParams::default();
        let tuning = MovementTuning::default();
        let aim = GoalAim::new(Vec2::new(20.0, 1.0), params.input_mode, params.snap_threshold);
        let sim = SegmentSimulator {
            probe: &floor,
            shape: &capsule,
            rule: &aim,
            params: &params,
            tuning: &tuning,
        };
        let dt = params.time_step;
        let standing = |x: f32, i: usize| Frame {
            time: i as f32 * dt,
            grounded: true,
            ..Frame::at_rest(Vec2::new(x, 1.0))
        };

        // The child reports a rising ledge behind the parent's start, so the
        // closest parent frame to its landing target is frame 0
        let parent = Segment::new(vec![standing(0.0, 0), standing(0.5, 1), standing(1.0, 2), standing(1.5, 3)]).unwrap();
        let behind = Frame {
            ledge: LedgeType::Rising,
            ..standing(-4.0, 4)
        };
        let child = Segment::new(vec![*parent.last(), behind]).unwrap();

        let mut tree = PathTree::new();
        let root = tree.insert_root(parent, StopReason::GroundedChanged);
        let child = tree.insert_child(root, NodeKind::Continuation, child, StopReason::GroundedChanged);

        let mut driver = TreeSearchDriver::new(sim, Vec2::new(20.0, 1.0));
        driver.tree = tree;
        driver.graft_branches(child).unwrap();

        assert_eq!(driver.branches.len(), 1);
        let report = &driver.branches[0];
        assert_eq!(report.parent, root);
        assert_eq!(report.seed, 0);
        assert!(report.degenerate);

        let branch = driver.tree.get(report.node.unwrap()).unwrap();
        assert!(matches!(branch.kind, NodeKind::Branch { degenerate: true, .. }));
        assert!(branch.kind.is_degenerate());
        assert_eq!(driver.tree.degenerate_count(), 1);
        assert_eq!(branch.segment.first(), &driver.tree.get(root).unwrap().segment.frames()[report.pivot]);
    }

    #[test]
    fn test_step_down_grafts_inner_branch() {
        let params = SearchParams {
            jump_on_ledge: true,
            ..Default::default()
        };
        let result = find_paths(
            &step_down(),
            Vec2::new(-5.0, 1.0),
            Vec2::new(12.0, -2.0),
            &params,
            &MovementTuning::default(),
        )
        .unwrap();
        assert!(result.tree.len() >= 2);
        assert!(!result.branches.is_empty());
        for report in &result.branches {
            let parent = result.tree.get(report.parent).unwrap();
            let last = parent.segment.len() - 1;
            assert!(report.pivot > 0 && report.pivot < last, "pivot {} of {}", report.pivot, last);
            assert!(!report.degenerate);

            let branch = result.tree.get(report.node.unwrap()).unwrap();
            assert_eq!(branch.segment.first(), &parent.segment.frames()[report.pivot]);
        }
        assert!(result.solved());
    }

    #[test]
    fn test_searches_are_deterministic() {
        let params = SearchParams::default();
        let run = || {
            find_paths(
                &step_down(),
                Vec2::new(-5.0, 1.0),
                Vec2::new(12.0, -2.0),
                &params,
                &MovementTuning::default(),
            )
            .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_continuations_start_at_parent_tail() {
        let result = find_paths(
            &step_down(),
            Vec2::new(-5.0, 1.0),
            Vec2::new(12.0, -2.0),
            &SearchParams::default(),
            &MovementTuning::default(),
        )
        .unwrap();
        for node in result.tree.iter() {
            if node.kind == NodeKind::Continuation {
                let parent = result.tree.get(node.parent.unwrap()).unwrap();
                assert_eq!(node.segment.first(), parent.segment.last());
            }
        }
    }

    #[test]
    fn test_invalid_configuration_fails_before_simulating() {
        let floor = flat_floor();
        let bad_step = SearchParams {
            time_step: 0.0,
            ..Default::default()
        };
        let err = find_paths(&floor, Vec2::ZERO, Vec2::X, &bad_step, &MovementTuning::default());
        assert!(matches!(err, Err(ProfilerError::InvalidTimeStep(_))));

        let boxed = MovementTuning {
            shape: ShapeDef::Box {
                width: 1.0,
                height: 2.0,
            },
            ..Default::default()
        };
        let err = find_paths(&floor, Vec2::ZERO, Vec2::X, &SearchParams::default(), &boxed);
        assert!(matches!(err, Err(ProfilerError::UnsupportedShape(_))));
    }

    #[test]
    fn test_unreachable_goal_exhausts() {
        // Nothing to stand on and the goal sits straight below the start
        let params = SearchParams {
            max_simulation_time: 2.0,
            ..Default::default()
        };
        let result = find_paths(
            &LevelGeometry::new(),
            Vec2::ZERO,
            Vec2::new(0.0, -50.0),
            &params,
            &MovementTuning::default(),
        )
        .unwrap();
        assert_eq!(result.status, SearchStatus::Exhausted);
        assert!(result.solution.is_none());
        assert!(result.solution_time().is_none());
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn test_node_cap_truncates() {
        let params = SearchParams {
            max_nodes: 1,
            ..Default::default()
        };
        let result = find_paths(
            &step_down(),
            Vec2::new(-5.0, 1.0),
            Vec2::new(12.0, -2.0),
            &params,
            &MovementTuning::default(),
        )
        .unwrap();
        assert_eq!(result.tree.len(), 1);
        assert!(result.truncated);
        assert_eq!(result.status, SearchStatus::Exhausted);
    }

    #[test]
    fn test_custom_rule_closure() {
        let stand_still = |_: Vec2| Vec2::ZERO;
        let params = SearchParams {
            max_simulation_time: 1.0,
            ..Default::default()
        };
        let result = find_paths_with(
            &flat_floor(),
            &stand_still,
            Vec2::new(0.0, 1.0),
            Vec2::new(5.0, 1.0),
            &params,
            &MovementTuning::default(),
        )
        .unwrap();
        assert_eq!(result.status, SearchStatus::Exhausted);
        assert_eq!(result.tree.len(), 1);
        let tail = result.tree.root().unwrap().segment.last();
        assert!(tail.position.x.abs() < 1e-3);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_search_terminates_within_budget(
            start_x in -15.0f32..-1.0,
            goal_x in 1.0f32..25.0,
            mode in prop_oneof![
                Just(InputMode::Direct),
                Just(InputMode::EightWay),
                Just(InputMode::XOnly),
            ],
        ) {
            let params = SearchParams {
                max_simulation_time: 4.0,
                max_nodes: 32,
                input_mode: mode,
                ..Default::default()
            };
            let result = find_paths(
                &step_down(),
                Vec2::new(start_x, 1.0),
                Vec2::new(goal_x, -2.0),
                &params,
                &MovementTuning::default(),
            ).unwrap();
            prop_assert!(result.status == SearchStatus::Solved || result.status == SearchStatus::Exhausted);
            prop_assert!(result.tree.len() <= params.max_nodes);
            for node in result.tree.iter() {
                for pair in node.segment.frames().windows(2) {
                    prop_assert!(pair[1].time > pair[0].time);
                }
            }
        }
    }
}
