//! Jump-timing refinement by bisection over a parent segment

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ProfilerError;
use crate::physics::{Frame, LedgeType, Segment};
use crate::search::segment::{SegmentRun, SegmentSimulator, StopReason, branch_stop, forced_jump};
use crate::search::tree::{NodeId, NodeKind, PathTree};

/// Where a trial jump came down relative to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandingSide {
    /// Still short of the target along the direction of travel
    Undershoot,
    Overshoot,
}

/// Result of [`bisect`]: the final interval and what the last probe returned
#[derive(Debug, Clone, PartialEq)]
pub struct Bisection<T> {
    /// Index probed last
    pub pivot: usize,
    pub lower: usize,
    pub upper: usize,
    /// Midpoint narrowing steps (the seed probe is not counted)
    pub iterations: u32,
    /// Total probes, seed included
    pub simulations: u32,
    pub side: LandingSide,
    pub outcome: T,
}

/// Bisect over `[0, last_index]` starting from `seed`.
///
/// Undershoot moves the lower bound up to the pivot, overshoot moves the
/// upper bound down; the bounds never cross, so the loop ends with
/// `upper - lower == 1` after at most `ceil(log2(last_index))` midpoint
/// probes. A single-frame range is probed once at index 0.
pub fn bisect<T, E>(
    last_index: usize,
    seed: usize,
    mut probe: impl FnMut(usize) -> Result<(LandingSide, T), E>,
) -> Result<Bisection<T>, E> {
    let mut lower = 0;
    let mut upper = last_index;
    let mut pivot = seed.min(last_index);
    let (mut side, mut outcome) = probe(pivot)?;
    let mut iterations = 0;
    let mut simulations = 1;

    if last_index > 0 {
        loop {
            match side {
                LandingSide::Undershoot => lower = pivot.min(upper - 1),
                LandingSide::Overshoot => upper = pivot.max(lower + 1),
            }
            if upper - lower <= 1 {
                break;
            }
            pivot = (lower + upper) / 2;
            iterations += 1;
            (side, outcome) = probe(pivot)?;
            simulations += 1;
        }
    }

    Ok(Bisection {
        pivot,
        lower,
        upper,
        iterations,
        simulations,
        side,
        outcome,
    })
}

/// What one refinement found, reported alongside the grafted node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchReport {
    /// Node the branch was grafted onto
    pub parent: NodeId,
    /// Node whose segment showed the rising ledge
    pub source: NodeId,
    pub ledge_index: usize,
    pub target: [f32; 2],
    pub seed: usize,
    pub pivot: usize,
    pub iterations: u32,
    pub simulations: u32,
    pub side: LandingSide,
    pub stop: StopReason,
    pub landing: [f32; 2],
    /// Pivot (seed or final) is the parent's first frame; no earlier ancestor
    /// was searched
    pub degenerate: bool,
    /// Set once the branch is in the tree
    pub node: Option<NodeId>,
}

/// A refined branch waiting to be grafted
#[derive(Debug, Clone, PartialEq)]
pub struct BranchPlan {
    pub report: BranchReport,
    pub run: SegmentRun,
}

impl BranchPlan {
    pub fn kind(&self) -> NodeKind {
        NodeKind::Branch {
            pivot: self.report.pivot,
            degenerate: self.report.degenerate,
        }
    }
}

/// Index of the first frame of each contiguous run of rising frames.
///
/// Index 0 is the inherited branch point and is skipped.
pub fn rising_ledges(segment: &Segment) -> Vec<usize> {
    let frames = segment.frames();
    (1..frames.len())
        .filter(|&i| frames[i].ledge == LedgeType::Rising && frames[i - 1].ledge != LedgeType::Rising)
        .collect()
}

pub struct BranchSearch<'s, 'a> {
    pub sim: &'s SegmentSimulator<'a>,
}

impl<'s, 'a> BranchSearch<'s, 'a> {
    /// Ground under the ledge frame, lifted so it is where the agent's
    /// center would rest after landing
    pub fn landing_target(&self, ledge: &Frame) -> Option<Vec2> {
        let half_height = self.sim.shape.half_height();
        self.sim
            .probe
            .cast_down(ledge.position, self.sim.params.ledge_probe_distance + half_height)
            .map(|hit| hit.point + Vec2::Y * half_height)
    }

    /// Re-simulate a forced jump from `parent[pivot]`
    pub fn trial(&self, parent: &Segment, pivot: usize, target: Vec2) -> Result<SegmentRun, ProfilerError> {
        let start = parent.frames()[pivot];
        let mut stop = branch_stop(start.time, self.sim.params.max_branch_time, target);
        self.sim
            .simulate(start, self.sim.context_for(&start), &mut stop, &forced_jump)
    }

    /// Bisect `parent` for the jump frame whose landing meets `target`
    pub fn refine(
        &self,
        parent: &Segment,
        target: Vec2,
    ) -> Result<(usize, Bisection<SegmentRun>), ProfilerError> {
        let seed = parent.closest_index(target);
        let direction = if target.x < parent.first().position.x {
            -1.0
        } else {
            1.0
        };
        let bisection = bisect(parent.len() - 1, seed, |pivot| {
            let run = self.trial(parent, pivot, target)?;
            let side = if (run.tail().position.x - target.x) * direction < 0.0 {
                LandingSide::Undershoot
            } else {
                LandingSide::Overshoot
            };
            Ok::<_, ProfilerError>((side, run))
        })?;
        Ok((seed, bisection))
    }

    /// Mine `child`'s segment for rising ledges and refine each against the
    /// child's parent. Pivots already branched from (in the tree or earlier in
    /// this plan) are skipped.
    pub fn plan(&self, tree: &PathTree, child: NodeId) -> Result<Vec<BranchPlan>, ProfilerError> {
        let Some(node) = tree.get(child) else {
            return Ok(Vec::new());
        };
        let Some(parent) = node.parent.and_then(|id| tree.get(id)) else {
            return Ok(Vec::new());
        };

        let mut taken: Vec<usize> = tree
            .children(parent.id)
            .filter_map(|sibling| match sibling.kind {
                NodeKind::Branch { pivot, .. } => Some(pivot),
                _ => None,
            })
            .collect();

        let mut plans = Vec::new();
        for ledge_index in rising_ledges(&node.segment) {
            let ledge = &node.segment.frames()[ledge_index];
            let Some(target) = self.landing_target(ledge) else {
                debug!("ledge at frame {} of node {} has no ground below", ledge_index, child);
                continue;
            };

            let (seed, bisection) = self.refine(&parent.segment, target)?;
            if taken.contains(&bisection.pivot) {
                continue;
            }
            taken.push(bisection.pivot);

            let degenerate = seed == 0 || bisection.pivot == 0;
            if degenerate {
                warn!(
                    "degenerate branch on node {}: pivot reached the first frame (seed {}, final {})",
                    parent.id, seed, bisection.pivot
                );
            }

            let run = bisection.outcome;
            plans.push(BranchPlan {
                report: BranchReport {
                    parent: parent.id,
                    source: child,
                    ledge_index,
                    target: target.to_array(),
                    seed,
                    pivot: bisection.pivot,
                    iterations: bisection.iterations,
                    simulations: bisection.simulations,
                    side: bisection.side,
                    stop: run.stop,
                    landing: run.tail().position.to_array(),
                    degenerate,
                    node: None,
                },
                run,
            });
        }
        Ok(plans)
    }
}
