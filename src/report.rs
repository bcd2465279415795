//! Console summaries and JSON export of a search result

use serde::{Deserialize, Serialize};

use crate::error::ProfilerError;
use crate::physics::{Frame, LedgeType};
use crate::search::{BranchReport, NodeId, NodeKind, SearchParams, SearchResult, SearchStatus, StopReason};
use crate::tuning::MovementTuning;

/// Headline numbers for one profiled level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub level_name: String,
    pub status: SearchStatus,
    pub nodes: usize,
    pub branches: usize,
    pub degenerate: usize,
    pub max_depth: usize,
    pub frames: usize,
    pub truncated: bool,
    pub solution_path: Vec<NodeId>,
    pub solution_time: Option<f32>,
}

impl ProfileSummary {
    pub fn new(level_name: &str, result: &SearchResult) -> Self {
        Self {
            level_name: level_name.to_string(),
            status: result.status,
            nodes: result.tree.len(),
            branches: result.tree.branch_count(),
            degenerate: result.tree.degenerate_count(),
            max_depth: result.tree.max_depth(),
            frames: result.tree.frame_count(),
            truncated: result.truncated,
            solution_path: result.solution_path(),
            solution_time: result.solution_time(),
        }
    }

    pub fn solved(&self) -> bool {
        self.status == SearchStatus::Solved
    }

    /// Format result for console output
    pub fn format(&self) -> String {
        let header = format!(
            "PROFILE: {} ({} nodes, {} branches, depth {}, {} frames)",
            self.level_name, self.nodes, self.branches, self.max_depth, self.frames
        );

        let mut lines = vec![header];
        if self.solved() {
            let path: Vec<String> = self.solution_path.iter().map(|id| id.to_string()).collect();
            lines.push(format!(
                "  SOLVED: goal crossed at t={:.2}s via {}",
                self.solution_time.unwrap_or_default(),
                path.join(" -> ")
            ));
        } else {
            lines.push(format!("  EXHAUSTED: no path reached the goal ({})", self.status.name()));
        }
        if self.degenerate > 0 {
            lines.push(format!(
                "  WARNING: {} degenerate branch(es) pivoted on their parent's first frame",
                self.degenerate
            ));
        }
        if self.truncated {
            lines.push("  WARNING: node cap reached, tree truncated".to_string());
        }
        lines.join("\n")
    }
}

/// Frame as stored in the export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    pub time: f32,
    pub grounded: bool,
    pub ledge: LedgeType,
}

impl From<&Frame> for FrameRecord {
    fn from(frame: &Frame) -> Self {
        Self {
            position: frame.position.to_array(),
            velocity: frame.velocity.to_array(),
            time: frame.time,
            grounded: frame.grounded,
            ledge: frame.ledge,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    #[serde(flatten)]
    pub kind: NodeKind,
    pub stop: StopReason,
    pub frames: Vec<FrameRecord>,
}

/// Whole-run export for visualization tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileExport {
    pub run_id: String,
    pub created_at: String,
    pub level_name: String,
    pub start: [f32; 2],
    pub goal: [f32; 2],
    pub params: SearchParams,
    pub tuning: MovementTuning,
    pub summary: ProfileSummary,
    pub branches: Vec<BranchReport>,
    /// Parent-before-child order
    pub nodes: Vec<NodeRecord>,
}

impl ProfileExport {
    pub fn new(
        level_name: &str,
        result: &SearchResult,
        params: &SearchParams,
        tuning: &MovementTuning,
    ) -> Self {
        let mut nodes = Vec::with_capacity(result.tree.len());
        result.tree.visit(|node| {
            nodes.push(NodeRecord {
                id: node.id,
                parent: node.parent,
                children: node.children.clone(),
                kind: node.kind,
                stop: node.stop,
                frames: node.segment.frames().iter().map(FrameRecord::from).collect(),
            });
        });

        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            level_name: level_name.to_string(),
            start: result.start.to_array(),
            goal: result.goal.to_array(),
            params: params.clone(),
            tuning: tuning.clone(),
            summary: ProfileSummary::new(level_name, result),
            branches: result.branches.clone(),
            nodes,
        }
    }

    pub fn to_json(&self) -> Result<String, ProfilerError> {
        serde_json::to_string_pretty(self).map_err(|source| ProfilerError::Json {
            path: format!("export of {}", self.level_name),
            source,
        })
    }

    pub fn write_to(&self, path: &str) -> Result<(), ProfilerError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| ProfilerError::Io {
            path: path.to_string(),
            source,
        })
    }
}
