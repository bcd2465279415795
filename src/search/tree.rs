//! Arena-backed path tree: node id -> {segment, parent, children}

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::physics::Segment;
use crate::search::segment::StopReason;

/// Index into a [`PathTree`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a node's segment relates to its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum NodeKind {
    Root,
    /// Starts at the parent's last frame
    Continuation,
    /// Starts at `parent.frames[pivot]` with a jump issued
    Branch { pivot: usize, degenerate: bool },
}

impl NodeKind {
    pub fn is_branch(&self) -> bool {
        matches!(self, NodeKind::Branch { .. })
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, NodeKind::Branch { degenerate: true, .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
    pub stop: StopReason,
    pub segment: Segment,
}

/// Single-rooted, append-only tree of segments.
///
/// Nodes are never removed and segments never mutated, so ids stay valid for
/// the lifetime of the tree and children keep insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathTree {
    nodes: Vec<PathNode>,
}

impl PathTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the root; replaces nothing, so call once on an empty tree
    pub fn insert_root(&mut self, segment: Segment, stop: StopReason) -> NodeId {
        debug_assert!(self.nodes.is_empty(), "path tree already has a root");
        self.push(None, NodeKind::Root, segment, stop)
    }

    pub fn insert_child(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        segment: Segment,
        stop: StopReason,
    ) -> NodeId {
        let id = self.push(Some(parent), kind, segment, stop);
        self.nodes[parent.0].children.push(id);
        id
    }

    fn push(&mut self, parent: Option<NodeId>, kind: NodeKind, segment: Segment, stop: StopReason) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(PathNode {
            id,
            parent,
            children: Vec::new(),
            kind,
            stop,
            segment,
        });
        id
    }

    pub fn root(&self) -> Option<&PathNode> {
        self.nodes.first()
    }

    pub fn get(&self, id: NodeId) -> Option<&PathNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in insertion order (parents always precede children)
    pub fn iter(&self) -> impl Iterator<Item = &PathNode> {
        self.nodes.iter()
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &PathNode> {
        self.get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|child| self.get(*child))
    }

    /// Walk from `id`'s parent up to the root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = &PathNode> {
        let mut cursor = self.get(id).and_then(|node| node.parent);
        std::iter::from_fn(move || {
            let node = self.get(cursor?)?;
            cursor = node.parent;
            Some(node)
        })
    }

    /// Ids from the root down to `id` inclusive; empty for unknown ids
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        if self.get(id).is_none() {
            return Vec::new();
        }
        let mut path: Vec<NodeId> = self.ancestors(id).map(|node| node.id).collect();
        path.reverse();
        path.push(id);
        path
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|node| self.depth(node.id)).max().unwrap_or(0)
    }

    pub fn leaves(&self) -> impl Iterator<Item = &PathNode> {
        self.nodes.iter().filter(|node| node.children.is_empty())
    }

    pub fn branch_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.kind.is_branch()).count()
    }

    pub fn degenerate_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.kind.is_degenerate()).count()
    }

    /// Total frames across all segments
    pub fn frame_count(&self) -> usize {
        self.nodes.iter().map(|node| node.segment.len()).sum()
    }

    /// Breadth-first traversal from the root: every node once, parent first
    pub fn visit(&self, mut visitor: impl FnMut(&PathNode)) {
        let Some(root) = self.root() else {
            return;
        };
        let mut queue = VecDeque::from([root.id]);
        while let Some(id) = queue.pop_front() {
            let Some(node) = self.get(id) else {
                continue;
            };
            visitor(node);
            queue.extend(node.children.iter().copied());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::Frame;
    use bevy::prelude::*;

    fn segment(start: f32, len: usize) -> Segment {
        let frames = (0..len)
            .map(|i| Frame {
                time: start + i as f32 * 0.1,
                ..Frame::at_rest(Vec2::new(i as f32, 0.0))
            })
            .collect();
        Segment::new(frames).unwrap()
    }

    fn sample_tree() -> (PathTree, [NodeId; 4]) {
        let mut tree = PathTree::new();
        let root = tree.insert_root(segment(0.0, 5), StopReason::GroundedChanged);
        let cont = tree.insert_child(root, NodeKind::Continuation, segment(0.4, 3), StopReason::GroundedChanged);
        let branch = tree.insert_child(
            root,
            NodeKind::Branch {
                pivot: 2,
                degenerate: false,
            },
            segment(0.2, 4),
            StopReason::Landed,
        );
        let leaf = tree.insert_child(cont, NodeKind::Continuation, segment(0.6, 2), StopReason::GoalCrossed);
        (tree, [root, cont, branch, leaf])
    }

    #[test]
    fn test_structure_queries() {
        let (tree, [root, cont, branch, leaf]) = sample_tree();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.root().map(|n| n.id), Some(root));
        let children: Vec<_> = tree.children(root).map(|n| n.id).collect();
        assert_eq!(children, vec![cont, branch]);
        assert_eq!(tree.path_to(leaf), vec![root, cont, leaf]);
        assert_eq!(tree.depth(leaf), 2);
        assert_eq!(tree.max_depth(), 2);
        assert_eq!(tree.branch_count(), 1);
        assert_eq!(tree.frame_count(), 14);
        let leaves: Vec<_> = tree.leaves().map(|n| n.id).collect();
        assert_eq!(leaves, vec![branch, leaf]);
    }

    #[test]
    fn test_visit_is_parent_before_child() {
        let (tree, _) = sample_tree();
        let mut seen = Vec::new();
        tree.visit(|node| {
            if let Some(parent) = node.parent {
                assert!(seen.contains(&parent));
            }
            seen.push(node.id);
        });
        assert_eq!(seen.len(), tree.len());
    }

    #[test]
    fn test_unknown_ids_are_empty() {
        let (tree, _) = sample_tree();
        assert!(tree.get(NodeId(99)).is_none());
        assert!(tree.path_to(NodeId(99)).is_empty());
        assert_eq!(tree.children(NodeId(99)).count(), 0);
        PathTree::new().visit(|_| panic!("empty tree has no nodes"));
    }
}
