//! Layout engine: turns a decision tree into positioned boxes and links.
//!
//! Every leaf takes one vertical slot; parents sit halfway between the extreme
//! centers of their children, and depth maps to a fixed column.

use crate::constants;
use crate::types::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Geometry constants driving a layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConstants {
    /// Width of a node box
    pub node_width: f32,
    /// Height of a node box
    pub node_height: f32,
    /// Distance between two depth columns
    pub x_gap: f32,
    /// Gap between two leaf slots
    pub y_gap: f32,
    /// Padding around the graph
    pub padding: f32,
    /// Room kept right of the deepest column
    pub right_margin: f32,
    /// Smallest canvas width returned
    pub min_width: f32,
    /// Smallest canvas height returned (before padding)
    pub min_height: f32,
}

impl Default for LayoutConstants {
    fn default() -> Self {
        Self {
            node_width: constants::NODE_WIDTH,
            node_height: constants::NODE_HEIGHT,
            x_gap: constants::X_GAP,
            y_gap: constants::Y_GAP,
            padding: constants::LAYOUT_PADDING,
            right_margin: constants::LAYOUT_RIGHT_MARGIN,
            min_width: constants::MIN_CANVAS_WIDTH,
            min_height: constants::MIN_CANVAS_HEIGHT,
        }
    }
}

impl LayoutConstants {
    /// Height of one leaf slot.
    pub fn slot_height(&self) -> f32 {
        self.node_height + self.y_gap
    }

    /// X coordinate of the first column.
    pub fn left_offset(&self) -> f32 {
        self.padding * 2.0
    }
}

/// Kind of box drawn for a positioned node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Terminal outcome
    Leaf,
    /// Split or container
    Node,
}

/// A node box placed on the virtual canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedNode {
    /// Identifier, unique within one layout pass only
    pub id: NodeId,
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Column index
    pub depth: usize,
    /// Text drawn inside the box
    pub label: String,
    /// Box style
    pub kind: NodeKind,
}

/// A link between two positioned nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedLink {
    /// Source node
    pub from: NodeId,
    /// Target node
    pub to: NodeId,
    /// Branch value or sub-tree name
    pub label: String,
    /// Matching cases of the branch
    pub target_count: Option<u64>,
    /// Cases reaching the branch
    pub total: Option<u64>,
    /// Share of matching cases (0-100)
    pub percentage: Option<f64>,
}

/// Output of a layout pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutGraph {
    /// Positioned boxes
    pub nodes: Vec<PositionedNode>,
    /// Links between boxes
    pub links: Vec<PositionedLink>,
    /// Canvas width
    pub width: f32,
    /// Canvas height
    pub height: f32,
    /// Constants used for this pass
    pub constants: LayoutConstants,
}

impl LayoutGraph {
    /// Looks up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Right-center of the source box and left-center of the target box.
    pub fn link_endpoints(&self, link: &PositionedLink) -> Option<((f32, f32), (f32, f32))> {
        let from = self.node(link.from)?;
        let to = self.node(link.to)?;
        let half = self.constants.node_height / 2.0;
        Some((
            (from.x + self.constants.node_width, from.y + half),
            (to.x, to.y + half),
        ))
    }
}

/// Number of leaf slots a subtree occupies; always at least 1.
pub fn subtree_weight(node: &TreeNode) -> usize {
    let weight = match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Decision { branches, .. } => branches
            .values()
            .map(|branch| match branch.child() {
                BranchChild::Subtree(subtree) => subtree_weight(subtree),
                BranchChild::Terminal(_) => 1,
            })
            .sum(),
        TreeNode::MultiNode { nodes } => nodes.values().map(subtree_weight).sum(),
    };
    weight.max(1)
}

/// Lays out a tree as positioned nodes and links.
///
/// Node ids differ between calls; positions, labels, kinds and the link set do not.
pub fn layout(root: &TreeNode, constants: &LayoutConstants) -> LayoutGraph {
    let mut placer = Placer {
        constants,
        cursor_y: constants.padding,
        nodes: Vec::new(),
        links: Vec::new(),
    };
    placer.place(Placeable::Tree(root), 0);

    let max_depth = placer.nodes.iter().map(|n| n.depth).max().unwrap_or(0);
    let width = (constants.left_offset()
        + (max_depth as f32 + 1.0) * constants.x_gap
        + constants.node_width
        + constants.right_margin)
        .max(constants.min_width);
    let height = (subtree_weight(root) as f32 * constants.slot_height()).max(constants.min_height)
        + constants.padding * 2.0;

    log::debug!(
        "laid out {} nodes and {} links on a {}x{} canvas",
        placer.nodes.len(),
        placer.links.len(),
        width,
        height
    );

    LayoutGraph {
        nodes: placer.nodes,
        links: placer.links,
        width,
        height,
        constants: *constants,
    }
}

enum Placeable<'a> {
    Tree(&'a TreeNode),
    Terminal(TerminalBranch),
}

struct Placer<'a> {
    constants: &'a LayoutConstants,
    cursor_y: f32,
    nodes: Vec<PositionedNode>,
    links: Vec<PositionedLink>,
}

impl Placer<'_> {
    /// Places a node and its descendants, returning its vertical center and id.
    fn place(&mut self, item: Placeable<'_>, depth: usize) -> (f32, NodeId) {
        let id = Uuid::new_v4();
        let (center_y, label, kind) = match item {
            Placeable::Terminal(terminal) => (self.next_slot(), terminal.label(), NodeKind::Leaf),
            Placeable::Tree(node) if node.is_leaf() => (self.next_slot(), node.label(), NodeKind::Leaf),
            Placeable::Tree(node) if !node.has_children() => {
                (self.next_slot(), node.label(), NodeKind::Node)
            }
            Placeable::Tree(node) => {
                let centers = self.place_children(node, id, depth);
                let min = centers.iter().copied().fold(f32::INFINITY, f32::min);
                let max = centers.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                ((min + max) / 2.0, node.label(), NodeKind::Node)
            }
        };

        self.nodes.push(PositionedNode {
            id,
            x: self.constants.left_offset() + depth as f32 * self.constants.x_gap,
            y: center_y - self.constants.node_height / 2.0,
            depth,
            label,
            kind,
        });
        (center_y, id)
    }

    fn place_children(&mut self, node: &TreeNode, id: NodeId, depth: usize) -> Vec<f32> {
        let mut centers = Vec::new();
        match node {
            TreeNode::Decision { branches, .. } => {
                for (value, branch) in branches {
                    let child = match branch.child() {
                        BranchChild::Subtree(subtree) => Placeable::Tree(subtree),
                        BranchChild::Terminal(terminal) => Placeable::Terminal(terminal),
                    };
                    let (center, child_id) = self.place(child, depth + 1);
                    centers.push(center);
                    self.links.push(PositionedLink {
                        from: id,
                        to: child_id,
                        label: value.clone(),
                        target_count: Some(branch.count),
                        total: Some(branch.total_or_count()),
                        percentage: Some(branch.percentage),
                    });
                }
            }
            TreeNode::MultiNode { nodes } => {
                for (name, child) in nodes {
                    let (center, child_id) = self.place(Placeable::Tree(child), depth + 1);
                    centers.push(center);
                    self.links.push(PositionedLink {
                        from: id,
                        to: child_id,
                        label: name.clone(),
                        target_count: None,
                        total: None,
                        percentage: None,
                    });
                }
            }
            TreeNode::Leaf { .. } => {}
        }
        centers
    }

    fn next_slot(&mut self) -> f32 {
        let center = self.cursor_y + self.constants.node_height / 2.0;
        self.cursor_y += self.constants.slot_height();
        center
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> TreeNode {
        serde_json::from_value(value).unwrap()
    }

    fn age_tree() -> TreeNode {
        tree(json!({
            "type": "node",
            "variable": "Age",
            "branches": {
                "<30": {"count": 10, "percentage": 25.0, "total": 40},
                ">=30": {"count": 30, "percentage": 75.0, "total": 40}
            }
        }))
    }

    fn geometry(graph: &LayoutGraph) -> Vec<(i64, i64, String, NodeKind)> {
        let mut out: Vec<_> = graph
            .nodes
            .iter()
            .map(|n| (n.x.round() as i64, n.y.round() as i64, n.label.clone(), n.kind))
            .collect();
        out.sort_by(|a, b| (a.0, a.1, &a.2).cmp(&(b.0, b.1, &b.2)));
        out
    }

    #[test]
    fn test_single_leaf_layout() {
        let graph = layout(&TreeNode::leaf("3 (10.0%)"), &LayoutConstants::default());
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.links.is_empty());
        assert_eq!(graph.nodes[0].kind, NodeKind::Leaf);
        assert_eq!(graph.nodes[0].label, "3 (10.0%)");
    }

    #[test]
    fn test_terminal_branches_become_synthetic_leaves() {
        let c = LayoutConstants::default();
        let graph = layout(&age_tree(), &c);
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.links.len(), 2);
        assert!(graph.height >= 2.0 * c.slot_height());

        let labels: Vec<_> = graph
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Leaf)
            .map(|n| n.label.as_str())
            .collect();
        assert_eq!(labels, vec!["40 (25.0%)", "40 (75.0%)"]);

        let link = &graph.links[0];
        assert_eq!(link.label, "<30");
        assert_eq!(link.target_count, Some(10));
        assert_eq!(link.total, Some(40));
        assert_eq!(link.percentage, Some(25.0));
    }

    #[test]
    fn test_parent_centered_between_extreme_children() {
        let c = LayoutConstants::default();
        // Three leaves under the first branch, one under the second.
        let t = tree(json!({
            "type": "node",
            "variable": "A",
            "branches": {
                "x": {"count": 1, "percentage": 1.0, "subtree": {
                    "type": "node", "variable": "B", "branches": {
                        "1": {"count": 1, "percentage": 1.0},
                        "2": {"count": 1, "percentage": 1.0},
                        "3": {"count": 1, "percentage": 1.0}
                    }
                }},
                "y": {"count": 1, "percentage": 1.0}
            }
        }));
        let graph = layout(&t, &c);
        let center = |label: &str| {
            let n = graph.nodes.iter().find(|n| n.label == label).unwrap();
            n.y + c.node_height / 2.0
        };
        let leaves: Vec<f32> = graph
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Leaf)
            .map(|n| n.y + c.node_height / 2.0)
            .collect();
        let min = leaves.iter().copied().fold(f32::INFINITY, f32::min);
        let max = leaves.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        assert!((center("A") - (center("B") + max) / 2.0).abs() < 1e-3);
        assert!(center("B") > min);
        assert_eq!(subtree_weight(&t), 4);
    }

    #[test]
    fn test_columns_follow_depth() {
        let c = LayoutConstants::default();
        let graph = layout(&age_tree(), &c);
        for node in &graph.nodes {
            assert_eq!(node.x, c.left_offset() + node.depth as f32 * c.x_gap);
        }
        assert!(graph.width >= c.left_offset() + 2.0 * c.x_gap + c.node_width);
    }

    #[test]
    fn test_leaves_do_not_overlap() {
        let c = LayoutConstants::default();
        let t = tree(json!({
            "type": "multi_node",
            "nodes": {
                "Age": {"type": "node", "variable": "Age", "branches": {
                    "a": {"count": 1, "percentage": 1.0},
                    "b": {"count": 1, "percentage": 1.0}
                }},
                "Sex": {"type": "leaf", "message": "2 (3.0%)"}
            }
        }));
        let graph = layout(&t, &c);
        let mut ys: Vec<f32> = graph
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Leaf)
            .map(|n| n.y)
            .collect();
        ys.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for pair in ys.windows(2) {
            assert!(pair[1] - pair[0] >= c.node_height);
        }
        assert!(ys[0] >= c.padding);
        assert_eq!(graph.links.iter().filter(|l| l.total.is_none()).count(), 2);
    }

    #[test]
    fn test_empty_decision_node_weighs_one() {
        let t = tree(json!({"type": "node", "variable": "X", "branches": {}}));
        assert_eq!(subtree_weight(&t), 1);
        let graph = layout(&t, &LayoutConstants::default());
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].kind, NodeKind::Node);
    }

    #[test]
    fn test_layout_is_reproducible() {
        let c = LayoutConstants::default();
        let first = layout(&age_tree(), &c);
        let second = layout(&age_tree(), &c);
        assert_eq!(geometry(&first), geometry(&second));
        assert_ne!(first.nodes[0].id, second.nodes[0].id);
        assert_eq!(first.width, second.width);
        assert_eq!(first.height, second.height);
    }

    #[test]
    fn test_link_endpoints() {
        let c = LayoutConstants::default();
        let graph = layout(&age_tree(), &c);
        let root = graph.nodes.iter().find(|n| n.depth == 0).unwrap();
        let ((x1, y1), (x2, _)) = graph.link_endpoints(&graph.links[0]).unwrap();
        assert_eq!(x1, root.x + c.node_width);
        assert_eq!(y1, root.y + c.node_height / 2.0);
        assert_eq!(x2, c.left_offset() + c.x_gap);
    }
}
