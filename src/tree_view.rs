//! Expand/collapse state and the view model of the interactive tree.
//!
//! The tree itself is never touched: expansion flags live in maps keyed by
//! structured paths, and [`forest_view`] derives what should be on screen from
//! the tree, those flags and the caller's population settings.

use crate::format::{self, is_branch_stopped, population_share};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One step below a tree root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathStep {
    /// Followed the branch with this value
    Branch(String),
    /// Entered the named sub-tree of a multi node
    Member(String),
}

/// Location of a node inside the forest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodePath {
    /// Target variable of the tree
    pub target_variable: String,
    /// Target value of the tree
    pub target_value: String,
    /// Steps from the root
    pub steps: Vec<PathStep>,
}

impl NodePath {
    /// Path of a tree root.
    pub fn root(target_variable: &str, target_value: &str) -> Self {
        Self {
            target_variable: target_variable.to_string(),
            target_value: target_value.to_string(),
            steps: Vec::new(),
        }
    }

    /// Path one step further down.
    pub fn child(&self, step: PathStep) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self {
            target_variable: self.target_variable.clone(),
            target_value: self.target_value.clone(),
            steps,
        }
    }
}

/// Key of a top-level group (one target variable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeKey(pub String);

/// Expansion flags of decision nodes and of target-variable groups.
///
/// Everything starts collapsed.
#[derive(Debug, Clone, Default)]
pub struct ExpansionState {
    nodes: HashMap<NodePath, bool>,
    trees: HashMap<TreeKey, bool>,
}

impl ExpansionState {
    /// Whether the node at `path` is expanded.
    pub fn is_node_expanded(&self, path: &NodePath) -> bool {
        self.nodes.get(path).copied().unwrap_or(false)
    }

    /// Whether the group of a target variable is expanded.
    pub fn is_tree_expanded(&self, key: &TreeKey) -> bool {
        self.trees.get(key).copied().unwrap_or(false)
    }

    /// Flips a node flag.
    pub fn toggle_node(&mut self, path: &NodePath) {
        let entry = self.nodes.entry(path.clone()).or_insert(false);
        *entry = !*entry;
    }

    /// Flips a group flag.
    pub fn toggle_tree(&mut self, key: &TreeKey) {
        let entry = self.trees.entry(key.clone()).or_insert(false);
        *entry = !*entry;
    }

    /// Sets a node flag.
    pub fn set_node(&mut self, path: NodePath, expanded: bool) {
        self.nodes.insert(path, expanded);
    }

    /// Sets a group flag.
    pub fn set_tree(&mut self, key: TreeKey, expanded: bool) {
        self.trees.insert(key, expanded);
    }

    /// Collapses everything.
    pub fn collapse_all(&mut self) {
        self.nodes.clear();
        self.trees.clear();
    }

    /// Expands every group and every expandable node of the forest.
    pub fn expand_all(&mut self, forest: &DecisionForest) {
        for (variable, values) in forest {
            self.set_tree(TreeKey(variable.clone()), true);
            for (value, tree) in values {
                self.expand_subtree(tree, NodePath::root(variable, value));
            }
        }
    }

    fn expand_subtree(&mut self, node: &TreeNode, path: NodePath) {
        match node {
            TreeNode::Leaf { .. } => {}
            TreeNode::MultiNode { nodes } => {
                for (name, child) in nodes {
                    self.expand_subtree(child, path.child(PathStep::Member(name.clone())));
                }
                self.set_node(path, true);
            }
            TreeNode::Decision { branches, .. } => {
                for (value, branch) in branches {
                    if let Some(subtree) = &branch.subtree {
                        self.expand_subtree(subtree, path.child(PathStep::Branch(value.clone())));
                    }
                }
                self.set_node(path, true);
            }
        }
    }
}

/// Settings the view depends on besides the tree.
#[derive(Debug, Clone, Copy)]
pub struct ViewOptions<'a> {
    /// Branches reaching fewer cases are shown as stopped (0 disables)
    pub min_population_threshold: u64,
    /// Population used for the "share of the population" line
    pub base_population: Option<u64>,
    /// Selections used to spell out combined values
    pub selections: &'a SelectedValues,
}

/// What to draw for one node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeView<'a> {
    /// Inert row with the leaf message
    Leaf {
        /// Message, or a fallback when the leaf has none
        message: &'a str,
    },
    /// Toggle header over several sub-trees
    Multi {
        /// Key of the expansion flag
        path: NodePath,
        /// Number of contained sub-trees
        member_count: usize,
        /// Whether members are shown
        expanded: bool,
        /// Members, empty while collapsed
        members: Vec<MemberView<'a>>,
    },
    /// Toggle header over the branches of a split
    Decision {
        /// Key of the expansion flag
        path: NodePath,
        /// Split variable
        variable: &'a str,
        /// Dispersion score
        variance: Option<f64>,
        /// Whether branches are shown
        expanded: bool,
        /// First `ceil(n/2)` branches, empty while collapsed
        left: Vec<BranchView<'a>>,
        /// Remaining branches, empty while collapsed
        right: Vec<BranchView<'a>>,
    },
    /// Malformed node, rendered as nothing
    Empty,
}

/// A named sub-tree of a multi node.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberView<'a> {
    /// Sub-tree name
    pub name: &'a str,
    /// Sub-tree view
    pub node: NodeView<'a>,
}

/// One branch of an expanded decision node.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchView<'a> {
    /// Raw branch value
    pub value: &'a str,
    /// Value as displayed (combined values spelled out)
    pub display_value: String,
    /// Matching cases
    pub count: u64,
    /// Share of matching cases (0-100)
    pub percentage: f64,
    /// Cases reaching the branch
    pub total: u64,
    /// Share of the base population, when a base is known
    pub population_share: Option<f64>,
    /// What comes below the branch
    pub body: BranchBody<'a>,
}

/// Content below a branch.
#[derive(Debug, Clone, PartialEq)]
pub enum BranchBody<'a> {
    /// Not explored further: population under the threshold
    Stopped {
        /// Threshold in force
        threshold: u64,
    },
    /// Branch without a subtree
    Terminal,
    /// Nested tree
    Subtree(Box<NodeView<'a>>),
}

/// Top-level group of one target variable.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetGroupView<'a> {
    /// Key of the group flag
    pub key: TreeKey,
    /// Header title
    pub title: String,
    /// Number of values analysed
    pub value_count: usize,
    /// Whether the values are shown
    pub expanded: bool,
    /// Per-value trees, empty while collapsed
    pub values: Vec<TargetValueView<'a>>,
}

/// Tree built for one target value.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetValueView<'a> {
    /// Raw target value
    pub value: &'a str,
    /// Value as displayed
    pub display_value: String,
    /// Root view
    pub tree: NodeView<'a>,
}

/// Builds the view of the whole forest.
pub fn forest_view<'a>(
    forest: &'a DecisionForest,
    state: &ExpansionState,
    options: &ViewOptions<'_>,
) -> Vec<TargetGroupView<'a>> {
    forest
        .iter()
        .map(|(variable, values)| {
            let key = TreeKey(variable.clone());
            let expanded = state.is_tree_expanded(&key);
            let title = if values.keys().any(|v| format::is_combined(v)) {
                let joined = format::selected_variables_title(options.selections);
                if joined.is_empty() {
                    variable.clone()
                } else {
                    joined
                }
            } else {
                variable.clone()
            };
            let values_view = if expanded {
                values
                    .iter()
                    .map(|(value, tree)| TargetValueView {
                        value,
                        display_value: format::display_value(value, options.selections),
                        tree: node_view(tree, NodePath::root(variable, value), state, options),
                    })
                    .collect()
            } else {
                Vec::new()
            };
            TargetGroupView {
                key,
                title,
                value_count: values.len(),
                expanded,
                values: values_view,
            }
        })
        .collect()
}

/// Builds the view of one node and, when expanded, of its descendants.
pub fn node_view<'a>(
    node: &'a TreeNode,
    path: NodePath,
    state: &ExpansionState,
    options: &ViewOptions<'_>,
) -> NodeView<'a> {
    match node {
        TreeNode::Leaf { message, .. } => NodeView::Leaf {
            message: message
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or("End of branch"),
        },
        TreeNode::MultiNode { nodes } => {
            let expanded = state.is_node_expanded(&path);
            let members = if expanded {
                nodes
                    .iter()
                    .map(|(name, child)| MemberView {
                        name,
                        node: node_view(
                            child,
                            path.child(PathStep::Member(name.clone())),
                            state,
                            options,
                        ),
                    })
                    .collect()
            } else {
                Vec::new()
            };
            NodeView::Multi {
                path,
                member_count: nodes.len(),
                expanded,
                members,
            }
        }
        TreeNode::Decision {
            variable: Some(variable),
            variance,
            branches,
            ..
        } => {
            let expanded = state.is_node_expanded(&path);
            let (mut left, mut right) = (Vec::new(), Vec::new());
            if expanded {
                let split = branches.len().div_ceil(2);
                for (index, (value, branch)) in branches.iter().enumerate() {
                    let view = branch_view(value, branch, &path, state, options);
                    if index < split {
                        left.push(view);
                    } else {
                        right.push(view);
                    }
                }
            }
            NodeView::Decision {
                path,
                variable,
                variance: *variance,
                expanded,
                left,
                right,
            }
        }
        TreeNode::Decision { variable: None, .. } => NodeView::Empty,
    }
}

fn branch_view<'a>(
    value: &'a str,
    branch: &'a BranchData,
    parent: &NodePath,
    state: &ExpansionState,
    options: &ViewOptions<'_>,
) -> BranchView<'a> {
    let total = branch.total_or_count();
    let body = if is_branch_stopped(total, options.min_population_threshold) {
        BranchBody::Stopped {
            threshold: options.min_population_threshold,
        }
    } else {
        match branch.child() {
            BranchChild::Subtree(subtree) => BranchBody::Subtree(Box::new(node_view(
                subtree,
                parent.child(PathStep::Branch(value.to_string())),
                state,
                options,
            ))),
            BranchChild::Terminal(_) => BranchBody::Terminal,
        }
    };
    BranchView {
        value,
        display_value: format::display_value(value, options.selections),
        count: branch.count,
        percentage: branch.percentage,
        total,
        population_share: options
            .base_population
            .and_then(|base| population_share(total, base)),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn forest() -> DecisionForest {
        serde_json::from_value(json!({
            "Sick": {"True": {
                "type": "node",
                "variable": "Age",
                "variance": 1.5,
                "branches": {
                    "a": {"count": 1, "percentage": 10.0, "total": 5},
                    "b": {"count": 2, "percentage": 20.0, "total": 20, "subtree": {
                        "type": "node", "variable": "Smoker", "branches": {
                            "True": {"count": 2, "percentage": 50.0}
                        }
                    }},
                    "c": {"count": 0, "percentage": 0.0, "total": 0}
                }
            }}
        }))
        .unwrap()
    }

    fn no_selections() -> SelectedValues {
        SelectedValues::new()
    }

    #[test]
    fn test_initially_collapsed() {
        let f = forest();
        let selections = no_selections();
        let options = ViewOptions {
            min_population_threshold: 0,
            base_population: None,
            selections: &selections,
        };
        let groups = forest_view(&f, &ExpansionState::default(), &options);
        assert_eq!(groups.len(), 1);
        assert!(!groups[0].expanded);
        assert!(groups[0].values.is_empty());
        assert_eq!(groups[0].value_count, 1);
    }

    #[test]
    fn test_toggle_flips_only_one_entry() {
        let mut state = ExpansionState::default();
        let root = NodePath::root("Sick", "True");
        let child = root.child(PathStep::Branch("b".into()));
        state.toggle_node(&root);
        assert!(state.is_node_expanded(&root));
        assert!(!state.is_node_expanded(&child));
        state.toggle_node(&root);
        assert!(!state.is_node_expanded(&root));
        state.toggle_tree(&TreeKey("Sick".into()));
        assert!(state.is_tree_expanded(&TreeKey("Sick".into())));
        assert!(!state.is_tree_expanded(&TreeKey("Other".into())));
    }

    #[test]
    fn test_structured_keys_do_not_collide() {
        let mut state = ExpansionState::default();
        let a = NodePath::root("x-y", "z");
        let b = NodePath::root("x", "y-z");
        state.toggle_node(&a);
        assert!(!state.is_node_expanded(&b));
    }

    #[test]
    fn test_branch_split_and_stop_rule() {
        let f = forest();
        let tree = &f["Sick"]["True"];
        let selections = no_selections();
        let options = ViewOptions {
            min_population_threshold: 10,
            base_population: Some(40),
            selections: &selections,
        };
        let mut state = ExpansionState::default();
        let root = NodePath::root("Sick", "True");
        state.set_node(root.clone(), true);

        let NodeView::Decision { left, right, variance, .. } = node_view(tree, root, &state, &options) else {
            panic!("expected decision view");
        };
        assert_eq!(variance, Some(1.5));
        assert_eq!(left.iter().map(|b| b.value).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(right.iter().map(|b| b.value).collect::<Vec<_>>(), vec!["c"]);

        // total 5 < 10
        assert_eq!(left[0].body, BranchBody::Stopped { threshold: 10 });
        assert_eq!(left[0].population_share, Some(12.5));
        // total 20 passes, subtree collapsed
        let BranchBody::Subtree(sub) = &left[1].body else {
            panic!("expected subtree");
        };
        assert!(matches!(**sub, NodeView::Decision { expanded: false, .. }));
        // total 0 always stops
        assert!(matches!(right[0].body, BranchBody::Stopped { .. }));
    }

    #[test]
    fn test_zero_threshold_only_stops_empty_branches() {
        let f = forest();
        let selections = no_selections();
        let options = ViewOptions {
            min_population_threshold: 0,
            base_population: None,
            selections: &selections,
        };
        let mut state = ExpansionState::default();
        state.expand_all(&f);
        let groups = forest_view(&f, &state, &options);
        let NodeView::Decision { left, right, .. } = &groups[0].values[0].tree else {
            panic!("expected decision view");
        };
        assert_eq!(left[0].body, BranchBody::Terminal);
        assert!(left[0].population_share.is_none());
        let BranchBody::Subtree(sub) = &left[1].body else {
            panic!("expected subtree");
        };
        assert!(matches!(**sub, NodeView::Decision { expanded: true, .. }));
        assert!(matches!(right[0].body, BranchBody::Stopped { threshold: 0 }));
    }

    #[test]
    fn test_multi_node_and_malformed() {
        let tree: TreeNode = serde_json::from_value(json!({
            "type": "multi_node",
            "nodes": {
                "A": {"type": "leaf", "message": "1 (2.0%)"},
                "B": {"type": "node"},
                "C": {"type": "leaf"}
            }
        }))
        .unwrap();
        let selections = no_selections();
        let options = ViewOptions {
            min_population_threshold: 0,
            base_population: None,
            selections: &selections,
        };
        let root = NodePath::root("T", "v");
        let mut state = ExpansionState::default();
        let collapsed = node_view(&tree, root.clone(), &state, &options);
        assert!(matches!(collapsed, NodeView::Multi { member_count: 3, expanded: false, ref members, .. } if members.is_empty()));

        state.toggle_node(&root);
        let NodeView::Multi { members, .. } = node_view(&tree, root, &state, &options) else {
            panic!("expected multi view");
        };
        assert_eq!(members[0].node, NodeView::Leaf { message: "1 (2.0%)" });
        assert_eq!(members[1].node, NodeView::Empty);
        assert_eq!(members[2].node, NodeView::Leaf { message: "End of branch" });
    }

    #[test]
    fn test_combined_group_title_and_values() {
        let f: DecisionForest = serde_json::from_value(json!({
            "Sex + Smoker": {"Combined": {"type": "leaf", "message": "3 (5.0%)"}}
        }))
        .unwrap();
        let mut selections = SelectedValues::new();
        selections.insert("Sex".into(), vec!["M".into()]);
        selections.insert("Smoker".into(), vec!["Yes".into()]);
        let options = ViewOptions {
            min_population_threshold: 0,
            base_population: None,
            selections: &selections,
        };
        let mut state = ExpansionState::default();
        state.toggle_tree(&TreeKey("Sex + Smoker".into()));
        let groups = forest_view(&f, &state, &options);
        assert_eq!(groups[0].title, "Sex + Smoker");
        assert_eq!(groups[0].values[0].value, "Combined");
        assert_eq!(groups[0].values[0].display_value, "Sex=M + Smoker=Yes");
    }
}
