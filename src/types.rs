//! Core data types for decision trees as delivered by the analysis backend.
//!
//! This module defines the recursive tree model, the forest returned by the
//! build endpoint, and the analysis session wrapping it together with the
//! selections made in the wizard.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for nodes of a laid out graph.
pub type NodeId = Uuid;

/// Target variable name -> target value -> tree built for that value.
pub type DecisionForest = IndexMap<String, IndexMap<String, TreeNode>>;

/// Column name -> values selected for it, in selection order.
pub type SelectedValues = IndexMap<String, Vec<String>>;

lazy_static! {
    static ref PERCENT_RE: Regex = Regex::new(r"\(([-\d.]+)%\)").unwrap();
    static ref COUNT_RE: Regex = Regex::new(r"(\d+)").unwrap();
}

/// One node of a decision tree.
///
/// Trees are read-only once decoded; every stateful concern (expansion,
/// filtering) lives in side tables keyed by path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Terminal node
    Leaf {
        /// Human readable summary such as `"12 (33.3%)"`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        /// Structured case count, preferred over parsing `message`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        count: Option<u64>,
        /// Structured percentage (0-100), preferred over parsing `message`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        percentage: Option<f64>,
    },
    /// Split on one explanatory variable
    #[serde(rename = "node")]
    Decision {
        /// Variable the node splits on
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variable: Option<String>,
        /// Dispersion score of the split
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variance: Option<f64>,
        /// Branch value -> branch statistics, in backend order
        #[serde(default)]
        branches: IndexMap<String, BranchData>,
        /// Variables and values leading to this node, as reported by the backend
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        path: Vec<String>,
    },
    /// Several named sub-trees presented under one root
    MultiNode {
        /// Sub-tree name -> sub-tree
        #[serde(default)]
        nodes: IndexMap<String, TreeNode>,
    },
}

/// Statistics of one outgoing branch of a decision node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BranchData {
    /// Cases of this branch matching the target
    #[serde(default)]
    pub count: u64,
    /// Share of matching cases, already expressed 0-100
    #[serde(default)]
    pub percentage: f64,
    /// Cases reaching this branch regardless of the target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Further split below this branch; absent for terminal branches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtree: Option<Box<TreeNode>>,
}

/// A branch without a subtree, seen as a terminal outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerminalBranch {
    /// Matching cases
    pub count: u64,
    /// Cases reaching the branch (`count` when the backend omitted it)
    pub total: u64,
    /// Share of matching cases (0-100)
    pub percentage: f64,
}

impl TerminalBranch {
    /// Text shown for the synthetic leaf standing in for this branch.
    pub fn label(&self) -> String {
        format!("{} ({:.1}%)", self.total, self.percentage)
    }
}

/// What continues below a branch.
#[derive(Debug, Clone, Copy)]
pub enum BranchChild<'a> {
    /// The branch splits further
    Subtree(&'a TreeNode),
    /// The branch ends here
    Terminal(TerminalBranch),
}

impl BranchData {
    /// Population reaching the branch, falling back to `count`.
    pub fn total_or_count(&self) -> u64 {
        self.total.unwrap_or(self.count)
    }

    /// Classifies the branch as a subtree or a terminal outcome.
    pub fn child(&self) -> BranchChild<'_> {
        match &self.subtree {
            Some(subtree) => BranchChild::Subtree(subtree),
            None => BranchChild::Terminal(TerminalBranch {
                count: self.count,
                total: self.total_or_count(),
                percentage: self.percentage,
            }),
        }
    }
}

/// Count and percentage carried by a leaf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafStats {
    /// Matching cases
    pub count: u64,
    /// Share of matching cases (0-100)
    pub percentage: f64,
}

/// Parses statistics out of a leaf message such as `"12 (33.3%)"`.
///
/// The percentage is the parenthesized value followed by `%`; the count is the
/// first integer token. Returns `None` when no percentage can be found. A missing
/// count reads as 0.
pub fn parse_leaf_message(message: &str) -> Option<LeafStats> {
    let percentage = PERCENT_RE
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|p| p.is_finite())?;
    let count = COUNT_RE
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(0);
    Some(LeafStats { count, percentage })
}

impl TreeNode {
    /// Builds a leaf from a message only.
    pub fn leaf(message: impl Into<String>) -> Self {
        TreeNode::Leaf {
            message: Some(message.into()),
            count: None,
            percentage: None,
        }
    }

    /// Whether this node is a terminal leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf { .. })
    }

    /// Statistics of a leaf: structured fields first, then the message text.
    ///
    /// Returns `None` for non-leaf nodes and for leaves whose percentage is unknown.
    pub fn leaf_stats(&self) -> Option<LeafStats> {
        let TreeNode::Leaf {
            message,
            count,
            percentage,
        } = self
        else {
            return None;
        };
        let parsed = message.as_deref().and_then(parse_leaf_message);
        match percentage {
            Some(p) => Some(LeafStats {
                count: count.or(parsed.map(|s| s.count)).unwrap_or(0),
                percentage: *p,
            }),
            None => parsed.map(|stats| LeafStats {
                count: count.unwrap_or(stats.count),
                percentage: stats.percentage,
            }),
        }
    }

    /// Text displayed inside the node box.
    pub fn label(&self) -> String {
        match self {
            TreeNode::Leaf { message, .. } => message
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or("Leaf")
                .to_string(),
            TreeNode::Decision { variable, .. } => variable
                .as_deref()
                .filter(|v| !v.is_empty())
                .unwrap_or("Node")
                .to_string(),
            TreeNode::MultiNode { nodes } => format!("{} variables", nodes.len()),
        }
    }

    /// Whether the node has no children to lay out or render.
    pub fn has_children(&self) -> bool {
        match self {
            TreeNode::Leaf { .. } => false,
            TreeNode::Decision { branches, .. } => !branches.is_empty(),
            TreeNode::MultiNode { nodes } => !nodes.is_empty(),
        }
    }
}

/// How several target variables were treated when building the forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreatmentMode {
    /// One tree per target variable and value
    #[default]
    Independent,
    /// One combined tree across all target variables
    Together,
}

impl TreatmentMode {
    /// Display name of the mode.
    pub fn label(&self) -> &'static str {
        match self {
            TreatmentMode::Independent => "Independent",
            TreatmentMode::Together => "Together",
        }
    }
}

/// Response of the decision-tree build endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionTreeResponse {
    /// Name of the analysed spreadsheet
    pub filename: String,
    /// Predictor columns
    #[serde(rename = "variables_explicatives")]
    pub explanatory_variables: Vec<String>,
    /// Target columns
    #[serde(rename = "variables_a_expliquer")]
    pub target_variables: Vec<String>,
    /// Rows left after sample filtering
    pub filtered_sample_size: Option<u64>,
    /// Rows in the uploaded file
    pub original_sample_size: Option<u64>,
    /// The trees themselves
    pub decision_trees: DecisionForest,
    /// Mode the forest was built with, when reported
    pub treatment_mode: Option<TreatmentMode>,
}

/// A build response together with the wizard selections that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSession {
    /// Backend response
    #[serde(alias = "decisionTreeData")]
    pub decision_tree_data: DecisionTreeResponse,
    /// Values selected for the target variables
    #[serde(alias = "selectedColumnValues", deserialize_with = "de_selected_values")]
    pub selected_column_values: SelectedValues,
    /// Values selected on the remaining columns to filter the sample
    #[serde(alias = "selectedRemainingData", deserialize_with = "de_selected_values")]
    pub selected_remaining_data: SelectedValues,
    /// Minimum branch population requested at build time
    #[serde(alias = "minPopulationThreshold")]
    pub min_population_threshold: Option<u64>,
}

/// Errors raised while decoding a response or session file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The input is not valid JSON for the expected shape
    #[error("invalid analysis file: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisSession {
    /// Wraps a bare response with empty selections.
    pub fn from_response(response: DecisionTreeResponse) -> Self {
        Self {
            decision_tree_data: response,
            ..Default::default()
        }
    }

    /// Decodes either a full session or a bare build response.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let is_session = value
            .as_object()
            .map(|obj| obj.contains_key("decision_tree_data") || obj.contains_key("decisionTreeData"))
            .unwrap_or(false);
        if is_session {
            Ok(serde_json::from_value(value)?)
        } else {
            Ok(Self::from_response(serde_json::from_value(value)?))
        }
    }

    /// Serializes the session to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// The forest carried by the response.
    pub fn forest(&self) -> &DecisionForest {
        &self.decision_tree_data.decision_trees
    }

    /// Mode reported by the backend, guessed from the forest shape otherwise.
    pub fn treatment_mode(&self) -> TreatmentMode {
        self.decision_tree_data.treatment_mode.unwrap_or_else(|| {
            let combined = self
                .forest()
                .values()
                .any(|values| values.keys().any(|v| v.eq_ignore_ascii_case("combined")));
            if combined {
                TreatmentMode::Together
            } else {
                TreatmentMode::Independent
            }
        })
    }
}

/// Accepts selections whose values are strings, numbers or booleans.
fn de_selected_values<'de, D>(deserializer: D) -> Result<SelectedValues, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: IndexMap<String, Vec<serde_json::Value>> = IndexMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(column, values)| {
            let values = values
                .into_iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect();
            (column, values)
        })
        .collect())
}
