//! Terminal-branch extraction and percentage filtering.
//!
//! Walks a forest to list every terminal outcome with the path leading to it,
//! then filters those outcomes by a minimum percentage and population.

use crate::types::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// A terminal outcome of one tree, with the path leading to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredLeaf {
    /// `"variable = value"` steps (or sub-tree names) from the root
    pub path: Vec<String>,
    /// Matching cases
    pub count: u64,
    /// Share of matching cases (0-100)
    pub percentage: f64,
    /// Target variable of the tree
    pub target_variable: String,
    /// Target value of the tree
    pub target_value: String,
    /// Cases reaching the branch, when known
    pub total: Option<u64>,
}

impl FilteredLeaf {
    /// Branch population, estimated from count and percentage when unknown.
    pub fn total_or_estimate(&self) -> u64 {
        match self.total {
            Some(total) => total,
            None if self.percentage > 0.0 => {
                (self.count as f64 / (self.percentage / 100.0)).round() as u64
            }
            None => self.count,
        }
    }
}

/// What to do with outcomes that hold no matching case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmptyBranchPolicy {
    /// Skip zero-count terminal branches and leaves without a positive percentage
    #[default]
    Drop,
    /// Keep them, with whatever statistics are known (0 otherwise)
    Retain,
}

/// Validation errors of the minimum percentage input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// The input does not read as a number
    #[error("'{0}' is not a number; enter a percentage between 0 and 100")]
    NotANumber(String),
    /// The number lies outside [0, 100]
    #[error("{0} is out of range; enter a percentage between 0 and 100")]
    OutOfRange(f64),
}

/// Lists the terminal outcomes of every tree of the forest, dropping empty ones.
pub fn extract_leaves(forest: &DecisionForest) -> Vec<FilteredLeaf> {
    extract_leaves_with(forest, EmptyBranchPolicy::Drop)
}

/// Lists the terminal outcomes of every tree of the forest.
pub fn extract_leaves_with(forest: &DecisionForest, policy: EmptyBranchPolicy) -> Vec<FilteredLeaf> {
    let mut leaves = Vec::new();
    for (target_variable, values) in forest {
        for (target_value, tree) in values {
            leaves.extend(extract_tree_leaves(tree, target_variable, target_value, policy));
        }
    }
    leaves
}

/// Lists the terminal outcomes of a single tree.
pub fn extract_tree_leaves(
    tree: &TreeNode,
    target_variable: &str,
    target_value: &str,
    policy: EmptyBranchPolicy,
) -> Vec<FilteredLeaf> {
    let mut walker = LeafWalker {
        target_variable,
        target_value,
        policy,
        leaves: Vec::new(),
        dropped: 0,
    };
    let mut path = Vec::new();
    walker.walk(tree, &mut path);
    if walker.dropped > 0 {
        log::debug!(
            "{} = {}: dropped {} empty outcome(s), kept {}",
            target_variable,
            target_value,
            walker.dropped,
            walker.leaves.len()
        );
    }
    walker.leaves
}

struct LeafWalker<'a> {
    target_variable: &'a str,
    target_value: &'a str,
    policy: EmptyBranchPolicy,
    leaves: Vec<FilteredLeaf>,
    dropped: usize,
}

impl LeafWalker<'_> {
    fn walk(&mut self, node: &TreeNode, path: &mut Vec<String>) {
        match node {
            TreeNode::Leaf { message, .. } => {
                let stats = node.leaf_stats();
                if stats.is_none() {
                    if let Some(message) = message.as_deref().filter(|m| m.contains('%')) {
                        log::warn!("could not read statistics from leaf message '{}'", message);
                    }
                }
                let stats = stats.unwrap_or(LeafStats {
                    count: 0,
                    percentage: 0.0,
                });
                if stats.percentage > 0.0 || self.policy == EmptyBranchPolicy::Retain {
                    self.push(path.clone(), stats.count, stats.percentage, None);
                } else {
                    self.dropped += 1;
                }
            }
            TreeNode::MultiNode { nodes } => {
                for (name, child) in nodes {
                    path.push(name.clone());
                    self.walk(child, path);
                    path.pop();
                }
            }
            TreeNode::Decision {
                variable, branches, ..
            } => {
                let variable = variable.as_deref().unwrap_or("variable");
                for (value, branch) in branches {
                    path.push(format!("{} = {}", variable, value));
                    match branch.child() {
                        BranchChild::Subtree(subtree) => self.walk(subtree, path),
                        BranchChild::Terminal(_) => {
                            if branch.count > 0 || self.policy == EmptyBranchPolicy::Retain {
                                self.push(path.clone(), branch.count, branch.percentage, branch.total);
                            } else {
                                self.dropped += 1;
                            }
                        }
                    }
                    path.pop();
                }
            }
        }
    }

    fn push(&mut self, path: Vec<String>, count: u64, percentage: f64, total: Option<u64>) {
        self.leaves.push(FilteredLeaf {
            path,
            count,
            percentage,
            target_variable: self.target_variable.to_string(),
            target_value: self.target_value.to_string(),
            total,
        });
    }
}

/// Checks that a percentage lies in [0, 100].
pub fn validate_percentage(percentage: f64) -> Result<f64, FilterError> {
    if percentage.is_nan() || !(0.0..=100.0).contains(&percentage) {
        return Err(FilterError::OutOfRange(percentage));
    }
    Ok(percentage)
}

/// Reads a minimum percentage typed by the user.
pub fn parse_min_percentage(input: &str) -> Result<f64, FilterError> {
    let trimmed = input.trim();
    let value = trimmed
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| FilterError::NotANumber(trimmed.to_string()))?;
    validate_percentage(value)
}

/// Sorts outcomes by descending percentage, keeping the original order of ties.
pub fn sort_by_percentage(leaves: &mut [FilteredLeaf]) {
    leaves.sort_by(|a, b| match b.percentage.partial_cmp(&a.percentage) {
        Some(ordering) => ordering,
        None => Ordering::Equal,
    });
}

/// Keeps the outcomes reaching `min_percentage` (and `min_population` cases when
/// given), sorted by descending percentage.
pub fn filter_by_percentage(
    leaves: &[FilteredLeaf],
    min_percentage: f64,
    min_population: Option<u64>,
) -> Result<Vec<FilteredLeaf>, FilterError> {
    let min_percentage = validate_percentage(min_percentage)?;
    let mut kept: Vec<FilteredLeaf> = leaves
        .iter()
        .filter(|leaf| leaf.percentage >= min_percentage)
        .filter(|leaf| min_population.map_or(true, |min| leaf.count >= min))
        .cloned()
        .collect();
    sort_by_percentage(&mut kept);
    Ok(kept)
}

/// Extraction followed by filtering, over the whole forest.
pub fn extract_filtered_leaves(
    forest: &DecisionForest,
    min_percentage: f64,
    min_population: Option<u64>,
) -> Result<Vec<FilteredLeaf>, FilterError> {
    filter_by_percentage(&extract_leaves(forest), min_percentage, min_population)
}

/// State of the "minimum percentage" filter form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LeafFilter {
    /// Raw text typed by the user
    pub input: String,
    /// Result of the last successful filter run
    #[serde(skip)]
    pub results: Option<Vec<FilteredLeaf>>,
    /// Validation error of the last run
    #[serde(skip)]
    pub error: Option<FilterError>,
}

impl LeafFilter {
    /// Runs the filter over the forest. On invalid input nothing is filtered and
    /// the previous results are cleared.
    pub fn apply(&mut self, forest: &DecisionForest, min_population: Option<u64>) {
        let outcome = parse_min_percentage(&self.input)
            .and_then(|min| extract_filtered_leaves(forest, min, min_population));
        match outcome {
            Ok(leaves) => {
                self.results = Some(leaves);
                self.error = None;
            }
            Err(err) => {
                self.results = None;
                self.error = Some(err);
            }
        }
    }

    /// Clears input, results and error.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
