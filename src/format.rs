//! Display helpers shared by the tree view, the graph and the report.

use crate::constants::COMBINED_PLACEHOLDER;
use crate::types::SelectedValues;

/// Whether a value stands for a combination of several selections.
pub fn is_combined(value: &str) -> bool {
    value.to_lowercase().contains("combined")
}

/// `"var=value"` for every selected value, joined with `" + "`.
///
/// Falls back to a generic placeholder when nothing is selected.
pub fn combined_display(selections: &SelectedValues) -> String {
    let parts: Vec<String> = selections
        .iter()
        .flat_map(|(variable, values)| values.iter().map(move |v| format!("{}={}", variable, v)))
        .collect();
    if parts.is_empty() {
        COMBINED_PLACEHOLDER.to_string()
    } else {
        parts.join(" + ")
    }
}

/// Display form of a branch or target value. Only affects what is shown.
pub fn display_value(value: &str, selections: &SelectedValues) -> String {
    if is_combined(value) {
        combined_display(selections)
    } else {
        value.to_string()
    }
}

/// Names of the variables holding at least one selection, joined with `" + "`.
pub fn selected_variables_title(selections: &SelectedValues) -> String {
    selections
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(variable, _)| variable.as_str())
        .collect::<Vec<_>>()
        .join(" + ")
}

/// Share of the base population reaching a branch, rounded to 2 decimals.
pub fn population_share(branch_total: u64, base_population: u64) -> Option<f64> {
    if base_population == 0 {
        return None;
    }
    Some((branch_total as f64 / base_population as f64 * 10000.0).round() / 100.0)
}

/// A branch stops being explored when nobody reaches it or when it falls
/// under a positive population threshold.
pub fn is_branch_stopped(branch_total: u64, min_population_threshold: u64) -> bool {
    branch_total == 0 || (min_population_threshold > 0 && branch_total < min_population_threshold)
}

/// Percentage with two decimals and a `%` suffix.
pub fn percent_text(percentage: f64) -> String {
    format!("{:.2}%", percentage)
}

/// Color family used for a value token in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTone {
    /// `True`
    True,
    /// `False`
    False,
    /// Anything else
    Other,
}

/// Classifies a value token (case-insensitive, trimmed).
pub fn value_tone(value: &str) -> ValueTone {
    match value.trim().to_lowercase().as_str() {
        "true" => ValueTone::True,
        "false" => ValueTone::False,
        _ => ValueTone::Other,
    }
}
