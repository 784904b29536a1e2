//! # Decision Tree Viewer
//!
//! Explores the decision trees built by an analysis backend and turns them
//! into a paginated PDF report.
//!
//! ## Features
//! - Expand/collapse view of every (target variable, target value) tree
//! - Graph canvas with deterministic layout, panning and zooming
//! - Extraction of terminal outcomes filtered by percentage and population
//! - PDF report with a cover page, one diagram per tree and a leaf summary
//!
//! The engines (`layout`, `leaves`, `tree_view`, `graph_render`, `report`)
//! are plain functions over an already decoded forest and never touch the UI.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod format;
pub mod graph_render;
pub mod layout;
pub mod leaves;
pub mod report;
pub mod tree_view;
pub mod types;
mod ui;

// Re-export public types and functions
pub use layout::{layout, LayoutConstants, LayoutGraph};
pub use leaves::{extract_leaves, filter_by_percentage, FilteredLeaf};
pub use report::{export_report, ExportError, ReportMetadata};
pub use types::*;
pub use ui::DecisionTreeApp;

/// Runs the viewer, restoring the settings saved by the previous run.
///
/// # Example
///
/// ```no_run
/// use decision_tree_viewer::run_app;
///
/// #[tokio::main]
/// async fn main() -> Result<(), eframe::Error> {
///     run_app()
/// }
/// ```
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Decision Tree Viewer",
        options,
        Box::new(|cc| {
            let mut app = cc
                .storage
                .and_then(|storage| storage.get_string("app_state"))
                .and_then(|json| match DecisionTreeApp::from_json(&json) {
                    Ok(app) => Some(app),
                    Err(err) => {
                        log::warn!("ignoring unreadable saved settings: {err}");
                        None
                    }
                })
                .unwrap_or_default();
            app.reset_non_ui_fields();
            Ok(Box::new(app))
        }),
    )
}
