//! Application state management structures.
//!
//! Only viewer settings are persisted between runs; the loaded analysis, the
//! expansion flags and the filter form live for the session only.

use crate::layout::{self, LayoutConstants, LayoutGraph};
use crate::leaves::LeafFilter;
use crate::tree_view::ExpansionState;
use crate::types::*;
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};

/// What the central panel shows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ViewTab {
    /// Expand/collapse tree view of the whole forest
    #[default]
    Tree,
    /// Laid out graph of one tree
    Graph,
}

/// Pan and zoom of the graph canvas.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasState {
    /// Pan offset in screen space
    #[serde(skip)]
    pub offset: egui::Vec2,
    /// Zoom level (1.0 = one layout unit per point)
    pub zoom_factor: f32,
    /// Whether the offset must be recomputed to fit the graph
    #[serde(skip)]
    pub needs_fit: bool,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            offset: egui::Vec2::ZERO,
            zoom_factor: 1.0,
            needs_fit: true,
        }
    }
}

/// Messages sent from async file operations back to the app.
#[derive(Debug)]
pub enum FileOperationResult {
    /// A file was read; its content still has to be decoded
    LoadCompleted(PathBuf, String),
    /// Reading failed
    LoadFailed(PathBuf, String),
    /// The user closed the open dialog without choosing
    LoadCancelled,
    /// The report was written at this path
    ExportCompleted(PathBuf),
    /// Writing the report failed
    ExportFailed(String),
    /// The user closed the save dialog without choosing
    ExportCancelled,
}

/// A modal message shown over the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Window title
    pub title: String,
    /// Body text
    pub message: String,
    /// Whether a Retry button reloads the last file
    pub retry: bool,
}

/// State related to file operations.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct FileState {
    /// File the current analysis was loaded from
    #[serde(skip)]
    pub current_path: Option<PathBuf>,
    /// Last file a load was attempted from
    #[serde(skip)]
    pub last_load_path: Option<PathBuf>,
    /// A load is in flight; the Open action is disabled meanwhile
    #[serde(skip)]
    pub is_loading: bool,
    /// An export is being written
    #[serde(skip)]
    pub is_exporting: bool,
    /// Alert currently displayed
    #[serde(skip)]
    pub alert: Option<Alert>,
    /// Short status shown in the toolbar
    #[serde(skip)]
    pub status: Option<String>,
    /// Handed to async tasks to report their results
    #[serde(skip)]
    pub file_operation_sender: Option<Sender<FileOperationResult>>,
    /// Drained once per frame
    #[serde(skip)]
    pub file_operation_receiver: Option<Receiver<FileOperationResult>>,
}

impl Default for FileState {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            current_path: None,
            last_load_path: None,
            is_loading: false,
            is_exporting: false,
            alert: None,
            status: None,
            file_operation_sender: Some(sender),
            file_operation_receiver: Some(receiver),
        }
    }
}

/// The main application structure.
///
/// Implements `eframe::App`; see `ui/mod.rs` for the frame loop.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionTreeApp {
    /// Loaded analysis, if any
    #[serde(skip)]
    pub session: Option<AnalysisSession>,
    /// Expand/collapse flags of the tree view
    #[serde(skip)]
    pub expansion: ExpansionState,
    /// Minimum percentage filter form
    #[serde(skip)]
    pub filter: LeafFilter,
    /// Tree shown on the graph tab, as (target variable, target value)
    #[serde(skip)]
    pub selected_tree: Option<(String, String)>,
    /// Layout of the selected tree, with the key it was computed for
    #[serde(skip)]
    pub graph_cache: Option<((String, String), LayoutGraph)>,
    /// Graph canvas navigation
    pub canvas: CanvasState,
    /// File operations state
    pub file: FileState,
    /// Branches reaching fewer cases are shown as stopped (0 disables)
    pub min_population_threshold: u64,
    /// Base population used for population shares instead of the sample size
    pub base_population_override: Option<u64>,
    /// Geometry of the graph tab
    pub layout_constants: LayoutConstants,
    /// Current central tab
    pub tab: ViewTab,
    /// Whether dark mode visuals are enabled
    pub dark_mode: bool,
    /// Remembered width of the settings panel
    pub side_panel_width: f32,
}

impl Default for DecisionTreeApp {
    fn default() -> Self {
        Self {
            session: None,
            expansion: ExpansionState::default(),
            filter: LeafFilter::default(),
            selected_tree: None,
            graph_cache: None,
            canvas: CanvasState::default(),
            file: FileState::default(),
            min_population_threshold: 0,
            base_population_override: None,
            layout_constants: LayoutConstants::default(),
            tab: ViewTab::Tree,
            dark_mode: true,
            side_panel_width: 320.0,
        }
    }
}

impl DecisionTreeApp {
    /// Serializes the persisted settings to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Restores settings from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Replaces the loaded analysis and resets everything derived from it.
    pub fn install_session(&mut self, session: AnalysisSession, path: Option<PathBuf>) {
        if let Some(threshold) = session.min_population_threshold {
            self.min_population_threshold = threshold;
        }
        self.selected_tree = session
            .forest()
            .iter()
            .find_map(|(variable, values)| values.keys().next().map(|v| (variable.clone(), v.clone())));
        log::info!(
            "installed analysis of {} with {} target variables",
            session.decision_tree_data.filename,
            session.forest().len()
        );
        self.session = Some(session);
        self.expansion.collapse_all();
        self.filter.reset();
        self.graph_cache = None;
        self.canvas.needs_fit = true;
        self.file.current_path = path;
    }

    /// Population used for shares: the override, else the filtered then original sample size.
    pub fn base_population(&self) -> Option<u64> {
        self.base_population_override.or_else(|| {
            self.session.as_ref().and_then(|s| {
                s.decision_tree_data
                    .filtered_sample_size
                    .or(s.decision_tree_data.original_sample_size)
            })
        })
    }

    /// Every (target variable, target value) pair of the loaded forest.
    pub fn tree_keys(&self) -> Vec<(String, String)> {
        self.session
            .as_ref()
            .map(|s| {
                s.forest()
                    .iter()
                    .flat_map(|(variable, values)| {
                        values.keys().map(move |value| (variable.clone(), value.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Tree currently selected for the graph tab.
    pub fn selected_tree_node(&self) -> Option<&TreeNode> {
        let (variable, value) = self.selected_tree.as_ref()?;
        self.session.as_ref()?.forest().get(variable)?.get(value)
    }

    /// Layout of the selected tree, recomputed when the selection changed.
    pub fn selected_graph(&mut self) -> Option<&LayoutGraph> {
        let key = self.selected_tree.clone()?;
        let stale = self.graph_cache.as_ref().map(|(k, _)| k != &key).unwrap_or(true);
        if stale {
            let graph = layout::layout(self.selected_tree_node()?, &self.layout_constants);
            self.graph_cache = Some((key, graph));
            self.canvas.needs_fit = true;
        }
        self.graph_cache.as_ref().map(|(_, graph)| graph)
    }

    /// Runs the minimum percentage filter over the loaded forest.
    pub fn apply_filter(&mut self) {
        let min_population = Some(self.min_population_threshold).filter(|t| *t > 0);
        if let Some(session) = &self.session {
            self.filter.apply(session.forest(), min_population);
        }
    }

    /// Resets fields that are not viewer settings.
    pub fn reset_non_ui_fields(&mut self) {
        *self = Self {
            min_population_threshold: self.min_population_threshold,
            base_population_override: self.base_population_override,
            layout_constants: self.layout_constants,
            tab: self.tab,
            dark_mode: self.dark_mode,
            side_panel_width: self.side_panel_width,
            ..Default::default()
        };
    }
}
