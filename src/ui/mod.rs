//! User interface of the decision tree viewer.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main DecisionTreeApp
//! - `file_ops` - Loading analyses and exporting reports through async dialogs
//! - `canvas` - Graph canvas navigation, zooming and panning
//! - `rendering` - Drawing a laid out tree with the egui painter
//! - `tree_panel` - Expand/collapse view of the forest

mod canvas;
mod file_ops;
mod rendering;
mod state;
mod tree_panel;


pub use state::DecisionTreeApp;

use self::state::ViewTab;
use crate::format;
use eframe::egui;

impl eframe::App for DecisionTreeApp {
    /// Persist viewer settings between restarts.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match self.to_json() {
            Ok(json) => {
                storage.set_string("app_state", json);
            }
            Err(err) => {
                log::error!("Failed to serialize app state: {err}");
            }
        }
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.draw_ui(ctx);
    }
}

impl DecisionTreeApp {
    /// Draws one frame: toolbar, settings panel, central view and alerts.
    pub fn draw_ui(&mut self, ctx: &egui::Context) {
        let visuals = if self.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);

        self.handle_pending_operations(ctx);

        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        let viewport_width = ctx.input(|i| i.screen_rect().width());
        let max_allowed = (viewport_width * 0.9).max(180.0);
        let clamped_width = self.side_panel_width.clamp(180.0, max_allowed);
        egui::SidePanel::left("settings_panel")
            .resizable(true)
            .default_width(clamped_width)
            .show(ctx, |ui| {
                self.side_panel_width = ui.available_width().clamp(180.0, max_allowed);
                self.draw_settings_panel(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| match self.tab {
            ViewTab::Tree => self.draw_tree_view(ui),
            ViewTab::Graph => self.draw_graph_selector_and_canvas(ui),
        });

        self.draw_alert(ctx);

        if self.file.is_loading || self.file.is_exporting {
            ctx.request_repaint();
        }
    }

    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.add_enabled_ui(!self.file.is_loading, |ui| {
                if ui.button("Open analysis…").clicked() {
                    self.open_analysis();
                }
            });
            if self.file.is_loading {
                ui.spinner();
            }
            ui.add_enabled_ui(self.session.is_some() && !self.file.is_exporting, |ui| {
                if ui.button("Export PDF…").clicked() {
                    self.export_pdf();
                }
            });

            ui.separator();

            ui.selectable_value(&mut self.tab, ViewTab::Tree, "Tree");
            ui.selectable_value(&mut self.tab, ViewTab::Graph, "Graph");

            ui.separator();

            ui.checkbox(&mut self.dark_mode, "Dark mode");

            ui.separator();

            if let Some(session) = &self.session {
                ui.label(
                    egui::RichText::new(&session.decision_tree_data.filename).strong(),
                );
                ui.label(format!("({})", session.treatment_mode().label()));
            }
            if let Some(status) = &self.file.status {
                ui.label(egui::RichText::new(status).weak());
            }
        });
    }

    fn draw_settings_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Settings");
        ui.add_space(4.0);

        ui.horizontal(|ui| {
            ui.label("Min population:");
            ui.add(egui::DragValue::new(&mut self.min_population_threshold));
        });

        let mut use_override = self.base_population_override.is_some();
        if ui.checkbox(&mut use_override, "Custom base population").changed() {
            self.base_population_override = if use_override {
                Some(self.base_population().unwrap_or(0))
            } else {
                None
            };
        }
        if let Some(base) = &mut self.base_population_override {
            ui.add(egui::DragValue::new(base));
        } else if let Some(base) = self.base_population() {
            ui.label(egui::RichText::new(format!("Base population: {}", base)).weak());
        }

        ui.separator();
        ui.label("Minimum percentage:");
        let mut run_filter = false;
        ui.horizontal(|ui| {
            let edit = ui.add(
                egui::TextEdit::singleline(&mut self.filter.input)
                    .hint_text("e.g. 5.0")
                    .desired_width(80.0),
            );
            if edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                run_filter = true;
            }
            ui.add_enabled_ui(self.session.is_some(), |ui| {
                if ui.button("Filter").clicked() {
                    run_filter = true;
                }
            });
            if ui.button("Reset").clicked() {
                self.filter.reset();
            }
        });
        if run_filter {
            self.apply_filter();
        }
        if let Some(err) = &self.filter.error {
            let color = ui.visuals().error_fg_color;
            ui.colored_label(color, err.to_string());
        }
        self.draw_filter_results(ui);

        if self.session.is_some() {
            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("Expand all").clicked() {
                    if let Some(session) = &self.session {
                        self.expansion.expand_all(session.forest());
                    }
                }
                if ui.button("Collapse all").clicked() {
                    self.expansion.collapse_all();
                }
            });
        }
    }

    fn draw_filter_results(&self, ui: &mut egui::Ui) {
        let Some(results) = &self.filter.results else {
            return;
        };
        ui.label(format!("{} matching outcomes", results.len()));
        let selections = self.session.as_ref().map(|s| &s.selected_column_values);
        egui::ScrollArea::vertical()
            .id_salt("filter_results")
            .max_height(320.0)
            .show(ui, |ui| {
                for leaf in results {
                    let value = match selections {
                        Some(selections) => format::display_value(&leaf.target_value, selections),
                        None => leaf.target_value.clone(),
                    };
                    ui.group(|ui| {
                        ui.label(
                            egui::RichText::new(format!(
                                "{} - {} = {}",
                                format::percent_text(leaf.percentage),
                                leaf.target_variable,
                                value
                            ))
                            .strong(),
                        );
                        ui.label(format!(
                            "{} / {} cases",
                            leaf.count,
                            leaf.total_or_estimate()
                        ));
                        for step in &leaf.path {
                            ui.label(egui::RichText::new(format!("→ {}", step)).small());
                        }
                    });
                }
            });
    }

    fn draw_graph_selector_and_canvas(&mut self, ui: &mut egui::Ui) {
        let keys = self.tree_keys();
        if keys.is_empty() {
            self.draw_graph_canvas(ui);
            return;
        }
        let selected_text = self
            .selected_tree
            .as_ref()
            .map(|(variable, value)| self.tree_label(variable, value))
            .unwrap_or_else(|| "Select a tree".to_string());
        let entries: Vec<_> = keys
            .into_iter()
            .map(|key| {
                let text = self.tree_label(&key.0, &key.1);
                (key, text)
            })
            .collect();
        ui.horizontal(|ui| {
            egui::ComboBox::from_id_salt("tree_selector")
                .selected_text(selected_text)
                .show_ui(ui, |ui| {
                    for (key, text) in entries {
                        ui.selectable_value(&mut self.selected_tree, Some(key), text);
                    }
                });
            if ui.button("Fit").clicked() {
                self.canvas.needs_fit = true;
            }
            ui.label(format!("{:.0}%", self.canvas.zoom_factor * 100.0));
        });
        self.draw_graph_canvas(ui);
    }

    /// Selector text of a tree, with a combined target value spelled out.
    pub(crate) fn tree_label(&self, variable: &str, value: &str) -> String {
        let value = match &self.session {
            Some(session) => format::display_value(value, &session.selected_column_values),
            None => value.to_string(),
        };
        format!("{} : {}", variable, value)
    }

    fn draw_alert(&mut self, ctx: &egui::Context) {
        let Some(alert) = self.file.alert.clone() else {
            return;
        };
        egui::Window::new(alert.title.as_str())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(&alert.message);
                ui.horizontal(|ui| {
                    if alert.retry && ui.button("Retry").clicked() {
                        self.retry_load();
                    }
                    if ui.button("Dismiss").clicked() {
                        self.file.alert = None;
                    }
                });
            });
    }
}
