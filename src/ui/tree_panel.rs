//! Expand/collapse view of the whole forest.
//!
//! The view model comes from [`crate::tree_view`]; this module only draws it
//! and collects the toggles clicked during the frame.

use super::state::DecisionTreeApp;
use crate::format;
use crate::tree_view::{
    self, BranchBody, BranchView, ExpansionState, NodePath, NodeView, TreeKey, ViewOptions,
};
use eframe::egui;

/// A header clicked during the frame, applied once drawing is done.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Toggle {
    Tree(TreeKey),
    Node(NodePath),
}

const STOPPED_COLOR: egui::Color32 = egui::Color32::from_rgb(234, 88, 12);
const SHARE_COLOR: egui::Color32 = egui::Color32::from_rgb(109, 40, 217);

fn arrow(expanded: bool) -> &'static str {
    if expanded {
        "▼"
    } else {
        "▶"
    }
}

impl DecisionTreeApp {
    /// Draws the tree tab.
    pub(super) fn draw_tree_view(&mut self, ui: &mut egui::Ui) {
        let base_population = self.base_population();
        let Some(session) = &self.session else {
            ui.centered_and_justified(|ui| {
                ui.label("Open an analysis file to explore its decision trees.");
            });
            return;
        };

        let options = ViewOptions {
            min_population_threshold: self.min_population_threshold,
            base_population,
            selections: &session.selected_column_values,
        };
        let groups = tree_view::forest_view(session.forest(), &self.expansion, &options);

        let mut toggles = Vec::new();
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if groups.is_empty() {
                    ui.label("The analysis contains no decision tree.");
                }
                for group in &groups {
                    let header = format!(
                        "{} {}  ({} values)",
                        arrow(group.expanded),
                        group.title,
                        group.value_count
                    );
                    if ui
                        .selectable_label(group.expanded, egui::RichText::new(header).strong())
                        .clicked()
                    {
                        toggles.push(Toggle::Tree(group.key.clone()));
                    }
                    if !group.expanded {
                        continue;
                    }
                    ui.indent(("group", &group.key.0), |ui| {
                        for value in &group.values {
                            ui.label(
                                egui::RichText::new(format!("{} = {}", group.key.0, value.display_value))
                                    .italics(),
                            );
                            ui.indent(("value", value.value), |ui| {
                                draw_node(ui, &value.tree, &mut toggles);
                            });
                            ui.add_space(6.0);
                        }
                    });
                    ui.separator();
                }
            });

        apply_toggles(&mut self.expansion, toggles);
    }
}

fn apply_toggles(state: &mut ExpansionState, toggles: Vec<Toggle>) {
    for toggle in toggles {
        match toggle {
            Toggle::Tree(key) => state.toggle_tree(&key),
            Toggle::Node(path) => state.toggle_node(&path),
        }
    }
}

fn draw_node(ui: &mut egui::Ui, node: &NodeView<'_>, toggles: &mut Vec<Toggle>) {
    match node {
        NodeView::Leaf { message } => {
            ui.label(*message);
        }
        NodeView::Multi {
            path,
            member_count,
            expanded,
            members,
        } => {
            let header = format!("{} {} variables", arrow(*expanded), member_count);
            if ui.selectable_label(*expanded, header).clicked() {
                toggles.push(Toggle::Node(path.clone()));
            }
            for member in members {
                ui.indent(("member", member.name), |ui| {
                    ui.label(egui::RichText::new(member.name).strong());
                    draw_node(ui, &member.node, toggles);
                });
            }
        }
        NodeView::Decision {
            path,
            variable,
            variance,
            expanded,
            left,
            right,
        } => {
            let mut header = format!("{} {}", arrow(*expanded), variable);
            if let Some(variance) = variance {
                header.push_str(&format!("  (variance {:.4})", variance));
            }
            if ui
                .selectable_label(*expanded, egui::RichText::new(header).strong())
                .clicked()
            {
                toggles.push(Toggle::Node(path.clone()));
            }
            if !*expanded {
                return;
            }
            ui.columns(2, |columns| {
                for branch in left {
                    draw_branch(&mut columns[0], branch, toggles);
                }
                for branch in right {
                    draw_branch(&mut columns[1], branch, toggles);
                }
            });
        }
        NodeView::Empty => {}
    }
}

fn draw_branch(ui: &mut egui::Ui, branch: &BranchView<'_>, toggles: &mut Vec<Toggle>) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.label(egui::RichText::new(&branch.display_value).strong());
        ui.label(format!(
            "{}/{} cases  {}",
            branch.count,
            branch.total,
            format::percent_text(branch.percentage)
        ));
        if let Some(share) = branch.population_share {
            ui.label(
                egui::RichText::new(format!("{} of the population", format::percent_text(share)))
                    .color(SHARE_COLOR)
                    .small(),
            );
        }
        match &branch.body {
            BranchBody::Stopped { threshold } => {
                let text = if branch.total == 0 {
                    "Stopped: no cases reach this branch".to_string()
                } else {
                    format!("Stopped: insufficient population (< {})", threshold)
                };
                ui.label(egui::RichText::new(text).color(STOPPED_COLOR).italics());
            }
            BranchBody::Terminal => {}
            BranchBody::Subtree(node) => {
                draw_node(ui, node, toggles);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggles_flip_only_their_key() {
        let mut state = ExpansionState::default();
        let path = NodePath::root("Sick", "Yes");
        apply_toggles(
            &mut state,
            vec![Toggle::Tree(TreeKey("Sick".into())), Toggle::Node(path.clone())],
        );
        assert!(state.is_tree_expanded(&TreeKey("Sick".into())));
        assert!(state.is_node_expanded(&path));
        assert!(!state.is_tree_expanded(&TreeKey("Other".into())));
        apply_toggles(&mut state, vec![Toggle::Node(path.clone())]);
        assert!(!state.is_node_expanded(&path));
    }
}
