//! Canvas rendering of a laid out tree: link curves with their labels, then
//! node boxes on top.

use super::state::DecisionTreeApp;
use crate::constants;
use crate::graph_render::fit_label;
use crate::layout::{LayoutGraph, NodeKind, PositionedLink};
use eframe::egui;
use eframe::epaint::{CubicBezierShape, StrokeKind};

fn color(rgb: [u8; 3]) -> egui::Color32 {
    egui::Color32::from_rgb(rgb[0], rgb[1], rgb[2])
}

impl DecisionTreeApp {
    /// Renders all graph elements on the canvas.
    pub fn render_graph(&self, painter: &egui::Painter, graph: &LayoutGraph) {
        // White sheet behind the graph so the palette reads the same in both themes
        let sheet = egui::Rect::from_min_max(
            self.world_to_screen(egui::Pos2::ZERO),
            self.world_to_screen(egui::pos2(graph.width, graph.height)),
        );
        painter.rect_filled(sheet, 4.0, egui::Color32::WHITE);

        for link in &graph.links {
            self.draw_link(painter, graph, link);
        }
        for link in &graph.links {
            self.draw_link_labels(painter, graph, link);
        }

        let zoom = self.canvas.zoom_factor;
        let size = egui::vec2(graph.constants.node_width, graph.constants.node_height) * zoom;
        let font = egui::FontId::proportional((13.0 * zoom).clamp(6.0, 32.0));
        for node in &graph.nodes {
            let min = self.world_to_screen(egui::pos2(node.x, node.y));
            let rect = egui::Rect::from_min_size(min, size);
            let (fill, stroke) = match node.kind {
                NodeKind::Leaf => constants::LEAF_COLORS,
                NodeKind::Node => constants::NODE_COLORS,
            };
            let radius = constants::NODE_CORNER_RADIUS * zoom;
            painter.rect_filled(rect, radius, color(fill));
            painter.rect_stroke(
                rect,
                radius,
                egui::Stroke::new(constants::NODE_STROKE_WIDTH, color(stroke)),
                StrokeKind::Inside,
            );
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                fit_label(&node.label, graph.constants.node_width),
                font.clone(),
                color(constants::NODE_TEXT_COLOR),
            );
        }
    }

    fn link_screen_points(
        &self,
        graph: &LayoutGraph,
        link: &PositionedLink,
    ) -> Option<(egui::Pos2, egui::Pos2)> {
        let ((sx, sy), (tx, ty)) = graph.link_endpoints(link)?;
        Some((
            self.world_to_screen(egui::pos2(sx, sy)),
            self.world_to_screen(egui::pos2(tx, ty)),
        ))
    }

    fn draw_link(&self, painter: &egui::Painter, graph: &LayoutGraph, link: &PositionedLink) {
        let Some((start, end)) = self.link_screen_points(graph, link) else {
            return;
        };
        let mid_x = (start.x + end.x) / 2.0;
        let curve = CubicBezierShape::from_points_stroke(
            [start, egui::pos2(mid_x, start.y), egui::pos2(mid_x, end.y), end],
            false,
            egui::Color32::TRANSPARENT,
            egui::Stroke::new(1.5, color(constants::LINK_COLOR)),
        );
        painter.add(curve);
    }

    /// Branch value, `count/total` and percentage stacked at the curve midpoint.
    fn draw_link_labels(&self, painter: &egui::Painter, graph: &LayoutGraph, link: &PositionedLink) {
        let Some((start, end)) = self.link_screen_points(graph, link) else {
            return;
        };
        let zoom = self.canvas.zoom_factor;
        let mid = egui::pos2((start.x + end.x) / 2.0, (start.y + end.y) / 2.0);
        let font = |size: f32| egui::FontId::proportional((size * zoom).clamp(5.0, 30.0));

        painter.text(
            mid + egui::vec2(0.0, -8.0 * zoom),
            egui::Align2::CENTER_BOTTOM,
            &link.label,
            font(12.0),
            color(constants::LINK_LABEL_COLOR),
        );
        if let (Some(count), Some(total)) = (link.target_count, link.total) {
            painter.text(
                mid + egui::vec2(0.0, 6.0 * zoom),
                egui::Align2::CENTER_BOTTOM,
                format!("{}/{}", count, total),
                font(11.0),
                color(constants::LINK_COUNT_COLOR),
            );
        }
        if let Some(percentage) = link.percentage {
            painter.text(
                mid + egui::vec2(0.0, 18.0 * zoom),
                egui::Align2::CENTER_BOTTOM,
                format!("{:.2}%", percentage),
                font(10.0),
                color(constants::LINK_PERCENT_COLOR),
            );
        }
    }
}
