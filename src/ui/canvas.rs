//! Graph canvas navigation functionality.
//!
//! This module handles canvas panning, zooming and fitting, and the coordinate
//! transformations between screen and layout space.

use super::state::DecisionTreeApp;
use eframe::egui;

/// Smallest zoom factor reachable with the scroll wheel.
pub const MIN_ZOOM: f32 = 0.25;
/// Largest zoom factor reachable with the scroll wheel.
pub const MAX_ZOOM: f32 = 5.0;
const ZOOM_STEP: f32 = 0.025;

impl DecisionTreeApp {
    /// Converts screen coordinates to layout coordinates accounting for zoom and pan.
    pub fn screen_to_world(&self, screen_pos: egui::Pos2) -> egui::Pos2 {
        (screen_pos - self.canvas.offset) / self.canvas.zoom_factor
    }

    /// Converts layout coordinates to screen coordinates accounting for zoom and pan.
    pub fn world_to_screen(&self, world_pos: egui::Pos2) -> egui::Pos2 {
        world_pos * self.canvas.zoom_factor + self.canvas.offset
    }

    /// Handles primary or middle button dragging to pan the canvas.
    pub fn handle_canvas_panning(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let dragging = response.dragged_by(egui::PointerButton::Primary)
            || response.dragged_by(egui::PointerButton::Middle);
        if dragging {
            self.canvas.offset += ui.input(|i| i.pointer.delta());
        }
    }

    /// Handles scroll wheel zooming.
    ///
    /// Zooms in/out while keeping the layout point under the cursor fixed.
    /// Zoom range is clamped between [`MIN_ZOOM`] and [`MAX_ZOOM`].
    pub fn handle_canvas_zoom(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let scroll_delta = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll_delta == 0.0 {
            return;
        }
        let Some(mouse_pos) = ui
            .input(|i| i.pointer.hover_pos())
            .or_else(|| response.interact_pointer_pos())
        else {
            return;
        };
        if !response.rect.contains(mouse_pos) {
            return;
        }
        let step = if scroll_delta > 0.0 { ZOOM_STEP } else { -ZOOM_STEP };
        self.zoom_around(mouse_pos, self.canvas.zoom_factor + step);
    }

    /// Sets the zoom factor, keeping the layout point under `anchor` in place.
    pub fn zoom_around(&mut self, anchor: egui::Pos2, zoom: f32) {
        let world_before = self.screen_to_world(anchor);
        let old_zoom = self.canvas.zoom_factor;
        self.canvas.zoom_factor = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if (self.canvas.zoom_factor - old_zoom).abs() > f32::EPSILON {
            let after = self.world_to_screen(world_before);
            self.canvas.offset += anchor - after;
        }
    }

    /// Centers a graph of the given size in `rect`, shrinking it if needed.
    pub fn fit_to_rect(&mut self, graph_size: egui::Vec2, rect: egui::Rect) {
        if graph_size.x <= 0.0 || graph_size.y <= 0.0 {
            return;
        }
        let scale = (rect.width() / graph_size.x).min(rect.height() / graph_size.y);
        self.canvas.zoom_factor = scale.clamp(MIN_ZOOM, 1.0);
        let scaled = graph_size * self.canvas.zoom_factor;
        self.canvas.offset = rect.center().to_vec2() - scaled / 2.0;
        self.canvas.needs_fit = false;
    }

    /// Draws the graph tab: the selected tree with pan and zoom.
    pub(super) fn draw_graph_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());

        if self.selected_graph().is_none() {
            painter.text(
                response.rect.center(),
                egui::Align2::CENTER_CENTER,
                "No tree selected",
                egui::FontId::proportional(16.0),
                ui.visuals().weak_text_color(),
            );
            return;
        }

        if self.canvas.needs_fit {
            if let Some(graph) = self.selected_graph() {
                let size = egui::vec2(graph.width, graph.height);
                self.fit_to_rect(size, response.rect.shrink(8.0));
            }
        }

        self.handle_canvas_panning(ui, &response);
        self.handle_canvas_zoom(ui, &response);

        if response.double_clicked() {
            self.canvas.needs_fit = true;
        }

        if let Some((_, graph)) = &self.graph_cache {
            self.render_graph(&painter, graph);
        }
    }
}
