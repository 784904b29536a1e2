//! Graph rendering: a laid out tree to SVG, and SVG to a raster pixmap.
//!
//! The SVG string is the single drawing description; the raster form used by
//! the report is obtained by parsing it back with `usvg` and painting it with
//! `resvg` onto a `tiny-skia` pixmap.

use crate::constants;
use crate::layout::{LayoutGraph, NodeKind};
use lazy_static::lazy_static;
use std::fmt::Write as _;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while rasterizing a graph.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Generated SVG could not be parsed back
    #[error("failed to parse generated SVG: {0}")]
    Svg(#[from] usvg::Error),
    /// Target pixmap could not be allocated
    #[error("failed to allocate a {width}x{height} pixmap")]
    PixmapAllocation {
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
    },
}

lazy_static! {
    static ref FONT_DB: Arc<fontdb::Database> = {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        log::debug!("loaded {} font faces for graph rendering", db.len());
        Arc::new(db)
    };
}

/// Approximate advance of one character of a node label.
const LABEL_CHAR_WIDTH: f32 = 7.0;

fn hex(color: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

fn escape_xml(input: &str) -> String {
    let mut s = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => s.push_str("&amp;"),
            '<' => s.push_str("&lt;"),
            '>' => s.push_str("&gt;"),
            '"' => s.push_str("&quot;"),
            '\'' => s.push_str("&apos;"),
            _ => s.push(ch),
        }
    }
    s
}

/// Shortens a label so that it fits inside a box of the given width.
pub fn fit_label(label: &str, box_width: f32) -> String {
    let max_chars = ((box_width - 12.0) / LABEL_CHAR_WIDTH).floor().max(4.0) as usize;
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let mut out: String = label.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

/// Size of the drawing produced by [`build_svg`] for a graph.
pub fn svg_size(graph: &LayoutGraph) -> (u32, u32) {
    (
        graph.width.ceil().max(1.0) as u32,
        (graph.height + constants::TITLE_BAND_HEIGHT).ceil().max(1.0) as u32,
    )
}

/// Builds the SVG drawing of a laid out graph with a title band on top.
pub fn build_svg(graph: &LayoutGraph, title: &str) -> String {
    let (width, height) = svg_size(graph);
    let node_w = graph.constants.node_width;
    let node_h = graph.constants.node_height;
    let band = constants::TITLE_BAND_HEIGHT;

    let mut out = String::new();
    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">",
        width, height, width, height
    );
    let _ = writeln!(
        out,
        "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"#ffffff\" />",
        width, height
    );
    let _ = writeln!(
        out,
        "<text x=\"{:.1}\" y=\"{:.1}\" font-family=\"sans-serif\" font-size=\"16\" font-weight=\"bold\" fill=\"{}\" text-anchor=\"middle\" dominant-baseline=\"central\">{}</text>",
        width as f32 / 2.0,
        band / 2.0,
        hex(constants::NODE_TEXT_COLOR),
        escape_xml(title)
    );

    let _ = writeln!(out, "<g transform=\"translate(0,{:.1})\">", band);

    // Links first so boxes are drawn over curve ends
    let _ = writeln!(
        out,
        "<g stroke=\"{}\" stroke-width=\"1.5\" fill=\"none\">",
        hex(constants::LINK_COLOR)
    );
    for link in &graph.links {
        if let Some(((sx, sy), (tx, ty))) = graph.link_endpoints(link) {
            let mx = (sx + tx) / 2.0;
            let _ = writeln!(
                out,
                "  <path d=\"M{:.1},{:.1} C{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}\" />",
                sx, sy, mx, sy, mx, ty, tx, ty
            );
        }
    }
    let _ = writeln!(out, "</g>");

    // Link labels at the vertical midpoint
    let _ = writeln!(out, "<g font-family=\"sans-serif\" text-anchor=\"middle\">");
    for link in &graph.links {
        let Some(((sx, sy), (tx, ty))) = graph.link_endpoints(link) else {
            continue;
        };
        let mx = (sx + tx) / 2.0;
        let my = (sy + ty) / 2.0;
        let _ = writeln!(
            out,
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\" fill=\"{}\">{}</text>",
            mx,
            my - 8.0,
            hex(constants::LINK_LABEL_COLOR),
            escape_xml(&link.label)
        );
        if let (Some(count), Some(total)) = (link.target_count, link.total) {
            let _ = writeln!(
                out,
                "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" fill=\"{}\">{}/{}</text>",
                mx,
                my + 6.0,
                hex(constants::LINK_COUNT_COLOR),
                count,
                total
            );
        }
        if let Some(percentage) = link.percentage {
            let _ = writeln!(
                out,
                "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"10\" fill=\"{}\">{:.2}%</text>",
                mx,
                my + 18.0,
                hex(constants::LINK_PERCENT_COLOR),
                percentage
            );
        }
    }
    let _ = writeln!(out, "</g>");

    // Nodes
    for node in &graph.nodes {
        let (fill, stroke) = match node.kind {
            NodeKind::Leaf => constants::LEAF_COLORS,
            NodeKind::Node => constants::NODE_COLORS,
        };
        let _ = writeln!(
            out,
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" rx=\"{r}\" ry=\"{r}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\" />",
            node.x,
            node.y,
            node_w,
            node_h,
            hex(fill),
            hex(stroke),
            constants::NODE_STROKE_WIDTH,
            r = constants::NODE_CORNER_RADIUS
        );
        let _ = writeln!(
            out,
            "<text x=\"{:.1}\" y=\"{:.1}\" font-family=\"sans-serif\" font-size=\"13\" fill=\"{}\" text-anchor=\"middle\" dominant-baseline=\"central\">{}</text>",
            node.x + node_w / 2.0,
            node.y + node_h / 2.0,
            hex(constants::NODE_TEXT_COLOR),
            escape_xml(&fit_label(&node.label, node_w))
        );
    }

    let _ = writeln!(out, "</g>");
    let _ = writeln!(out, "</svg>");
    out
}

/// Renders a graph to a white-backed pixmap, `scale` pixels per layout unit.
pub fn render_to_raster(
    graph: &LayoutGraph,
    title: &str,
    scale: f32,
) -> Result<tiny_skia::Pixmap, RenderError> {
    let svg = build_svg(graph, title);
    let (width, height) = svg_size(graph);

    let opt = usvg::Options {
        fontdb: FONT_DB.clone(),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_data(svg.as_bytes(), &opt)?;

    let scale = scale.clamp(0.25, 8.0);
    let out_w = (width as f32 * scale).round().max(1.0) as u32;
    let out_h = (height as f32 * scale).round().max(1.0) as u32;
    let mut pixmap = tiny_skia::Pixmap::new(out_w, out_h).ok_or(RenderError::PixmapAllocation {
        width: out_w,
        height: out_h,
    })?;
    pixmap.fill(tiny_skia::Color::WHITE);

    let transform = tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());
    Ok(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{layout, LayoutConstants};
    use crate::types::TreeNode;
    use serde_json::json;

    fn age_graph() -> LayoutGraph {
        let tree: TreeNode = serde_json::from_value(json!({
            "type": "node",
            "variable": "Age",
            "branches": {
                "<30": {"count": 10, "percentage": 25.0, "total": 40},
                ">=30": {"count": 30, "percentage": 75.0, "total": 40}
            }
        }))
        .unwrap();
        layout(&tree, &LayoutConstants::default())
    }

    #[test]
    fn test_svg_contains_nodes_links_and_labels() {
        let svg = build_svg(&age_graph(), "Sick : True");
        assert_eq!(svg.matches("<rect").count(), 1 + 3);
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("&lt;30"));
        assert!(svg.contains("&gt;=30"));
        assert!(svg.contains("10/40"));
        assert!(svg.contains("75.00%"));
        assert!(svg.contains("Sick : True"));
        assert!(svg.contains("#dcfce7"));
        assert!(svg.contains("#e0f2fe"));
    }

    #[test]
    fn test_links_are_symmetric_s_curves() {
        let graph = age_graph();
        let svg = build_svg(&graph, "t");
        let ((sx, sy), (tx, ty)) = graph.link_endpoints(&graph.links[0]).unwrap();
        let mx = (sx + tx) / 2.0;
        let expected = format!(
            "M{:.1},{:.1} C{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}",
            sx, sy, mx, sy, mx, ty, tx, ty
        );
        assert!(svg.contains(&expected));
    }

    #[test]
    fn test_member_links_have_only_a_name() {
        let tree: TreeNode = serde_json::from_value(json!({
            "type": "multi_node",
            "nodes": {"Age": {"type": "leaf", "message": "1 (1.0%)"}}
        }))
        .unwrap();
        let svg = build_svg(&layout(&tree, &LayoutConstants::default()), "t");
        assert!(svg.contains(">Age</text>"));
        assert!(!svg.contains("%</text>"));
        assert!(!svg.contains("font-size=\"11\""));
    }

    #[test]
    fn test_long_labels_are_shortened() {
        let label = "x".repeat(100);
        let fitted = fit_label(&label, 180.0);
        assert!(fitted.chars().count() < 100);
        assert!(fitted.ends_with('…'));
        assert_eq!(fit_label("Age", 180.0), "Age");
    }

    #[test]
    fn test_raster_of_single_leaf() {
        let graph = layout(&TreeNode::leaf("3 (10.0%)"), &LayoutConstants::default());
        assert!(graph.links.is_empty());
        let pixmap = render_to_raster(&graph, "", 1.0).unwrap();
        let (w, h) = svg_size(&graph);
        assert_eq!((pixmap.width(), pixmap.height()), (w, h));
        // Corner stays white
        let corner = pixmap.pixel(0, 0).unwrap();
        assert_eq!((corner.red(), corner.green(), corner.blue(), corner.alpha()), (255, 255, 255, 255));
    }

    #[test]
    fn test_raster_scale() {
        let graph = age_graph();
        let pixmap = render_to_raster(&graph, "t", 0.5).unwrap();
        let (w, _) = svg_size(&graph);
        assert_eq!(pixmap.width(), (w as f32 * 0.5).round() as u32);
    }
}
