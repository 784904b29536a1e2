//! Shared application-wide constants.
//! Centralizes tweakable values used by the layout engine, the renderers and the report.

// Node geometry
/// Width of a node box in layout units.
pub const NODE_WIDTH: f32 = 180.0;
/// Height of a node box in layout units.
pub const NODE_HEIGHT: f32 = 50.0;
/// Horizontal distance between two tree depths.
pub const X_GAP: f32 = 240.0;
/// Vertical gap between two consecutive leaf slots.
pub const Y_GAP: f32 = 80.0;
/// Padding around the laid out graph.
pub const LAYOUT_PADDING: f32 = 20.0;
/// Extra room on the right of the deepest column.
pub const LAYOUT_RIGHT_MARGIN: f32 = 60.0;
/// Minimum width of a laid out canvas.
pub const MIN_CANVAS_WIDTH: f32 = 1100.0;
/// Minimum height of a laid out canvas (before padding).
pub const MIN_CANVAS_HEIGHT: f32 = 600.0;

// Drawing
/// Corner radius of node boxes.
pub const NODE_CORNER_RADIUS: f32 = 8.0;
/// Stroke width of node outlines.
pub const NODE_STROKE_WIDTH: f32 = 1.5;
/// Height reserved above the graph for its title.
pub const TITLE_BAND_HEIGHT: f32 = 40.0;
/// Leaf palette as (fill, stroke).
pub const LEAF_COLORS: ([u8; 3], [u8; 3]) = ([0xdc, 0xfc, 0xe7], [0x16, 0xa3, 0x4a]);
/// Decision node palette as (fill, stroke).
pub const NODE_COLORS: ([u8; 3], [u8; 3]) = ([0xe0, 0xf2, 0xfe], [0x02, 0x84, 0xc7]);
/// Link curve color.
pub const LINK_COLOR: [u8; 3] = [0x94, 0xa3, 0xb8];
/// Branch value label color.
pub const LINK_LABEL_COLOR: [u8; 3] = [0x47, 0x55, 0x69];
/// `count/total` label color.
pub const LINK_COUNT_COLOR: [u8; 3] = [0x0f, 0x17, 0x2a];
/// Percentage label color.
pub const LINK_PERCENT_COLOR: [u8; 3] = [0x64, 0x74, 0x8b];
/// Node label color.
pub const NODE_TEXT_COLOR: [u8; 3] = [0x0f, 0x17, 0x2a];

// Report pages (millimetres, A4 landscape)
/// Page width.
pub const PAGE_WIDTH_MM: f32 = 297.0;
/// Page height.
pub const PAGE_HEIGHT_MM: f32 = 210.0;
/// Left/right/top margin.
pub const PAGE_MARGIN_MM: f32 = 20.0;
/// Bottom limit used by flowing text.
pub const TEXT_BOTTOM_MARGIN_MM: f32 = 10.0;
/// Advance of one wrapped text line.
pub const LINE_HEIGHT_MM: f32 = 6.0;

// Cover page sample preview
/// Maximum number of filtered columns previewed on the cover page.
pub const PREVIEW_MAX_COLUMNS: usize = 8;
/// Maximum number of values previewed per column.
pub const PREVIEW_MAX_VALUES: usize = 8;

/// Placeholder used when a combined value has no known selections.
pub const COMBINED_PLACEHOLDER: &str = "Combined modalities";
