//! Cutting a tall raster into page-sized horizontal strips.

use crate::graph_render::RenderError;
use std::ops::Range;

/// Opaque RGB pixels of one strip, ready to be embedded in a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterStrip {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Row-major RGB bytes, `width * height * 3` long
    pub rgb: Vec<u8>,
}

/// Row ranges of the strips needed to cover `total_px` rows.
///
/// The first strip takes `first_px` rows when that is more than one row;
/// every other strip takes `full_px` rows, the last one possibly fewer.
/// Consecutive ranges touch, so no row is lost or repeated.
pub fn plan_strips(total_px: u32, first_px: u32, full_px: u32) -> Vec<Range<u32>> {
    let full_px = full_px.max(1);
    let mut ranges = Vec::new();
    let mut offset = 0;
    if first_px > 1 && total_px > 0 {
        let end = first_px.min(total_px);
        ranges.push(0..end);
        offset = end;
    }
    while offset < total_px {
        let end = (offset + full_px).min(total_px);
        ranges.push(offset..end);
        offset = end;
    }
    ranges
}

/// Copies `rows` of `source` onto a white canvas and returns them as RGB.
pub fn cut_strip(source: &tiny_skia::Pixmap, rows: Range<u32>) -> Result<RasterStrip, RenderError> {
    let width = source.width();
    let height = rows.end.saturating_sub(rows.start).max(1);
    let mut part = tiny_skia::Pixmap::new(width, height)
        .ok_or(RenderError::PixmapAllocation { width, height })?;
    part.fill(tiny_skia::Color::WHITE);
    part.draw_pixmap(
        0,
        -(rows.start as i32),
        source.as_ref(),
        &tiny_skia::PixmapPaint::default(),
        tiny_skia::Transform::identity(),
        None,
    );

    // Opaque after the white fill, so premultiplied equals straight RGB
    let rgb = part
        .data()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    Ok(RasterStrip { width, height, rgb })
}

/// The whole pixmap as a single strip.
pub fn whole(source: &tiny_skia::Pixmap) -> Result<RasterStrip, RenderError> {
    cut_strip(source, 0..source.height())
}
