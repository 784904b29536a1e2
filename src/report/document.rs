//! Page model of the report and the text flow that fills it.
//!
//! Coordinates are millimetres from the top-left corner of a page; text `y`
//! is the baseline. Nothing here knows about PDF.

use super::metrics::{text_width_mm, PT_TO_MM};
use super::slicing::RasterStrip;
use super::ReportOptions;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(r"\S+|\s+").unwrap();
}

/// An RGB color with 8-bit channels.
pub type Rgb8 = [u8; 3];

/// Plain black.
pub const BLACK: Rgb8 = [0, 0, 0];

/// Something drawn on a page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageItem {
    /// A run of text on one line
    Text {
        /// Left edge
        x: f32,
        /// Baseline
        y: f32,
        /// Font size in points
        size: f32,
        /// Bold face
        bold: bool,
        /// Fill color
        color: Rgb8,
        /// Content
        text: String,
    },
    /// A raster image
    Image {
        /// Left edge
        x: f32,
        /// Top edge
        y: f32,
        /// Width on the page
        width: f32,
        /// Height on the page
        height: f32,
        /// Pixels
        strip: RasterStrip,
    },
}

/// One page of the report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Items in drawing order
    pub items: Vec<PageItem>,
}

impl Page {
    /// Text runs of the page.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            PageItem::Text { text, .. } => Some(text.as_str()),
            PageItem::Image { .. } => None,
        })
    }

    /// Concatenated text of the page, one line per run.
    pub fn plain_text(&self) -> String {
        self.texts().collect::<Vec<_>>().join("\n")
    }
}

/// A colored piece of a line.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Content
    pub text: String,
    /// Fill color
    pub color: Rgb8,
}

impl Segment {
    /// Creates a segment.
    pub fn new(text: impl Into<String>, color: Rgb8) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }
}

/// Paginated document under construction, with a vertical cursor.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    pages: Vec<Page>,
    /// Vertical cursor on the current page
    pub y: f32,
    /// Font size used by flowing text
    pub font_size: f32,
    /// Bold face used by flowing text
    pub bold: bool,
    options: ReportOptions,
}

impl DocumentBuilder {
    /// Starts a document with one empty page.
    pub fn new(options: ReportOptions) -> Self {
        Self {
            pages: vec![Page::default()],
            y: options.margin_mm,
            font_size: options.body_font_size,
            bold: false,
            options,
        }
    }

    /// Geometry in use.
    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    /// Finishes the document.
    pub fn into_pages(self) -> Vec<Page> {
        self.pages
    }

    /// Pages built so far.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Opens a new page and moves the cursor to its top margin.
    pub fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = self.options.margin_mm;
    }

    fn current(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Lowest baseline flowing text may use.
    pub fn bottom_limit(&self) -> f32 {
        self.options.page_height_mm - self.options.text_bottom_margin_mm
    }

    /// Starts a new page when `needed` more millimetres would cross the bottom limit.
    pub fn ensure_space(&mut self, needed: f32) {
        if self.y + needed > self.bottom_limit() {
            self.new_page();
        }
    }

    /// Draws text at an absolute position without moving the cursor.
    pub fn text_at(&mut self, x: f32, y: f32, text: impl Into<String>, color: Rgb8) {
        let (size, bold) = (self.font_size, self.bold);
        self.current().items.push(PageItem::Text {
            x,
            y,
            size,
            bold,
            color,
            text: text.into(),
        });
    }

    /// Draws text at `x`, wrapped before the right margin; every row
    /// advances the cursor by `advance`.
    pub fn text_line(&mut self, x: f32, text: impl Into<String>, color: Rgb8, advance: f32) {
        let text = text.into();
        let max_width = self.options.page_width_mm - self.options.margin_mm - x;
        for row in wrap_words(&text, self.font_size, self.bold, max_width) {
            self.ensure_space(self.options.line_height_mm);
            let y = self.y;
            self.text_at(x, y, row, color);
            self.y += advance;
        }
    }

    /// Draws text centered horizontally around baseline `y`, wrapped to the
    /// printable width. Returns the baseline of the last line.
    pub fn centered(&mut self, y: f32, text: &str, color: Rgb8) -> f32 {
        let max_width = self.options.page_width_mm - 2.0 * self.options.margin_mm;
        let advance = self.font_size * PT_TO_MM * 1.3;
        let mut line_y = y;
        let rows = wrap_words(text, self.font_size, self.bold, max_width);
        for (index, line) in rows.into_iter().enumerate() {
            if index > 0 {
                line_y += advance;
            }
            let width = text_width_mm(&line, self.font_size, self.bold);
            let x = ((self.options.page_width_mm - width) / 2.0).max(self.options.margin_mm);
            self.text_at(x, line_y, line, color);
        }
        line_y
    }

    /// Flowing single-color line, wrapped within the margins.
    pub fn line(&mut self, text: &str, color: Rgb8) {
        self.rich_line(&[Segment::new(text, color)]);
    }

    /// Flowing line made of colored segments, wrapped within the margins.
    ///
    /// Each wrapped row advances the cursor by the line height and moves to a
    /// new page when the bottom limit is reached.
    pub fn rich_line(&mut self, segments: &[Segment]) {
        let line_height = self.options.line_height_mm;
        let left = self.options.margin_mm;
        let max_x = self.options.page_width_mm - self.options.margin_mm;
        self.ensure_space(line_height);

        let mut x = left;
        let mut run = Run::new(left, BLACK);
        let (size, bold) = (self.font_size, self.bold);
        for segment in segments {
            for token in TOKEN_RE.find_iter(&segment.text) {
                for piece in split_to_width(token.as_str(), size, bold, max_x - left) {
                    let width = text_width_mm(&piece, size, bold);
                    if x + width > max_x && x > left {
                        self.flush(&mut run);
                        self.y += line_height;
                        self.ensure_space(line_height);
                        x = left;
                        if piece.trim().is_empty() {
                            continue;
                        }
                    }
                    if run.color != segment.color {
                        self.flush(&mut run);
                    }
                    if run.text.is_empty() {
                        run = Run::new(x, segment.color);
                    }
                    run.text.push_str(&piece);
                    x += width;
                }
            }
        }
        self.flush(&mut run);
        self.y += line_height;
    }

    fn flush(&mut self, run: &mut Run) {
        if !run.text.trim().is_empty() {
            let y = self.y;
            let text = std::mem::take(&mut run.text);
            self.text_at(run.x, y, text, run.color);
        }
        run.text.clear();
    }

    /// Places an image with its top edge at `y`.
    pub fn image_at(&mut self, y: f32, width: f32, height: f32, strip: RasterStrip) {
        let x = self.options.margin_mm;
        self.current().items.push(PageItem::Image {
            x,
            y,
            width,
            height,
            strip,
        });
    }
}

struct Run {
    x: f32,
    color: Rgb8,
    text: String,
}

impl Run {
    fn new(x: f32, color: Rgb8) -> Self {
        Self {
            x,
            color,
            text: String::new(),
        }
    }
}

/// Cuts a token into pieces no wider than `max_width`, at character boundaries.
fn split_to_width(token: &str, size_pt: f32, bold: bool, max_width: f32) -> Vec<String> {
    if text_width_mm(token, size_pt, bold) <= max_width {
        return vec![token.to_string()];
    }
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in token.chars() {
        current.push(ch);
        if text_width_mm(&current, size_pt, bold) > max_width && current.chars().count() > 1 {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(ch);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Greedy word wrap against the measured text width. Words wider than a
/// whole row are cut.
pub fn wrap_words(text: &str, size_pt: f32, bold: bool, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        for piece in split_to_width(word, size_pt, bold, max_width) {
            let candidate = if current.is_empty() {
                piece.clone()
            } else {
                format!("{} {}", current, piece)
            };
            if text_width_mm(&candidate, size_pt, bold) <= max_width || current.is_empty() {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current = piece;
            }
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
