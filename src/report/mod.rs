//! Paginated PDF report of a decision forest.
//!
//! The report is built in two passes: [`build_document`] lays out pages in
//! millimetres (cover, then a title page and a content page per target value),
//! and [`pdf::write_pdf`] serializes them. Graph images come from
//! [`crate::graph_render`] and are sliced across pages when too tall.

pub mod document;
pub mod metrics;
pub mod pdf;
pub mod slicing;

use crate::constants;
use crate::format::{self, percent_text, value_tone, ValueTone};
use crate::graph_render::{self, RenderError};
use crate::layout::{self, LayoutConstants};
use crate::leaves::{extract_tree_leaves, sort_by_percentage, EmptyBranchPolicy};
use crate::types::*;
use document::{DocumentBuilder, Page, Rgb8, Segment, BLACK};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

const PURPLE: Rgb8 = [109, 40, 217];
const VIOLET: Rgb8 = [147, 51, 234];
const GRAY: Rgb8 = [55, 65, 81];
const LIGHT_GRAY: Rgb8 = [107, 114, 128];
const BLUE: Rgb8 = [37, 99, 235];
const GREEN: Rgb8 = [16, 163, 69];
const RED: Rgb8 = [239, 68, 68];
const ORANGE: Rgb8 = [234, 88, 12];

/// Text drawn in place of a graph that could not be rendered.
pub const DIAGRAM_PLACEHOLDER: &str = "Diagram generation failed";

/// Errors raised while producing or saving a report.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The PDF writer failed
    #[error("PDF generation failed: {0}")]
    Pdf(String),
    /// The report could not be written to disk
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Page geometry and typography of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    /// Pixels per layout unit of the graph raster
    pub raster_scale: f32,
    /// Page width in millimetres
    pub page_width_mm: f32,
    /// Page height in millimetres
    pub page_height_mm: f32,
    /// Left, right and top margin
    pub margin_mm: f32,
    /// Distance kept between flowing text and the bottom edge
    pub text_bottom_margin_mm: f32,
    /// Advance of one flowing line
    pub line_height_mm: f32,
    /// Size of flowing text
    pub body_font_size: f32,
    /// Size of the cover title
    pub cover_title_font_size: f32,
    /// Size of the per-tree title pages
    pub tree_title_font_size: f32,
    /// Geometry of the embedded graphs
    pub layout: LayoutConstants,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            raster_scale: 2.0,
            page_width_mm: constants::PAGE_WIDTH_MM,
            page_height_mm: constants::PAGE_HEIGHT_MM,
            margin_mm: constants::PAGE_MARGIN_MM,
            text_bottom_margin_mm: constants::TEXT_BOTTOM_MARGIN_MM,
            line_height_mm: constants::LINE_HEIGHT_MM,
            body_font_size: 12.0,
            cover_title_font_size: 20.0,
            tree_title_font_size: 28.0,
            layout: LayoutConstants::default(),
        }
    }
}

/// Everything the report shows besides the trees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Name of the analysed file
    pub filename: String,
    /// Target columns
    pub target_variables: Vec<String>,
    /// Predictor columns
    pub explanatory_variables: Vec<String>,
    /// Values selected on the target columns
    pub selections: SelectedValues,
    /// Values selected on other columns to filter the sample
    pub sample_selections: SelectedValues,
    /// How target variables were treated
    pub treatment_mode: TreatmentMode,
    /// Rows left after sample filtering
    pub filtered_sample_size: Option<u64>,
    /// Rows in the analysed file
    pub original_sample_size: Option<u64>,
}

impl ReportMetadata {
    /// Collects the metadata of a loaded session.
    pub fn from_session(session: &AnalysisSession) -> Self {
        let response = &session.decision_tree_data;
        Self {
            filename: response.filename.clone(),
            target_variables: response.target_variables.clone(),
            explanatory_variables: response.explanatory_variables.clone(),
            selections: session.selected_column_values.clone(),
            sample_selections: session.selected_remaining_data.clone(),
            treatment_mode: session.treatment_mode(),
            filtered_sample_size: response.filtered_sample_size,
            original_sample_size: response.original_sample_size,
        }
    }

    /// Variable and value as shown for one tree.
    ///
    /// Combined values of a `together` forest name every target variable and
    /// spell out the selections.
    pub fn display_pair(&self, variable: &str, value: &str) -> (String, String) {
        if self.treatment_mode == TreatmentMode::Together && format::is_combined(value) {
            (
                self.target_variables.join(" + "),
                format::combined_display(&self.selections),
            )
        } else {
            (variable.to_string(), value.to_string())
        }
    }
}

/// `decision_tree_report_{name without extension}.pdf`.
pub fn report_filename(source: &str) -> String {
    let stem = match source.rfind('.') {
        Some(dot) if dot > 0 => &source[..dot],
        _ => source,
    };
    format!("decision_tree_report_{}.pdf", stem)
}

/// Builds the report of a forest and returns the PDF bytes.
pub fn export_report(forest: &DecisionForest, meta: &ReportMetadata) -> Result<Vec<u8>, ExportError> {
    export_report_with(forest, meta, &ReportOptions::default())
}

/// [`export_report`] with explicit options.
pub fn export_report_with(
    forest: &DecisionForest,
    meta: &ReportMetadata,
    options: &ReportOptions,
) -> Result<Vec<u8>, ExportError> {
    let pages = build_document(forest, meta, options, |tree, title| {
        let graph = layout::layout(tree, &options.layout);
        graph_render::render_to_raster(&graph, title, options.raster_scale)
    });
    log::info!("writing report of {} pages for {}", pages.len(), meta.filename);
    pdf::write_pdf(&pages, "Decision Tree Analysis Report", options)
}

/// Writes report bytes to disk.
pub fn save_report(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Lays out every page of the report.
///
/// `render` produces the graph raster of one tree; a failure is replaced by
/// a placeholder and the remaining trees are still reported.
pub fn build_document<F>(
    forest: &DecisionForest,
    meta: &ReportMetadata,
    options: &ReportOptions,
    render: F,
) -> Vec<Page>
where
    F: Fn(&TreeNode, &str) -> Result<tiny_skia::Pixmap, RenderError>,
{
    let mut doc = DocumentBuilder::new(options.clone());
    cover_page(&mut doc, meta);

    for (variable, values) in forest {
        for (value, tree) in values {
            log::info!("adding decision tree {} : {} to the report", variable, value);
            let (display_var, display_val) = meta.display_pair(variable, value);

            // Title page
            doc.new_page();
            doc.font_size = options.tree_title_font_size;
            doc.bold = true;
            let title_y = (options.page_height_mm / 2.0 - 10.0).max(30.0);
            doc.centered(
                title_y,
                &format!("Decision tree - {} : {}", display_var, display_val),
                BLACK,
            );

            // Graph and summary page
            doc.new_page();
            doc.font_size = options.body_font_size;
            doc.bold = false;
            if let Err(e) = render(tree, "").and_then(|pixmap| place_graph(&mut doc, &pixmap)) {
                log::warn!("diagram for {} : {} failed: {}", variable, value, e);
                doc.font_size = 10.0;
                let y = doc.y;
                doc.text_at(options.margin_mm, y, DIAGRAM_PLACEHOLDER, BLACK);
                doc.y += 10.0;
                doc.font_size = options.body_font_size;
            }
            leaf_summary(&mut doc, tree, variable, value, &display_var, &display_val);
        }
    }

    doc.into_pages()
}

fn cover_page(doc: &mut DocumentBuilder, meta: &ReportMetadata) {
    let options = doc.options().clone();
    let left = options.margin_mm;

    doc.font_size = options.cover_title_font_size;
    doc.bold = true;
    let title_y = doc.y;
    doc.centered(title_y, "Decision Tree Analysis Report", BLACK);
    doc.y += 15.0;

    doc.font_size = options.body_font_size;
    doc.bold = false;
    doc.text_line(left, format!("File: {}", meta.filename), BLACK, 8.0);
    doc.text_line(
        left,
        format!("Treatment mode: {}", meta.treatment_mode.label()),
        BLACK,
        8.0,
    );
    doc.text_line(
        left,
        format!("Target variables: {}", meta.target_variables.join(", ")),
        BLACK,
        8.0,
    );
    let explanatory = if meta.explanatory_variables.is_empty() {
        "-".to_string()
    } else {
        meta.explanatory_variables.join(", ")
    };
    doc.text_line(left, format!("Explanatory variables: {}", explanatory), BLACK, 8.0);

    if let (Some(filtered), Some(original)) = (meta.filtered_sample_size, meta.original_sample_size) {
        if original > 0 && filtered != original {
            doc.text_line(
                left,
                format!("Sample: {} of {} rows", filtered, original),
                BLACK,
                8.0,
            );
        }
    }

    let columns: Vec<(&String, &Vec<String>)> = meta
        .sample_selections
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .collect();
    if columns.is_empty() {
        return;
    }

    doc.bold = true;
    doc.text_line(
        left,
        format!("Sample (selections) - Filtered columns: {}", columns.len()),
        BLACK,
        8.0,
    );
    doc.bold = false;
    for (column, values) in columns.iter().take(constants::PREVIEW_MAX_COLUMNS) {
        let mut unique: Vec<&String> = Vec::new();
        for value in values.iter() {
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        let line_height = options.line_height_mm;
        doc.text_line(
            left + 4.0,
            format!("{} ({} modality(ies))", column, unique.len()),
            BLACK,
            line_height,
        );
        for value in unique.iter().take(constants::PREVIEW_MAX_VALUES) {
            doc.text_line(left + 10.0, format!("-> {} = {}", column, value), BLACK, line_height);
        }
        if unique.len() > constants::PREVIEW_MAX_VALUES {
            doc.text_line(left + 10.0, "...", BLACK, line_height);
        }
    }
    if columns.len() > constants::PREVIEW_MAX_COLUMNS {
        doc.text_line(left + 4.0, "...", BLACK, options.line_height_mm);
    }
}

/// Places a graph raster at the cursor, slicing it across pages when needed.
fn place_graph(doc: &mut DocumentBuilder, pixmap: &tiny_skia::Pixmap) -> Result<(), RenderError> {
    let options = doc.options().clone();
    let margin = options.margin_mm;
    let width_mm = options.page_width_mm - 2.0 * margin;
    let mm_per_px = width_mm / pixmap.width().max(1) as f32;
    let image_height = pixmap.height() as f32 * mm_per_px;
    let full_px = ((options.page_height_mm - 2.0 * margin) / mm_per_px).floor().max(1.0) as u32;
    let local_y = margin.max(doc.y - 6.0);

    if full_px >= pixmap.height() {
        let strip = slicing::whole(pixmap)?;
        let mut top = local_y;
        if top + image_height > options.page_height_mm - margin {
            doc.new_page();
            top = margin;
        }
        doc.image_at(top, width_mm, image_height, strip);
        doc.y = top + image_height + 10.0;
        return Ok(());
    }

    let first_px = ((options.page_height_mm - margin - local_y) / mm_per_px).floor().max(1.0) as u32;
    let ranges = slicing::plan_strips(pixmap.height(), first_px, full_px);
    let starts_here = first_px > 1;
    let strips = ranges
        .into_iter()
        .map(|rows| slicing::cut_strip(pixmap, rows))
        .collect::<Result<Vec<_>, _>>()?;

    for (index, strip) in strips.into_iter().enumerate() {
        let top = if index == 0 && starts_here {
            local_y
        } else {
            doc.new_page();
            margin
        };
        let height = strip.height as f32 * mm_per_px;
        doc.image_at(top, width_mm, height, strip);
        doc.y = top + height + 4.0;
    }
    Ok(())
}

fn tone_color(value: &str) -> Rgb8 {
    match value_tone(value) {
        ValueTone::True => GREEN,
        ValueTone::False => RED,
        ValueTone::Other => ORANGE,
    }
}

/// Every terminal outcome of the tree, most frequent first.
fn leaf_summary(
    doc: &mut DocumentBuilder,
    tree: &TreeNode,
    variable: &str,
    value: &str,
    display_var: &str,
    display_val: &str,
) {
    let mut leaves = extract_tree_leaves(tree, variable, value, EmptyBranchPolicy::Drop);
    sort_by_percentage(&mut leaves);

    doc.font_size = doc.options().body_font_size;
    doc.bold = false;
    doc.y += 6.0;

    for (index, leaf) in leaves.iter().enumerate() {
        let pct = percent_text(leaf.percentage);
        doc.line(&format!("#{}", index + 1), PURPLE);
        doc.line(
            &format!(
                "{} - {} cases with {} out of {} cases of this branch",
                pct,
                leaf.count,
                display_val,
                leaf.total_or_estimate()
            ),
            PURPLE,
        );
        doc.rich_line(&[Segment::new("Variable: ", GRAY), Segment::new(display_var, BLUE)]);
        doc.rich_line(&[
            Segment::new("Value: ", GRAY),
            Segment::new(display_val, tone_color(display_val)),
        ]);
        doc.line("Branch path:", GRAY);
        doc.y += 2.0;
        for step in &leaf.path {
            if let Some((name, step_value)) = step.split_once(" = ") {
                let step_value = step_value.trim();
                doc.rich_line(&[
                    Segment::new("   -> ", VIOLET),
                    Segment::new(name.trim(), BLUE),
                    Segment::new(" = ", LIGHT_GRAY),
                    Segment::new(step_value, tone_color(step_value)),
                ]);
            } else {
                doc.line(&format!("   -> {}", step), VIOLET);
            }
        }
        doc.rich_line(&[
            Segment::new("Cases: ", GRAY),
            Segment::new(leaf.count.to_string(), GRAY),
            Segment::new("   ", GRAY),
            Segment::new(format!("{} with {}", pct, display_val), PURPLE),
        ]);
        doc.y += 4.0;
    }
}

#[cfg(test)]
mod tests {
    use super::document::PageItem;
    use super::*;
    use serde_json::json;

    fn forest() -> DecisionForest {
        serde_json::from_value(json!({
            "Sick": {
                "True": {
                    "type": "node",
                    "variable": "Age",
                    "branches": {
                        "<30": {"count": 10, "percentage": 25.0, "total": 40},
                        ">=30": {"count": 30, "percentage": 75.0, "total": 40}
                    }
                },
                "False": {"type": "leaf", "message": "4 (10.0%)"}
            }
        }))
        .unwrap()
    }

    fn meta() -> ReportMetadata {
        ReportMetadata {
            filename: "survey.xlsx".into(),
            target_variables: vec!["Sick".into()],
            explanatory_variables: vec!["Age".into()],
            ..Default::default()
        }
    }

    fn fake_render(height: u32) -> impl Fn(&TreeNode, &str) -> Result<tiny_skia::Pixmap, RenderError> {
        move |_, _| {
            tiny_skia::Pixmap::new(100, height).ok_or(RenderError::PixmapAllocation { width: 100, height })
        }
    }

    fn failing_render(_: &TreeNode, _: &str) -> Result<tiny_skia::Pixmap, RenderError> {
        Err(RenderError::PixmapAllocation { width: 0, height: 0 })
    }

    fn texts(page: &Page) -> Vec<(f32, f32, f32, String)> {
        page.items
            .iter()
            .filter_map(|item| match item {
                PageItem::Text { x, y, size, text, .. } => Some((*x, *y, *size, text.clone())),
                PageItem::Image { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_report_filename() {
        assert_eq!(report_filename("data.xlsx"), "decision_tree_report_data.pdf");
        assert_eq!(report_filename("a.b.csv"), "decision_tree_report_a.b.pdf");
        assert_eq!(report_filename("plain"), "decision_tree_report_plain.pdf");
    }

    #[test]
    fn test_page_count_covers_every_pair() {
        let options = ReportOptions::default();
        let pages = build_document(&forest(), &meta(), &options, fake_render(40));
        assert!(pages.len() >= 1 + 2 * 2);
        assert!(pages[1].plain_text().contains("Decision tree - Sick : True"));
        let titles: Vec<usize> = pages
            .iter()
            .enumerate()
            .filter(|(_, p)| p.plain_text().contains("Decision tree - Sick :"))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(titles.len(), 2);
        assert!(pages[titles[1]].plain_text().contains("Sick : False"));
        // Each title page holds only its title
        for i in titles {
            assert_eq!(pages[i].items.len(), 1);
        }
    }

    #[test]
    fn test_cover_page_contents() {
        let mut m = meta();
        m.filtered_sample_size = Some(80);
        m.original_sample_size = Some(100);
        m.sample_selections
            .insert("City".into(), vec!["Paris".into(), "Paris".into(), "Lyon".into()]);
        m.sample_selections.insert("Empty".into(), vec![]);
        let pages = build_document(&forest(), &m, &ReportOptions::default(), fake_render(40));
        let cover = pages[0].plain_text();
        assert!(cover.contains("File: survey.xlsx"));
        assert!(cover.contains("Treatment mode: Independent"));
        assert!(cover.contains("Target variables: Sick"));
        assert!(cover.contains("Explanatory variables: Age"));
        assert!(cover.contains("Sample: 80 of 100 rows"));
        assert!(cover.contains("Filtered columns: 1"));
        assert!(cover.contains("City (2 modality(ies))"));
        assert!(cover.contains("-> City = Lyon"));
        assert!(!cover.contains("Empty"));
    }

    #[test]
    fn test_long_cover_values_stay_inside_margins() {
        let options = ReportOptions::default();
        let mut m = meta();
        m.explanatory_variables = (0..30).map(|i| format!("WIDE_COLUMN_{}", i)).collect();
        m.sample_selections.insert("W".repeat(40), vec!["M".repeat(120)]);
        let pages = build_document(&forest(), &m, &options, fake_render(40));
        let right = options.page_width_mm - options.margin_mm;
        let mut rows = 0;
        for item in &pages[0].items {
            if let PageItem::Text { x, text, size, bold, .. } = item {
                assert!(
                    x + metrics::text_width_mm(text, *size, *bold) <= right + 1e-3,
                    "{:?} crosses the right margin",
                    text
                );
                rows += 1;
            }
        }
        assert!(rows > 8);
        assert!(pages[0].plain_text().contains("WIDE_COLUMN_29"));
    }

    #[test]
    fn test_sample_line_hidden_when_unfiltered() {
        let mut m = meta();
        m.filtered_sample_size = Some(100);
        m.original_sample_size = Some(100);
        let pages = build_document(&forest(), &m, &ReportOptions::default(), fake_render(40));
        assert!(!pages[0].plain_text().contains("Sample:"));
    }

    #[test]
    fn test_preview_caps() {
        let mut m = meta();
        for c in 0..10 {
            let values = (0..12).map(|v| format!("v{}", v)).collect();
            m.sample_selections.insert(format!("col{}", c), values);
        }
        let pages = build_document(&forest(), &m, &ReportOptions::default(), fake_render(40));
        let cover: String = pages
            .iter()
            .take_while(|p| !p.plain_text().contains("Decision tree -"))
            .map(|p| p.plain_text())
            .collect::<Vec<_>>()
            .join("\n");
        assert!(cover.contains("col7 (12 modality(ies))"));
        assert!(!cover.contains("col8"));
        assert!(cover.contains("-> col0 = v7"));
        assert!(!cover.contains("-> col0 = v8"));
        assert!(cover.matches("...").count() >= 9);
    }

    #[test]
    fn test_leaf_summary_order_and_paths() {
        let pages = build_document(&forest(), &meta(), &ReportOptions::default(), fake_render(40));
        let content: String = pages.iter().map(|p| p.plain_text()).collect::<Vec<_>>().join("\n");
        let first = content.find("75.00% - 30 cases with True out of 40 cases of this branch").unwrap();
        let second = content.find("25.00% - 10 cases with True out of 40 cases of this branch").unwrap();
        assert!(first < second);
        assert!(content.contains("Branch path:"));
        assert!(content.contains("   -> "));
        assert!(content.contains(">=30"));
        assert!(content.contains("Cases: 30   "));
    }

    #[test]
    fn test_combined_titles_in_together_mode() {
        let forest: DecisionForest = serde_json::from_value(json!({
            "Sex + Smoker": {"Combined": {"type": "leaf", "message": "3 (5.0%)"}}
        }))
        .unwrap();
        let mut m = meta();
        m.treatment_mode = TreatmentMode::Together;
        m.target_variables = vec!["Sex".into(), "Smoker".into()];
        m.selections.insert("Sex".into(), vec!["M".into()]);
        m.selections.insert("Smoker".into(), vec!["Yes".into()]);
        let pages = build_document(&forest, &m, &ReportOptions::default(), fake_render(40));
        let title = pages[1].plain_text();
        assert!(title.contains("Sex + Smoker"));
        assert!(title.contains("Sex=M"));
    }

    #[test]
    fn test_failed_diagram_uses_placeholder_and_continues() {
        let pages = build_document(&forest(), &meta(), &ReportOptions::default(), failing_render);
        let placeholders = pages
            .iter()
            .filter(|p| p.plain_text().contains(DIAGRAM_PLACEHOLDER))
            .count();
        assert_eq!(placeholders, 2);
        assert!(pages
            .iter()
            .any(|p| p.plain_text().contains("cases of this branch")));
        assert!(pages.iter().all(|p| p.items.iter().all(|i| matches!(i, PageItem::Text { .. }))));
    }

    #[test]
    fn test_tall_graph_is_sliced_without_gaps() {
        let options = ReportOptions::default();
        let pages = build_document(&forest(), &meta(), &options, fake_render(1000));
        let strips: Vec<(f32, u32)> = pages
            .iter()
            .flat_map(|p| p.items.iter())
            .filter_map(|item| match item {
                PageItem::Image { y, strip, .. } => Some((*y, strip.height)),
                PageItem::Text { .. } => None,
            })
            .collect();
        // Two trees, each sliced into several strips of 1000 rows in total
        let total: u32 = strips.iter().map(|(_, h)| h).sum();
        assert_eq!(total, 2000);
        assert!(strips.len() > 2);
        for page in &pages {
            let images = page
                .items
                .iter()
                .filter(|i| matches!(i, PageItem::Image { .. }))
                .count();
            assert!(images <= 1);
            for item in &page.items {
                if let PageItem::Image { y, height, .. } = item {
                    assert!(y + height <= options.page_height_mm - options.margin_mm + 1e-3);
                }
            }
        }
    }

    #[test]
    fn test_short_graph_is_one_image_nudged_up() {
        let options = ReportOptions::default();
        let pages = build_document(&forest(), &meta(), &options, fake_render(40));
        let PageItem::Image { y, width, .. } = &pages[2].items[0] else {
            panic!("expected the graph first");
        };
        assert_eq!(*y, options.margin_mm);
        assert_eq!(*width, options.page_width_mm - 2.0 * options.margin_mm);
    }

    #[test]
    fn test_text_never_overlaps() {
        let options = ReportOptions::default();
        let mut m = meta();
        m.sample_selections.insert("City".into(), vec!["Paris".into()]);
        let pages = build_document(&forest(), &m, &options, fake_render(1000));
        for page in &pages {
            let mut items: Vec<(f32, f32, f32, String, bool)> = page
                .items
                .iter()
                .filter_map(|item| match item {
                    PageItem::Text { x, y, size, text, bold, .. } => {
                        Some((*x, *y, *size, text.clone(), *bold))
                    }
                    PageItem::Image { .. } => None,
                })
                .collect();
            items.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap().then(a.0.partial_cmp(&b.0).unwrap()));
            for pair in items.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                if (b.1 - a.1).abs() < 1e-3 {
                    let a_end = a.0 + metrics::text_width_mm(&a.3, a.2, a.4);
                    assert!(b.0 >= a_end - 1e-3, "{:?} overlaps {:?}", a, b);
                } else {
                    assert!(b.1 - a.1 >= options.line_height_mm - 1e-3, "{:?} too close to {:?}", a, b);
                }
            }
            for (_, y, _, _, _) in &items {
                assert!(*y <= options.page_height_mm - options.text_bottom_margin_mm);
            }
        }
    }

    #[test]
    fn test_export_report_writes_pdf() {
        let options = ReportOptions {
            raster_scale: 0.25,
            ..ReportOptions::default()
        };
        let bytes = export_report_with(&forest(), &meta(), &options).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_metadata_from_session() {
        let session = AnalysisSession::from_json(
            &json!({
                "decision_tree_data": {
                    "filename": "f.csv",
                    "variables_explicatives": ["Age"],
                    "variables_a_expliquer": ["Sick"],
                    "filtered_sample_size": 5,
                    "original_sample_size": 9,
                    "decision_trees": {}
                },
                "selected_remaining_data": {"City": ["Paris"]}
            })
            .to_string(),
        )
        .unwrap();
        let m = ReportMetadata::from_session(&session);
        assert_eq!(m.filename, "f.csv");
        assert_eq!(m.target_variables, vec!["Sick".to_string()]);
        assert_eq!(m.sample_selections["City"], vec!["Paris".to_string()]);
        assert_eq!(m.filtered_sample_size, Some(5));
    }
}
