//! Serialization of laid out pages with `printpdf`.

use super::document::{Page, PageItem, Rgb8};
use super::{ExportError, ReportOptions};
use printpdf::{
    BuiltinFont, Color, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument,
    Px, Rgb,
};

fn to_pdf_color(color: Rgb8) -> Color {
    Color::Rgb(Rgb::new(
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
        None,
    ))
}

/// Folds text to what the built-in Helvetica encoding renders reliably.
pub fn pdf_safe(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            c if c.is_ascii() => out.push(c),
            '→' => out.push_str("->"),
            '…' => out.push_str("..."),
            '–' | '—' => out.push('-'),
            '’' | '‘' => out.push('\''),
            '“' | '”' => out.push('"'),
            'à' | 'á' | 'â' | 'ä' | 'ã' => out.push('a'),
            'À' | 'Á' | 'Â' | 'Ä' | 'Ã' => out.push('A'),
            'é' | 'è' | 'ê' | 'ë' => out.push('e'),
            'É' | 'È' | 'Ê' | 'Ë' => out.push('E'),
            'î' | 'ï' | 'í' | 'ì' => out.push('i'),
            'Î' | 'Ï' | 'Í' | 'Ì' => out.push('I'),
            'ô' | 'ö' | 'ó' | 'ò' | 'õ' => out.push('o'),
            'Ô' | 'Ö' | 'Ó' | 'Ò' | 'Õ' => out.push('O'),
            'ù' | 'û' | 'ü' | 'ú' => out.push('u'),
            'Ù' | 'Û' | 'Ü' | 'Ú' => out.push('U'),
            'ç' => out.push('c'),
            'Ç' => out.push('C'),
            'ñ' => out.push('n'),
            'Ñ' => out.push('N'),
            _ => out.push('?'),
        }
    }
    out
}

/// Writes pages into a PDF document and returns its bytes.
pub fn write_pdf(pages: &[Page], title: &str, options: &ReportOptions) -> Result<Vec<u8>, ExportError> {
    let page_w = Mm(options.page_width_mm);
    let page_h = Mm(options.page_height_mm);
    let (doc, first_page, first_layer) = PdfDocument::new(pdf_safe(title), page_w, page_h, "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;

    for (index, page) in pages.iter().enumerate() {
        let (page_index, layer_index) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(page_w, page_h, "Layer 1")
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);

        for item in &page.items {
            match item {
                PageItem::Text {
                    x,
                    y,
                    size,
                    bold: is_bold,
                    color,
                    text,
                } => {
                    layer.set_fill_color(to_pdf_color(*color));
                    let font = if *is_bold { &bold } else { &regular };
                    layer.use_text(
                        pdf_safe(text),
                        *size,
                        Mm(*x),
                        Mm(options.page_height_mm - *y),
                        font,
                    );
                }
                PageItem::Image {
                    x,
                    y,
                    width,
                    height,
                    strip,
                } => {
                    if strip.width == 0 || *width <= 0.0 {
                        continue;
                    }
                    let image = Image::from(ImageXObject {
                        width: Px(strip.width as usize),
                        height: Px(strip.height as usize),
                        color_space: ColorSpace::Rgb,
                        bits_per_component: ColorBits::Bit8,
                        interpolate: true,
                        image_data: strip.rgb.clone(),
                        image_filter: None,
                        smask: None,
                        clipping_bbox: None,
                    });
                    // Image size on the page is pixels * 25.4 / dpi
                    let dpi = strip.width as f32 * 25.4 / *width;
                    image.add_to_layer(
                        layer.clone(),
                        ImageTransform {
                            translate_x: Some(Mm(*x)),
                            translate_y: Some(Mm(options.page_height_mm - *y - *height)),
                            dpi: Some(dpi),
                            ..Default::default()
                        },
                    );
                }
            }
        }
        layer.set_fill_color(to_pdf_color([0, 0, 0]));
    }

    doc.save_to_bytes().map_err(|e| ExportError::Pdf(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_safe() {
        assert_eq!(pdf_safe("a → b"), "a -> b");
        assert_eq!(pdf_safe("Indépendant…"), "Independant...");
        assert_eq!(pdf_safe("ok"), "ok");
        assert_eq!(pdf_safe("日本"), "??");
    }

    #[test]
    fn test_write_pdf_produces_a_document() {
        let options = ReportOptions::default();
        let mut page = Page::default();
        page.items.push(PageItem::Text {
            x: 20.0,
            y: 20.0,
            size: 12.0,
            bold: false,
            color: [0, 0, 0],
            text: "hello".into(),
        });
        page.items.push(PageItem::Image {
            x: 20.0,
            y: 30.0,
            width: 100.0,
            height: 50.0,
            strip: super::super::slicing::RasterStrip {
                width: 2,
                height: 1,
                rgb: vec![255; 6],
            },
        });
        let bytes = write_pdf(&[page.clone(), page], "t", &options).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
