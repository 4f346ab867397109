use chrono::{DateTime, Local};
use printpdf::{BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rgb};

use crate::report::{LocalRenderer, ReportEntry};

// A4 portrait, 15mm margins. printpdf's Mm wraps f32.
const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 15.0;
const ENTRY_H: f32 = 30.0;
const FRAME_W: f32 = 20.0;
const FRAME_H: f32 = 26.0;

/// Local fallback renderer. Produces the same report as the document
/// service minus the actual photo bytes: each entry shows the photo
/// label (or a "no photo" placeholder) inside an empty frame.
pub struct PdfRenderer;

impl PdfRenderer {
    pub fn new() -> PdfRenderer {
        PdfRenderer
    }
}

fn hairline(layer: &PdfLayerReference, y: f32, gray: f32) {
    layer.set_outline_color(Color::Rgb(Rgb::new(gray, gray, gray, None)));
    layer.set_outline_thickness(0.5);
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(MARGIN), Mm(y)), false),
            (Point::new(Mm(PAGE_W - MARGIN), Mm(y)), false),
        ],
        is_closed: false,
    });
}

fn frame(layer: &PdfLayerReference, x: f32, y: f32, w: f32, h: f32) {
    layer.set_outline_color(Color::Rgb(Rgb::new(0.7, 0.7, 0.7, None)));
    layer.set_outline_thickness(0.5);
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(x), Mm(y)), false),
            (Point::new(Mm(x + w), Mm(y)), false),
            (Point::new(Mm(x + w), Mm(y + h)), false),
            (Point::new(Mm(x), Mm(y + h)), false),
        ],
        is_closed: true,
    });
}

impl LocalRenderer for PdfRenderer {
    fn render(
        &self,
        entries: &[ReportEntry],
        generated: DateTime<Local>,
    ) -> anyhow::Result<Vec<u8>> {
        let (doc, page1, layer1) =
            PdfDocument::new("Absence Report", Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font: IndirectFontRef = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold: IndirectFontRef = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

        let mut layer = doc.get_page(page1).get_layer(layer1);

        // Header.
        layer.use_text("Absence Report", 18.0, Mm(MARGIN), Mm(PAGE_H - MARGIN - 10.0), &bold);
        layer.use_text(
            format!("Generated: {}", generated.format("%Y-%m-%d %H:%M")),
            11.0,
            Mm(MARGIN),
            Mm(PAGE_H - MARGIN - 18.0),
            &font,
        );
        hairline(&layer, PAGE_H - MARGIN - 22.0, 0.0);

        let mut y = PAGE_H - MARGIN - 30.0;

        for entry in entries {
            if y < MARGIN + ENTRY_H {
                let (page, idx) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
                layer = doc.get_page(page).get_layer(idx);
                y = PAGE_H - MARGIN - 10.0;
            }

            let frame_x = MARGIN;
            let frame_y = y - FRAME_H;
            frame(&layer, frame_x, frame_y, FRAME_W, FRAME_H);
            let label = match &entry.photo_label {
                Some(n) => format!("photo {}", n),
                None => "no photo".to_string(),
            };
            layer.use_text(
                label,
                8.0,
                Mm(frame_x + 2.0),
                Mm(frame_y + FRAME_H / 2.0 - 1.5),
                &font,
            );

            let text_x = MARGIN + FRAME_W + 8.0;
            layer.use_text(
                format!("{}. {}", entry.ordinal, entry.name),
                13.0,
                Mm(text_x),
                Mm(y - 7.0),
                &bold,
            );
            layer.use_text(
                format!("Student ID: {}", entry.id),
                11.0,
                Mm(text_x),
                Mm(y - 14.0),
                &font,
            );
            if let Some(n) = &entry.photo_label {
                layer.use_text(
                    format!("Photo label: {}", n),
                    9.0,
                    Mm(text_x),
                    Mm(y - 20.0),
                    &font,
                );
            }

            hairline(&layer, y - ENTRY_H + 2.0, 0.9);
            y -= ENTRY_H;
        }

        layer.use_text(
            format!("Total absent: {}", entries.len()),
            11.0,
            Mm(MARGIN),
            Mm(MARGIN),
            &bold,
        );

        let bytes = doc.save_to_bytes()?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ordinal: usize, id: &str, name: &str, photo: Option<&str>) -> ReportEntry {
        ReportEntry {
            ordinal,
            id: id.to_string(),
            name: name.to_string(),
            photo_label: photo.map(|s| s.to_string()),
        }
    }

    #[test]
    fn renders_pdf_bytes() {
        let entries = vec![
            entry(1, "123456789", "Alice Chen", Some("7")),
            entry(2, "987654321", "Bo Zhang", None),
        ];
        let bytes = PdfRenderer::new()
            .render(&entries, Local::now())
            .expect("render");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn paginates_long_lists() {
        let entries: Vec<ReportEntry> = (0..30)
            .map(|i| entry(i + 1, "123456789", "Student", None))
            .collect();
        let bytes = PdfRenderer::new()
            .render(&entries, Local::now())
            .expect("render");
        // 30 entries at 30mm each cannot fit a single A4 page.
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.matches("/Type /Page").count() > 1 || bytes.len() > 4000);
    }

    #[test]
    fn empty_entry_list_still_renders() {
        let bytes = PdfRenderer::new().render(&[], Local::now()).expect("render");
        assert!(bytes.starts_with(b"%PDF"));
    }
}
