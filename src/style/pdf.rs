use printpdf::{BuiltinFont, Color, Mm, PdfDocument, Rect, Rgb as PdfRgb};

use super::render::{DocumentInfo, ModuleMatrix, RenderError, Rgb};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const TITLE_TOP: f32 = 40.0;
const SYMBOL_TOP: f32 = 60.0;
const SYMBOL_SIZE: f32 = 100.0;

fn color(rgb: Rgb) -> Color {
    Color::Rgb(PdfRgb::new(
        rgb[0] as f32 / 255.0,
        rgb[1] as f32 / 255.0,
        rgb[2] as f32 / 255.0,
        None,
    ))
}

/// Rough Helvetica width, good enough to centre a line.
fn text_width(text: &str, size_pt: f32) -> f32 {
    text.chars().count() as f32 * size_pt * 0.5 * 0.3528
}

fn centred_x(text: &str, size_pt: f32) -> f32 {
    ((PAGE_WIDTH - text_width(text, size_pt)) / 2.0).max(10.0)
}

/// A4 page: title, the symbol as vector modules, and a footer line.
pub fn document(
    matrix: &ModuleMatrix,
    foreground: Rgb,
    background: Rgb,
    info: &DocumentInfo,
) -> Result<Vec<u8>, RenderError> {
    let title = if info.title.trim().is_empty() {
        "My QR Code"
    } else {
        info.title.as_str()
    };
    let (doc, page, layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "qr");
    let layer = doc.get_page(page).get_layer(layer);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;

    layer.set_fill_color(color([0, 0, 0]));
    layer.use_text(
        title,
        20.0,
        Mm(centred_x(title, 20.0)),
        Mm(PAGE_HEIGHT - TITLE_TOP),
        &font,
    );

    let left = (PAGE_WIDTH - SYMBOL_SIZE) / 2.0;
    let top = PAGE_HEIGHT - SYMBOL_TOP;
    layer.set_fill_color(color(background));
    layer.add_rect(Rect::new(
        Mm(left),
        Mm(top - SYMBOL_SIZE),
        Mm(left + SYMBOL_SIZE),
        Mm(top),
    ));

    let count = matrix.width();
    let module = SYMBOL_SIZE / count as f32;
    layer.set_fill_color(color(foreground));
    for y in 0..count {
        for x in 0..count {
            if !matrix.is_dark(x as isize, y as isize) {
                continue;
            }
            let x0 = left + x as f32 * module;
            let y1 = top - y as f32 * module;
            layer.add_rect(Rect::new(Mm(x0), Mm(y1 - module), Mm(x0 + module), Mm(y1)));
        }
    }

    let footer = format!("Generated with QRForge - {}", info.kind);
    layer.set_fill_color(color([0, 0, 0]));
    layer.use_text(
        footer.as_str(),
        10.0,
        Mm(centred_x(&footer, 10.0)),
        Mm(top - SYMBOL_SIZE - 10.0),
        &font,
    );

    doc.save_to_bytes()
        .map_err(|e| RenderError::Pdf(e.to_string()))
}
