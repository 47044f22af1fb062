//! Landscape A4 participation certificate with a verification QR code.
//!
//! The builtin PDF fonts only cover Latin-1. Names in other scripts need a
//! TrueType font, embedded through [`EmbeddedFonts`].

use std::io::Cursor;
use std::path::Path;

use chrono::NaiveDate;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb,
};
use printpdf::path::PaintMode;
use qrcode::QrCode;
use volunteer_common::{AppError, AppResult};

const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const QR_SIZE: f32 = 36.0;

/// Points to millimetres.
const PT_TO_MM: f32 = 0.352_778;

/// Everything printed on a certificate.
#[derive(Debug, Clone)]
pub struct CertificateDocument<'a> {
    pub certificate_id: &'a str,
    pub volunteer_name: &'a str,
    pub event_name: &'a str,
    pub organiser_name: &'a str,
    pub event_date: Option<NaiveDate>,
    pub hours_contributed: f64,
    pub skills: &'a [String],
    pub issued_on: NaiveDate,
    pub verify_url: &'a str,
}

/// TrueType faces used instead of the builtin Helvetica set.
#[derive(Debug, Clone)]
pub struct EmbeddedFonts {
    pub regular: Vec<u8>,
    pub bold: Option<Vec<u8>>,
}

/// Read the configured font files. `None` when no regular font is set.
pub async fn load_fonts(
    regular: Option<&Path>,
    bold: Option<&Path>,
) -> AppResult<Option<EmbeddedFonts>> {
    async fn read(path: &Path) -> AppResult<Vec<u8>> {
        tokio::fs::read(path).await.map_err(|e| {
            AppError::Config(format!("Failed to read font {}: {e}", path.display()))
        })
    }

    let Some(regular) = regular else {
        return Ok(None);
    };
    let bold = match bold {
        Some(path) => Some(read(path).await?),
        None => None,
    };
    Ok(Some(EmbeddedFonts {
        regular: read(regular).await?,
        bold,
    }))
}

/// Whether the builtin fonts can draw `text`.
#[must_use]
pub fn builtin_can_draw(text: &str) -> bool {
    text.chars().all(|c| u32::from(c) < 0x100)
}

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("Failed to render certificate: {e}"))
}

/// Dark modules of the QR code for `data`, row-major, with the side length.
pub fn qr_modules(data: &str) -> AppResult<(usize, Vec<bool>)> {
    let code = QrCode::new(data.as_bytes()).map_err(pdf_error)?;
    let width = code.width();
    let modules = code
        .to_colors()
        .into_iter()
        .map(|c| c == qrcode::Color::Dark)
        .collect();
    Ok((width, modules))
}

/// Approximate x offset that centres `text` on the page.
///
/// Builtin fonts carry no metrics here, so glyphs are taken as half an em.
fn centred_x(text: &str, font_size: f32) -> Mm {
    let width = text.chars().count() as f32 * font_size * 0.5 * PT_TO_MM;
    Mm(((PAGE_WIDTH - width) / 2.0).max(10.0))
}

fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn centred(layer: &PdfLayerReference, text: &str, size: f32, y: f32, font: &IndirectFontRef) {
    layer.use_text(text, size, centred_x(text, size), Mm(y), font);
}

fn draw_qr(layer: &PdfLayerReference, data: &str, x: f32, y: f32) -> AppResult<()> {
    let (width, modules) = qr_modules(data)?;
    let cell = QR_SIZE / width as f32;

    layer.set_fill_color(rgb(0.0, 0.0, 0.0));
    for (i, dark) in modules.into_iter().enumerate() {
        if !dark {
            continue;
        }
        let col = (i % width) as f32;
        let row = (i / width) as f32;
        let left = x + col * cell;
        let top = y + QR_SIZE - row * cell;
        layer.add_rect(
            Rect::new(Mm(left), Mm(top - cell), Mm(left + cell), Mm(top))
                .with_mode(PaintMode::Fill),
        );
    }
    Ok(())
}

/// Render a certificate to PDF bytes.
pub fn render(doc: &CertificateDocument<'_>, fonts: Option<&EmbeddedFonts>) -> AppResult<Vec<u8>> {
    let (pdf, page, layer) = PdfDocument::new(
        format!("Certificate {}", doc.certificate_id),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Certificate",
    );
    let layer = pdf.get_page(page).get_layer(layer);

    let (regular, bold, italic) = if let Some(faces) = fonts {
        let regular = pdf
            .add_external_font(Cursor::new(faces.regular.as_slice()))
            .map_err(pdf_error)?;
        let bold = match &faces.bold {
            Some(bytes) => pdf
                .add_external_font(Cursor::new(bytes.as_slice()))
                .map_err(pdf_error)?,
            None => regular.clone(),
        };
        (regular.clone(), bold, regular)
    } else {
        (
            pdf.add_builtin_font(BuiltinFont::Helvetica)
                .map_err(pdf_error)?,
            pdf.add_builtin_font(BuiltinFont::HelveticaBold)
                .map_err(pdf_error)?,
            pdf.add_builtin_font(BuiltinFont::HelveticaOblique)
                .map_err(pdf_error)?,
        )
    };

    // Double frame
    layer.set_outline_color(rgb(0.13, 0.40, 0.30));
    layer.set_outline_thickness(3.0);
    layer.add_rect(
        Rect::new(Mm(8.0), Mm(8.0), Mm(PAGE_WIDTH - 8.0), Mm(PAGE_HEIGHT - 8.0))
            .with_mode(PaintMode::Stroke),
    );
    layer.set_outline_thickness(1.0);
    layer.add_rect(
        Rect::new(Mm(13.0), Mm(13.0), Mm(PAGE_WIDTH - 13.0), Mm(PAGE_HEIGHT - 13.0))
            .with_mode(PaintMode::Stroke),
    );

    layer.set_fill_color(rgb(0.13, 0.40, 0.30));
    centred(&layer, "CERTIFICATE OF PARTICIPATION", 30.0, 170.0, &bold);

    layer.set_fill_color(rgb(0.2, 0.2, 0.2));
    centred(&layer, "This certifies that", 14.0, 150.0, &italic);
    centred(&layer, doc.volunteer_name, 28.0, 134.0, &bold);
    centred(&layer, "volunteered at", 14.0, 120.0, &italic);
    centred(&layer, doc.event_name, 20.0, 107.0, &bold);

    let organised = format!("organised by {}", doc.organiser_name);
    centred(&layer, &organised, 13.0, 96.0, &regular);

    let mut details = Vec::new();
    if let Some(date) = doc.event_date {
        details.push(date.format("%d %B %Y").to_string());
    }
    details.push(format!("{:.2} hours contributed", doc.hours_contributed));
    centred(&layer, &details.join("  |  "), 12.0, 84.0, &regular);

    if !doc.skills.is_empty() {
        let skills = format!("Skills demonstrated: {}", doc.skills.join(", "));
        centred(&layer, &skills, 12.0, 74.0, &regular);
    }

    layer.set_fill_color(rgb(0.35, 0.35, 0.35));
    layer.use_text(
        format!("Issued {}", doc.issued_on.format("%d %B %Y")),
        10.0,
        Mm(24.0),
        Mm(30.0),
        &regular,
    );
    layer.use_text(
        format!("Certificate ID: {}", doc.certificate_id),
        9.0,
        Mm(24.0),
        Mm(24.0),
        &regular,
    );

    draw_qr(&layer, doc.verify_url, PAGE_WIDTH - 24.0 - QR_SIZE, 20.0)?;
    layer.set_fill_color(rgb(0.35, 0.35, 0.35));
    layer.use_text(
        "Scan to verify",
        8.0,
        Mm(PAGE_WIDTH - 24.0 - QR_SIZE + 6.0),
        Mm(16.0),
        &regular,
    );

    pdf.save_to_bytes().map_err(pdf_error)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_modules_are_square() {
        let (width, modules) =
            qr_modules("https://volunteer.example.org/verify-certificate/abc").unwrap();
        assert!(width >= 21);
        assert_eq!(modules.len(), width * width);
        assert!(modules.iter().any(|&dark| dark));
    }

    #[test]
    fn test_render_produces_pdf() {
        let skills = vec!["first aid".to_string(), "logistics".to_string()];
        let bytes = render(
            &CertificateDocument {
                certificate_id: "5f0c7f7e-8d0a-4c2e-9a53-1c2d3e4f5a6b",
                volunteer_name: "Ada Tan",
                event_name: "Beach cleanup",
                organiser_name: "Green Shores",
                event_date: NaiveDate::from_ymd_opt(2026, 3, 14),
                hours_contributed: 3.5,
                skills: &skills,
                issued_on: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
                verify_url: "https://volunteer.example.org/verify-certificate/5f0c7f7e",
            },
            None,
        )
        .unwrap();

        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_builtin_font_coverage() {
        assert!(builtin_can_draw("Zoë Müller"));
        assert!(!builtin_can_draw("陈小明"));
        assert!(!builtin_can_draw("Дмитрий"));
    }

    #[tokio::test]
    async fn test_load_fonts() {
        assert!(load_fonts(None, None).await.unwrap().is_none());

        let missing = std::env::temp_dir().join("vhub-no-such-font.ttf");
        assert!(matches!(
            load_fonts(Some(&missing), None).await,
            Err(AppError::Config(_))
        ));

        let path = std::env::temp_dir().join(format!("vhub-font-{}.ttf", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, b"font-bytes").await.unwrap();
        let fonts = load_fonts(Some(&path), None).await.unwrap().unwrap();
        assert_eq!(fonts.regular, b"font-bytes");
        assert!(fonts.bold.is_none());
        tokio::fs::remove_file(&path).await.ok();
    }

    #[test]
    fn test_centring_stays_on_page() {
        let long = "x".repeat(400);
        assert!(centred_x(&long, 28.0).0 >= 10.0);
        assert!(centred_x("short", 12.0).0 > 100.0);
    }
}
