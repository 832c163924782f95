// Certificate PDF generation
// Uses genpdf - requires Liberation, DejaVu or Arial fonts in standard paths
pub mod layout;

use genpdf::elements::{Break, Image, Paragraph};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::{Alignment, Element, Scale};
use image::ImageFormat;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::db::NocRecord;

const SYSTEM_FONT_DIRS: [&str; 5] = [
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/TTF",
    "/System/Library/Fonts/Supplemental",
    "/Library/Fonts",
];

/// Font family names with their regular, bold, italic and bold-italic file suffixes.
/// DejaVu ships `DejaVuSans.ttf` and `-Oblique` variants instead of genpdf's naming.
const FONT_FAMILIES: [(&str, [&str; 4]); 3] = [
    ("LiberationSans", ["-Regular", "-Bold", "-Italic", "-BoldItalic"]),
    ("DejaVuSans", ["", "-Bold", "-Oblique", "-BoldOblique"]),
    ("Arial", ["-Regular", "-Bold", "-Italic", "-BoldItalic"]),
];

// genpdf sizes images at 300 dpi unless scaled.
const IMAGE_DPI: f64 = 300.0;
const PHOTO_WIDTH_MM: f64 = 35.0;
const PHOTO_MAX_HEIGHT_MM: f64 = 45.0;
const QR_WIDTH_MM: f64 = 40.0;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no suitable fonts found; install fonts-liberation or set FONT_DIR")]
    FontsMissing,
    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("PDF generation failed: {0}")]
    Pdf(#[from] genpdf::error::Error),
}

/// Everything printed on one certificate.
pub struct CertificateData {
    pub record: NocRecord,
    pub photo: Vec<u8>,
    pub qr_code: Vec<u8>,
}

pub trait CertificateRenderer: Send + Sync {
    /// Build the complete document in memory.
    fn render(&self, certificate: &CertificateData) -> Result<Vec<u8>, RenderError>;
}

/// Raw font files for one family, read from disk once.
#[derive(Debug, Clone)]
struct FontFiles {
    regular: Vec<u8>,
    bold: Vec<u8>,
    italic: Vec<u8>,
    bold_italic: Vec<u8>,
}

impl FontFiles {
    fn read(dir: &Path, name: &str, suffixes: &[&str; 4]) -> std::io::Result<Self> {
        let read = |suffix: &str| std::fs::read(dir.join(format!("{}{}.ttf", name, suffix)));
        Ok(Self {
            regular: read(suffixes[0])?,
            bold: read(suffixes[1])?,
            italic: read(suffixes[2])?,
            bold_italic: read(suffixes[3])?,
        })
    }

    fn family(&self) -> Result<FontFamily<FontData>, RenderError> {
        Ok(FontFamily {
            regular: FontData::new(self.regular.clone(), None)?,
            bold: FontData::new(self.bold.clone(), None)?,
            italic: FontData::new(self.italic.clone(), None)?,
            bold_italic: FontData::new(self.bold_italic.clone(), None)?,
        })
    }
}

/// First complete font family found, searching each directory in order.
fn find_fonts(dirs: &[PathBuf]) -> Option<FontFiles> {
    dirs.iter().filter(|dir| dir.is_dir()).find_map(|dir| {
        FONT_FAMILIES.iter().find_map(|(name, suffixes)| {
            let files = FontFiles::read(dir, name, suffixes).ok()?;
            tracing::debug!("Loaded {} fonts from {}", name, dir.display());
            Some(files)
        })
    })
}

pub struct PdfRenderer {
    fonts: Option<FontFiles>,
}

impl PdfRenderer {
    /// Looks in `font_dir` first, then the usual system font directories.
    pub fn new(font_dir: Option<PathBuf>) -> Self {
        let font_dirs: Vec<PathBuf> = font_dir
            .into_iter()
            .chain(SYSTEM_FONT_DIRS.iter().map(PathBuf::from))
            .collect();
        Self::from_dirs(&font_dirs)
    }

    fn from_dirs(font_dirs: &[PathBuf]) -> Self {
        Self {
            fonts: find_fonts(font_dirs),
        }
    }

    pub fn has_fonts(&self) -> bool {
        self.fonts.is_some()
    }

    fn font_family(&self) -> Result<FontFamily<FontData>, RenderError> {
        self.fonts
            .as_ref()
            .ok_or(RenderError::FontsMissing)?
            .family()
    }
}

impl CertificateRenderer for PdfRenderer {
    fn render(&self, certificate: &CertificateData) -> Result<Vec<u8>, RenderError> {
        let record = &certificate.record;

        let mut doc = genpdf::Document::new(self.font_family()?);
        doc.set_title(format!("NOC {}", record.noc_number));
        doc.set_paper_size(genpdf::PaperSize::A4);

        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(15);
        doc.set_page_decorator(decorator);

        let title_style = genpdf::style::Style::new().bold().with_font_size(18);
        doc.push(
            Paragraph::new(layout::TITLE)
                .aligned(Alignment::Center)
                .styled(title_style),
        );
        doc.push(Break::new(1));
        doc.push(
            Paragraph::new(format!("Certificate Number: {}", record.noc_number))
                .aligned(Alignment::Center)
                .styled(genpdf::style::Style::new().with_font_size(14)),
        );
        doc.push(Break::new(1));

        doc.push(
            embedded_image(
                &certificate.photo,
                ImageFormat::Jpeg,
                PHOTO_WIDTH_MM,
                PHOTO_MAX_HEIGHT_MM,
            )?
            .with_alignment(Alignment::Right),
        );
        doc.push(Break::new(1));

        let body_style = genpdf::style::Style::new().with_font_size(11);
        for line in layout::field_lines(record) {
            doc.push(Paragraph::new(line).styled(body_style));
            doc.push(Break::new(0.25));
        }

        doc.push(Break::new(1));
        doc.push(
            Paragraph::new(layout::VERIFY_CAPTION)
                .aligned(Alignment::Center)
                .styled(body_style),
        );
        doc.push(
            embedded_image(&certificate.qr_code, ImageFormat::Png, QR_WIDTH_MM, QR_WIDTH_MM)?
                .with_alignment(Alignment::Center),
        );

        doc.push(Break::new(1));
        let footer_style = genpdf::style::Style::new().with_font_size(10);
        for line in layout::FOOTER {
            doc.push(Paragraph::new(line).aligned(Alignment::Center).styled(footer_style));
        }

        let mut buffer = Vec::new();
        doc.render(&mut buffer)?;
        Ok(buffer)
    }
}

/// Re-encode as RGB without alpha (the PDF backend rejects alpha channels)
/// and scale to fit the given printed box, keeping the aspect ratio.
fn embedded_image(
    data: &[u8],
    format: ImageFormat,
    max_width_mm: f64,
    max_height_mm: f64,
) -> Result<Image, RenderError> {
    let (encoded, width_px, height_px) = normalize_image(data, format)?;
    let natural_mm = |px: u32| f64::from(px) / IMAGE_DPI * 25.4;
    let factor = (max_width_mm / natural_mm(width_px)).min(max_height_mm / natural_mm(height_px));
    Ok(Image::from_reader(Cursor::new(encoded))?.with_scale(Scale::new(factor, factor)))
}

fn normalize_image(data: &[u8], format: ImageFormat) -> Result<(Vec<u8>, u32, u32), RenderError> {
    let rgb = image::load_from_memory(data)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(rgb).write_to(&mut out, format)?;
    Ok((out.into_inner(), width, height))
}
