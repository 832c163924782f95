use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("QR encoding failed: {0}")]
    Encode(#[from] qrcode::types::QrError),
    #[error("QR image write failed: {0}")]
    Image(#[from] image::ImageError),
}

/// URL a scanned certificate resolves to: the PDF download route.
pub fn verification_url(base: &str, noc_number: &str) -> String {
    format!("{}/api/noc/pdf/{}", base.trim_end_matches('/'), noc_number)
}

/// Encode `data` as a grayscale PNG.
pub fn encode_png(data: &str) -> Result<Vec<u8>, QrError> {
    let code = QrCode::new(data.as_bytes())?;
    let image = code
        .render::<Luma<u8>>()
        .quiet_zone(true)
        .min_dimensions(200, 200)
        .build();

    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(image).write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}
